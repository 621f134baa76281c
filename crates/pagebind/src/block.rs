//! Composite blocks.
//!
//! A block is a page object scoped to one root element: its own fields are
//! located within that root. [`Block<B>`] keeps only the root proxy; the inner
//! `B` is bound afresh on every [`Block::get`], so it always reflects the root
//! currently in the document.

use crate::binder::ElementBinder;
use crate::driver::SearchContext;
use crate::element::{ElementList, WebElement};
use crate::page_object::PageObject;
use crate::readiness::ReadinessWaiter;
use crate::result::PageResult;
use crate::schema::{BoundProxy, ElementField, FieldTarget, ShapeTraits};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Block behaviour needed by the readiness waiter, independent of `B`
pub trait BlockField {
    /// Root element proxy
    fn root(&self) -> &WebElement;

    /// Bind the block's fields within the current root and await them
    fn await_children(&self, waiter: &ReadinessWaiter) -> PageResult<()>;
}

/// Block-list behaviour needed by the readiness waiter
pub trait BlockListField {
    /// Root match set
    fn roots(&self) -> &ElementList;

    /// Lazy block over the first root
    fn first_block(&self) -> PageResult<Box<dyn BlockField + '_>>;
}

/// A composite block field
pub struct Block<B> {
    root: WebElement,
    _marker: PhantomData<fn() -> B>,
}

impl<B> Default for Block<B> {
    fn default() -> Self {
        Self {
            root: WebElement::default(),
            _marker: PhantomData,
        }
    }
}

impl<B> Clone for Block<B> {
    fn clone(&self) -> Self {
        Self::from_root(self.root.clone())
    }
}

impl<B> fmt::Debug for Block<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("block", &std::any::type_name::<B>())
            .field("root", &self.root)
            .finish()
    }
}

impl<B> Block<B> {
    /// Block rooted at `root`
    #[must_use]
    pub fn from_root(root: WebElement) -> Self {
        Self {
            root,
            _marker: PhantomData,
        }
    }
}

impl<B: PageObject> Block<B> {
    /// Root element proxy
    #[must_use]
    pub const fn root(&self) -> &WebElement {
        &self.root
    }

    /// Resolve the root and bind a fresh `B` within it.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` when no root matches.
    pub fn get(&self) -> PageResult<B> {
        let handle = self.root.resolve()?;
        let driver = Arc::clone(self.root.driver()?);

        let mut block = B::default();
        let _ = ElementBinder::new(Arc::clone(&driver))
            .bind(&mut block, &SearchContext::within(handle.clone()));
        block.set_root(WebElement::resolved(self.root.name(), driver, handle));
        Ok(block)
    }

    pub fn is_displayed(&self) -> PageResult<bool> {
        self.root.is_displayed()
    }

    pub fn is_present(&self) -> PageResult<bool> {
        self.root.is_present()
    }
}

impl<B: PageObject> BlockField for Block<B> {
    fn root(&self) -> &WebElement {
        &self.root
    }

    fn await_children(&self, waiter: &ReadinessWaiter) -> PageResult<()> {
        waiter.await_page(&self.get()?)
    }
}

impl<B: PageObject> ElementField for Block<B> {
    fn shape() -> ShapeTraits {
        ShapeTraits::BLOCK
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::Block(root) => {
                self.root = root;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::Block(self)
    }
}

/// A list of composite blocks over one root match set
pub struct BlockList<B> {
    roots: ElementList,
    _marker: PhantomData<fn() -> B>,
}

impl<B> Default for BlockList<B> {
    fn default() -> Self {
        Self {
            roots: ElementList::default(),
            _marker: PhantomData,
        }
    }
}

impl<B> fmt::Debug for BlockList<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockList")
            .field("block", &std::any::type_name::<B>())
            .field("roots", &self.roots)
            .finish()
    }
}

impl<B: PageObject> BlockList<B> {
    /// Bound blocks, one per current root
    pub fn blocks(&self) -> PageResult<Vec<B>> {
        self.roots
            .elements()?
            .into_iter()
            .map(|root| Block::<B>::from_root(root).get())
            .collect()
    }

    /// Lazy block over the first current root
    pub fn first(&self) -> PageResult<Block<B>> {
        Ok(Block::from_root(self.roots.first()?))
    }

    pub fn len(&self) -> PageResult<usize> {
        self.roots.len()
    }

    pub fn is_empty(&self) -> PageResult<bool> {
        self.roots.is_empty()
    }
}

impl<B: PageObject> BlockListField for BlockList<B> {
    fn roots(&self) -> &ElementList {
        &self.roots
    }

    fn first_block(&self) -> PageResult<Box<dyn BlockField + '_>> {
        Ok(Box::new(self.first()?))
    }
}

impl<B: PageObject> ElementField for BlockList<B> {
    fn shape() -> ShapeTraits {
        ShapeTraits::BLOCK_LIST
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::BlockList(roots) => {
                self.roots = roots;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::BlockList(self)
    }
}
