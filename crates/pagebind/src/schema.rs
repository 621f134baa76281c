//! Field schema and classification.
//!
//! A page object describes its element fields as a list of
//! [`FieldBindingSpec`]s, normally generated by `#[derive(PageObject)]`. The
//! binder and the readiness waiter only ever look at a page object through this
//! schema and the [`ElementField`] trait.

use crate::block::{BlockField, BlockListField};
use crate::element::{ElementList, WebElement};
use crate::locator::LocatorSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Shape capabilities of a field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeTraits {
    /// Typed element wrapping a single raw element
    pub typified: bool,
    /// Composite block with its own fields
    pub block: bool,
    /// Usable as a single raw element
    pub single: bool,
    /// List of typed elements
    pub typified_list: bool,
    /// List of composite blocks
    pub block_list: bool,
    /// Usable as a list of raw elements
    pub list: bool,
}

impl ShapeTraits {
    /// No recognizable shape
    pub const NONE: Self = Self {
        typified: false,
        block: false,
        single: false,
        typified_list: false,
        block_list: false,
        list: false,
    };

    /// Raw single element
    pub const ELEMENT: Self = Self {
        single: true,
        ..Self::NONE
    };

    /// Raw element list
    pub const ELEMENT_LIST: Self = Self {
        list: true,
        ..Self::NONE
    };

    /// Typed element, which is also usable as a raw element
    pub const TYPIFIED: Self = Self {
        typified: true,
        single: true,
        ..Self::NONE
    };

    /// Typed element list
    pub const TYPIFIED_LIST: Self = Self {
        typified_list: true,
        list: true,
        ..Self::NONE
    };

    /// Composite block, rooted at a single element
    pub const BLOCK: Self = Self {
        block: true,
        single: true,
        ..Self::NONE
    };

    /// Composite block list
    pub const BLOCK_LIST: Self = Self {
        block_list: true,
        list: true,
        ..Self::NONE
    };
}

/// Binding category of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    /// Raw single element
    SingleElement,
    /// Raw element list
    ElementList,
    /// Typed element
    TypifiedElement,
    /// Typed element list
    TypifiedElementList,
    /// Composite block
    CompositeBlock,
    /// Composite block list
    CompositeBlockList,
    /// Not an element field
    Unrecognized,
}

impl FieldCategory {
    /// Whether the category binds to a match set rather than one element
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::ElementList | Self::TypifiedElementList | Self::CompositeBlockList
        )
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SingleElement => "single element",
            Self::ElementList => "element list",
            Self::TypifiedElement => "typed element",
            Self::TypifiedElementList => "typed element list",
            Self::CompositeBlock => "block",
            Self::CompositeBlockList => "block list",
            Self::Unrecognized => "unrecognized",
        };
        f.write_str(name)
    }
}

/// Classify a shape. First match wins:
/// typed > block > single > typed list > block list > list.
#[must_use]
pub const fn classify(shape: ShapeTraits) -> FieldCategory {
    if shape.typified {
        FieldCategory::TypifiedElement
    } else if shape.block {
        FieldCategory::CompositeBlock
    } else if shape.single {
        FieldCategory::SingleElement
    } else if shape.typified_list {
        FieldCategory::TypifiedElementList
    } else if shape.block_list {
        FieldCategory::CompositeBlockList
    } else if shape.list {
        FieldCategory::ElementList
    } else {
        FieldCategory::Unrecognized
    }
}

/// Readiness condition declared on a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessMark {
    /// Must be displayed
    Visible,
    /// Must be absent, stale or hidden
    Invisible,
    /// Styled visible unconditionally
    ForceVisible,
}

impl fmt::Display for ReadinessMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Visible => "visible",
            Self::Invisible => "invisible",
            Self::ForceVisible => "force-visible",
        };
        f.write_str(name)
    }
}

/// Declared binding metadata of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBindingSpec {
    field_name: String,
    shape: ShapeTraits,
    locator: Option<LocatorSpec>,
    label: Option<String>,
    mark: Option<ReadinessMark>,
    timeout_override: Option<Duration>,
    wrapped_root: bool,
}

impl FieldBindingSpec {
    /// Field of the given shape, without a locator
    #[must_use]
    pub fn new(field_name: impl Into<String>, shape: ShapeTraits) -> Self {
        Self {
            field_name: field_name.into(),
            shape,
            locator: None,
            label: None,
            mark: None,
            timeout_override: None,
            wrapped_root: false,
        }
    }

    /// Field whose type is not an element shape
    #[must_use]
    pub fn unrecognized(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ShapeTraits::NONE)
    }

    /// Set the find-criteria
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<LocatorSpec>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Set the readiness mark
    #[must_use]
    pub const fn with_mark(mut self, mark: ReadinessMark) -> Self {
        self.mark = Some(mark);
        self
    }

    /// Set the display name used in logs and errors
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Override the wait timeout for this field
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Mark as the wrapped root element of a block
    #[must_use]
    pub const fn wrapped_root(mut self) -> Self {
        self.wrapped_root = true;
        self
    }

    /// Rust field name
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Display name, defaulting to the field name
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field_name)
    }

    #[must_use]
    pub const fn shape(&self) -> ShapeTraits {
        self.shape
    }

    #[must_use]
    pub const fn locator(&self) -> Option<&LocatorSpec> {
        self.locator.as_ref()
    }

    #[must_use]
    pub const fn mark(&self) -> Option<ReadinessMark> {
        self.mark
    }

    #[must_use]
    pub const fn timeout_override(&self) -> Option<Duration> {
        self.timeout_override
    }

    #[must_use]
    pub const fn is_wrapped_root(&self) -> bool {
        self.wrapped_root
    }

    /// Binding category derived from the shape
    #[must_use]
    pub const fn category(&self) -> FieldCategory {
        classify(self.shape)
    }
}

/// A deferred-resolution proxy offered to a field by the binder
#[derive(Debug, Clone)]
pub enum BoundProxy {
    /// Raw single element
    Element(WebElement),
    /// Raw element list
    List(ElementList),
    /// Element to wrap in a typed element
    Typified(WebElement),
    /// Match set to wrap in a typed element list
    TypifiedList(ElementList),
    /// Root element of a block
    Block(WebElement),
    /// Root match set of a block list
    BlockList(ElementList),
}

impl BoundProxy {
    /// Category this proxy was created for
    #[must_use]
    pub const fn category(&self) -> FieldCategory {
        match self {
            Self::Element(_) => FieldCategory::SingleElement,
            Self::List(_) => FieldCategory::ElementList,
            Self::Typified(_) => FieldCategory::TypifiedElement,
            Self::TypifiedList(_) => FieldCategory::TypifiedElementList,
            Self::Block(_) => FieldCategory::CompositeBlock,
            Self::BlockList(_) => FieldCategory::CompositeBlockList,
        }
    }
}

/// Borrowed view of a bound field, as seen by the readiness waiter
#[derive(Clone, Copy)]
pub enum FieldTarget<'a> {
    /// Raw single element
    Element(&'a WebElement),
    /// Typed element, through its wrapped element
    Typified(&'a WebElement),
    /// Raw element list
    List(&'a ElementList),
    /// Typed element list, through its match set
    TypifiedList(&'a ElementList),
    /// Composite block
    Block(&'a dyn BlockField),
    /// Composite block list
    BlockList(&'a dyn BlockListField),
}

impl FieldTarget<'_> {
    #[must_use]
    pub const fn category(&self) -> FieldCategory {
        match self {
            Self::Element(_) => FieldCategory::SingleElement,
            Self::Typified(_) => FieldCategory::TypifiedElement,
            Self::List(_) => FieldCategory::ElementList,
            Self::TypifiedList(_) => FieldCategory::TypifiedElementList,
            Self::Block(_) => FieldCategory::CompositeBlock,
            Self::BlockList(_) => FieldCategory::CompositeBlockList,
        }
    }
}

impl fmt::Debug for FieldTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldTarget({})", self.category())
    }
}

/// A page-object field that can receive a proxy.
///
/// Implemented by every element shape; `#[derive(PageObject)]` reaches fields
/// only through this trait.
pub trait ElementField {
    /// Shape capabilities of the implementing type
    fn shape() -> ShapeTraits
    where
        Self: Sized;

    /// Accept a proxy, handing it back if its shape does not fit
    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy>;

    /// View for readiness checks
    fn target(&self) -> FieldTarget<'_>;
}

/// Why the binder left a field untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// No find-criteria declared
    NoLocator,
    /// Type is not an element shape
    Unrecognized,
    /// The block's own root element
    WrappedRoot,
    /// The field refused the offered proxy
    ShapeMismatch,
    /// The schema names a field the page object does not expose
    MissingField,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoLocator => "no locator",
            Self::Unrecognized => "unrecognized shape",
            Self::WrappedRoot => "wrapped root",
            Self::ShapeMismatch => "shape mismatch",
            Self::MissingField => "missing field",
        };
        f.write_str(reason)
    }
}

/// Outcome of binding one page object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Fields that received a proxy, in declaration order
    pub bound: Vec<String>,
    /// Fields left untouched, in declaration order
    pub skipped: Vec<(String, SkipReason)>,
}

impl BindReport {
    #[must_use]
    pub fn is_bound(&self, field: &str) -> bool {
        self.bound.iter().any(|f| f == field)
    }

    /// Reason a field was skipped, if it was
    #[must_use]
    pub fn skip_reason(&self, field: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, reason)| *reason)
    }
}
