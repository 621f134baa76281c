//! Typed elements.
//!
//! A typed element wraps a [`WebElement`] proxy, delegates raw actions to it
//! and adds a human-readable display value.

use crate::element::{ElementList, WebElement};
use crate::result::PageResult;
use crate::schema::{BoundProxy, ElementField, FieldTarget, ShapeTraits};
use std::fmt;
use std::marker::PhantomData;

/// An element with domain-specific behaviour on top of a raw element
pub trait TypifiedElement: Default {
    /// Wrap a raw element proxy
    fn wrap(element: WebElement) -> Self;

    /// The wrapped proxy
    fn wrapped(&self) -> &WebElement;

    /// Value shown to the user, used in logs and assertions
    fn display_value(&self) -> PageResult<String> {
        self.wrapped().text()
    }

    fn click(&self) -> PageResult<()> {
        self.wrapped().click()
    }

    fn is_displayed(&self) -> PageResult<bool> {
        self.wrapped().is_displayed()
    }

    fn is_present(&self) -> PageResult<bool> {
        self.wrapped().is_present()
    }

    fn text(&self) -> PageResult<String> {
        self.wrapped().text()
    }

    fn attribute(&self, name: &str) -> PageResult<Option<String>> {
        self.wrapped().attribute(name)
    }
}

impl<T: TypifiedElement> ElementField for T {
    fn shape() -> ShapeTraits {
        ShapeTraits::TYPIFIED
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::Typified(element) => {
                *self = T::wrap(element);
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::Typified(self.wrapped())
    }
}

macro_rules! typified_element {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            element: WebElement,
        }

        impl $name {
            /// Wrapped proxy
            #[must_use]
            pub const fn element(&self) -> &WebElement {
                &self.element
            }
        }
    };
}

typified_element!(
    /// A clickable button
    Button
);

impl TypifiedElement for Button {
    fn wrap(element: WebElement) -> Self {
        Self { element }
    }

    fn wrapped(&self) -> &WebElement {
        &self.element
    }
}

typified_element!(
    /// A checkbox
    CheckBox
);

impl CheckBox {
    pub fn is_checked(&self) -> PageResult<bool> {
        self.element.is_selected()
    }

    /// Click only if currently unchecked
    pub fn select(&self) -> PageResult<()> {
        self.set(true)
    }

    /// Click only if currently checked
    pub fn deselect(&self) -> PageResult<()> {
        self.set(false)
    }

    pub fn set(&self, checked: bool) -> PageResult<()> {
        if self.is_checked()? != checked {
            self.element.click()?;
        }
        Ok(())
    }
}

impl TypifiedElement for CheckBox {
    fn wrap(element: WebElement) -> Self {
        Self { element }
    }

    fn wrapped(&self) -> &WebElement {
        &self.element
    }

    fn display_value(&self) -> PageResult<String> {
        Ok(if self.is_checked()? { "checked" } else { "unchecked" }.to_string())
    }
}

typified_element!(
    /// An editable text field
    TextInput
);

impl TextInput {
    /// Current value attribute
    pub fn value(&self) -> PageResult<String> {
        Ok(self.element.attribute("value")?.unwrap_or_default())
    }

    /// Replace the current value
    pub fn enter(&self, text: &str) -> PageResult<()> {
        self.element.clear()?;
        self.element.send_keys(text)
    }

    pub fn clear(&self) -> PageResult<()> {
        self.element.clear()
    }
}

impl TypifiedElement for TextInput {
    fn wrap(element: WebElement) -> Self {
        Self { element }
    }

    fn wrapped(&self) -> &WebElement {
        &self.element
    }

    fn display_value(&self) -> PageResult<String> {
        self.value()
    }
}

typified_element!(
    /// A hyperlink
    Link
);

impl Link {
    pub fn href(&self) -> PageResult<Option<String>> {
        self.element.attribute("href")
    }
}

impl TypifiedElement for Link {
    fn wrap(element: WebElement) -> Self {
        Self { element }
    }

    fn wrapped(&self) -> &WebElement {
        &self.element
    }
}

typified_element!(
    /// Read-only text, such as a heading or status message
    TextBlock
);

impl TypifiedElement for TextBlock {
    fn wrap(element: WebElement) -> Self {
        Self { element }
    }

    fn wrapped(&self) -> &WebElement {
        &self.element
    }

    fn display_value(&self) -> PageResult<String> {
        Ok(self.element.text()?.trim().to_string())
    }
}

/// A list of typed elements over one match set
pub struct TypifiedList<T> {
    list: ElementList,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for TypifiedList<T> {
    fn default() -> Self {
        Self {
            list: ElementList::default(),
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for TypifiedList<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypifiedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypifiedList")
            .field("element", &std::any::type_name::<T>())
            .field("list", &self.list)
            .finish()
    }
}

impl<T: TypifiedElement> TypifiedList<T> {
    /// Underlying match set
    #[must_use]
    pub const fn list(&self) -> &ElementList {
        &self.list
    }

    /// Snapshot of the current match set as typed elements
    pub fn items(&self) -> PageResult<Vec<T>> {
        Ok(self.list.elements()?.into_iter().map(T::wrap).collect())
    }

    /// Lazy typed proxy for the first match
    pub fn first(&self) -> PageResult<T> {
        Ok(T::wrap(self.list.first()?))
    }

    pub fn len(&self) -> PageResult<usize> {
        self.list.len()
    }

    pub fn is_empty(&self) -> PageResult<bool> {
        self.list.is_empty()
    }

    pub fn display_values(&self) -> PageResult<Vec<String>> {
        self.items()?.iter().map(T::display_value).collect()
    }
}

impl<T: TypifiedElement> ElementField for TypifiedList<T> {
    fn shape() -> ShapeTraits {
        ShapeTraits::TYPIFIED_LIST
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::TypifiedList(list) => {
                self.list = list;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::TypifiedList(&self.list)
    }
}
