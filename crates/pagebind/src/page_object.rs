//! Page Object Model Support
//!
//! A page object is a plain struct whose element fields are declared through a
//! build-time schema. Implement [`PageObject`] by hand, or derive it:
//!
//! ```rust
//! use pagebind::{Button, PageObject, TextBlock};
//!
//! #[derive(Debug, Default, PageObject)]
//! #[page(name = "Dynamic loading", url = "https://example.test/dynamic_loading/1")]
//! struct DynamicLoadingPage {
//!     #[page(visible, css = "#start button")]
//!     start: Button,
//!     #[page(invisible, id = "finish")]
//!     finish: TextBlock,
//! }
//!
//! let schema = DynamicLoadingPage::schema();
//! assert_eq!(schema.len(), 2);
//! assert_eq!(DynamicLoadingPage::page_name(), "Dynamic loading");
//! ```

use crate::element::WebElement;
use crate::schema::{ElementField, FieldBindingSpec};

/// Declared element schema of a page or block.
///
/// `Default` must produce an unbound instance; binding assigns proxies in place.
pub trait PageObject: Default + 'static {
    /// Field bindings in declaration order
    fn schema() -> Vec<FieldBindingSpec>;

    /// Field by Rust name
    fn field(&self, name: &str) -> Option<&dyn ElementField>;

    /// Mutable field by Rust name
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn ElementField>;

    /// Name used in logs and errors
    fn page_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// URL opened by `PageLifecycle::open_default`
    fn default_url() -> Option<&'static str> {
        None
    }

    /// Receive the resolved root element when used as a block
    fn set_root(&mut self, _root: WebElement) {}
}
