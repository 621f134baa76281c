//! Mock Driver Module
//!
//! An in-memory document implementing [`Driver`](crate::Driver), for testing page
//! objects without a browser.
//!
//! ## Example
//!
//! ```rust
//! use pagebind::mock::{MockDriver, MockElement};
//! use pagebind::{By, Driver, SearchContext};
//!
//! let driver = MockDriver::new();
//! driver.insert(MockElement::new("finish").hidden());
//!
//! let found = driver.find_all(&SearchContext::Document, &By::id("finish")).unwrap();
//! assert_eq!(found.len(), 1);
//! assert!(!driver.is_displayed(&found[0]).unwrap());
//! ```

mod dom;
mod driver;

pub use dom::{DisplayState, MockElement};
pub use driver::MockDriver;
