//! Pagebind: Lazy Element Binding for Browser Page Objects
//!
//! Page objects declare their elements as typed fields with locator and
//! readiness annotations. Pagebind binds every field to a lazy proxy that
//! re-locates its element on each use, then blocks until the page reports
//! ready before handing the object to the test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   PAGEBIND Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Element    │    │ Readiness  │            │
//! │   │ Object     │───►│ Binder     │───►│ Waiter     │───► Ready  │
//! │   │ (schema)   │    │ (proxies)  │    │ (+settle)  │     event  │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                            │                 │                  │
//! │                            ▼                 ▼                  │
//! │                     ┌─────────────────────────────┐             │
//! │                     │ Driver (WebDriver session)  │             │
//! │                     └─────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use pagebind::mock::{MockDriver, MockElement};
//! use pagebind::{
//!     Button, FakeClock, LifecycleState, PageLifecycle, PageObject, TextBlock, TypifiedElement,
//! };
//!
//! #[derive(Debug, Default, PageObject)]
//! #[page(name = "Dynamic loading")]
//! struct DynamicLoading {
//!     #[page(visible, id = "start")]
//!     start: Button,
//!     #[page(invisible, id = "loading")]
//!     loading: TextBlock,
//! }
//!
//! let driver = MockDriver::new();
//! driver.insert(MockElement::new("start").tag("button").text("Start"));
//!
//! let page = PageLifecycle::new(driver.shared())
//!     .with_clock(FakeClock::shared())
//!     .load::<DynamicLoading>()
//!     .unwrap();
//! assert_eq!(page.state(), &LifecycleState::Ready);
//! page.start.click().unwrap();
//! ```

#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

// Lets `#[derive(PageObject)]` expand to `::pagebind::...` inside this crate.
extern crate self as pagebind;

/// Resolves schema fields into lazy proxies
pub mod binder;
/// Composite elements scoped to a root element
pub mod block;
/// Time source for waits
pub mod clock;
/// YAML and environment configuration
pub mod config;
/// Browser driver abstraction
pub mod driver;
/// Lazily located elements and element lists
pub mod element;
/// Page construction, readiness and notification
pub mod lifecycle;
/// Locator strategies and composition
pub mod locator;
/// `tracing` subscriber setup
pub mod logging;
/// In-memory driver for tests
pub mod mock;
/// Page-ready event fan-out
pub mod notify;
/// The page object trait
pub mod page_object;
/// Proxy construction per field category
pub mod proxy;
/// Readiness-mark waits
pub mod readiness;
/// Error types
pub mod result;
/// Field schema and classification
pub mod schema;
/// Typed element wrappers
pub mod typified;
/// Poll loop and document settle
pub mod wait;

pub use binder::ElementBinder;
pub use block::{Block, BlockField, BlockList, BlockListField};
pub use clock::{system_clock, Clock, FakeClock, SystemClock};
pub use config::PageConfig;
pub use driver::{Driver, DriverError, DriverResult, ElementHandle, ScriptArg, SearchContext};
pub use element::{ElementList, WebElement};
pub use lifecycle::{AngularIdle, FrameworkIdle, LifecycleState, Page, PageLifecycle};
pub use locator::{By, ElementLocator, LocatorResolver, LocatorSpec};
pub use logging::{init_tracing, LogFormat};
pub use notify::{
    LogListener, NotificationPool, PageReadyListener, PageReadyNotifier, PoolConfig,
};
pub use page_object::PageObject;
pub use proxy::ElementProxyFactory;
pub use readiness::ReadinessWaiter;
pub use result::{PageError, PageResult};
pub use schema::{
    classify, BindReport, BoundProxy, ElementField, FieldBindingSpec, FieldCategory,
    FieldTarget, ReadinessMark, ShapeTraits, SkipReason,
};
pub use typified::{Button, CheckBox, Link, TextBlock, TextInput, TypifiedElement, TypifiedList};
pub use wait::{DocumentSettle, SettlePolicy, SettleState, WaitPolicy};

/// Derive [`PageObject`] from `#[page(...)]` field annotations
#[cfg(feature = "derive")]
pub use pagebind_derive::PageObject;

/// Common imports for page object tests
pub mod prelude {
    pub use super::{
        Block, BlockList, Button, By, CheckBox, ElementList, LifecycleState, Link, LocatorSpec,
        Page, PageError, PageLifecycle, PageObject, PageResult, TextBlock, TextInput,
        TypifiedElement, TypifiedList, WebElement,
    };
}
