//! Page Lifecycle
//!
//! Drives a page object from construction to ready:
//!
//! ```text
//! Unbound ─bind─► Binding ─bound─► AwaitingReady ─[framework idle]─► AwaitingReady ─readiness─► Ready
//!                    │                   │                                                │
//!                    └───────────────────┴──────────────────► Failed(cause) ◄─────────────┘
//! ```
//!
//! A page object is driven once. Navigating again means loading a new
//! instance.

use crate::binder::ElementBinder;
use crate::clock::{system_clock, Clock};
use crate::config::PageConfig;
use crate::driver::{Driver, SearchContext};
use crate::notify::PageReadyNotifier;
use crate::page_object::PageObject;
use crate::readiness::ReadinessWaiter;
use crate::result::{PageError, PageResult};
use crate::schema::BindReport;
use crate::wait::{poll_until, SettlePolicy, WaitFault, WaitPolicy};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Script detecting AngularJS on the page
pub const ANGULAR_DETECT_SCRIPT: &str = "return typeof angular;";

/// Script reporting whether AngularJS has no outstanding `$http` requests
pub const ANGULAR_IDLE_SCRIPT: &str =
    "return angular.element(document).injector().get('$http').pendingRequests.length === 0;";

/// Lifecycle state of one page object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, fields unbound
    Unbound,
    /// Fields being bound
    Binding,
    /// Waiting for framework idle and readiness marks
    AwaitingReady,
    /// Every mark satisfied
    Ready,
    /// Terminal failure
    Failed(String),
}

impl LifecycleState {
    /// Whether `next` may follow this state
    #[must_use]
    pub const fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Unbound, Self::Binding)
                | (Self::Binding, Self::AwaitingReady | Self::Failed(_))
                | (Self::AwaitingReady, Self::AwaitingReady | Self::Ready | Self::Failed(_))
        )
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "unbound"),
            Self::Binding => write!(f, "binding"),
            Self::AwaitingReady => write!(f, "awaiting ready"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(cause) => write!(f, "failed: {cause}"),
        }
    }
}

/// A page object together with its lifecycle state
pub struct Page<P> {
    inner: P,
    state: LifecycleState,
    driver: Arc<dyn Driver>,
    report: BindReport,
}

impl<P: fmt::Debug> fmt::Debug for Page<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("inner", &self.inner)
            .field("state", &self.state)
            .field("report", &self.report)
            .finish()
    }
}

impl<P: PageObject> Page<P> {
    /// Wrap a freshly constructed page object
    #[must_use]
    pub fn unbound(inner: P, driver: Arc<dyn Driver>) -> Self {
        Self {
            inner,
            state: LifecycleState::Unbound,
            driver,
            report: BindReport::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &LifecycleState {
        &self.state
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        P::page_name()
    }

    /// Outcome of binding
    #[must_use]
    pub const fn bind_report(&self) -> &BindReport {
        &self.report
    }

    /// Fluent access for chaining
    #[must_use]
    pub const fn then(&self) -> &P {
        &self.inner
    }

    /// Run `f` against the page object and keep chaining
    pub fn with<F>(&self, f: F) -> PageResult<&Self>
    where
        F: FnOnce(&P) -> PageResult<()>,
    {
        f(&self.inner)?;
        Ok(self)
    }

    /// Document title
    pub fn title(&self) -> PageResult<String> {
        self.script_string("return document.title;")
    }

    /// Serialized document
    pub fn source(&self) -> PageResult<String> {
        self.script_string("return document.documentElement.outerHTML;")
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    fn script_string(&self, script: &str) -> PageResult<String> {
        let value = self
            .driver
            .execute_script(script, &[])
            .map_err(|e| PageError::from_driver(P::page_name(), e))?;
        Ok(match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    fn transition(&mut self, next: LifecycleState) -> PageResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(PageError::InvalidState {
                message: format!(
                    "page '{}' cannot go from {} to {next}",
                    P::page_name(),
                    self.state
                ),
            });
        }
        debug!(page = P::page_name(), from = %self.state, to = %next, "lifecycle transition");
        self.state = next;
        Ok(())
    }
}

impl<P> Deref for Page<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.inner
    }
}

impl<P> DerefMut for Page<P> {
    fn deref_mut(&mut self) -> &mut P {
        &mut self.inner
    }
}

/// A client-side framework that must go idle before readiness checks
pub trait FrameworkIdle: Send + Sync + fmt::Debug {
    /// Framework name for logs
    fn name(&self) -> &'static str;

    /// Whether the framework is running on the current page
    fn detect(&self, driver: &dyn Driver) -> bool;

    /// Block until the framework reports idle
    fn await_idle(&self, driver: &dyn Driver, clock: &dyn Clock, policy: &WaitPolicy) -> PageResult<()>;
}

/// AngularJS: idle once `$http` has no pending requests
#[derive(Debug, Clone, Copy, Default)]
pub struct AngularIdle;

impl FrameworkIdle for AngularIdle {
    fn name(&self) -> &'static str {
        "angular"
    }

    fn detect(&self, driver: &dyn Driver) -> bool {
        match driver.execute_script(ANGULAR_DETECT_SCRIPT, &[]) {
            Ok(value) => value.as_str() == Some("object"),
            Err(e) => {
                debug!(error = %e, "angular detection failed, assuming absent");
                false
            }
        }
    }

    fn await_idle(&self, driver: &dyn Driver, clock: &dyn Clock, policy: &WaitPolicy) -> PageResult<()> {
        // A failing idle script counts as not idle yet.
        let outcome = poll_until(clock, policy, || match driver.execute_script(ANGULAR_IDLE_SCRIPT, &[]) {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            Err(e) => {
                debug!(error = %e, "angular idle script failed");
                Ok(false)
            }
        });
        match outcome {
            Ok(_) => Ok(()),
            Err(WaitFault::Failed(e)) => Err(e),
            Err(WaitFault::TimedOut { elapsed }) => Err(PageError::WaitTimeout {
                field: self.name().to_string(),
                condition: "idle".to_string(),
                elapsed_ms: elapsed.as_millis() as u64,
                cause: None,
            }),
            Err(WaitFault::Stale) => Err(PageError::WaitTimeout {
                field: self.name().to_string(),
                condition: "idle".to_string(),
                elapsed_ms: 0,
                cause: Some("stale element reference".to_string()),
            }),
        }
    }
}

/// Binds, awaits and announces page objects for one driver session
#[derive(Debug, Clone)]
pub struct PageLifecycle {
    driver: Arc<dyn Driver>,
    policy: WaitPolicy,
    settle: SettlePolicy,
    clock: Arc<dyn Clock>,
    idle: Option<Arc<dyn FrameworkIdle>>,
    notifier: Option<Arc<dyn PageReadyNotifier>>,
}

impl PageLifecycle {
    /// Lifecycle with default policies, no framework idle and no notifier
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            policy: WaitPolicy::default(),
            settle: SettlePolicy::default(),
            clock: system_clock(),
            idle: None,
            notifier: None,
        }
    }

    /// Lifecycle using the waits and framework detection of `config`
    #[must_use]
    pub fn from_config(driver: Arc<dyn Driver>, config: &PageConfig) -> Self {
        let lifecycle = Self::new(driver)
            .with_policy(config.wait_policy())
            .with_settle(config.settle_policy());
        if config.detect_angular {
            lifecycle.with_framework_idle(AngularIdle)
        } else {
            lifecycle
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_framework_idle(mut self, idle: impl FrameworkIdle + 'static) -> Self {
        self.idle = Some(Arc::new(idle));
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn PageReadyNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Same lifecycle with a different wait timeout
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut lifecycle = self.clone();
        lifecycle.policy = self.policy.overridden_by(Some(timeout));
        lifecycle
    }

    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    #[must_use]
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// The waiter this lifecycle uses for readiness marks
    #[must_use]
    pub fn waiter(&self) -> ReadinessWaiter {
        ReadinessWaiter::new(Arc::clone(&self.driver))
            .with_policy(self.policy)
            .with_settle(self.settle)
            .with_clock(Arc::clone(&self.clock))
    }

    /// Drive a constructed page object to ready.
    ///
    /// # Errors
    ///
    /// `PageLoadFailed` wrapping the first failing field or condition.
    pub fn enter<P: PageObject>(&self, page: P) -> PageResult<Page<P>> {
        let mut page = Page::unbound(page, Arc::clone(&self.driver));
        self.drive(&mut page)?;
        Ok(page)
    }

    /// Construct `P` and drive it to ready
    pub fn load<P: PageObject>(&self) -> PageResult<Page<P>> {
        self.enter(P::default())
    }

    /// Navigate to `url`, then load `P`
    pub fn open<P: PageObject>(&self, url: &str) -> PageResult<Page<P>> {
        info!(page = P::page_name(), url, "opening page");
        self.driver.navigate(url).map_err(|e| PageError::PageLoadFailed {
            page: P::page_name().to_string(),
            source: Box::new(PageError::from_driver(P::page_name(), e)),
        })?;
        self.load()
    }

    /// Navigate to the URL `P` declares, then load it
    pub fn open_default<P: PageObject>(&self) -> PageResult<Page<P>> {
        let url = P::default_url().ok_or_else(|| PageError::Config {
            message: format!("page '{}' declares no url", P::page_name()),
        })?;
        self.open(url)
    }

    /// Run the lifecycle on `page`, leaving it `Ready` or `Failed`
    pub fn drive<P: PageObject>(&self, page: &mut Page<P>) -> PageResult<()> {
        let name = P::page_name();
        page.transition(LifecycleState::Binding)?;
        page.report = ElementBinder::new(Arc::clone(&self.driver))
            .bind(&mut page.inner, &SearchContext::Document);
        page.transition(LifecycleState::AwaitingReady)?;

        match self.await_ready(&page.inner) {
            Ok(()) => {
                page.transition(LifecycleState::Ready)?;
                info!(page = name, bound = page.report.bound.len(), "page ready");
                self.announce(name);
                Ok(())
            }
            Err(e) => {
                error!(page = name, error = %e, "page failed to load");
                page.transition(LifecycleState::Failed(e.to_string()))?;
                Err(PageError::PageLoadFailed {
                    page: name.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    fn await_ready<P: PageObject>(&self, page: &P) -> PageResult<()> {
        if let Some(idle) = &self.idle {
            if idle.detect(self.driver.as_ref()) {
                debug!(page = P::page_name(), framework = idle.name(), "waiting for framework idle");
                idle.await_idle(self.driver.as_ref(), self.clock.as_ref(), &self.policy)?;
            }
        }
        self.waiter().await_page(page)
    }

    fn announce(&self, page: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify_page_ready(page) {
                warn!(page, error = %e, "page ready notification failed, page is still ready");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::element::WebElement;
    use crate::locator::By;
    use crate::mock::{MockDriver, MockElement};
    use crate::schema::{ElementField, FieldBindingSpec, ReadinessMark, ShapeTraits};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Home {
        heading: WebElement,
    }

    impl PageObject for Home {
        fn schema() -> Vec<FieldBindingSpec> {
            vec![FieldBindingSpec::new("heading", ShapeTraits::ELEMENT)
                .with_locator(By::css("h1"))
                .with_mark(ReadinessMark::Visible)]
        }

        fn field(&self, name: &str) -> Option<&dyn ElementField> {
            (name == "heading").then_some(&self.heading as &dyn ElementField)
        }

        fn field_mut(&mut self, name: &str) -> Option<&mut dyn ElementField> {
            if name == "heading" {
                Some(&mut self.heading)
            } else {
                None
            }
        }

        fn page_name() -> &'static str {
            "Home"
        }

        fn default_url() -> Option<&'static str> {
            Some("https://example.test/")
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        pages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl PageReadyNotifier for Recorder {
        fn notify_page_ready(&self, page: &str) -> PageResult<()> {
            self.pages.lock().unwrap().push(page.to_string());
            if self.fail {
                return Err(PageError::NotificationRejected {
                    message: "closed".into(),
                });
            }
            Ok(())
        }
    }

    fn lifecycle(driver: &MockDriver) -> PageLifecycle {
        PageLifecycle::new(driver.shared()).with_clock(FakeClock::shared())
    }

    fn home_dom(driver: &MockDriver) {
        driver.insert(MockElement::new("title").matching(By::css("h1")).text("Welcome"));
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_valid_transitions() {
            use LifecycleState::*;
            assert!(Unbound.can_transition_to(&Binding));
            assert!(Binding.can_transition_to(&AwaitingReady));
            assert!(AwaitingReady.can_transition_to(&AwaitingReady));
            assert!(AwaitingReady.can_transition_to(&Ready));
            assert!(AwaitingReady.can_transition_to(&Failed("x".into())));
        }

        #[test]
        fn test_invalid_transitions() {
            use LifecycleState::*;
            assert!(!Unbound.can_transition_to(&Ready));
            assert!(!Ready.can_transition_to(&Binding));
            assert!(!Failed("x".into()).can_transition_to(&Binding));
            assert!(Ready.is_terminal());
        }
    }

    mod drive_tests {
        use super::*;

        #[test]
        fn test_load_reaches_ready() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let page = lifecycle(&driver).load::<Home>().unwrap();
            assert_eq!(page.state(), &LifecycleState::Ready);
            assert_eq!(page.then().heading.text().unwrap(), "Welcome");
            assert!(page.bind_report().is_bound("heading"));
        }

        #[test]
        fn test_failure_wraps_cause() {
            let driver = MockDriver::new();
            let lifecycle = lifecycle(&driver).with_timeout(Duration::from_millis(500));
            let mut page = Page::unbound(Home::default(), driver.shared());
            let err = lifecycle.drive(&mut page).unwrap_err();

            match err {
                PageError::PageLoadFailed { page: name, source } => {
                    assert_eq!(name, "Home");
                    assert!(matches!(*source, PageError::WaitTimeout { elapsed_ms: 500, .. }));
                }
                other => panic!("expected load failure, got {other:?}"),
            }
            assert!(matches!(page.state(), LifecycleState::Failed(_)));
        }

        #[test]
        fn test_page_is_driven_once() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let lifecycle = lifecycle(&driver);
            let mut page = lifecycle.load::<Home>().unwrap();
            assert!(matches!(
                lifecycle.drive(&mut page),
                Err(PageError::InvalidState { .. })
            ));
            assert_eq!(page.state(), &LifecycleState::Ready);
        }

        #[test]
        fn test_open_default_navigates() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let _ = lifecycle(&driver).open_default::<Home>().unwrap();
            assert_eq!(driver.navigations(), vec!["https://example.test/".to_string()]);
        }

        #[test]
        fn test_title_and_source() {
            let driver = MockDriver::new();
            home_dom(&driver);
            driver.script_result("document.title", serde_json::json!("Example"));
            let page = lifecycle(&driver).load::<Home>().unwrap();
            assert_eq!(page.title().unwrap(), "Example");
            assert_eq!(page.source().unwrap(), "");
        }
    }

    mod notify_tests {
        use super::*;

        #[test]
        fn test_ready_page_is_announced() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let recorder = Arc::new(Recorder::default());
            let _ = lifecycle(&driver)
                .with_notifier(recorder.clone())
                .load::<Home>()
                .unwrap();
            assert_eq!(*recorder.pages.lock().unwrap(), vec!["Home".to_string()]);
        }

        #[test]
        fn test_notification_failure_keeps_page_ready() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let recorder = Arc::new(Recorder {
                fail: true,
                ..Recorder::default()
            });
            let page = lifecycle(&driver)
                .with_notifier(recorder.clone())
                .load::<Home>()
                .unwrap();
            assert_eq!(page.state(), &LifecycleState::Ready);
        }

        #[test]
        fn test_failed_page_is_not_announced() {
            let driver = MockDriver::new();
            let recorder = Arc::new(Recorder::default());
            let result = lifecycle(&driver)
                .with_timeout(Duration::ZERO)
                .with_notifier(recorder.clone())
                .load::<Home>();
            assert!(result.is_err());
            assert!(recorder.pages.lock().unwrap().is_empty());
        }
    }

    mod angular_tests {
        use super::*;

        #[test]
        fn test_absent_angular_is_skipped() {
            let driver = MockDriver::new();
            home_dom(&driver);
            let _ = lifecycle(&driver)
                .with_framework_idle(AngularIdle)
                .load::<Home>()
                .unwrap();
            assert_eq!(driver.scripts_containing("typeof angular"), 1);
            assert_eq!(driver.scripts_containing("pendingRequests"), 0);
        }

        #[test]
        fn test_waits_for_pending_requests() {
            let driver = MockDriver::new();
            home_dom(&driver);
            driver.script_result("typeof angular", serde_json::json!("object"));
            driver.script_result("pendingRequests", serde_json::json!(true));
            let _ = lifecycle(&driver)
                .with_framework_idle(AngularIdle)
                .load::<Home>()
                .unwrap();
            assert_eq!(driver.scripts_containing("pendingRequests"), 1);
        }

        #[test]
        fn test_busy_angular_times_out() {
            let driver = MockDriver::new();
            home_dom(&driver);
            driver.script_result("typeof angular", serde_json::json!("object"));
            driver.script_result("pendingRequests", serde_json::json!(false));
            let err = lifecycle(&driver)
                .with_timeout(Duration::from_secs(1))
                .with_framework_idle(AngularIdle)
                .load::<Home>()
                .unwrap_err();
            match err {
                PageError::PageLoadFailed { source, .. } => {
                    assert!(matches!(*source, PageError::WaitTimeout { ref field, .. } if field == "angular"));
                }
                other => panic!("expected load failure, got {other:?}"),
            }
        }

        #[test]
        fn test_failing_idle_probe_waits_out_the_timeout() {
            let driver = MockDriver::new();
            driver.fail_scripts(true);
            let clock = FakeClock::shared();
            let policy = WaitPolicy::new().with_timeout(500);

            let err = AngularIdle
                .await_idle(&driver, clock.as_ref(), &policy)
                .unwrap_err();
            assert!(matches!(
                err,
                PageError::WaitTimeout { ref field, ref condition, cause: None, .. }
                    if field == "angular" && condition == "idle"
            ));
            assert_eq!(clock.elapsed(), Duration::from_millis(500));
            assert!(driver.scripts_containing("pendingRequests") > 1);
        }
    }
}
