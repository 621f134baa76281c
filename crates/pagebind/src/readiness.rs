//! Readiness Waiting
//!
//! Blocks until every marked field of a bound page object satisfies its
//! declared condition.
//!
//! | Mark           | Single / typed / block      | Lists                        |
//! |----------------|-----------------------------|------------------------------|
//! | `Visible`      | poll until displayed        | all displayed (typed/block lists: first) |
//! | `Invisible`    | absent, stale or hidden     | `UnsupportedMark`            |
//! | `ForceVisible` | style script, once          | skipped                      |
//!
//! A stale reference during a `Visible` wait triggers one document settle and
//! a single retry with a fresh timeout. Inside a block the block owns that
//! retry, so the root is located again and its fields rebound. Block fields
//! wait under the block's own timeout.

use crate::block::BlockField;
use crate::clock::{system_clock, Clock};
use crate::driver::{Driver, ScriptArg};
use crate::element::{ElementList, WebElement};
use crate::page_object::PageObject;
use crate::result::{PageError, PageResult};
use crate::schema::{FieldBindingSpec, FieldTarget, ReadinessMark};
use crate::wait::{poll_until, DocumentSettle, SettlePolicy, WaitFault, WaitPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Style mutation applied to `ForceVisible` fields
pub const FORCE_VISIBLE_SCRIPT: &str = "arguments[0].style.zindex='10000';\
arguments[0].style.visibility='visible';\
arguments[0].style.opacity='100';";

/// Awaits the readiness marks of page objects
#[derive(Debug, Clone)]
pub struct ReadinessWaiter {
    driver: Arc<dyn Driver>,
    policy: WaitPolicy,
    settle: SettlePolicy,
    clock: Arc<dyn Clock>,
    recover: bool,
}

impl ReadinessWaiter {
    /// Waiter with default policies and the system clock
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            policy: WaitPolicy::default(),
            settle: SettlePolicy::default(),
            clock: system_clock(),
            recover: true,
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
    pub const fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Waiter for the fields of a block: same clock and settle, the block's
    /// effective policy, and stale faults handed back to the block
    fn scoped_to_block(&self, policy: WaitPolicy) -> Self {
        Self {
            policy,
            recover: false,
            ..self.clone()
        }
    }

    /// Await every marked field of `page`, in declaration order.
    ///
    /// # Errors
    ///
    /// The first failing field's error, typically `WaitTimeout`.
    pub fn await_page<P: PageObject>(&self, page: &P) -> PageResult<()> {
        for spec in P::schema() {
            let Some(mark) = spec.mark() else {
                continue;
            };
            if spec.is_wrapped_root() {
                continue;
            }
            let Some(field) = page.field(spec.field_name()) else {
                debug!(page = P::page_name(), field = spec.field_name(), "marked field not exposed");
                continue;
            };
            self.await_field(&spec, mark, field.target())?;
        }
        Ok(())
    }

    /// Await one field's mark
    pub fn await_field(
        &self,
        spec: &FieldBindingSpec,
        mark: ReadinessMark,
        target: FieldTarget<'_>,
    ) -> PageResult<()> {
        let policy = self.policy.overridden_by(spec.timeout_override());
        let label = spec.label();
        debug!(field = label, %mark, category = %target.category(), "awaiting field");

        match (mark, target) {
            (ReadinessMark::Visible, FieldTarget::Element(el) | FieldTarget::Typified(el)) => {
                self.await_visible(label, &policy, el)
            }
            (ReadinessMark::Visible, FieldTarget::List(list)) => {
                self.visible_with_recovery(label, &policy, || all_displayed(list))
            }
            (ReadinessMark::Visible, FieldTarget::TypifiedList(list)) => {
                self.await_visible(label, &policy, &list.first()?)
            }
            (ReadinessMark::Visible, FieldTarget::Block(block)) => {
                self.await_block_visible(label, &policy, block)
            }
            (ReadinessMark::Visible, FieldTarget::BlockList(blocks)) => {
                let first = blocks.first_block()?;
                self.await_block_visible(label, &policy, &*first)
            }

            (ReadinessMark::Invisible, FieldTarget::Element(el) | FieldTarget::Typified(el)) => {
                self.await_invisible(label, &policy, el)
            }
            (ReadinessMark::Invisible, FieldTarget::Block(block)) => {
                self.await_invisible(label, &policy, block.root())
            }
            (
                ReadinessMark::Invisible,
                target @ (FieldTarget::List(_)
                | FieldTarget::TypifiedList(_)
                | FieldTarget::BlockList(_)),
            ) => Err(PageError::UnsupportedMark {
                field: label.to_string(),
                mark: mark.to_string(),
                category: target.category().to_string(),
            }),

            (ReadinessMark::ForceVisible, FieldTarget::Element(el) | FieldTarget::Typified(el)) => {
                self.force_visible(label, el)
            }
            (ReadinessMark::ForceVisible, FieldTarget::Block(block)) => {
                self.force_visible(label, block.root())
            }
            (ReadinessMark::ForceVisible, target) => {
                debug!(field = label, category = %target.category(), "force-visible does not apply to lists");
                Ok(())
            }
        }
    }

    fn await_visible(&self, label: &str, policy: &WaitPolicy, element: &WebElement) -> PageResult<()> {
        self.visible_with_recovery(label, policy, || displayed_or_absent(element))
    }

    /// Children first, so the block root has to turn up before its fields can bind.
    ///
    /// A stale child means the block was re-rendered: settle once, then look
    /// the root up again and rebind its fields.
    fn await_block_visible(
        &self,
        label: &str,
        policy: &WaitPolicy,
        block: &dyn BlockField,
    ) -> PageResult<()> {
        let root = block.root();
        let children = self.scoped_to_block(*policy);
        self.await_block_root(label, policy, root)?;
        match block.await_children(&children) {
            Ok(()) => {}
            Err(e) if e.is_stale() && self.recover => {
                info!(field = label, "block re-rendered while awaiting its fields, waiting for the page to settle");
                self.settle_document(label);
                let retry_start = self.clock.now();
                self.await_block_root(label, policy, root)?;
                match block.await_children(&children) {
                    Ok(()) => info!(field = label, "block fields visible after staleness recovery"),
                    Err(e) if e.is_stale() => {
                        return Err(timeout(
                            label,
                            "visible",
                            self.clock.elapsed_since(retry_start),
                            Some("stale element reference after retry"),
                        ));
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
        self.await_visible(label, policy, root)
    }

    fn await_block_root(&self, label: &str, policy: &WaitPolicy, root: &WebElement) -> PageResult<()> {
        match poll_until(self.clock.as_ref(), policy, || root.is_present()) {
            Ok(_) => Ok(()),
            Err(WaitFault::TimedOut { elapsed }) => Err(timeout(label, "present", elapsed, None)),
            Err(WaitFault::Stale) => {
                Err(timeout(label, "present", Duration::ZERO, Some("stale element reference")))
            }
            Err(WaitFault::Failed(e)) => Err(e),
        }
    }

    fn settle_document(&self, label: &str) {
        let settled = DocumentSettle::new(self.settle).run(self.driver.as_ref(), self.clock.as_ref());
        debug!(field = label, ?settled, "retrying after settle");
    }

    /// Visibility wait with a single settle-and-retry on staleness
    fn visible_with_recovery<F>(&self, label: &str, policy: &WaitPolicy, mut check: F) -> PageResult<()>
    where
        F: FnMut() -> PageResult<bool>,
    {
        let clock = self.clock.as_ref();
        match poll_until(clock, policy, &mut check) {
            Ok(waited) => {
                debug!(field = label, waited_ms = waited.as_millis() as u64, "visible");
                return Ok(());
            }
            Err(WaitFault::TimedOut { elapsed }) => return Err(timeout(label, "visible", elapsed, None)),
            Err(WaitFault::Failed(e)) => return Err(e),
            Err(WaitFault::Stale) if !self.recover => {
                return Err(PageError::StaleElement {
                    name: label.to_string(),
                });
            }
            Err(WaitFault::Stale) => {}
        }

        info!(field = label, "stale element while awaiting visibility, waiting for the page to settle");
        self.settle_document(label);

        let retry_start = clock.now();
        match poll_until(clock, policy, &mut check) {
            Ok(_) => {
                info!(field = label, "visible after staleness recovery");
                Ok(())
            }
            Err(WaitFault::TimedOut { elapsed }) => Err(timeout(label, "visible", elapsed, None)),
            Err(WaitFault::Stale) => Err(timeout(
                label,
                "visible",
                clock.elapsed_since(retry_start),
                Some("stale element reference after retry"),
            )),
            Err(WaitFault::Failed(e)) => Err(e),
        }
    }

    fn await_invisible(&self, label: &str, policy: &WaitPolicy, element: &WebElement) -> PageResult<()> {
        match poll_until(self.clock.as_ref(), policy, || hidden_or_gone(element)) {
            Ok(_) | Err(WaitFault::Stale) => Ok(()),
            Err(WaitFault::TimedOut { elapsed }) => Err(timeout(label, "invisible", elapsed, None)),
            Err(WaitFault::Failed(e)) => Err(e),
        }
    }

    /// Resolution errors propagate, script errors only warn
    fn force_visible(&self, label: &str, element: &WebElement) -> PageResult<()> {
        let handle = element.resolve()?;
        let driver = element.driver()?;
        if let Err(e) = driver.execute_script(FORCE_VISIBLE_SCRIPT, &[ScriptArg::Element(handle)]) {
            warn!(field = label, error = %e, "force-visible script failed");
        }
        Ok(())
    }
}

fn timeout(field: &str, condition: &str, elapsed: Duration, cause: Option<&str>) -> PageError {
    PageError::WaitTimeout {
        field: field.to_string(),
        condition: condition.to_string(),
        elapsed_ms: elapsed.as_millis() as u64,
        cause: cause.map(str::to_string),
    }
}

/// Not yet present counts as not visible yet
fn displayed_or_absent(element: &WebElement) -> PageResult<bool> {
    match element.is_displayed() {
        Err(e) if e.is_not_found() => Ok(false),
        other => other,
    }
}

fn hidden_or_gone(element: &WebElement) -> PageResult<bool> {
    match element.is_displayed() {
        Ok(displayed) => Ok(!displayed),
        Err(e) if e.is_not_found() || e.is_stale() => Ok(true),
        Err(e) => Err(e),
    }
}

/// Every current match displayed, and at least one match
fn all_displayed(list: &ElementList) -> PageResult<bool> {
    let elements = list.elements()?;
    if elements.is_empty() {
        return Ok(false);
    }
    for element in &elements {
        if !element.is_displayed()? {
            return Ok(false);
        }
    }
    Ok(true)
}
