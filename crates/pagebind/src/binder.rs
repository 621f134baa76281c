//! Field binding.
//!
//! Walks a page object's schema and assigns a proxy to every element field.
//! Binding never fails: anything that cannot be bound is skipped, logged at
//! debug level and recorded in the [`BindReport`].

use crate::driver::{Driver, SearchContext};
use crate::page_object::PageObject;
use crate::proxy::ElementProxyFactory;
use crate::schema::{BindReport, FieldCategory, SkipReason};
use std::sync::Arc;
use tracing::debug;

/// Assigns proxies to the fields of a page object
#[derive(Debug, Clone)]
pub struct ElementBinder {
    factory: ElementProxyFactory,
}

impl ElementBinder {
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            factory: ElementProxyFactory::new(driver),
        }
    }

    /// Bind every field of `page` within `context`
    pub fn bind<P: PageObject>(&self, page: &mut P, context: &SearchContext) -> BindReport {
        let mut report = BindReport::default();
        let page_name = P::page_name();

        for spec in P::schema() {
            let name = spec.field_name().to_string();
            let category = spec.category();

            let skip = if spec.is_wrapped_root() {
                Some(SkipReason::WrappedRoot)
            } else if category == FieldCategory::Unrecognized {
                Some(SkipReason::Unrecognized)
            } else if spec.locator().is_none() {
                Some(SkipReason::NoLocator)
            } else {
                None
            };
            if let Some(reason) = skip {
                debug!(page = page_name, field = %name, %reason, "skipping field");
                report.skipped.push((name, reason));
                continue;
            }

            let Some(proxy) = spec
                .locator()
                .and_then(|locator| self.factory.create(category, locator, context, spec.label()))
            else {
                report.skipped.push((name, SkipReason::Unrecognized));
                continue;
            };

            let Some(field) = page.field_mut(&name) else {
                debug!(page = page_name, field = %name, "schema names a field the page does not expose");
                report.skipped.push((name, SkipReason::MissingField));
                continue;
            };

            match field.bind(proxy) {
                Ok(()) => {
                    debug!(page = page_name, field = %name, %category, %context, "bound field");
                    report.bound.push(name);
                }
                Err(rejected) => {
                    debug!(
                        page = page_name,
                        field = %name,
                        offered = %rejected.category(),
                        "field refused proxy"
                    );
                    report.skipped.push((name, SkipReason::ShapeMismatch));
                }
            }
        }
        report
    }
}
