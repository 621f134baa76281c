//! Proxy creation for classified fields.

use crate::driver::{Driver, SearchContext};
use crate::element::{ElementList, WebElement};
use crate::locator::{ElementLocator, LocatorSpec};
use crate::schema::{BoundProxy, FieldCategory};
use std::sync::Arc;

/// Builds deferred-resolution proxies for one driver.
///
/// Creating a proxy never touches the DOM.
#[derive(Debug, Clone)]
pub struct ElementProxyFactory {
    driver: Arc<dyn Driver>,
}

impl ElementProxyFactory {
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Proxy for a field of `category`, or `None` for unrecognized fields
    #[must_use]
    pub fn create(
        &self,
        category: FieldCategory,
        locator: &LocatorSpec,
        context: &SearchContext,
        name: &str,
    ) -> Option<BoundProxy> {
        let locator = ElementLocator::new(Arc::clone(&self.driver), locator.clone(), context.clone());
        let proxy = match category {
            FieldCategory::SingleElement => BoundProxy::Element(WebElement::located(name, locator)),
            FieldCategory::TypifiedElement => {
                BoundProxy::Typified(WebElement::located(name, locator))
            }
            FieldCategory::CompositeBlock => BoundProxy::Block(WebElement::located(name, locator)),
            FieldCategory::ElementList => BoundProxy::List(ElementList::located(name, locator)),
            FieldCategory::TypifiedElementList => {
                BoundProxy::TypifiedList(ElementList::located(name, locator))
            }
            FieldCategory::CompositeBlockList => {
                BoundProxy::BlockList(ElementList::located(name, locator))
            }
            FieldCategory::Unrecognized => return None,
        };
        Some(proxy)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::locator::By;
    use crate::mock::MockDriver;

    #[test]
    fn test_create_matches_category_without_resolving() {
        let driver = MockDriver::new();
        let factory = ElementProxyFactory::new(driver.shared());
        let spec = LocatorSpec::simple(By::css("li"));

        for category in [
            FieldCategory::SingleElement,
            FieldCategory::ElementList,
            FieldCategory::TypifiedElement,
            FieldCategory::TypifiedElementList,
            FieldCategory::CompositeBlock,
            FieldCategory::CompositeBlockList,
        ] {
            let proxy = factory
                .create(category, &spec, &SearchContext::Document, "items")
                .unwrap();
            assert_eq!(proxy.category(), category);
        }
        assert_eq!(driver.find_calls(), 0);
    }

    #[test]
    fn test_unrecognized_yields_nothing() {
        let factory = ElementProxyFactory::new(MockDriver::new().shared());
        assert!(factory
            .create(
                FieldCategory::Unrecognized,
                &By::id("x").into(),
                &SearchContext::Document,
                "x"
            )
            .is_none());
    }
}
