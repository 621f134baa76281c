//! Deferred-resolution element proxies.
//!
//! A [`WebElement`] or [`ElementList`] holds a locator, never a result: every
//! capability call resolves again against the current DOM. The only exception
//! is an element obtained from a list snapshot, which refers to one fixed
//! handle and goes stale when that node is detached.

use crate::driver::{Driver, DriverResult, ElementHandle, ScriptArg};
use crate::locator::ElementLocator;
use crate::result::{PageError, PageResult};
use crate::schema::{BoundProxy, ElementField, FieldTarget, ShapeTraits};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Source {
    /// Re-resolved on every call
    Located(ElementLocator),
    /// One fixed node
    Resolved {
        driver: Arc<dyn Driver>,
        handle: ElementHandle,
    },
}

/// A single element field.
///
/// `WebElement::default()` is unbound; every call on it fails with
/// [`PageError::NotBound`] until the binder assigns a locator.
#[derive(Debug, Clone, Default)]
pub struct WebElement {
    name: String,
    source: Option<Source>,
}

impl WebElement {
    /// Element resolved through `locator` on every call
    #[must_use]
    pub fn located(name: impl Into<String>, locator: ElementLocator) -> Self {
        Self {
            name: name.into(),
            source: Some(Source::Located(locator)),
        }
    }

    /// Element fixed to an already resolved handle
    #[must_use]
    pub fn resolved(name: impl Into<String>, driver: Arc<dyn Driver>, handle: ElementHandle) -> Self {
        Self {
            name: name.into(),
            source: Some(Source::Resolved { driver, handle }),
        }
    }

    /// Display name used in errors
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    /// Locator, unless unbound or fixed to a handle
    #[must_use]
    pub fn locator(&self) -> Option<&ElementLocator> {
        match &self.source {
            Some(Source::Located(locator)) => Some(locator),
            _ => None,
        }
    }

    fn not_bound(&self) -> PageError {
        PageError::NotBound {
            name: self.name.clone(),
        }
    }

    pub(crate) fn driver(&self) -> PageResult<&Arc<dyn Driver>> {
        match &self.source {
            Some(Source::Located(locator)) => Ok(locator.driver()),
            Some(Source::Resolved { driver, .. }) => Ok(driver),
            None => Err(self.not_bound()),
        }
    }

    /// Current first match, or `None` when nothing matches
    pub fn try_resolve(&self) -> PageResult<Option<ElementHandle>> {
        match &self.source {
            Some(Source::Located(locator)) => locator
                .find_first()
                .map_err(|e| PageError::from_driver(&self.name, e)),
            Some(Source::Resolved { handle, .. }) => Ok(Some(handle.clone())),
            None => Err(self.not_bound()),
        }
    }

    /// Current first match
    pub fn resolve(&self) -> PageResult<ElementHandle> {
        self.try_resolve()?.ok_or_else(|| PageError::ElementNotFound {
            name: self.name.clone(),
            locator: self
                .locator()
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
    }

    /// Whether at least one element currently matches
    pub fn is_present(&self) -> PageResult<bool> {
        Ok(self.try_resolve()?.is_some())
    }

    fn act<T>(&self, f: impl FnOnce(&dyn Driver, &ElementHandle) -> DriverResult<T>) -> PageResult<T> {
        let handle = self.resolve()?;
        let driver = self.driver()?;
        f(driver.as_ref(), &handle).map_err(|e| PageError::from_driver(&self.name, e))
    }

    pub fn click(&self) -> PageResult<()> {
        self.act(|d, h| d.click(h))
    }

    pub fn send_keys(&self, keys: &str) -> PageResult<()> {
        self.act(|d, h| d.send_keys(h, keys))
    }

    pub fn clear(&self) -> PageResult<()> {
        self.act(|d, h| d.clear(h))
    }

    pub fn text(&self) -> PageResult<String> {
        self.act(|d, h| d.text(h))
    }

    pub fn attribute(&self, name: &str) -> PageResult<Option<String>> {
        self.act(|d, h| d.attribute(h, name))
    }

    pub fn is_displayed(&self) -> PageResult<bool> {
        self.act(|d, h| d.is_displayed(h))
    }

    pub fn is_selected(&self) -> PageResult<bool> {
        self.act(|d, h| d.is_selected(h))
    }

    pub fn tag_name(&self) -> PageResult<String> {
        self.act(|d, h| d.tag_name(h))
    }

    /// Run `script` with this element as `arguments[0]`
    pub fn execute_script(&self, script: &str) -> PageResult<serde_json::Value> {
        self.act(|d, h| d.execute_script(script, &[ScriptArg::Element(h.clone())]))
    }
}

impl ElementField for WebElement {
    fn shape() -> ShapeTraits {
        ShapeTraits::ELEMENT
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::Element(element) => {
                *self = element;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::Element(self)
    }
}

/// A list field: the full current match set, re-resolved on every call
#[derive(Debug, Clone, Default)]
pub struct ElementList {
    name: String,
    locator: Option<ElementLocator>,
}

impl ElementList {
    #[must_use]
    pub fn located(name: impl Into<String>, locator: ElementLocator) -> Self {
        Self {
            name: name.into(),
            locator: Some(locator),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.locator.is_some()
    }

    #[must_use]
    pub const fn locator(&self) -> Option<&ElementLocator> {
        self.locator.as_ref()
    }

    fn bound_locator(&self) -> PageResult<&ElementLocator> {
        self.locator.as_ref().ok_or_else(|| PageError::NotBound {
            name: self.name.clone(),
        })
    }

    /// Handles of the current match set
    pub fn handles(&self) -> PageResult<Vec<ElementHandle>> {
        self.bound_locator()?
            .find_all()
            .map_err(|e| PageError::from_driver(&self.name, e))
    }

    /// Snapshot of the current match set
    pub fn elements(&self) -> PageResult<Vec<WebElement>> {
        let locator = self.bound_locator()?;
        Ok(self
            .handles()?
            .into_iter()
            .enumerate()
            .map(|(i, handle)| {
                WebElement::resolved(
                    format!("{}[{i}]", self.name),
                    Arc::clone(locator.driver()),
                    handle,
                )
            })
            .collect())
    }

    pub fn len(&self) -> PageResult<usize> {
        Ok(self.handles()?.len())
    }

    pub fn is_empty(&self) -> PageResult<bool> {
        Ok(self.handles()?.is_empty())
    }

    /// Element at `index` of the current match set
    pub fn get(&self, index: usize) -> PageResult<Option<WebElement>> {
        Ok(self.elements()?.into_iter().nth(index))
    }

    /// Texts of the current match set
    pub fn texts(&self) -> PageResult<Vec<String>> {
        self.elements()?.iter().map(WebElement::text).collect()
    }

    /// Lazy proxy for the first match of the same locator
    pub fn first(&self) -> PageResult<WebElement> {
        Ok(WebElement::located(
            format!("{}[0]", self.name),
            self.bound_locator()?.clone(),
        ))
    }
}

impl ElementField for ElementList {
    fn shape() -> ShapeTraits {
        ShapeTraits::ELEMENT_LIST
    }

    fn bind(&mut self, proxy: BoundProxy) -> Result<(), BoundProxy> {
        match proxy {
            BoundProxy::List(list) => {
                *self = list;
                Ok(())
            }
            other => Err(other),
        }
    }

    fn target(&self) -> FieldTarget<'_> {
        FieldTarget::List(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::SearchContext;
    use crate::locator::{By, LocatorSpec};
    use crate::mock::{MockDriver, MockElement};

    fn locator(driver: &MockDriver, by: By) -> ElementLocator {
        ElementLocator::new(driver.shared(), LocatorSpec::simple(by), SearchContext::Document)
    }

    mod element_tests {
        use super::*;

        #[test]
        fn test_unbound_element_reports_not_bound() {
            let element = WebElement::default();
            assert!(!element.is_bound());
            assert!(matches!(element.click(), Err(PageError::NotBound { .. })));
        }

        #[test]
        fn test_construction_does_not_resolve() {
            let driver = MockDriver::new();
            let _element = WebElement::located("start", locator(&driver, By::id("start")));
            assert_eq!(driver.find_calls(), 0);
        }

        #[test]
        fn test_missing_element_is_not_found() {
            let driver = MockDriver::new();
            let element = WebElement::located("start", locator(&driver, By::id("start")));
            match element.click() {
                Err(PageError::ElementNotFound { name, locator }) => {
                    assert_eq!(name, "start");
                    assert_eq!(locator, "id=start");
                }
                other => panic!("expected not found, got {other:?}"),
            }
        }

        #[test]
        fn test_every_call_re_resolves() {
            let driver = MockDriver::new();
            driver.insert(MockElement::new("title").text("Hello"));
            let element = WebElement::located("title", locator(&driver, By::id("title")));

            assert_eq!(element.text().unwrap(), "Hello");
            driver.replace("title", MockElement::new("title-2").matching(By::id("title")).text("World"));
            assert_eq!(element.text().unwrap(), "World");
            assert_eq!(driver.find_calls(), 2);
        }

        #[test]
        fn test_resolved_element_goes_stale() {
            let driver = MockDriver::new();
            driver.insert(MockElement::new("row"));
            let element = WebElement::resolved("row", driver.shared(), ElementHandle::new("row"));
            assert!(element.is_displayed().unwrap());
            driver.detach("row");
            assert!(element.is_displayed().unwrap_err().is_stale());
        }

        #[test]
        fn test_execute_script_passes_element() {
            let driver = MockDriver::new();
            driver.insert(MockElement::new("menu"));
            let element = WebElement::located("menu", locator(&driver, By::id("menu")));
            element.execute_script("arguments[0].focus();").unwrap();
            let scripts = driver.executed_scripts();
            assert_eq!(
                scripts[0].1,
                vec![ScriptArg::Element(ElementHandle::new("menu"))]
            );
        }
    }

    mod list_tests {
        use super::*;

        fn items(driver: &MockDriver, n: usize) {
            for i in 0..n {
                driver.insert(
                    MockElement::new(format!("item{i}"))
                        .matching(By::css("li"))
                        .text(format!("Item {i}")),
                );
            }
        }

        #[test]
        fn test_count_is_never_cached() {
            let driver = MockDriver::new();
            items(&driver, 2);
            let list = ElementList::located("items", locator(&driver, By::css("li")));
            assert_eq!(list.len().unwrap(), 2);
            driver.insert(MockElement::new("late").matching(By::css("li")));
            assert_eq!(list.len().unwrap(), 3);
            driver.detach("item0");
            assert_eq!(list.len().unwrap(), 2);
        }

        #[test]
        fn test_texts_and_get() {
            let driver = MockDriver::new();
            items(&driver, 3);
            let list = ElementList::located("items", locator(&driver, By::css("li")));
            assert_eq!(list.texts().unwrap(), vec!["Item 0", "Item 1", "Item 2"]);
            let second = list.get(1).unwrap().unwrap();
            assert_eq!(second.name(), "items[1]");
            assert!(list.get(3).unwrap().is_none());
        }

        #[test]
        fn test_first_is_lazy() {
            let driver = MockDriver::new();
            let list = ElementList::located("items", locator(&driver, By::css("li")));
            let first = list.first().unwrap();
            assert_eq!(driver.find_calls(), 0);
            items(&driver, 1);
            assert_eq!(first.text().unwrap(), "Item 0");
        }

        #[test]
        fn test_empty_list_is_not_an_error() {
            let driver = MockDriver::new();
            let list = ElementList::located("items", locator(&driver, By::css("li")));
            assert!(list.is_empty().unwrap());
            assert!(ElementList::default().is_empty().is_err());
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn test_bind_rejects_other_shapes() {
            let mut element = WebElement::default();
            let offered = BoundProxy::List(ElementList::default());
            assert!(element.bind(offered).is_err());
            assert!(element.bind(BoundProxy::Element(WebElement::default())).is_ok());
            assert_eq!(WebElement::shape(), ShapeTraits::ELEMENT);
            assert_eq!(ElementList::shape(), ShapeTraits::ELEMENT_LIST);
        }
    }
}
