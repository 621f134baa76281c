//! Scriptable in-memory [`Driver`] implementation.

use super::dom::{DisplayState, MockDom, MockElement};
use crate::driver::{
    Driver, DriverError, DriverResult, ElementHandle, ScriptArg, SearchContext,
    DOCUMENT_READY_SCRIPT,
};
use crate::locator::By;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory driver with an inspectable DOM.
///
/// Clones share the same DOM, so a test can keep one handle for mutation while
/// the page object holds another as `Arc<dyn Driver>`.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    dom: Arc<Mutex<MockDom>>,
}

impl MockDriver {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in an `Arc<dyn Driver>` sharing this DOM
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Driver> {
        Arc::new(self.clone())
    }

    fn dom(&self) -> MutexGuard<'_, MockDom> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.dom
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add an element to the document
    pub fn insert(&self, element: MockElement) {
        self.dom().elements.push(element);
    }

    /// Detach an element (and implicitly its descendants)
    pub fn detach(&self, id: &str) {
        if let Some(el) = self.dom().get_mut(id) {
            el.attached = false;
        }
    }

    /// Detach `old_id` and insert `element` in its place
    pub fn replace(&self, old_id: &str, element: MockElement) {
        self.detach(old_id);
        self.insert(element);
    }

    /// Change whether an element is displayed
    pub fn set_displayed(&self, id: &str, displayed: bool) {
        if let Some(el) = self.dom().get_mut(id) {
            el.displayed = displayed;
        }
    }

    /// Change the rendered text of an element
    pub fn set_text(&self, id: &str, text: impl Into<String>) {
        if let Some(el) = self.dom().get_mut(id) {
            el.text = text.into();
        }
    }

    /// Queue scripted answers for the next `is_displayed` probes of `id`.
    /// Once the queue is exhausted the element's own state is reported again.
    pub fn queue_display(&self, id: &str, states: impl IntoIterator<Item = DisplayState>) {
        self.dom()
            .display_queue
            .entry(id.to_string())
            .or_default()
            .extend(states);
    }

    /// Queue answers for the document-ready probe; afterwards it reports ready
    pub fn queue_ready(&self, states: impl IntoIterator<Item = bool>) {
        self.dom().ready_queue.extend(states);
    }

    /// Return `value` from scripts containing `fragment`
    pub fn script_result(&self, fragment: impl Into<String>, value: serde_json::Value) {
        self.dom().script_results.push((fragment.into(), value));
    }

    /// Make every script fail
    pub fn fail_scripts(&self, fail: bool) {
        self.dom().fail_scripts = fail;
    }

    /// Scripts executed so far, with their arguments
    #[must_use]
    pub fn executed_scripts(&self) -> Vec<(String, Vec<ScriptArg>)> {
        self.dom().executed.clone()
    }

    /// Scripts executed so far whose source contains `fragment`
    #[must_use]
    pub fn scripts_containing(&self, fragment: &str) -> usize {
        self.dom()
            .executed
            .iter()
            .filter(|(s, _)| s.contains(fragment))
            .count()
    }

    /// URLs navigated to so far
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.dom().navigations.clone()
    }

    /// Ids of clicked elements, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.dom().clicks.clone()
    }

    /// Number of `find_all` calls so far
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.dom().find_calls
    }

    /// Number of `is_displayed` calls so far
    #[must_use]
    pub fn display_calls(&self) -> usize {
        self.dom().display_calls
    }

    /// Current value of an attribute, bypassing liveness checks
    #[must_use]
    pub fn attribute_of(&self, id: &str, name: &str) -> Option<String> {
        self.dom()
            .get(id)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    fn with_live<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&mut MockElement) -> T,
    ) -> DriverResult<T> {
        let mut dom = self.dom();
        if !dom.is_live(element.id()) {
            return Err(DriverError::StaleElementReference);
        }
        dom.get_mut(element.id())
            .map(f)
            .ok_or(DriverError::StaleElementReference)
    }
}

impl Driver for MockDriver {
    fn find_all(&self, context: &SearchContext, by: &By) -> DriverResult<Vec<ElementHandle>> {
        let mut dom = self.dom();
        dom.find_calls += 1;

        if let SearchContext::Element(parent) = context {
            if !dom.is_live(parent.id()) {
                return Err(DriverError::StaleElementReference);
            }
        }

        let found = dom
            .elements
            .iter()
            .filter(|el| el.matches.contains(by))
            .filter(|el| dom.is_live(&el.id))
            .filter(|el| match context {
                SearchContext::Document => true,
                SearchContext::Element(parent) => dom.is_descendant_of(&el.id, parent.id()),
            })
            .map(|el| ElementHandle::new(el.id.clone()))
            .collect();
        Ok(found)
    }

    fn is_displayed(&self, element: &ElementHandle) -> DriverResult<bool> {
        let mut dom = self.dom();
        dom.display_calls += 1;

        let scripted = dom
            .display_queue
            .get_mut(element.id())
            .and_then(std::collections::VecDeque::pop_front);
        match scripted {
            Some(DisplayState::Stale) => return Err(DriverError::StaleElementReference),
            Some(DisplayState::Shown) => return Ok(true),
            Some(DisplayState::Hidden) => return Ok(false),
            None => {}
        }

        if !dom.is_live(element.id()) {
            return Err(DriverError::StaleElementReference);
        }
        Ok(dom.get(element.id()).is_some_and(|el| el.displayed))
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg]) -> DriverResult<serde_json::Value> {
        let mut dom = self.dom();
        dom.executed.push((script.to_string(), args.to_vec()));

        if dom.fail_scripts {
            return Err(DriverError::script("scripts disabled"));
        }
        for arg in args {
            if let ScriptArg::Element(handle) = arg {
                if !dom.is_live(handle.id()) {
                    return Err(DriverError::StaleElementReference);
                }
            }
        }
        if script == DOCUMENT_READY_SCRIPT {
            return Ok(serde_json::Value::Bool(
                dom.ready_queue.pop_front().unwrap_or(true),
            ));
        }
        Ok(dom
            .script_results
            .iter()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(serde_json::Value::Null))
    }

    fn navigate(&self, url: &str) -> DriverResult<()> {
        self.dom().navigations.push(url.to_string());
        Ok(())
    }

    fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        let id = self.with_live(element, |el| {
            if el.tag == "input" && el.attributes.get("type").map(String::as_str) == Some("checkbox")
            {
                el.selected = !el.selected;
            }
            el.id.clone()
        })?;
        self.dom().clicks.push(id);
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, keys: &str) -> DriverResult<()> {
        self.with_live(element, |el| {
            el.attributes
                .entry("value".to_string())
                .or_default()
                .push_str(keys);
        })
    }

    fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        self.with_live(element, |el| {
            let _ = el.attributes.insert("value".to_string(), String::new());
        })
    }

    fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        self.with_live(element, |el| el.text.clone())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.with_live(element, |el| el.attributes.get(name).cloned())
    }

    fn is_selected(&self, element: &ElementHandle) -> DriverResult<bool> {
        self.with_live(element, |el| el.selected)
    }

    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String> {
        self.with_live(element, |el| el.tag.clone())
    }
}
