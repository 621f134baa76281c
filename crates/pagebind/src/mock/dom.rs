//! In-memory DOM model backing [`MockDriver`](super::MockDriver).

use crate::locator::By;
use std::collections::{HashMap, VecDeque};

/// Scripted outcome of one `is_displayed` probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// Report the element as displayed
    Shown,
    /// Report the element as hidden
    Hidden,
    /// Fail with a stale element reference
    Stale,
}

/// An element of the mock DOM.
///
/// Elements do not parse selectors; each one lists the criteria it answers to.
#[derive(Debug, Clone)]
pub struct MockElement {
    pub(crate) id: String,
    pub(crate) tag: String,
    pub(crate) matches: Vec<By>,
    pub(crate) parent: Option<String>,
    pub(crate) displayed: bool,
    pub(crate) selected: bool,
    pub(crate) text: String,
    pub(crate) attributes: HashMap<String, String>,
    pub(crate) attached: bool,
}

impl MockElement {
    /// Create a displayed, attached `div` that answers to `By::id(id)`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            matches: vec![By::id(id.clone())],
            id,
            tag: "div".to_string(),
            parent: None,
            displayed: true,
            selected: false,
            text: String::new(),
            attributes: HashMap::new(),
            attached: true,
        }
    }

    /// Also answer to `by`
    #[must_use]
    pub fn matching(mut self, by: By) -> Self {
        self.matches.push(by);
        self
    }

    /// Place under the element with id `parent`
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Start selected
    #[must_use]
    pub const fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Set the tag name
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockDom {
    pub(crate) elements: Vec<MockElement>,
    pub(crate) display_queue: HashMap<String, VecDeque<DisplayState>>,
    pub(crate) ready_queue: VecDeque<bool>,
    pub(crate) script_results: Vec<(String, serde_json::Value)>,
    pub(crate) fail_scripts: bool,
    pub(crate) executed: Vec<(String, Vec<crate::driver::ScriptArg>)>,
    pub(crate) navigations: Vec<String>,
    pub(crate) clicks: Vec<String>,
    pub(crate) find_calls: usize,
    pub(crate) display_calls: usize,
}

impl MockDom {
    pub(crate) fn get(&self, id: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Attached, and every ancestor attached
    pub(crate) fn is_live(&self, id: &str) -> bool {
        let mut cursor = Some(id.to_string());
        let mut depth = 0;
        while let Some(current) = cursor {
            match self.get(&current) {
                Some(el) if el.attached => cursor = el.parent.clone(),
                _ => return false,
            }
            depth += 1;
            if depth > self.elements.len() {
                return false;
            }
        }
        true
    }

    pub(crate) fn is_descendant_of(&self, id: &str, ancestor: &str) -> bool {
        let mut cursor = self.get(id).and_then(|e| e.parent.clone());
        let mut depth = 0;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(&current).and_then(|e| e.parent.clone());
            depth += 1;
            if depth > self.elements.len() {
                return false;
            }
        }
        false
    }
}
