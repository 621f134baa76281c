//! Locator abstraction for element selection.
//!
//! A [`LocatorSpec`] is the declared find-criteria of a field. It is resolved by
//! [`LocatorResolver`] against a [`SearchContext`] every time it is needed.
//!
//! # Design Philosophy
//!
//! - **Never cached**: resolution is a pure function of the DOM at call time
//! - **Never waits**: zero matches is an empty result, not an error
//! - **Composable**: criteria chain (narrowing) or alternate (first group wins)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::driver::{Driver, DriverResult, ElementHandle, SearchContext};

/// A primitive find-criterion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum By {
    /// Element id attribute
    Id(String),
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression
    XPath(String),
    /// Name attribute
    Name(String),
    /// Single class name
    ClassName(String),
    /// Tag name
    TagName(String),
    /// Exact link text
    LinkText(String),
    /// Substring of link text
    PartialLinkText(String),
}

impl By {
    /// Create an id criterion
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a CSS criterion
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath criterion
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a name-attribute criterion
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create a class-name criterion
    #[must_use]
    pub fn class_name(class: impl Into<String>) -> Self {
        Self::ClassName(class.into())
    }

    /// Create a tag-name criterion
    #[must_use]
    pub fn tag_name(tag: impl Into<String>) -> Self {
        Self::TagName(tag.into())
    }

    /// Create a link-text criterion
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Create a partial link-text criterion
    #[must_use]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Strategy name as used in WebDriver locators
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::Name(_) => "name",
            Self::ClassName(_) => "class name",
            Self::TagName(_) => "tag name",
            Self::LinkText(_) => "link text",
            Self::PartialLinkText(_) => "partial link text",
        }
    }

    /// Selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Id(v)
            | Self::Css(v)
            | Self::XPath(v)
            | Self::Name(v)
            | Self::ClassName(v)
            | Self::TagName(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v) => v,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Declared find-criteria of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorSpec {
    /// One criterion
    Simple(By),
    /// Each criterion narrows within the matches of the previous one
    Chain(Vec<By>),
    /// The first alternative with at least one match wins
    Any(Vec<LocatorSpec>),
}

impl LocatorSpec {
    /// Single-criterion spec
    #[must_use]
    pub const fn simple(by: By) -> Self {
        Self::Simple(by)
    }

    /// Chained spec
    #[must_use]
    pub fn chain(bys: impl IntoIterator<Item = By>) -> Self {
        Self::Chain(bys.into_iter().collect())
    }

    /// Alternation spec
    #[must_use]
    pub fn any(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Any(alternatives.into_iter().collect())
    }
}

impl From<By> for LocatorSpec {
    fn from(by: By) -> Self {
        Self::Simple(by)
    }
}

impl fmt::Display for LocatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(by) => write!(f, "{by}"),
            Self::Chain(bys) => {
                let parts: Vec<String> = bys.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" >> "))
            }
            Self::Any(alts) => {
                let parts: Vec<String> = alts.iter().map(ToString::to_string).collect();
                write!(f, "any({})", parts.join(" | "))
            }
        }
    }
}

/// Resolves locator specs against the live DOM
#[derive(Debug, Clone, Copy, Default)]
pub struct LocatorResolver;

impl LocatorResolver {
    /// Find every element matching `spec` within `context`.
    ///
    /// # Errors
    ///
    /// Propagates driver faults, e.g. a stale parent element in `context`.
    pub fn resolve(
        driver: &dyn Driver,
        spec: &LocatorSpec,
        context: &SearchContext,
    ) -> DriverResult<Vec<ElementHandle>> {
        match spec {
            LocatorSpec::Simple(by) => driver.find_all(context, by),
            LocatorSpec::Chain(bys) => Self::resolve_chain(driver, bys, context),
            LocatorSpec::Any(alternatives) => {
                for alternative in alternatives {
                    let found = Self::resolve(driver, alternative, context)?;
                    if !found.is_empty() {
                        return Ok(found);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    fn resolve_chain(
        driver: &dyn Driver,
        bys: &[By],
        context: &SearchContext,
    ) -> DriverResult<Vec<ElementHandle>> {
        let Some((first, rest)) = bys.split_first() else {
            return Ok(Vec::new());
        };

        let mut current = driver.find_all(context, first)?;
        for by in rest {
            let mut next: Vec<ElementHandle> = Vec::new();
            for parent in &current {
                for found in driver.find_all(&SearchContext::within(parent.clone()), by)? {
                    if !next.contains(&found) {
                        next.push(found);
                    }
                }
            }
            if next.is_empty() {
                return Ok(next);
            }
            current = next;
        }
        Ok(current)
    }
}

/// A locator spec bound to a driver and a search context.
///
/// Cheap to clone; resolution happens only when [`find_all`](Self::find_all)
/// or [`find_first`](Self::find_first) is called.
#[derive(Debug, Clone)]
pub struct ElementLocator {
    driver: Arc<dyn Driver>,
    spec: LocatorSpec,
    context: SearchContext,
}

impl ElementLocator {
    /// Bind `spec` to `driver` within `context`
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, spec: LocatorSpec, context: SearchContext) -> Self {
        Self {
            driver,
            spec,
            context,
        }
    }

    /// The declared spec
    #[must_use]
    pub const fn spec(&self) -> &LocatorSpec {
        &self.spec
    }

    /// The search context
    #[must_use]
    pub const fn context(&self) -> &SearchContext {
        &self.context
    }

    /// The driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Current match set
    pub fn find_all(&self) -> DriverResult<Vec<ElementHandle>> {
        LocatorResolver::resolve(self.driver.as_ref(), &self.spec, &self.context)
    }

    /// First current match, if any
    pub fn find_first(&self) -> DriverResult<Option<ElementHandle>> {
        Ok(self.find_all()?.into_iter().next())
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            SearchContext::Document => write!(f, "{}", self.spec),
            SearchContext::Element(parent) => write!(f, "{} within {parent}", self.spec),
        }
    }
}
