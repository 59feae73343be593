//! The page-level operations the portal routines are written against
//!
//! [`BrowserSession`](crate::BrowserSession) implements [`PageDriver`] over a
//! real Chromium tab; tests implement it with scripted page state.

use std::fmt;
use std::time::Duration;

use rjco_core::SelectOption;

use crate::error::Result;

/// How an element is addressed on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    /// `name` attribute
    Name(&'a str),
    /// `id` attribute
    Id(&'a str),
    /// Raw XPath expression
    XPath(&'a str),
}

impl Locator<'_> {
    /// XPath expression selecting the element
    pub fn to_xpath(&self) -> String {
        match self {
            Self::Name(name) => format!("//*[@name='{}']", name),
            Self::Id(id) => format!("//*[@id='{}']", id),
            Self::XPath(xpath) => (*xpath).to_string(),
        }
    }
}

impl fmt::Display for Locator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name={}", name),
            Self::Id(id) => write!(f, "id={}", id),
            Self::XPath(xpath) => write!(f, "xpath={}", xpath),
        }
    }
}

/// Blocking page operations
///
/// Every wait polls until the condition holds or `timeout` elapses, in which
/// case it fails with [`BrowserError::Timeout`](crate::BrowserError::Timeout).
/// Non-wait operations act on the element as it is right now.
pub trait PageDriver {
    /// Load a URL in the active tab
    fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until the element exists and is rendered
    fn wait_visible(&self, locator: Locator<'_>, timeout: Duration) -> Result<()>;

    /// Wait until the element exists in the DOM
    fn wait_present(&self, locator: Locator<'_>, timeout: Duration) -> Result<()>;

    /// Wait until the element is hidden or gone
    fn wait_invisible(&self, locator: Locator<'_>, timeout: Duration) -> Result<()>;

    /// Every `<option>` of a `<select>`, in page order
    fn options(&self, locator: Locator<'_>) -> Result<Vec<SelectOption>>;

    /// Select the option with `value` and fire `change`
    fn select_value(&self, locator: Locator<'_>, value: &str) -> Result<()>;

    /// Select the option at `index` and fire `change`
    fn select_index(&self, locator: Locator<'_>, index: usize) -> Result<()>;

    /// Empty an input and type `text` into it
    fn clear_and_type(&self, locator: Locator<'_>, text: &str) -> Result<()>;

    fn click(&self, locator: Locator<'_>) -> Result<()>;

    fn attribute(&self, locator: Locator<'_>, name: &str) -> Result<Option<String>>;

    /// Rendered text of the element
    fn text(&self, locator: Locator<'_>) -> Result<String>;

    /// Rendered text of every matching element; empty when nothing matches
    fn texts(&self, locator: Locator<'_>) -> Result<Vec<String>>;

    /// Press on the element's midpoint, move by `(dx, dy)` while held, release
    ///
    /// Implementations must dispatch this as one uninterrupted pointer
    /// sequence; the portal's slider rejects separate clicks.
    fn drag_by(&self, locator: Locator<'_>, dx: f64, dy: f64) -> Result<()>;
}
