//! Browser session management
//!
//! Provides a managed Chromium instance driving a single tab. The browser
//! process lives exactly as long as the [`BrowserSession`].

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::Input;
use headless_chrome::types::RemoteError;
use headless_chrome::{Browser, Element, LaunchOptionsBuilder, Tab};
use rjco_core::SelectOption;
use serde_json::json;
use tracing::{debug, info};

use crate::driver::{Locator, PageDriver};
use crate::error::{BrowserError, Result};

/// Interval between two checks of a wait condition
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const IS_DISPLAYED_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 || rect.height > 0;
}"#;

const OPTIONS_JS: &str = r#"function() {
    return JSON.stringify(Array.from(this.options).map(o => ({
        label: o.text.trim(),
        value: o.value
    })));
}"#;

const SELECT_VALUE_JS: &str = r#"function(value) {
    const index = Array.from(this.options).findIndex(o => o.value === value);
    if (index < 0) {
        return false;
    }
    this.selectedIndex = index;
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

const SELECT_INDEX_JS: &str = r#"function(index) {
    if (index < 0 || index >= this.options.length) {
        return false;
    }
    this.selectedIndex = index;
    this.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

const CLEAR_JS: &str = r#"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

/// Browser session configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Whether to run in headless mode
    pub headless: bool,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout: u64,
    /// Seconds without DevTools traffic before the browser is considered dead
    pub idle_timeout: u64,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1920,
            height: 1080,
            navigation_timeout: 60,
            idle_timeout: 300,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Create a new configuration builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

impl From<&rjco_core::BrowserSettings> for BrowserConfig {
    fn from(settings: &rjco_core::BrowserSettings) -> Self {
        let mut builder = BrowserConfig::builder()
            .headless(settings.headless)
            .window_size(settings.window_width, settings.window_height);
        if let Some(ua) = &settings.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder.build()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn navigation_timeout(mut self, seconds: u64) -> Self {
        self.config.navigation_timeout = seconds;
        self
    }

    pub fn idle_timeout(mut self, seconds: u64) -> Self {
        self.config.idle_timeout = seconds;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Managed browser session
pub struct BrowserSession {
    browser: Browser,
    config: BrowserConfig,
}

impl BrowserSession {
    /// Launch a browser with custom configuration
    pub fn with_config(config: BrowserConfig) -> Result<Self> {
        use std::ffi::OsStr;

        info!("Creating browser session (headless: {})", config.headless);

        let mut args: Vec<String> = vec![
            format!("--window-size={},{}", config.width, config.height),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
        ];

        if let Some(ref ua) = config.user_agent {
            args.push(format!("--user-agent={}", ua));
        }

        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .idle_browser_timeout(Duration::from_secs(config.idle_timeout))
            .args(os_args)
            .build()
            .map_err(|e| {
                BrowserError::Initialization(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options).map_err(|e| {
            BrowserError::Initialization(format!("Failed to launch browser: {}", e))
        })?;

        info!("Browser session created successfully");

        Ok(Self { browser, config })
    }

    /// Get the active tab
    pub fn active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.browser.get_tabs();
        let tabs_guard = tabs
            .lock()
            .map_err(|e| BrowserError::TabError(format!("Failed to lock tabs: {}", e)))?;

        tabs_guard
            .first()
            .cloned()
            .ok_or_else(|| BrowserError::TabError("No active tab available".to_string()))
    }

    /// Rendered state of the element matched right now; `None` if absent
    fn displayed(tab: &Tab, xpath: &str) -> Option<bool> {
        let element = tab.find_element_by_xpath(xpath).ok()?;
        Some(is_displayed(&element).unwrap_or(false))
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.active_tab()?;

        info!("Navigating to: {}", url);

        tab.set_default_timeout(Duration::from_secs(self.config.navigation_timeout));
        tab.navigate_to(url).map_err(|e| {
            BrowserError::Navigation(format!("Failed to navigate to {}: {}", url, e))
        })?;

        tab.wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("Navigation timeout: {}", e)))?;

        let title = tab.get_title().unwrap_or_else(|_| "Unknown".to_string());
        info!("Navigated to: {} (title: {})", url, title);

        Ok(())
    }

    fn wait_visible(&self, locator: Locator<'_>, timeout: Duration) -> Result<()> {
        let tab = self.active_tab()?;
        let xpath = locator.to_xpath();

        debug!("Waiting for {} to be visible (timeout: {:?})", locator, timeout);
        poll_until(timeout, &format!("{} to be visible", locator), || {
            Self::displayed(&tab, &xpath) == Some(true)
        })?;
        debug!("{}: OK", locator);

        Ok(())
    }

    fn wait_present(&self, locator: Locator<'_>, timeout: Duration) -> Result<()> {
        let tab = self.active_tab()?;
        let xpath = locator.to_xpath();

        debug!("Waiting for {} to be present (timeout: {:?})", locator, timeout);
        poll_until(timeout, &format!("{} to be present", locator), || {
            tab.find_element_by_xpath(&xpath).is_ok()
        })?;
        debug!("{}: OK", locator);

        Ok(())
    }

    fn wait_invisible(&self, locator: Locator<'_>, timeout: Duration) -> Result<()> {
        let tab = self.active_tab()?;
        let xpath = locator.to_xpath();

        debug!("Waiting for {} to disappear (timeout: {:?})", locator, timeout);
        poll_until(timeout, &format!("{} to disappear", locator), || {
            Self::displayed(&tab, &xpath) != Some(true)
        })?;
        debug!("{}: gone", locator);

        Ok(())
    }

    fn options(&self, locator: Locator<'_>) -> Result<Vec<SelectOption>> {
        let tab = self.active_tab()?;
        let element = find(&tab, locator)?;

        let raw = element
            .call_js_fn(OPTIONS_JS, vec![], false)
            .map_err(|e| {
                BrowserError::Extraction(format!("Failed to read options of {}: {}", locator, e))
            })?
            .value
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or_else(|| {
                BrowserError::Extraction(format!("{} did not return its options", locator))
            })?;

        let options: Vec<SelectOption> = serde_json::from_str(&raw).map_err(|e| {
            BrowserError::Extraction(format!("Malformed options of {}: {}", locator, e))
        })?;

        debug!("{} has {} options", locator, options.len());
        Ok(options)
    }

    fn select_value(&self, locator: Locator<'_>, value: &str) -> Result<()> {
        let tab = self.active_tab()?;
        let element = find(&tab, locator)?;

        debug!("Selecting value '{}' in {}", value, locator);
        if !call_bool(&element, SELECT_VALUE_JS, vec![json!(value)], locator)? {
            return Err(BrowserError::ElementNotFound(format!(
                "Option with value '{}' in {}",
                value, locator
            )));
        }

        Ok(())
    }

    fn select_index(&self, locator: Locator<'_>, index: usize) -> Result<()> {
        let tab = self.active_tab()?;
        let element = find(&tab, locator)?;

        debug!("Selecting index {} in {}", index, locator);
        if !call_bool(&element, SELECT_INDEX_JS, vec![json!(index)], locator)? {
            return Err(BrowserError::ElementNotFound(format!(
                "Option #{} in {}",
                index, locator
            )));
        }

        Ok(())
    }

    fn clear_and_type(&self, locator: Locator<'_>, text: &str) -> Result<()> {
        let tab = self.active_tab()?;
        let element = find(&tab, locator)?;

        debug!("Typing into {} ({} chars)", locator, text.chars().count());

        element.call_js_fn(CLEAR_JS, vec![], false).map_err(|e| {
            BrowserError::Interaction(format!("Failed to clear {}: {}", locator, e))
        })?;
        element.type_into(text).map_err(|e| {
            BrowserError::Interaction(format!("Failed to type into {}: {}", locator, e))
        })?;

        Ok(())
    }

    fn click(&self, locator: Locator<'_>) -> Result<()> {
        let tab = self.active_tab()?;

        debug!("Clicking {}", locator);
        find(&tab, locator)?
            .click()
            .map_err(|e| BrowserError::Interaction(format!("Failed to click {}: {}", locator, e)))?;

        Ok(())
    }

    fn attribute(&self, locator: Locator<'_>, name: &str) -> Result<Option<String>> {
        let tab = self.active_tab()?;

        find(&tab, locator)?.get_attribute_value(name).map_err(|e| {
            BrowserError::Extraction(format!("Failed to read {} of {}: {}", name, locator, e))
        })
    }

    fn text(&self, locator: Locator<'_>) -> Result<String> {
        let tab = self.active_tab()?;

        let text = find(&tab, locator)?.get_inner_text().map_err(|e| {
            BrowserError::Extraction(format!("Failed to read text of {}: {}", locator, e))
        })?;

        debug!("Extracted {} characters from {}", text.len(), locator);
        Ok(text.trim().to_string())
    }

    fn texts(&self, locator: Locator<'_>) -> Result<Vec<String>> {
        let tab = self.active_tab()?;

        let elements = matches_or_empty(tab.find_elements_by_xpath(&locator.to_xpath()), locator)?;

        elements
            .iter()
            .map(|element| {
                element
                    .get_inner_text()
                    .map(|t| t.trim().to_string())
                    .map_err(|e| {
                        BrowserError::Extraction(format!(
                            "Failed to read text of {}: {}",
                            locator, e
                        ))
                    })
            })
            .collect()
    }

    fn drag_by(&self, locator: Locator<'_>, dx: f64, dy: f64) -> Result<()> {
        let tab = self.active_tab()?;
        let element = find(&tab, locator)?;

        let start = element.get_midpoint().map_err(|e| {
            BrowserError::Interaction(format!("Failed to locate {} on screen: {}", locator, e))
        })?;
        let (x, y) = (start.x, start.y);

        debug!("Dragging {} by ({}, {}) from ({}, {})", locator, dx, dy, x, y);

        let gesture = [
            json!({ "type": "mouseMoved", "x": x, "y": y }),
            json!({ "type": "mousePressed", "x": x, "y": y, "button": "left", "buttons": 1, "clickCount": 1 }),
            json!({ "type": "mouseMoved", "x": x + dx, "y": y + dy, "button": "left", "buttons": 1 }),
            json!({ "type": "mouseReleased", "x": x + dx, "y": y + dy, "button": "left", "buttons": 0, "clickCount": 1 }),
        ];

        for step in gesture {
            let event: Input::DispatchMouseEvent = serde_json::from_value(step).map_err(|e| {
                BrowserError::Interaction(format!("Invalid pointer event: {}", e))
            })?;
            tab.call_method(event).map_err(|e| {
                BrowserError::Interaction(format!("Failed to drag {}: {}", locator, e))
            })?;
        }

        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        info!("Closing browser session");
        // The browser process is killed when `Browser` is dropped
    }
}

/// Find the element matched by `locator` right now
fn find<'a>(tab: &'a Tab, locator: Locator<'_>) -> Result<Element<'a>> {
    tab.find_element_by_xpath(&locator.to_xpath())
        .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", locator, e)))
}

fn is_displayed(element: &Element<'_>) -> Result<bool> {
    let result = element
        .call_js_fn(IS_DISPLAYED_JS, vec![], false)
        .map_err(|e| BrowserError::Extraction(format!("Visibility check failed: {}", e)))?;

    Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
}

fn call_bool(
    element: &Element<'_>,
    function: &str,
    args: Vec<serde_json::Value>,
    locator: Locator<'_>,
) -> Result<bool> {
    let result = element.call_js_fn(function, args, false).map_err(|e| {
        BrowserError::Interaction(format!("Script on {} failed: {}", locator, e))
    })?;

    Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
}

/// Poll `check` until it holds or `timeout` elapses
///
/// The condition is always evaluated at least once, so a zero timeout
/// means "check now".
pub(crate) fn poll_until<F>(timeout: Duration, what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(BrowserError::Timeout(format!(
                "waited {:?} for {}",
                timeout, what
            )));
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Chrome rejects fetching an empty search range
const EMPTY_SEARCH_MESSAGE: &str = "Invalid search result range";

/// Treat a search with no matches as an empty list; any other failure is an error
fn matches_or_empty<T>(result: anyhow::Result<Vec<T>>, locator: Locator<'_>) -> Result<Vec<T>> {
    match result {
        Ok(found) => Ok(found),
        Err(e) if is_no_match(&e) => {
            debug!("No elements for {}", locator);
            Ok(Vec::new())
        }
        Err(e) => Err(BrowserError::Extraction(format!(
            "Failed to search {}: {}",
            locator, e
        ))),
    }
}

fn is_no_match(error: &anyhow::Error) -> bool {
    if error.downcast_ref::<NoElementFound>().is_some() {
        return true;
    }
    error
        .downcast_ref::<RemoteError>()
        .is_some_and(|remote| remote.message == EMPTY_SEARCH_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert_eq!(config.idle_timeout, 300);
    }

    #[test]
    fn test_browser_config_builder() {
        let config = BrowserConfig::builder()
            .headless(false)
            .window_size(1280, 720)
            .navigation_timeout(90)
            .idle_timeout(600)
            .user_agent("Custom Agent")
            .build();

        assert!(!config.headless);
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert_eq!(config.navigation_timeout, 90);
        assert_eq!(config.idle_timeout, 600);
        assert_eq!(config.user_agent, Some("Custom Agent".to_string()));
    }

    #[test]
    fn test_browser_config_from_settings() {
        let settings = rjco_core::BrowserSettings {
            headless: false,
            window_width: 800,
            window_height: 600,
            user_agent: Some("UA".to_string()),
        };
        let config = BrowserConfig::from(&settings);
        assert!(!config.headless);
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.user_agent.as_deref(), Some("UA"));
    }

    #[test]
    fn test_matches_or_empty_no_match() {
        let locator = Locator::XPath("//td");
        let missing: Vec<u8> = matches_or_empty(Err(NoElementFound {}.into()), locator).unwrap();
        assert!(missing.is_empty());

        let empty_range = RemoteError {
            code: -32000,
            message: EMPTY_SEARCH_MESSAGE.to_string(),
        };
        let empty: Vec<u8> = matches_or_empty(Err(empty_range.into()), locator).unwrap();
        assert!(empty.is_empty());

        assert_eq!(matches_or_empty(Ok(vec![1, 2]), locator).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_matches_or_empty_reports_failures() {
        let locator = Locator::XPath("//td");
        let closed = RemoteError {
            code: -32000,
            message: "Target closed".to_string(),
        };
        let result: Result<Vec<u8>> = matches_or_empty(Err(closed.into()), locator);
        assert!(matches!(result, Err(BrowserError::Extraction(m)) if m.contains("Target closed")));

        let result: Result<Vec<u8>> =
            matches_or_empty(Err(anyhow::anyhow!("connection closed")), locator);
        assert!(matches!(result, Err(BrowserError::Extraction(_))));
    }

    #[test]
    fn test_poll_until_immediate() {
        assert!(poll_until(Duration::ZERO, "nothing", || true).is_ok());
    }

    #[test]
    fn test_poll_until_times_out() {
        let mut calls = 0;
        let result = poll_until(Duration::from_millis(300), "never", || {
            calls += 1;
            false
        });
        assert!(matches!(result, Err(BrowserError::Timeout(_))));
        assert!(calls >= 2);
    }

    #[test]
    fn test_poll_until_eventually() {
        let mut calls = 0;
        let result = poll_until(Duration::from_secs(5), "third call", || {
            calls += 1;
            calls == 3
        });
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_drag_events_deserialize() {
        let event: std::result::Result<Input::DispatchMouseEvent, _> = serde_json::from_value(
            json!({ "type": "mousePressed", "x": 1.0, "y": 2.0, "button": "left", "buttons": 1, "clickCount": 1 }),
        );
        assert!(event.is_ok());
    }
}
