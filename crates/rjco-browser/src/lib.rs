//! rjco-browser: Browser automation for rjco-scraping
//!
//! This crate drives a Chromium tab through the `headless_chrome` crate and
//! exposes the handful of page operations the portal routines need.
//!
//! ## Features
//!
//! - Headless or visible Chromium with configurable window and user agent
//! - XPath-based element waits (visible, present, invisible) with timeouts
//! - Dropdown enumeration and selection that fires the page's `change` handlers
//! - A single-gesture pointer drag for slider controls
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rjco_browser::{BrowserConfig, BrowserSession, Locator, PageDriver};
//! use std::time::Duration;
//!
//! let session = BrowserSession::with_config(BrowserConfig::builder().headless(true).build())?;
//! session.navigate("https://example.com")?;
//! session.wait_visible(Locator::Name("q"), Duration::from_secs(10))?;
//! ```

pub mod driver;
pub mod error;
pub mod session;

pub use driver::{Locator, PageDriver};
pub use error::{BrowserError, Result};
pub use session::{BrowserConfig, BrowserConfigBuilder, BrowserSession};
