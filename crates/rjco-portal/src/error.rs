//! Error types for rjco-portal

use rjco_browser::BrowserError;
use thiserror::Error;

/// Failure of a portal routine
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for element: {0}")]
    ElementTimeout(String),

    #[error("The portal reported an error: {0}")]
    UnexpectedPortal(String),

    #[error("No entity matches '{0}'")]
    EntityNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Interrupted by user")]
    UserInterrupt,

    #[error("Browser error: {0}")]
    Browser(BrowserError),

    #[error(transparent)]
    Core(#[from] rjco_core::Error),
}

impl PortalError {
    /// Errors after which no further city or entity can be processed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UserInterrupt
                | Self::Browser(BrowserError::TabError(_))
                | Self::Browser(BrowserError::Initialization(_))
        )
    }
}

impl From<BrowserError> for PortalError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::ElementNotFound(what) => Self::ElementNotFound(what),
            BrowserError::Timeout(what) => Self::ElementTimeout(what),
            other => Self::Browser(other),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<std::io::Error> for PortalError {
    fn from(e: std::io::Error) -> Self {
        Self::Core(rjco_core::Error::Io(e))
    }
}

/// Result type alias for rjco-portal
pub type Result<T> = std::result::Result<T, PortalError>;

/// Failure to persist the results of a run
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
