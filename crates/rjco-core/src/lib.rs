//! rjco-core: shared building blocks for rjco-scraping
//!
//! Configuration, the error type, the data model of scraped results and the
//! pure parsing helpers that turn page text and CSV exports into records.

pub mod config;
pub mod error;
pub mod parse;
pub mod report;
pub mod types;

pub use config::{BrowserSettings, Config, DownloadConfig, PortalConfig};
pub use error::{Error, Result};
pub use parse::{CaseCode, CsvTable};
pub use report::{CityReport, EntityReport, Outcome, ReportTotals, RunReport};
pub use types::{
    ActuacionEntry, CaseDetails, CaseRecord, EntityRow, OptionMap, ResultTable, SelectOption,
};
