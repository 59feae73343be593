//! rjco-portal: Scraping routines for the Rama Judicial "Consulta de Procesos" portal
//!
//! Everything here runs against a [`PageDriver`](rjco_browser::PageDriver),
//! so the same routines drive a real Chromium tab or a scripted page in
//! tests.
//!
//! - [`Portal::open`] loads the entry page and rejects an error dialog
//! - [`Portal::run_text_search`] searches a party name across every city
//!   and entity, collecting the CSV exports into a [`ResultTable`](rjco_core::ResultTable)
//! - [`Portal::search_case`] fetches one process by docket number
//! - [`output`] writes the XLSX, JSON and report files

pub mod aggregator;
pub mod case_lookup;
pub mod download;
pub mod entity_search;
pub mod error;
pub mod output;
pub mod page;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::TextSearchRun;
pub use download::{Downloader, HttpDownloader, TempFiles};
pub use error::{OutputError, PortalError, Result};
pub use session::{CancelFlag, Portal};
