//! Search one entity by party name and collect its CSV export

use std::fs;

use rjco_browser::PageDriver;
use rjco_core::EntityRow;
use rjco_core::parse::{clean_download_href, download_file_name, parse_entity_csv};
use tracing::{debug, info, warn};
use url::Url;

use crate::download::{Downloader, TempFiles};
use crate::error::{PortalError, Result};
use crate::page::{self, by_name};
use crate::session::Portal;

impl<D: PageDriver> Portal<D> {
    /// Run the search-by-name form for one entity of the selected city
    ///
    /// The error modal, if it shows up after selecting the entity or after
    /// submitting, yields an empty result. Every other failure is returned.
    /// The downloaded export is tracked in `temp` and left for the caller
    /// to clean up.
    pub fn search_entity(
        &self,
        downloader: &dyn Downloader,
        temp: &mut TempFiles,
        label: &str,
        value: &str,
        query: &str,
    ) -> Result<Vec<EntityRow>> {
        self.cancel_flag().check()?;
        info!("Searching '{}' in {}", query, label.trim());

        self.select_value(page::ENTITY_SELECT, value)?;
        if self.check_error_overlay()? {
            warn!("Error dialog after selecting {}, no results", label.trim());
            return Ok(Vec::new());
        }

        self.select_index(by_name::QUERY_MODE, by_name::QUERY_MODE_INDEX)?;
        self.select_index(by_name::SUBJECT_TYPE, by_name::SUBJECT_TYPE_INDEX)?;
        self.select_index(by_name::PERSON_TYPE, by_name::PERSON_TYPE_INDEX)?;

        self.visible(by_name::NAME_INPUT)?;
        self.driver().clear_and_type(by_name::NAME_INPUT, query)?;

        self.visible(by_name::SLIDER)?;
        self.unlock_slider(by_name::SLIDER)?;

        self.visible(by_name::SUBMIT)?;
        self.driver().click(by_name::SUBMIT)?;
        self.wait_until_idle(by_name::LOADING)?;

        if self.check_error_overlay()? {
            warn!("Error dialog after searching {}, no results", label.trim());
            return Ok(Vec::new());
        }

        let url = self.export_url()?;
        let path = temp.reserve(&download_file_name(url.as_str()));
        downloader.download(url.as_str(), &path)?;

        let table = parse_entity_csv(&fs::read(&path)?)?;
        let rows: Vec<EntityRow> = table
            .into_columns()
            .into_iter()
            .map(|columns| EntityRow::new(columns, label))
            .collect();

        info!("{}: {} rows", label.trim(), rows.len());
        Ok(rows)
    }

    /// Ask the portal for the CSV export and resolve its link
    fn export_url(&self) -> Result<Url> {
        self.visible(by_name::CSV_BUTTON)?;
        self.driver().click(by_name::CSV_BUTTON)?;
        self.present(by_name::CSV_LINK)?;

        let href = self
            .driver()
            .attribute(by_name::CSV_LINK, "href")?
            .ok_or_else(|| PortalError::ElementNotFound(format!("href of {}", by_name::CSV_LINK)))?;
        let cleaned = clean_download_href(&href)?;

        let base = Url::parse(&self.config().entry_url)
            .map_err(|e| PortalError::Network(format!("entry URL: {}", e)))?;
        let url = base
            .join(&cleaned)
            .map_err(|e| PortalError::Network(format!("download link '{}': {}", cleaned, e)))?;

        debug!("Export available at {}", url);
        Ok(url)
    }
}
