//! Text search across every city and entity of the portal

use rjco_browser::PageDriver;
use rjco_core::{CityReport, EntityReport, Outcome, ResultTable, RunReport, SelectOption};
use tracing::{error, info, warn};

use crate::download::{Downloader, TempFiles};
use crate::error::{PortalError, Result};
use crate::page;
use crate::session::Portal;

/// Rows and per-entity outcomes of a text search
#[derive(Debug)]
pub struct TextSearchRun {
    pub table: ResultTable,
    pub report: RunReport,
}

impl<D: PageDriver> Portal<D> {
    /// Search `query` in every active entity of every city
    ///
    /// Entity and city failures are recorded in the report and the run
    /// moves on. A fatal error (lost tab, interrupt) stops the loop early;
    /// the rows gathered so far are still returned, with
    /// `report.interrupted` set when the operator cancelled. Only a failure
    /// to enumerate the cities is returned as an error.
    pub fn run_text_search(
        &self,
        downloader: &dyn Downloader,
        temp: &mut TempFiles,
        query: &str,
    ) -> Result<TextSearchRun> {
        let mut report = RunReport::new(query);
        let mut table = ResultTable::new();

        let cities = self.list_options(page::CITY_SELECT)?;
        info!("Searching '{}' in {} cities", query, cities.len());

        for city in &cities {
            if self.cancel_flag().is_cancelled() {
                report.interrupted = true;
                break;
            }

            let mut city_report = CityReport {
                label: city.label.clone(),
                value: city.value.clone(),
                outcome: Outcome::Succeeded { rows: 0 },
                entities: Vec::new(),
            };

            let before = table.len();
            let result = self.search_city(downloader, temp, city, query, &mut table, &mut city_report);
            let stop = match result {
                Ok(()) => {
                    let rows = table.len() - before;
                    city_report.outcome = Outcome::Succeeded { rows };
                    info!("{}: OK, {} rows", city.label.trim(), rows);
                    false
                }
                Err(PortalError::UserInterrupt) => {
                    warn!("Interrupted while searching {}", city.label.trim());
                    city_report.outcome = Outcome::Failed {
                        reason: PortalError::UserInterrupt.to_string(),
                    };
                    report.interrupted = true;
                    true
                }
                Err(e) => {
                    error!("Failed to search city {}: {}", city.label.trim(), e);
                    city_report.outcome = Outcome::Failed {
                        reason: e.to_string(),
                    };
                    e.is_fatal()
                }
            };

            report.cities.push(city_report);
            if stop {
                break;
            }
        }

        report.finish();
        let totals = report.totals();
        info!(
            "Search finished: {} rows, {} entities searched, {} skipped, {} failed",
            totals.rows, totals.succeeded, totals.skipped, totals.failed
        );

        Ok(TextSearchRun { table, report })
    }

    /// Search every active entity of one city, appending rows to `table`
    ///
    /// Each entity's rows are tagged with the city before they are appended,
    /// so a fatal error midway keeps what the city produced so far.
    fn search_city(
        &self,
        downloader: &dyn Downloader,
        temp: &mut TempFiles,
        city: &SelectOption,
        query: &str,
        table: &mut ResultTable,
        city_report: &mut CityReport,
    ) -> Result<()> {
        info!("Fetching data for {}", city.label.trim());

        self.select_value(page::CITY_SELECT, &city.value)?;
        if self.check_error_overlay()? {
            return Err(PortalError::UnexpectedPortal(format!(
                "error dialog after selecting {}",
                city.label.trim()
            )));
        }

        let entities = self.list_options(page::ENTITY_SELECT)?;

        for entity in &entities {
            self.cancel_flag().check()?;

            let mut record = |outcome| {
                city_report.entities.push(EntityReport {
                    label: entity.label.clone(),
                    value: entity.value.clone(),
                    outcome,
                })
            };

            if entity.is_inactive() {
                record(Outcome::Skipped {
                    reason: "inactive".to_string(),
                });
                continue;
            }

            match self.search_entity(downloader, temp, &entity.label, &entity.value, query) {
                Ok(mut rows) => {
                    record(Outcome::Succeeded { rows: rows.len() });
                    for row in &mut rows {
                        row.ciudad = Some(city.label.clone());
                    }
                    table.extend(rows);
                }
                Err(e) => {
                    error!("Failed to get data for entity {}: {}", entity.label.trim(), e);
                    record(Outcome::Failed {
                        reason: e.to_string(),
                    });
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }
}
