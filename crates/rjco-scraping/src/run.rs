//! One scraping run, start to finish, on a blocking thread

use std::process::ExitCode;

use rjco_browser::{BrowserConfig, BrowserSession};
use rjco_core::Config;
use rjco_portal::output::{self, CASE_EXTENSION, REPORT_EXTENSION, TABLE_EXTENSION};
use rjco_portal::{CancelFlag, HttpDownloader, Portal, PortalError, TempFiles, TextSearchRun};
use tracing::{error, info, warn};

/// What to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Party name across every city and entity
    TextSearch { query: String },
    /// One process by docket number
    CaseLookup { code: String },
}

/// How a run ended, and the process exit code for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Finished; individual entity failures are in the report
    Completed,
    /// Could not start or could not produce a result
    Aborted,
    /// Scraped, but the results could not be saved
    OutputFailed,
    /// Stopped by the operator; partial results were saved
    Interrupted,
}

impl RunStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Aborted => 1,
            Self::OutputFailed => 2,
            Self::Interrupted => 130,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Status for a failure that ended the run before any result existed
fn failure_status(e: &PortalError) -> RunStatus {
    match e {
        PortalError::UserInterrupt => RunStatus::Interrupted,
        _ => RunStatus::Aborted,
    }
}

/// Run a job against a fresh browser session
///
/// The browser is closed and temporary downloads removed before this
/// returns, whatever the outcome.
pub fn execute(config: &Config, job: &Job, output_base: &str, cancel: CancelFlag) -> RunStatus {
    let mut temp = match TempFiles::new(&config.download.dir) {
        Ok(temp) => temp,
        Err(e) => {
            error!("Cannot use download directory {}: {}", config.download.dir.display(), e);
            return RunStatus::Aborted;
        }
    };

    let session = match BrowserSession::with_config(BrowserConfig::from(&config.browser)) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to launch browser: {}", e);
            return RunStatus::Aborted;
        }
    };

    let portal = match Portal::open(session, config.portal.clone(), cancel) {
        Ok(portal) => portal,
        Err(e) => {
            error!("Portal not available: {}", e);
            return failure_status(&e);
        }
    };

    let status = match job {
        Job::TextSearch { query } => {
            let downloader = match HttpDownloader::new(&config.download) {
                Ok(downloader) => downloader,
                Err(e) => {
                    error!("Failed to create HTTP client: {}", e);
                    return RunStatus::Aborted;
                }
            };
            let result = portal.run_text_search(&downloader, &mut temp, query);
            drop(portal);
            temp.cleanup();
            match result {
                Ok(run) => save_text_search(&run, output_base),
                Err(e) => {
                    error!("Search could not start: {}", e);
                    failure_status(&e)
                }
            }
        }
        Job::CaseLookup { code } => {
            let result = portal.search_case(code);
            drop(portal);
            match result {
                Ok(record) => {
                    let path = output::output_path(output_base, CASE_EXTENSION);
                    match output::write_case_json(&record, &path) {
                        Ok(()) => RunStatus::Completed,
                        Err(e) => {
                            error!("Could not save the result: {}", e);
                            RunStatus::OutputFailed
                        }
                    }
                }
                Err(e) => {
                    error!("Lookup of {} failed: {}", code, e);
                    failure_status(&e)
                }
            }
        }
    };

    info!("Scraping finished");
    status
}

/// Write the table and its report; both are attempted even if one fails
fn save_text_search(run: &TextSearchRun, output_base: &str) -> RunStatus {
    let mut saved = true;

    let table_path = output::output_path(output_base, TABLE_EXTENSION);
    if let Err(e) = output::write_table_xlsx(&run.table, &table_path) {
        error!("Could not save the result: {}", e);
        saved = false;
    }

    let report_path = output::output_path(output_base, REPORT_EXTENSION);
    if let Err(e) = output::write_report_json(&run.report, &report_path) {
        error!("Could not save the run report: {}", e);
        saved = false;
    }

    let totals = run.report.totals();
    if totals.failed > 0 || totals.failed_cities > 0 {
        warn!(
            "{} entities and {} cities failed, see {}",
            totals.failed,
            totals.failed_cities,
            report_path.display()
        );
    }

    match (saved, run.report.interrupted) {
        (false, _) => RunStatus::OutputFailed,
        (true, true) => RunStatus::Interrupted,
        (true, false) => RunStatus::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rjco_core::{EntityRow, ResultTable, RunReport};

    fn search_run(interrupted: bool) -> TextSearchRun {
        let mut row = EntityRow::new(vec![("Radicacion".to_string(), "1".to_string())], "JUZGADO 1");
        row.ciudad = Some("BOGOTA".to_string());
        let mut table = ResultTable::new();
        table.extend(vec![row]);

        let mut report = RunReport::new("sura");
        report.interrupted = interrupted;
        report.finish();

        TextSearchRun { table, report }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Completed.code(), 0);
        assert_eq!(RunStatus::Aborted.code(), 1);
        assert_eq!(RunStatus::OutputFailed.code(), 2);
        assert_eq!(RunStatus::Interrupted.code(), 130);
    }

    #[test]
    fn test_failure_status() {
        assert_eq!(failure_status(&PortalError::UserInterrupt), RunStatus::Interrupted);
        assert_eq!(
            failure_status(&PortalError::EntityNotFound("9999".into())),
            RunStatus::Aborted
        );
    }

    #[test]
    fn test_save_text_search_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("resultado");
        let base = base.to_str().unwrap();

        assert_eq!(save_text_search(&search_run(false), base), RunStatus::Completed);
        assert!(dir.path().join("resultado.xlsx").exists());
        assert!(dir.path().join("resultado.report.json").exists());
    }

    #[test]
    fn test_save_interrupted_run() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("parcial");

        let status = save_text_search(&search_run(true), base.to_str().unwrap());

        assert_eq!(status, RunStatus::Interrupted);
        assert!(dir.path().join("parcial.xlsx").exists());
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("missing").join("output");

        let status = save_text_search(&search_run(false), base.to_str().unwrap());
        assert_eq!(status, RunStatus::OutputFailed);
    }
}
