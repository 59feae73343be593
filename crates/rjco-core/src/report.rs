//! Per-city and per-entity outcomes of an aggregate run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one city or entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded { rows: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    pub label: String,
    pub value: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityReport {
    pub label: String,
    pub value: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub entities: Vec<EntityReport>,
}

/// Summary of one aggregate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub query: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub interrupted: bool,
    pub cities: Vec<CityReport>,
}

/// Counts across every entity of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows: usize,
    pub failed_cities: usize,
}

impl RunReport {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            started_at: Utc::now(),
            finished_at: None,
            interrupted: false,
            cities: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn totals(&self) -> ReportTotals {
        let mut totals = ReportTotals::default();
        for city in &self.cities {
            if city.outcome.is_failed() {
                totals.failed_cities += 1;
            }
            for entity in &city.entities {
                match &entity.outcome {
                    Outcome::Succeeded { rows } => {
                        totals.succeeded += 1;
                        totals.rows += rows;
                    }
                    Outcome::Skipped { .. } => totals.skipped += 1,
                    Outcome::Failed { .. } => totals.failed += 1,
                }
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(label: &str, outcome: Outcome) -> EntityReport {
        EntityReport {
            label: label.to_string(),
            value: "1".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_report_totals() {
        let mut report = RunReport::new("sura");
        report.cities.push(CityReport {
            label: "BOGOTA".to_string(),
            value: "11001".to_string(),
            outcome: Outcome::Succeeded { rows: 5 },
            entities: vec![
                entity("J1", Outcome::Succeeded { rows: 2 }),
                entity("J2", Outcome::Succeeded { rows: 3 }),
                entity("J3 (Inactivo)", Outcome::Skipped { reason: "inactive".into() }),
                entity("J4", Outcome::Failed { reason: "timeout".into() }),
            ],
        });
        report.cities.push(CityReport {
            label: "CALI".to_string(),
            value: "76001".to_string(),
            outcome: Outcome::Failed { reason: "portal error".into() },
            entities: vec![],
        });

        let totals = report.totals();
        assert_eq!(totals.succeeded, 2);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.rows, 5);
        assert_eq!(totals.failed_cities, 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(entity("J4", Outcome::Failed { reason: "timeout".into() }))
            .unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["reason"], "timeout");
        assert_eq!(value["label"], "J4");
    }

    #[test]
    fn test_finish_sets_timestamp() {
        let mut report = RunReport::new("sura");
        assert!(report.finished_at.is_none());
        report.finish();
        assert!(report.finished_at.unwrap() >= report.started_at);
    }
}
