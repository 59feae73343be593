//! Data model shared by the portal routines and the output writer

use serde::{Deserialize, Serialize};

/// Column appended to every row with the entity label
pub const ENTITY_COLUMN: &str = "Entidad";

/// Column appended to every row with the city label
pub const CITY_COLUMN: &str = "Ciudad";

/// Marker the portal appends to entities that no longer accept queries
pub const INACTIVE_MARKER: &str = "(inactivo)";

/// One `<option>` of a dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Whether the portal flags this entry as inactive (any case, any position)
    pub fn is_inactive(&self) -> bool {
        is_inactive_label(&self.label)
    }
}

/// Whether a label carries the "(Inactivo)" marker
pub fn is_inactive_label(label: &str) -> bool {
    label.to_lowercase().contains(INACTIVE_MARKER)
}

/// Ordered label → value lookup built from a dropdown
///
/// The first option of a portal dropdown is always a "choose one"
/// placeholder and is never part of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: Vec<SelectOption>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the raw option list of a dropdown, dropping the placeholder
    pub fn from_dropdown(options: Vec<SelectOption>) -> Self {
        let mut map = Self::new();
        for option in options.into_iter().skip(1) {
            map.insert(option.label, option.value);
        }
        map
    }

    /// Insert or replace; a repeated label keeps its original position
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|o| o.label == label) {
            Some(existing) => existing.value = value,
            None => self.entries.push(SelectOption { label, value }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.value.as_str())
    }

    /// First entry whose value contains `fragment`
    pub fn find_by_value_fragment(&self, fragment: &str) -> Option<&SelectOption> {
        self.entries.iter().find(|o| o.value.contains(fragment))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectOption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a OptionMap {
    type Item = &'a SelectOption;
    type IntoIter = std::slice::Iter<'a, SelectOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One row of an entity's CSV export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRow {
    /// Header → cell pairs, in CSV column order
    pub columns: Vec<(String, String)>,
    /// Entity label the row came from
    pub entidad: String,
    /// City label, filled in by the aggregator
    pub ciudad: Option<String>,
}

impl EntityRow {
    pub fn new(columns: Vec<(String, String)>, entidad: impl Into<String>) -> Self {
        Self {
            columns,
            entidad: entidad.into(),
            ciudad: None,
        }
    }

    /// Cell by column name, including `Entidad` and `Ciudad`
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            ENTITY_COLUMN => Some(self.entidad.as_str()),
            CITY_COLUMN => self.ciudad.as_deref(),
            _ => self
                .columns
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str()),
        }
    }
}

/// Aggregate of every entity row gathered during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    rows: Vec<EntityRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = EntityRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[EntityRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of data columns in first-seen order, then `Entidad` and `Ciudad`
    ///
    /// Entities may export different headers; rows lacking a column get an
    /// empty cell.
    pub fn headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = Vec::new();
        for row in &self.rows {
            for (name, _) in &row.columns {
                if !headers.iter().any(|h| h == name) {
                    headers.push(name.clone());
                }
            }
        }
        headers.push(ENTITY_COLUMN.to_string());
        headers.push(CITY_COLUMN.to_string());
        headers
    }
}

/// Structured record of one judicial process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "numeroRadicacion")]
    pub numero_radicacion: String,
    pub datos: CaseDetails,
    pub actuaciones: Vec<ActuacionEntry>,
}

/// Key/value fields of the process detail panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetails {
    pub despacho: String,
    pub ponente: String,
    pub tipo: String,
    pub clase: String,
    pub recurso: String,
    pub ubicacion: String,
    pub demandantes: Vec<String>,
    pub demandados: Vec<String>,
    pub contenido: String,
}

/// One row of the procedural-history table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuacionEntry {
    pub fecha_actuacion: String,
    pub actuacion: String,
    pub anotacion: String,
    pub fecha_inicia_termino: String,
    pub fecha_finaliza_termino: String,
    pub fecha_registro: String,
}

impl ActuacionEntry {
    /// Number of table cells that make up one entry
    pub const FIELD_COUNT: usize = 6;
}
