//! Pure reshaping of scraped text into records
//!
//! Nothing in here touches the browser or the network; the portal routines
//! feed raw strings and bytes in and get typed values back.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{ActuacionEntry, CITY_COLUMN, ENTITY_COLUMN};

/// Number of CSV columns kept from an entity export
pub const CSV_COLUMNS: usize = 6;

/// Length of the city segment at the start of a docket number
const CITY_CODE_LEN: usize = 5;

/// End (exclusive) of the entity segment of a docket number
const ENTITY_CODE_END: usize = 9;

static ABRIR_DOCUMENTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*javascript:abrirDocumento\('(?P<url>[^']*)'\)\s*;?\s*$")
        .expect("static regex is valid")
});

/// Docket number split into the segments the search form needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseCode {
    code: String,
}

impl CaseCode {
    /// Validate a docket number
    ///
    /// The first nine characters must be ASCII digits: five for the city,
    /// four identifying the entity.
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() < ENTITY_CODE_END {
            return Err(Error::InvalidCaseCode(format!(
                "'{}' is shorter than {} characters",
                code, ENTITY_CODE_END
            )));
        }
        if !code.as_bytes()[..ENTITY_CODE_END]
            .iter()
            .all(u8::is_ascii_digit)
        {
            return Err(Error::InvalidCaseCode(format!(
                "'{}' must start with {} digits",
                code, ENTITY_CODE_END
            )));
        }

        Ok(Self {
            code: code.to_string(),
        })
    }

    /// Full docket number as typed into the form
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Characters `[0, 5)`: value of the city dropdown
    pub fn city_code(&self) -> &str {
        &self.code[..CITY_CODE_LEN]
    }

    /// Characters `[5, 9)`: fragment of the entity dropdown value
    pub fn entity_fragment(&self) -> &str {
        &self.code[CITY_CODE_LEN..ENTITY_CODE_END]
    }
}

/// Split a "Label - NAME A - NAME B" party string into trimmed names
pub fn split_parties(raw: &str) -> Vec<String> {
    raw.split('-')
        .skip(1)
        .map(|segment| segment.trim().to_string())
        .collect()
}

/// Regroup the flat cell texts of the history table into entries
///
/// Returns the entries and any trailing cells that did not fill a complete
/// group; callers are expected to flag a non-empty remainder.
pub fn group_actuaciones(cells: &[String]) -> (Vec<ActuacionEntry>, &[String]) {
    let chunks = cells.chunks_exact(ActuacionEntry::FIELD_COUNT);
    let remainder = chunks.remainder();

    let entries = chunks
        .map(|c| ActuacionEntry {
            fecha_actuacion: c[0].clone(),
            actuacion: c[1].clone(),
            anotacion: c[2].clone(),
            fecha_inicia_termino: c[3].clone(),
            fecha_finaliza_termino: c[4].clone(),
            fecha_registro: c[5].clone(),
        })
        .collect();

    (entries, remainder)
}

/// Extract the file URL from the CSV link's `href`
///
/// The portal renders `javascript:abrirDocumento('<url>')`; plain URLs pass
/// through untouched.
pub fn clean_download_href(href: &str) -> Result<String> {
    let url = match ABRIR_DOCUMENTO.captures(href) {
        Some(caps) => caps["url"].to_string(),
        None => href
            .replace("')", "")
            .replace("javascript:abrirDocumento('", "")
            .trim()
            .to_string(),
    };

    if url.is_empty() || url.starts_with("javascript:") {
        return Err(Error::Other(format!("No download URL in link '{}'", href)));
    }

    Ok(url)
}

/// File name for a downloaded export: last path segment of its URL
pub fn download_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "resultado.csv".to_string(),
    }
}

/// Decode a UTF-16 export (BOM-sniffed, little-endian when unmarked)
pub fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (text, encoding, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
    if had_errors {
        return Err(Error::Encoding(format!(
            "{} bytes are not valid {}",
            bytes.len(),
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Header and rows of an entity export, limited to the first six columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Pair every row with the header
    pub fn into_columns(self) -> Vec<Vec<(String, String)>> {
        let headers = self.headers;
        self.rows
            .into_iter()
            .map(|row| headers.iter().cloned().zip(row).collect())
            .collect()
    }
}

/// Parse a downloaded entity export
///
/// Layout: UTF-16 text, `;` delimited, a title line, then the header line,
/// then data. Only the first six columns are kept. A header with fewer
/// than six columns, or a data row with fewer than six cells, is rejected
/// rather than misaligned.
pub fn parse_entity_csv(bytes: &[u8]) -> Result<CsvTable> {
    let text = decode_utf16(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    // Title line above the header
    if records.next().transpose()?.is_none() {
        return Err(Error::CsvSchema("export is empty".to_string()));
    }

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| Error::CsvSchema("export has no header line".to_string()))?;
    if header.len() < CSV_COLUMNS {
        return Err(Error::CsvSchema(format!(
            "expected at least {} columns, header has {}",
            CSV_COLUMNS,
            header.len()
        )));
    }
    if header.len() > CSV_COLUMNS {
        debug!(
            "Export has {} columns, keeping the first {}",
            header.len(),
            CSV_COLUMNS
        );
    }

    let headers = unique_headers(header.iter().take(CSV_COLUMNS));

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if record.len() < CSV_COLUMNS {
            return Err(Error::CsvSchema(format!(
                "data row {} has {} cells, expected at least {}",
                index + 1,
                record.len(),
                CSV_COLUMNS
            )));
        }
        rows.push(
            record
                .iter()
                .take(CSV_COLUMNS)
                .map(|cell| cell.trim().to_string())
                .collect(),
        );
    }

    Ok(CsvTable { headers, rows })
}

/// Trimmed header names, each distinct from the others and from the
/// columns every result row gets appended
///
/// A repeated name gets a `.N` suffix with the first free `N`, so
/// `Fecha;Fecha` becomes `Fecha`, `Fecha.1`.
fn unique_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    let taken = |headers: &[String], name: &str| {
        name == ENTITY_COLUMN || name == CITY_COLUMN || headers.iter().any(|h| h == name)
    };

    for name in names {
        let name = name.trim();
        let mut unique = name.to_string();
        let mut n = 1;
        while taken(&headers, &unique) {
            unique = format!("{}.{}", name, n);
            n += 1;
        }
        if unique != name {
            debug!("Renamed export column '{}' to '{}'", name, unique);
        }
        headers.push(unique);
    }
    headers
}
