//! Scripted page and downloader for unit tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use rjco_browser::{BrowserError, Locator, PageDriver};
use rjco_core::{PortalConfig, SelectOption};

use crate::download::Downloader;
use crate::error::{PortalError, Result};
use crate::page;

pub(crate) const ENTRY_URL: &str = "https://portal.test/consultaprocesos/ConsultaJusticias21.aspx";

pub(crate) fn test_config() -> PortalConfig {
    PortalConfig {
        entry_url: ENTRY_URL.to_string(),
        element_timeout_secs: 1,
        overlay_timeout_secs: 1,
        loading_timeout_secs: 1,
        settle_delay_ms: 0,
        slider_offset_px: 10.0,
    }
}

/// UTF-16LE bytes with BOM, the way the portal serves its exports
pub(crate) fn utf16_bytes(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

fn placeholder() -> SelectOption {
    SelectOption::new("Seleccione...", "0")
}

fn options(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
    std::iter::once(placeholder())
        .chain(pairs.iter().map(|(l, v)| SelectOption::new(*l, *v)))
        .collect()
}

#[derive(Default)]
struct State {
    cities: Vec<SelectOption>,
    entities: HashMap<String, Vec<SelectOption>>,
    city: Option<String>,
    entity: Option<String>,

    overlay: bool,
    overlay_on_select: HashSet<String>,
    wait_failures: HashMap<String, BrowserError>,
    entity_timeouts: HashSet<String>,
    hidden: HashSet<String>,
    texts: HashMap<String, String>,
    cells: Vec<String>,

    navigations: Vec<String>,
    selections: Vec<(String, String)>,
    index_selections: Vec<(String, usize)>,
    typed: Vec<(String, String)>,
    clicks: Vec<String>,
    drags: Vec<(String, f64, f64)>,
}

/// [`PageDriver`] over an in-memory model of the portal page
///
/// Dropdowns hold scripted options (a placeholder is always prepended),
/// the entity list follows the selected city, and the error modal shows up
/// when asked to, until its close button is clicked.
#[derive(Default)]
pub(crate) struct StubDriver {
    state: RefCell<State>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cities(self, cities: &[(&str, &str)]) -> Self {
        self.state.borrow_mut().cities = options(cities);
        self
    }

    pub fn with_entities(self, city_value: &str, entities: &[(&str, &str)]) -> Self {
        self.state
            .borrow_mut()
            .entities
            .insert(city_value.to_string(), options(entities));
        self
    }

    /// Text of a span (or any single element)
    pub fn with_text(self, locator: Locator<'_>, text: &str) -> Self {
        self.state
            .borrow_mut()
            .texts
            .insert(locator.to_xpath(), text.to_string());
        self
    }

    /// Cells returned for the procedural-history table
    pub fn with_history(self, cells: &[&str]) -> Self {
        self.state.borrow_mut().cells = cells.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Show the error modal until it is closed
    pub fn show_overlay(&self) {
        self.state.borrow_mut().overlay = true;
    }

    /// Show the error modal whenever `value` is selected in any dropdown
    pub fn overlay_on_select(&self, value: &str) {
        self.state
            .borrow_mut()
            .overlay_on_select
            .insert(value.to_string());
    }

    /// Make every wait on `locator` fail with `error`
    pub fn fail_wait(&self, locator: Locator<'_>, error: BrowserError) {
        self.state
            .borrow_mut()
            .wait_failures
            .insert(locator.to_xpath(), error);
    }

    /// Keep `locator` in the DOM but never rendered
    pub fn hide(&self, locator: Locator<'_>) {
        self.state.borrow_mut().hidden.insert(locator.to_xpath());
    }

    /// Make the CSV link never appear while entity `value` is selected
    pub fn time_out_entity(&self, value: &str) {
        self.state
            .borrow_mut()
            .entity_timeouts
            .insert(value.to_string());
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }

    /// Values selected in `control`, in call order
    pub fn selected(&self, control: Locator<'_>) -> Vec<String> {
        let xpath = control.to_xpath();
        self.state
            .borrow()
            .selections
            .iter()
            .filter(|(l, _)| *l == xpath)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn index_selections(&self) -> Vec<(String, usize)> {
        self.state.borrow().index_selections.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.borrow().typed.clone()
    }

    pub fn clicked(&self, locator: Locator<'_>) -> bool {
        let xpath = locator.to_xpath();
        self.state.borrow().clicks.iter().any(|c| *c == xpath)
    }

    pub fn drags(&self) -> Vec<(String, f64, f64)> {
        self.state.borrow().drags.clone()
    }

    fn scripted_failure(&self, locator: Locator<'_>) -> Option<BrowserError> {
        let state = self.state.borrow();
        if let Some(error) = state.wait_failures.get(&locator.to_xpath()) {
            return Some(error.clone());
        }
        if locator == page::by_name::CSV_LINK {
            if let Some(entity) = &state.entity {
                if state.entity_timeouts.contains(entity) {
                    return Some(BrowserError::Timeout(format!("{} never appeared", locator)));
                }
            }
        }
        None
    }

    fn dropdown(&self, locator: Locator<'_>) -> Vec<SelectOption> {
        let state = self.state.borrow();
        if locator == page::CITY_SELECT {
            return state.cities.clone();
        }
        if locator == page::ENTITY_SELECT {
            return state
                .city
                .as_ref()
                .and_then(|city| state.entities.get(city))
                .cloned()
                .unwrap_or_else(|| vec![placeholder()]);
        }
        Vec::new()
    }
}

impl PageDriver for StubDriver {
    fn navigate(&self, url: &str) -> rjco_browser::Result<()> {
        self.state.borrow_mut().navigations.push(url.to_string());
        Ok(())
    }

    fn wait_visible(&self, locator: Locator<'_>, _timeout: Duration) -> rjco_browser::Result<()> {
        if let Some(error) = self.scripted_failure(locator) {
            return Err(error);
        }
        let state = self.state.borrow();
        let hidden = state.hidden.contains(&locator.to_xpath());
        if hidden || (locator == page::ERROR_OVERLAY && !state.overlay) {
            return Err(BrowserError::Timeout(format!("{} not visible", locator)));
        }
        Ok(())
    }

    fn wait_present(&self, locator: Locator<'_>, _timeout: Duration) -> rjco_browser::Result<()> {
        if let Some(error) = self.scripted_failure(locator) {
            return Err(error);
        }
        if locator == page::ERROR_OVERLAY && !self.state.borrow().overlay {
            return Err(BrowserError::Timeout(format!("{} not in the page", locator)));
        }
        Ok(())
    }

    fn wait_invisible(&self, locator: Locator<'_>, _timeout: Duration) -> rjco_browser::Result<()> {
        match self.scripted_failure(locator) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn options(&self, locator: Locator<'_>) -> rjco_browser::Result<Vec<SelectOption>> {
        Ok(self.dropdown(locator))
    }

    fn select_value(&self, locator: Locator<'_>, value: &str) -> rjco_browser::Result<()> {
        if !self.dropdown(locator).iter().any(|o| o.value == value) {
            return Err(BrowserError::ElementNotFound(format!(
                "no option '{}' in {}",
                value, locator
            )));
        }

        let mut state = self.state.borrow_mut();
        state.selections.push((locator.to_xpath(), value.to_string()));
        if locator == page::CITY_SELECT {
            state.city = Some(value.to_string());
            state.entity = None;
        } else if locator == page::ENTITY_SELECT {
            state.entity = Some(value.to_string());
        }
        if state.overlay_on_select.contains(value) {
            state.overlay = true;
        }
        Ok(())
    }

    fn select_index(&self, locator: Locator<'_>, index: usize) -> rjco_browser::Result<()> {
        self.state
            .borrow_mut()
            .index_selections
            .push((locator.to_xpath(), index));
        Ok(())
    }

    fn clear_and_type(&self, locator: Locator<'_>, text: &str) -> rjco_browser::Result<()> {
        self.state
            .borrow_mut()
            .typed
            .push((locator.to_xpath(), text.to_string()));
        Ok(())
    }

    fn click(&self, locator: Locator<'_>) -> rjco_browser::Result<()> {
        let mut state = self.state.borrow_mut();
        if locator == page::ERROR_OVERLAY_CLOSE {
            state.overlay = false;
        }
        state.clicks.push(locator.to_xpath());
        Ok(())
    }

    fn attribute(&self, locator: Locator<'_>, name: &str) -> rjco_browser::Result<Option<String>> {
        let state = self.state.borrow();
        if locator == page::by_name::CSV_LINK && name == "href" {
            return Ok(state.entity.as_ref().map(|entity| {
                format!("javascript:abrirDocumento('../Temp/{}.csv')", entity)
            }));
        }
        Ok(None)
    }

    fn text(&self, locator: Locator<'_>) -> rjco_browser::Result<String> {
        self.state
            .borrow()
            .texts
            .get(&locator.to_xpath())
            .cloned()
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }

    fn texts(&self, locator: Locator<'_>) -> rjco_browser::Result<Vec<String>> {
        if locator == page::by_number::HISTORY_CELLS {
            return Ok(self.state.borrow().cells.clone());
        }
        Ok(Vec::new())
    }

    fn drag_by(&self, locator: Locator<'_>, dx: f64, dy: f64) -> rjco_browser::Result<()> {
        self.state
            .borrow_mut()
            .drags
            .push((locator.to_string(), dx, dy));
        Ok(())
    }
}

/// [`Downloader`] that writes the same export for every URL
pub(crate) struct StubDownloader {
    body: Vec<u8>,
    failing: HashSet<String>,
    urls: RefCell<Vec<String>>,
}

impl StubDownloader {
    /// Serve `csv` encoded as UTF-16LE
    pub fn new(csv: &str) -> Self {
        Self {
            body: utf16_bytes(csv),
            failing: HashSet::new(),
            urls: RefCell::new(Vec::new()),
        }
    }

    /// Fail every URL containing `fragment`
    pub fn failing_for(mut self, fragment: &str) -> Self {
        self.failing.insert(fragment.to_string());
        self
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.borrow().clone()
    }
}

impl Downloader for StubDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.urls.borrow_mut().push(url.to_string());
        if self.failing.iter().any(|f| url.contains(f.as_str())) {
            return Err(PortalError::Network(format!("{} returned HTTP 500", url)));
        }
        fs::write(dest, &self.body)?;
        Ok(())
    }
}

/// Two-row export in the portal's layout
pub(crate) const TWO_ROW_CSV: &str = "Consulta de procesos\r\n\
Radicacion;Fecha;Clase;Demandante;Demandado;Despacho\r\n\
11001310300120190001;2019-01-10;Ordinario;ACME SA;SURA SA;Juzgado 1\r\n\
11001310300120190002;2019-02-11;Ejecutivo;JOHN DOE;SURA SA;Juzgado 1\r\n";
