//! Look up a single process by its docket number

use rjco_browser::{Locator, PageDriver};
use rjco_core::parse::{group_actuaciones, split_parties};
use rjco_core::{CaseCode, CaseDetails, CaseRecord};
use tracing::{debug, info, warn};

use crate::error::{PortalError, Result};
use crate::page::{self, by_number};
use crate::session::Portal;

impl<D: PageDriver> Portal<D> {
    /// Fetch the detail panel and procedural history of one process
    ///
    /// The error modal is dismissed and logged at every step but never ends
    /// the lookup early; a failed search surfaces as the detail panel not
    /// showing up.
    pub fn search_case(&self, code: &str) -> Result<CaseRecord> {
        let code = CaseCode::parse(code)?;
        self.cancel_flag().check()?;

        info!("Searching in city {}", code.city_code());
        self.select_value(page::CITY_SELECT, code.city_code())?;
        self.note_overlay(&code)?;

        let entities = self.list_options(page::ENTITY_SELECT)?;
        let entity = entities
            .find_by_value_fragment(code.entity_fragment())
            .ok_or_else(|| PortalError::EntityNotFound(code.entity_fragment().to_string()))?;
        info!("Entity {} ({})", entity.label.trim(), entity.value);

        self.select_value(page::ENTITY_SELECT, &entity.value)?;
        self.note_overlay(&code)?;

        self.present(by_number::CODE_INPUT)?;
        self.driver().clear_and_type(by_number::CODE_INPUT, code.as_str())?;
        self.visible(by_number::SLIDER)?;
        self.unlock_slider(by_number::SLIDER)?;
        self.present(by_number::SUBMIT)?;
        self.driver().click(by_number::SUBMIT)?;
        self.note_overlay(&code)?;

        self.cancel_flag().check()?;
        self.present(by_number::DETAILS)?;

        let datos = CaseDetails {
            despacho: self.span(by_number::DESPACHO)?,
            ponente: self.span(by_number::PONENTE)?,
            tipo: self.span(by_number::TIPO)?,
            clase: self.span(by_number::CLASE)?,
            recurso: self.span(by_number::RECURSO)?,
            ubicacion: self.span(by_number::UBICACION)?,
            demandantes: split_parties(&self.span(by_number::DEMANDANTES)?),
            demandados: split_parties(&self.span(by_number::DEMANDADOS)?),
            contenido: self.span(by_number::CONTENIDO)?,
        };

        let cells = self.driver().texts(by_number::HISTORY_CELLS)?;
        let (actuaciones, remainder) = group_actuaciones(&cells);
        if !remainder.is_empty() {
            warn!(
                "History table has {} trailing cells outside a complete row, dropped",
                remainder.len()
            );
        }
        info!("{}: {} history entries", code.as_str(), actuaciones.len());

        Ok(CaseRecord {
            numero_radicacion: code.as_str().to_string(),
            datos,
            actuaciones,
        })
    }

    fn note_overlay(&self, code: &CaseCode) -> Result<()> {
        if self.check_error_overlay()? {
            warn!("Error dialog while searching {}", code.as_str());
        }
        Ok(())
    }

    fn span(&self, locator: Locator<'_>) -> Result<String> {
        self.driver()
            .wait_present(locator, self.config().element_timeout())?;
        let text = self.driver().text(locator)?;
        debug!("{} = {:?}", locator, text);
        Ok(text)
    }
}
