//! Layout of the "Consulta de Procesos" page
//!
//! Every control name, id and XPath the routines rely on lives here, so a
//! change in the portal's markup is a change in this file only.

use rjco_browser::Locator;

/// City dropdown
pub const CITY_SELECT: Locator<'static> = Locator::Name("ddlCiudad");

/// Entity (court) dropdown, repopulated after a city is chosen
pub const ENTITY_SELECT: Locator<'static> = Locator::Name("ddlEntidadEspecialidad");

/// Error modal while it is shown
pub const ERROR_OVERLAY: Locator<'static> =
    Locator::XPath("//div[@id='modalError' and @style='display: block;']");

/// "Cerrar" button of the error modal
pub const ERROR_OVERLAY_CLOSE: Locator<'static> =
    Locator::XPath("//div[@id='modalError']//*/td/input[@value='Cerrar' and @type='button']");

/// Search-by-name form
pub mod by_name {
    use super::Locator;

    /// Query mode selector; index 1 is "search by person"
    pub const QUERY_MODE: Locator<'static> = Locator::Name("rblConsulta");
    pub const QUERY_MODE_INDEX: usize = 1;

    /// Subject type; index 2 is "defendant"
    pub const SUBJECT_TYPE: Locator<'static> = Locator::Name("ddlTipoSujeto");
    pub const SUBJECT_TYPE_INDEX: usize = 2;

    /// Person type; index 2 is "legal person"
    pub const PERSON_TYPE: Locator<'static> = Locator::Name("ddlTipoPersona");
    pub const PERSON_TYPE_INDEX: usize = 2;

    pub const NAME_INPUT: Locator<'static> = Locator::Name("txtNatural");
    pub const SLIDER: Locator<'static> = Locator::Id("sliderBehaviorConsultaNom_railElement");
    pub const SUBMIT: Locator<'static> = Locator::Name("btnConsultaNom");

    /// "Cargando" window shown while the search runs
    pub const LOADING: Locator<'static> = Locator::XPath("//div[@id='miVentana']");

    pub const CSV_BUTTON: Locator<'static> = Locator::Name("btnGetCSV");
    pub const CSV_LINK: Locator<'static> =
        Locator::XPath("//div[@id='updResultadosNum']/span[@id='lblCSVFileStatus']/b/a");
}

/// Search-by-docket-number form and its result panel
pub mod by_number {
    use super::Locator;

    pub const CODE_INPUT: Locator<'static> =
        Locator::XPath("//div[@id='divNumRadicacion']/table/tbody/tr/td/div/input");
    pub const SLIDER: Locator<'static> = Locator::Id("sliderBehaviorNumeroProceso_railElement");
    pub const SUBMIT: Locator<'static> = Locator::XPath(
        "//div[@id='divNumRadicacion']/table/tbody/tr/td/input[@value='Consultar']",
    );

    pub const DETAILS: Locator<'static> =
        Locator::XPath("//div[@id='divActuaciones']/div[@class='contenedor']");

    pub const DESPACHO: Locator<'static> = Locator::Id("lblJuzgadoActual");
    pub const PONENTE: Locator<'static> = Locator::Id("lblPonente");
    pub const TIPO: Locator<'static> = Locator::Id("lblTipo");
    pub const CLASE: Locator<'static> = Locator::Id("lblClase");
    pub const RECURSO: Locator<'static> = Locator::Id("lblRecurso");
    pub const UBICACION: Locator<'static> = Locator::Id("lblUbicacion");
    pub const DEMANDANTES: Locator<'static> = Locator::Id("lblNomDemandante");
    pub const DEMANDADOS: Locator<'static> = Locator::Id("lblNomDemandado");
    pub const CONTENIDO: Locator<'static> = Locator::Id("lblContenido");

    /// Cells of the procedural-history table, row by row
    pub const HISTORY_CELLS: Locator<'static> = Locator::XPath(
        "//table[@class='ActuacionesDetalle']/tbody/tr[@class='tr_contenido']/td",
    );
}
