//! Portal session: bootstrap, error-modal handling and dropdown enumeration

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rjco_browser::{Locator, PageDriver};
use rjco_core::{OptionMap, PortalConfig};
use tracing::{debug, info, warn};

use crate::error::{PortalError, Result};
use crate::page;

/// Shared flag raised when the operator interrupts the run
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(UserInterrupt)` once the flag is raised
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(PortalError::UserInterrupt);
        }
        Ok(())
    }
}

/// An open page of the portal
///
/// Owns the driver: dropping the `Portal` closes the browser, whichever way
/// the run ends.
pub struct Portal<D: PageDriver> {
    driver: D,
    config: PortalConfig,
    cancel: CancelFlag,
}

impl<D: PageDriver> Portal<D> {
    /// Navigate to the entry page and make sure it loaded cleanly
    ///
    /// Fails with [`PortalError::UnexpectedPortal`] when the portal greets
    /// the session with its error modal (which is dismissed first).
    pub fn open(driver: D, config: PortalConfig, cancel: CancelFlag) -> Result<Self> {
        info!("Opening portal at {}", config.entry_url);

        driver.navigate(&config.entry_url)?;
        let portal = Self {
            driver,
            config,
            cancel,
        };

        if portal.check_error_overlay()? {
            return Err(PortalError::UnexpectedPortal(
                "error dialog on the entry page".to_string(),
            ));
        }

        Ok(portal)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Detect and dismiss the portal's error modal
    ///
    /// Returns `true` when the modal showed up within the overlay timeout
    /// and was closed. A wait timeout means there is no modal.
    pub fn check_error_overlay(&self) -> Result<bool> {
        match self
            .driver
            .wait_visible(page::ERROR_OVERLAY, self.config.overlay_timeout())
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        debug!("Error dialog shown, pressing 'Cerrar'");
        self.driver.click(page::ERROR_OVERLAY_CLOSE)?;
        debug!("Error dialog closed");

        Ok(true)
    }

    /// Options of a dropdown, minus its placeholder, in page order
    ///
    /// Fails with [`PortalError::ElementNotFound`] if the control does not
    /// become visible within the element timeout.
    pub fn list_options(&self, control: Locator<'_>) -> Result<OptionMap> {
        self.driver
            .wait_visible(control, self.config.element_timeout())
            .map_err(|e| PortalError::ElementNotFound(format!("{} ({})", control, e)))?;

        let options = OptionMap::from_dropdown(self.driver.options(control)?);
        debug!("{} lists {} options", control, options.len());

        Ok(options)
    }

    /// Perform the slider "unlock" gesture the portal requires before a search
    ///
    /// One press-move-release drag to the right along the slider rail.
    pub fn unlock_slider(&self, slider: Locator<'_>) -> Result<()> {
        debug!("Unlocking slider {}", slider);
        self.driver
            .drag_by(slider, self.config.slider_offset_px, 0.0)?;
        Ok(())
    }

    /// Wait for a control with the default element timeout
    pub(crate) fn visible(&self, locator: Locator<'_>) -> Result<()> {
        self.driver
            .wait_visible(locator, self.config.element_timeout())?;
        Ok(())
    }

    /// Wait for an element to exist in the DOM, rendered or not
    pub(crate) fn present(&self, locator: Locator<'_>) -> Result<()> {
        self.driver
            .wait_present(locator, self.config.element_timeout())?;
        Ok(())
    }

    pub(crate) fn select_value(&self, control: Locator<'_>, value: &str) -> Result<()> {
        self.visible(control)?;
        self.driver.select_value(control, value)?;
        Ok(())
    }

    pub(crate) fn select_index(&self, control: Locator<'_>, index: usize) -> Result<()> {
        self.visible(control)?;
        self.driver.select_index(control, index)?;
        Ok(())
    }

    /// Wait until a "loading" element goes away; running out of time is
    /// logged, not returned
    pub(crate) fn wait_until_idle(&self, indicator: Locator<'_>) -> Result<()> {
        pause(self.config.settle_delay());
        match self
            .driver
            .wait_invisible(indicator, self.config.loading_timeout())
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_timeout() => {
                warn!("{} still visible, continuing anyway", indicator);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
