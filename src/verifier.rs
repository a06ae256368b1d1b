//! Checks, after SC4 initialized its graphics system, that it actually
//! uses the requested options. Mismatches are only logged; the window
//! already exists and changing it now is not safe.

use log::{debug, error};

use crate::driver::DriverBackend;
use crate::host::GraphicsSystem;
use crate::settings::DesiredConfiguration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub geometry_mismatch: bool,
    pub driver_mismatch: bool,
}

impl VerificationReport {
    pub fn is_ok(&self) -> bool {
        !self.geometry_mismatch && !self.driver_mismatch
    }
}

pub fn verify_graphics_options(
    graphics: &dyn GraphicsSystem,
    config: &DesiredConfiguration,
) -> VerificationReport {
    let mut report = VerificationReport::default();

    let metrics = graphics.game_metrics();
    let is_full_screen = graphics.is_full_screen_mode();
    let mode = config.window_mode();

    if metrics.width != config.window_width()
        || metrics.height != config.window_height()
        || metrics.bit_depth != config.color_depth().bits()
        || is_full_screen != mode.is_host_full_screen()
    {
        error!(
            "SC4's graphics options ({}x{}x{}, {}) don't match the requested options ({}x{}x{}, {}).",
            metrics.width,
            metrics.height,
            metrics.bit_depth,
            if is_full_screen { "full screen" } else { "windowed" },
            config.window_width(),
            config.window_height(),
            config.color_depth().bits(),
            mode.describe()
        );
        report.geometry_mismatch = true;
    }

    match graphics.active_driver_class_id() {
        Some(active) if !config.is_using_driver(active) => {
            error!(
                "Failed to set the game's driver to {}, SC4 is using {}.",
                config.driver().name(),
                DriverBackend::from_class_id(active).map_or("an unknown driver", |d| d.name())
            );
            report.driver_mismatch = true;
        }
        Some(_) => {}
        None => debug!("SC4 has no active graphics driver to verify."),
    }

    report
}
