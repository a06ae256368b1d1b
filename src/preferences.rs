//! Brings SC4's persisted video preferences in line with the desired
//! configuration before the host reads them.

use log::{debug, info};

use crate::driver::DriverBackend;
use crate::host::{PreferencesStore, VideoPreferences};
use crate::settings::DesiredConfiguration;

/// The host's preferences UI treats the driver type as a boolean where 1 is
/// hardware and 0 is software rendering. Unlike the base game, OpenGL
/// counts as hardware.
pub fn driver_type_flag(driver: DriverBackend) -> u8 {
    match driver {
        DriverBackend::DirectX | DriverBackend::OpenGL => 1,
        DriverBackend::Software => 0,
    }
}

fn driver_types_match(existing: u8, driver: DriverBackend) -> bool {
    match driver {
        DriverBackend::DirectX | DriverBackend::OpenGL => existing != 0,
        DriverBackend::Software => existing == 0,
    }
}

pub fn preferences_match(prefs: &VideoPreferences, config: &DesiredConfiguration) -> bool {
    prefs.width == config.window_width()
        && prefs.height == config.window_height()
        && prefs.bit_depth == config.color_depth().bits()
        && prefs.full_screen == config.window_mode().is_full_screen()
        && driver_types_match(prefs.driver_type, config.driver())
}

/// Overwrites the preferences and saves them once, but only when they
/// differ from `config`. Returns whether a save happened.
pub fn reconcile(store: &mut dyn PreferencesStore, config: &DesiredConfiguration) -> bool {
    let prefs = store.video_preferences_mut();

    if preferences_match(prefs, config) {
        debug!("SC4 video preferences already match, nothing to save.");
        return false;
    }

    *prefs = VideoPreferences {
        width: config.window_width(),
        height: config.window_height(),
        bit_depth: config.color_depth().bits(),
        full_screen: config.window_mode().is_full_screen(),
        driver_type: driver_type_flag(config.driver()),
    };
    info!(
        "Updating SC4 video preferences to {}x{}x{}, {}, {}.",
        prefs.width,
        prefs.height,
        prefs.bit_depth,
        if prefs.full_screen { "full screen" } else { "windowed" },
        config.driver().name()
    );

    store.save_preferences();
    true
}
