//! The plugin director: runs the graphics option overrides at the host's
//! start up lifecycle points.
//!
//! 1. construction: load `SC4GraphicsOptions.ini` (defaults on failure)
//! 2. `pre_framework_init`: install window interception, reconcile the
//!    persisted preferences, apply compatibility fixes, push the options to
//!    the graphics system and suppress the intro videos
//! 3. `pre_app_init`: fall back to converting the main window when
//!    interception is unavailable, then verify what the host ended up using
//! 4. `shutdown` / drop: remove window interception

use std::path::Path;

use log::{debug, error, info};

use crate::compat::{ProcessMemory, apply_compatibility_fixes};
use crate::constants::{GRAPHICS_OPTIONS_DIRECTOR_ID, INTRO_OFF_ARGUMENT, INTRO_SWITCH};
use crate::host::{
    CommandLine, DisplayMetrics, FrameworkState, GraphicsSystem, HostEnvironment, HostServices,
};
use crate::preferences::reconcile;
use crate::settings::{DesiredConfiguration, ScreenSize, WindowMode};
use crate::verifier::{VerificationReport, verify_graphics_options};
use crate::window_hooks::{
    InterceptionBackend, WindowFactory, WindowInterceptor, convert_to_borderless,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    /// The director must be registered for the lifecycle notifications.
    RegisterHook,
    /// The host was already past pre-app-init; that work ran immediately.
    RanPreAppInit,
}

pub struct GraphicsOptionsDirector<B: InterceptionBackend> {
    settings: DesiredConfiguration,
    interceptor: WindowInterceptor<B>,
}

impl<B: InterceptionBackend> GraphicsOptionsDirector<B> {
    pub fn new(settings: DesiredConfiguration, backend: B) -> Self {
        Self { settings, interceptor: WindowInterceptor::new(backend) }
    }

    /// Loads the configuration file, falling back to the built-in defaults
    /// when it cannot be used.
    pub fn load(config_path: &Path, primary: ScreenSize, backend: B) -> Self {
        let settings = DesiredConfiguration::load(config_path, primary).unwrap_or_else(|e| {
            error!("{}", e);
            DesiredConfiguration::default()
        });
        Self::new(settings, backend)
    }

    pub fn director_id(&self) -> u32 {
        GRAPHICS_OPTIONS_DIRECTOR_ID
    }

    pub fn settings(&self) -> &DesiredConfiguration {
        &self.settings
    }

    pub fn interceptor(&self) -> &WindowInterceptor<B> {
        &self.interceptor
    }

    pub fn on_start(
        &mut self,
        state: FrameworkState,
        host: &mut HostServices<'_>,
        windows: &mut dyn WindowFactory,
    ) -> StartAction {
        if state < FrameworkState::PreAppInit {
            StartAction::RegisterHook
        } else {
            self.pre_app_init(host, windows);
            StartAction::RanPreAppInit
        }
    }

    pub fn pre_framework_init(
        &mut self,
        host: &mut HostServices<'_>,
        environment: &dyn HostEnvironment,
        memory: &mut dyn ProcessMemory,
    ) {
        // SC4 creates its main window after this point.
        if !self.interceptor.is_installed() {
            if let Err(e) = self.interceptor.install(self.settings.window_mode()) {
                error!("{}", e);
            }
        }

        debug!("PauseGameOnFocusLoss={}", self.settings.pause_on_focus_loss());

        if let Some(preferences) = host.preferences.as_deref_mut() {
            reconcile(preferences, &self.settings);

            apply_compatibility_fixes(
                &self.settings,
                environment.game_version(),
                &environment.app_folder(),
                memory,
            );

            if let Some(graphics) = host.graphics.as_deref_mut() {
                apply_graphics_options(graphics, &self.settings);
            }
        }

        if !self.settings.intro_video_enabled() {
            if let Some(command_line) = host.command_line.as_deref_mut() {
                disable_intro_video(command_line);
            }
        }
    }

    pub fn pre_app_init(
        &mut self,
        host: &mut HostServices<'_>,
        windows: &mut dyn WindowFactory,
    ) -> Option<VerificationReport> {
        if self.settings.window_mode() == WindowMode::BorderlessFullScreen
            && !self.interceptor.is_installed()
        {
            match host.main_window {
                Some(window) if !window.is_null() => convert_to_borderless(windows, window),
                _ => error!("Unable to find SC4's main window for borderless full screen mode."),
            }
        }

        host.graphics
            .as_deref()
            .map(|graphics| verify_graphics_options(graphics, &self.settings))
    }

    pub fn shutdown(&mut self) {
        if self.interceptor.is_installed() {
            if let Err(e) = self.interceptor.remove() {
                error!("{}", e);
            }
        }
    }
}

impl<B: InterceptionBackend> Drop for GraphicsOptionsDirector<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Overrides the values SC4 already took from its preferences and command line.
pub fn apply_graphics_options(graphics: &mut dyn GraphicsSystem, config: &DesiredConfiguration) {
    graphics.pre_init_set_desired_game_resolution(DisplayMetrics {
        width: config.window_width(),
        height: config.window_height(),
        bit_depth: config.color_depth().bits(),
    });
    graphics.pre_init_set_windowed_mode(!config.window_mode().is_host_full_screen());
    graphics.set_default_driver_class_id(config.driver().class_id());
    info!(
        "Requested {}x{}x{}, {}, {} driver.",
        config.window_width(),
        config.window_height(),
        config.color_depth().bits(),
        config.window_mode().describe(),
        config.driver().name()
    );
}

/// Appends `-Intro:off` unless the command line already has an `Intro` switch.
pub fn disable_intro_video(command_line: &mut dyn CommandLine) -> bool {
    if command_line.is_switch_present(INTRO_SWITCH) {
        return false;
    }
    let index = command_line.arg_count();
    command_line.insert_argument(INTRO_OFF_ARGUMENT, index);
    true
}
