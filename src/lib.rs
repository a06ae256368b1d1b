//! Graphics option overrides for SimCity 4.
//!
//! The DLL is loaded into the game process and lets the user pick the
//! renderer, resolution, color depth and window mode from
//! `SC4GraphicsOptions.ini`, including a borderless full screen mode the
//! game itself cannot express.
//!
//! - Loads and validates the configuration at start up
//! - Rewrites SC4's saved video preferences when they disagree with it
//! - Patches the full screen color depth of known game builds
//! - Intercepts main window creation for borderless full screen
//! - Verifies the options SC4 actually ended up using

pub mod compat;
pub mod constants;
pub mod director;
pub mod driver;
pub mod error;
pub mod host;
pub mod logging;
pub mod preferences;
pub mod settings;
pub mod verifier;
pub mod window_hooks;
#[cfg(windows)]
pub mod win32_utils;

pub use director::{GraphicsOptionsDirector, StartAction};
pub use driver::DriverBackend;
pub use error::{GraphicsOptionsError, Result};
pub use settings::{ColorDepth, DesiredConfiguration, ScreenSize, WindowMode};

#[cfg(windows)]
pub use platform::create_director;

#[cfg(windows)]
mod platform {
    use log::{error, info};

    use crate::constants::{PLUGIN_CONFIG_FILE_NAME, PLUGIN_LOG_FILE_NAME};
    use crate::director::GraphicsOptionsDirector;
    use crate::logging::init_logging;
    use crate::win32_utils::{dll_directory, primary_display_size};
    use crate::window_hooks::detours::DetourBackend;

    /// Creates the director for the host to register.
    ///
    /// 1. Start logging to `SC4GraphicsOptions.log` beside the DLL.
    /// 2. Load `SC4GraphicsOptions.ini` from the same folder, checked
    ///    against the primary monitor.
    /// 3. Back window interception with the user32 detours.
    pub fn create_director() -> GraphicsOptionsDirector<DetourBackend> {
        let folder = match dll_directory() {
            Ok(folder) => folder,
            Err(e) => {
                eprintln!("[SC4GraphicsOptions] {:#}", e);
                Default::default()
            }
        };

        init_logging(&folder.join(PLUGIN_LOG_FILE_NAME), false);
        if folder.as_os_str().is_empty() {
            error!("Unable to locate the plugin folder, using the working directory.");
        }

        let director = GraphicsOptionsDirector::load(
            &folder.join(PLUGIN_CONFIG_FILE_NAME),
            primary_display_size(),
            DetourBackend::new(),
        );
        info!("Loaded the graphics options from {}", folder.display());
        director
    }
}
