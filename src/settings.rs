//! Loads and validates the plugin's `SC4GraphicsOptions.ini`.
//!
//! Invalid values never fail the load. Each one is logged at error level
//! and replaced, in this order:
//!
//! 1. unknown `Driver` → DirectX
//! 2. unknown `WindowMode` → Windowed
//! 3. `ColorDepth` other than 16/32 → 32
//! 4. windowed and smaller than 800x600 → 800x600
//! 5. windowed and larger than the primary display → borderless full screen
//! 6. full screen modes always use the primary display resolution
//!
//! A missing file, a missing required key, or a value that cannot be parsed
//! at all is a [`GraphicsOptionsError::Configuration`].

use std::path::Path;

use ini::{Ini, Properties};
use log::{debug, error};

use crate::constants::{
    CONFIG_SECTION, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, MIN_WINDOW_HEIGHT,
    MIN_WINDOW_WIDTH,
};
use crate::driver::{DriverBackend, starts_with_ignore_ascii_case};
use crate::error::{GraphicsOptionsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed,
    FullScreen,
    BorderlessFullScreen,
}

impl WindowMode {
    /// Matches the host's lenient parsing, where anything starting with
    /// "Borderless" selects the borderless mode.
    pub fn from_config_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("Windowed") {
            Some(WindowMode::Windowed)
        } else if value.eq_ignore_ascii_case("FullScreen") {
            Some(WindowMode::FullScreen)
        } else if starts_with_ignore_ascii_case(value, "Borderless") {
            Some(WindowMode::BorderlessFullScreen)
        } else {
            None
        }
    }

    /// Full screen as recorded in SC4's saved preferences, where both full
    /// screen modes count.
    pub fn is_full_screen(self) -> bool {
        matches!(self, WindowMode::FullScreen | WindowMode::BorderlessFullScreen)
    }

    /// The host only knows windowed and exclusive full screen. Borderless
    /// full screen is a windowed window with rewritten geometry.
    pub fn is_host_full_screen(self) -> bool {
        self == WindowMode::FullScreen
    }

    pub fn describe(self) -> &'static str {
        if self.is_host_full_screen() { "full screen" } else { "windowed" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Bits16,
    Bits32,
}

impl ColorDepth {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(ColorDepth::Bits16),
            32 => Some(ColorDepth::Bits32),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            ColorDepth::Bits16 => 16,
            ColorDepth::Bits32 => 32,
        }
    }
}

/// Current resolution of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The graphics options the host is forced into. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredConfiguration {
    window_width: u32,
    window_height: u32,
    color_depth: ColorDepth,
    window_mode: WindowMode,
    driver: DriverBackend,
    intro_video_enabled: bool,
    pause_on_focus_loss: bool,
}

impl Default for DesiredConfiguration {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            color_depth: ColorDepth::Bits32,
            window_mode: WindowMode::Windowed,
            driver: DriverBackend::DirectX,
            intro_video_enabled: true,
            pause_on_focus_loss: false,
        }
    }
}

impl DesiredConfiguration {
    pub fn load(path: &Path, primary: ScreenSize) -> Result<Self> {
        let ini = Ini::load_from_file(path).map_err(|e| {
            GraphicsOptionsError::Configuration(format!(
                "Failed to open the settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_ini(&ini, primary)
    }

    pub fn from_ini_str(contents: &str, primary: ScreenSize) -> Result<Self> {
        let ini = Ini::load_from_str(contents)
            .map_err(|e| GraphicsOptionsError::Configuration(e.to_string()))?;
        Self::from_ini(&ini, primary)
    }

    fn from_ini(ini: &Ini, primary: ScreenSize) -> Result<Self> {
        let section = ini.section(Some(CONFIG_SECTION)).ok_or_else(|| {
            GraphicsOptionsError::Configuration(format!("Missing [{}] section", CONFIG_SECTION))
        })?;

        let intro_video_enabled = get_bool(section, "EnableIntroVideo")?;
        let pause_on_focus_loss = get_bool(section, "PauseGameOnFocusLoss")?;

        let driver_value = get_str(section, "Driver")?;
        let driver = DriverBackend::from_config_value(driver_value).unwrap_or_else(|| {
            error!("Unknown Driver value '{}', falling back to DirectX.", driver_value);
            DriverBackend::DirectX
        });

        let mode_value = get_str(section, "WindowMode")?;
        let mut window_mode = WindowMode::from_config_value(mode_value).unwrap_or_else(|| {
            error!("Unknown WindowMode value '{}', falling back to Windowed.", mode_value);
            WindowMode::Windowed
        });

        let depth_bits = get_u32(section, "ColorDepth")?;
        let color_depth = ColorDepth::from_bits(depth_bits).unwrap_or_else(|| {
            error!(
                "Unsupported color depth value {}, must be one of 16 or 32. Defaulting to 32.",
                depth_bits
            );
            ColorDepth::Bits32
        });

        let (window_width, window_height) = if window_mode == WindowMode::Windowed {
            let width = get_u32(section, "WindowWidth")?;
            let height = get_u32(section, "WindowHeight")?;

            if width < MIN_WINDOW_WIDTH || height < MIN_WINDOW_HEIGHT {
                error!(
                    "The window dimensions must be at least {}x{}, defaulting to {}x{}.",
                    MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT
                );
                (MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT)
            } else if width > primary.width || height > primary.height {
                error!(
                    "The window dimensions are larger than the monitor size, switching to \
                     borderless full screen mode with a resolution of {}x{}.",
                    primary.width, primary.height
                );
                window_mode = WindowMode::BorderlessFullScreen;
                (primary.width, primary.height)
            } else {
                (width, height)
            }
        } else {
            // SC4 only supports full screen on the primary monitor.
            (primary.width, primary.height)
        };

        let config = Self {
            window_width,
            window_height,
            color_depth,
            window_mode,
            driver,
            intro_video_enabled,
            pause_on_focus_loss,
        };
        debug!("Loaded graphics options: {:?}", config);
        Ok(config)
    }

    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn color_depth(&self) -> ColorDepth {
        self.color_depth
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    pub fn driver(&self) -> DriverBackend {
        self.driver
    }

    pub fn intro_video_enabled(&self) -> bool {
        self.intro_video_enabled
    }

    pub fn pause_on_focus_loss(&self) -> bool {
        self.pause_on_focus_loss
    }

    pub fn is_using_driver(&self, class_id: u32) -> bool {
        self.driver.class_id() == class_id
    }

    #[cfg(test)]
    pub(crate) fn for_test(
        driver: DriverBackend,
        window_mode: WindowMode,
        color_depth: ColorDepth,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            window_width,
            window_height,
            color_depth,
            window_mode,
            driver,
            ..Self::default()
        }
    }
}

fn get_str<'a>(section: &'a Properties, key: &str) -> Result<&'a str> {
    section
        .get(key)
        .map(str::trim)
        .ok_or_else(|| GraphicsOptionsError::Configuration(format!("Missing key {}", key)))
}

fn get_u32(section: &Properties, key: &str) -> Result<u32> {
    let value = get_str(section, key)?;
    value.parse().map_err(|_| {
        GraphicsOptionsError::Configuration(format!("Invalid {} value '{}'", key, value))
    })
}

fn get_bool(section: &Properties, key: &str) -> Result<bool> {
    let value = get_str(section, key)?;
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Ok(false)
    } else {
        Err(GraphicsOptionsError::Configuration(format!(
            "Invalid {} value '{}'",
            key, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR: ScreenSize = ScreenSize::new(1920, 1080);

    fn config(driver: &str, mode: &str, depth: &str, width: u32, height: u32) -> String {
        format!(
            "[GraphicsOptions]\n\
             EnableIntroVideo=false\n\
             PauseGameOnFocusLoss=true\n\
             Driver={driver}\n\
             WindowMode={mode}\n\
             ColorDepth={depth}\n\
             WindowWidth={width}\n\
             WindowHeight={height}\n"
        )
    }

    fn load(driver: &str, mode: &str, depth: &str, width: u32, height: u32) -> DesiredConfiguration {
        DesiredConfiguration::from_ini_str(&config(driver, mode, depth, width, height), MONITOR)
            .unwrap()
    }

    #[test]
    fn valid_windowed_configuration_is_unchanged() {
        for (w, h) in [(800, 600), (1280, 1024), (1920, 1080), (1600, 900)] {
            let c = load("OpenGL", "Windowed", "16", w, h);
            assert_eq!(c.window_mode(), WindowMode::Windowed);
            assert_eq!((c.window_width(), c.window_height()), (w, h));
            assert_eq!(c.color_depth(), ColorDepth::Bits16);
            assert_eq!(c.driver(), DriverBackend::OpenGL);
            assert!(!c.intro_video_enabled());
            assert!(c.pause_on_focus_loss());
        }
    }

    #[test]
    fn small_windows_are_clamped_to_minimum() {
        let c = load("DirectX", "Windowed", "32", 640, 480);
        assert_eq!((c.window_width(), c.window_height()), (800, 600));
        assert_eq!(c.window_mode(), WindowMode::Windowed);

        let c = load("DirectX", "Windowed", "32", 1024, 500);
        assert_eq!((c.window_width(), c.window_height()), (800, 600));
    }

    #[test]
    fn minimum_size_rule_runs_before_the_monitor_rule() {
        let c = load("DirectX", "Windowed", "32", 700, 2000);
        assert_eq!(c.window_mode(), WindowMode::Windowed);
        assert_eq!((c.window_width(), c.window_height()), (800, 600));
    }

    #[test]
    fn both_full_screen_modes_count_as_full_screen_in_preferences() {
        assert!(WindowMode::FullScreen.is_full_screen());
        assert!(WindowMode::BorderlessFullScreen.is_full_screen());
        assert!(!WindowMode::Windowed.is_full_screen());
        assert!(!WindowMode::BorderlessFullScreen.is_host_full_screen());
    }

    #[test]
    fn oversized_windows_become_borderless_at_monitor_size() {
        for (w, h) in [(2560, 1440), (1921, 1080), (1920, 1081)] {
            let c = load("DirectX", "Windowed", "32", w, h);
            assert_eq!(c.window_mode(), WindowMode::BorderlessFullScreen);
            assert_eq!((c.window_width(), c.window_height()), (1920, 1080));
        }
    }

    #[test]
    fn full_screen_modes_always_use_monitor_size() {
        for mode in ["FullScreen", "Borderless", "BorderlessFullScreen", "fullscreen"] {
            let c = load("DirectX", mode, "32", 800, 600);
            assert_ne!(c.window_mode(), WindowMode::Windowed);
            assert_eq!((c.window_width(), c.window_height()), (1920, 1080));
        }
    }

    #[test]
    fn full_screen_does_not_require_window_dimensions() {
        let text = "[GraphicsOptions]\n\
                    EnableIntroVideo=true\n\
                    PauseGameOnFocusLoss=false\n\
                    Driver=DirectX\n\
                    WindowMode=FullScreen\n\
                    ColorDepth=64\n";
        let c = DesiredConfiguration::from_ini_str(text, MONITOR).unwrap();
        assert_eq!(c.window_mode(), WindowMode::FullScreen);
        assert_eq!(c.color_depth(), ColorDepth::Bits32);
        assert_eq!((c.window_width(), c.window_height()), (1920, 1080));
    }

    #[test]
    fn unknown_tokens_fall_back() {
        let c = load("Glide", "Maximized", "24", 1024, 768);
        assert_eq!(c.driver(), DriverBackend::DirectX);
        assert_eq!(c.window_mode(), WindowMode::Windowed);
        assert_eq!(c.color_depth(), ColorDepth::Bits32);
        assert_eq!((c.window_width(), c.window_height()), (1024, 768));
    }

    #[test]
    fn scgl_selects_opengl() {
        let c = load("scgl", "Windowed", "32", 1024, 768);
        assert_eq!(c.driver(), DriverBackend::OpenGL);
        assert!(c.is_using_driver(DriverBackend::OpenGL.class_id()));
    }

    #[test]
    fn missing_or_malformed_values_are_errors() {
        let no_section = DesiredConfiguration::from_ini_str("Driver=DirectX\n", MONITOR);
        assert!(matches!(no_section, Err(GraphicsOptionsError::Configuration(_))));

        let missing_height = "[GraphicsOptions]\n\
                              EnableIntroVideo=true\n\
                              PauseGameOnFocusLoss=false\n\
                              Driver=DirectX\n\
                              WindowMode=Windowed\n\
                              ColorDepth=32\n\
                              WindowWidth=1024\n";
        assert!(DesiredConfiguration::from_ini_str(missing_height, MONITOR).is_err());

        let bad_bool = config("DirectX", "Windowed", "32", 1024, 768)
            .replace("EnableIntroVideo=false", "EnableIntroVideo=maybe");
        assert!(DesiredConfiguration::from_ini_str(&bad_bool, MONITOR).is_err());

        let bad_depth = config("DirectX", "Windowed", "deep", 1024, 768);
        assert!(DesiredConfiguration::from_ini_str(&bad_depth, MONITOR).is_err());
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let path = std::env::temp_dir().join("sc4_graphics_options_does_not_exist.ini");
        let result = DesiredConfiguration::load(&path, MONITOR);
        assert!(matches!(result, Err(GraphicsOptionsError::Configuration(_))));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "sc4_graphics_options_settings_{}.ini",
            std::process::id()
        ));
        std::fs::write(&path, config("Software", "Windowed", "16", 1280, 720)).unwrap();
        let c = DesiredConfiguration::load(&path, MONITOR).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(c.driver(), DriverBackend::Software);
        assert_eq!((c.window_width(), c.window_height()), (1280, 720));
    }

    #[test]
    fn defaults_match_the_host_defaults() {
        let c = DesiredConfiguration::default();
        assert_eq!(c.driver(), DriverBackend::DirectX);
        assert_eq!(c.window_mode(), WindowMode::Windowed);
        assert_eq!(c.color_depth(), ColorDepth::Bits32);
        assert_eq!((c.window_width(), c.window_height()), (1024, 768));
        assert!(c.intro_video_enabled());
        assert!(!c.pause_on_focus_loss());
    }
}
