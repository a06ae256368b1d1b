//! The parts of SimCity 4 the plugin talks to.
//!
//! The host's COM plumbing is resolved by the glue that registers the
//! director; everything here is the narrow surface the lifecycle code
//! needs, so it can be driven by the real host or by test doubles.

use std::path::PathBuf;

use crate::window_hooks::WindowHandle;

/// SC4's persisted video preferences record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoPreferences {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
    pub full_screen: bool,
    /// 1 for hardware rendering, 0 for software rendering.
    pub driver_type: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
}

/// Lifecycle states of the host framework, in the order it passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FrameworkState {
    Uninitialized,
    PreFrameWorkInit,
    PreAppInit,
    PostAppInit,
    Running,
    PreAppShutdown,
    PostAppShutdown,
}

pub trait PreferencesStore {
    fn video_preferences_mut(&mut self) -> &mut VideoPreferences;

    /// Writes the preferences to disk.
    fn save_preferences(&mut self);
}

pub trait GraphicsSystem {
    fn pre_init_set_desired_game_resolution(&mut self, metrics: DisplayMetrics);
    fn pre_init_set_windowed_mode(&mut self, windowed: bool);
    fn set_default_driver_class_id(&mut self, class_id: u32);

    fn game_metrics(&self) -> DisplayMetrics;
    fn is_full_screen_mode(&self) -> bool;
    /// Class id of the driver the graphics system ended up using, if one was created.
    fn active_driver_class_id(&self) -> Option<u32>;
}

pub trait CommandLine {
    fn arg_count(&self) -> usize;
    fn is_switch_present(&self, name: &str) -> bool;
    fn insert_argument(&mut self, argument: &str, index: usize);
}

pub trait HostEnvironment {
    /// Build number of the running executable, e.g. 641.
    fn game_version(&self) -> Option<u16>;
    /// Folder containing the host executable.
    fn app_folder(&self) -> PathBuf;
}

/// Collaborators available for one lifecycle notification. Any of them may
/// be missing when the host refuses the corresponding interface.
#[derive(Default)]
pub struct HostServices<'a> {
    pub preferences: Option<&'a mut dyn PreferencesStore>,
    pub graphics: Option<&'a mut dyn GraphicsSystem>,
    pub command_line: Option<&'a mut dyn CommandLine>,
    pub main_window: Option<WindowHandle>,
}
