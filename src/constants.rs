/// File name of the plugin configuration, resolved next to the DLL.
pub const PLUGIN_CONFIG_FILE_NAME: &str = "SC4GraphicsOptions.ini";

/// File name of the plugin log, resolved next to the DLL.
pub const PLUGIN_LOG_FILE_NAME: &str = "SC4GraphicsOptions.log";

/// Section of the configuration file holding every key.
pub const CONFIG_SECTION: &str = "GraphicsOptions";

/// Environment variable overriding the log filter (env_logger syntax).
pub const LOG_FILTER_ENV: &str = "SC4_GRAPHICS_OPTIONS_LOG";

/// Director id the host uses to identify this plugin.
pub const GRAPHICS_OPTIONS_DIRECTOR_ID: u32 = 0x50A4_C948;

/// Identifying tokens of the host's graphics drivers.
pub const GDRIVER_DIRECTX_CLSID: u32 = 0xBADB_6906;
pub const GDRIVER_OPENGL_CLSID: u32 = 0xC455_4841;
pub const GDRIVER_SOFTWARE_CLSID: u32 = 0x7ACA_35C6;

/// Smallest window the host lays its UI out correctly in.
pub const MIN_WINDOW_WIDTH: u32 = 800;
pub const MIN_WINDOW_HEIGHT: u32 = 600;

/// Default windowed size used when no configuration could be loaded.
pub const DEFAULT_WINDOW_WIDTH: u32 = 1024;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 768;

/// DirectX 7 surfaces cannot exceed this in either dimension.
pub const DX7_TEXTURE_LIMIT: u32 = 2048;

/// DirectDraw wrapper that lifts the DirectX 7 limit when placed next to the host executable.
pub const DDRAW_WRAPPER_FILE_NAME: &str = "ddraw.dll";

/// Command line switch controlling the intro videos, and the argument that disables them.
pub const INTRO_SWITCH: &str = "Intro";
pub const INTRO_OFF_ARGUMENT: &str = "-Intro:off";

// Win32 window styles and commands. Kept here so the interception policy
// compiles and tests on every target.
pub const WS_POPUP: u32 = 0x8000_0000;
pub const WS_VISIBLE: u32 = 0x1000_0000;
pub const WS_MAXIMIZE: u32 = 0x0100_0000;
pub const WS_OVERLAPPEDWINDOW: u32 = 0x00CF_0000;

pub const SWP_NOSIZE: u32 = 0x0001;
pub const SWP_NOMOVE: u32 = 0x0002;
pub const SWP_FRAMECHANGED: u32 = 0x0020;

pub const SW_SHOWMAXIMIZED: i32 = 3;
pub const SW_MAXIMIZE: i32 = 3;

/// `HWND_TOP` for `SetWindowPos`.
pub const HWND_TOP: isize = 0;
