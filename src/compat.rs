//! Workarounds for limits baked into the SC4 executable.

use std::path::Path;

use log::{debug, error, info};

use crate::constants::{DDRAW_WRAPPER_FILE_NAME, DX7_TEXTURE_LIMIT};
use crate::driver::DriverBackend;
use crate::error::{GraphicsOptionsError, Result};
use crate::settings::{ColorDepth, DesiredConfiguration, WindowMode};

/// Raw access to the host process's memory.
pub trait ProcessMemory {
    fn read_byte(&self, address: usize) -> Result<u8>;

    /// Makes the page at `address` writable and executable, then writes `value`.
    fn write_byte(&mut self, address: usize, value: u8) -> Result<()>;
}

/// A single byte patch valid for exactly one build of the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryPatch {
    pub game_version: u16,
    pub address: usize,
    pub original: u8,
    pub patched: u8,
}

/// Maxis hard-coded the DirectX driver to 16-bit color when running full
/// screen. Replacing that constant with 32 fixes it; the offset comes from
/// the patched executable published at
/// https://github.com/dege-diosg/dgVoodoo2/issues/3
pub const FULL_SCREEN_COLOR_DEPTH_PATCHES: &[MemoryPatch] = &[MemoryPatch {
    game_version: 641,
    address: 0x0088_7738,
    original: 16,
    patched: 32,
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    NotRequired,
    Applied,
    AlreadyApplied,
}

pub fn find_patch(table: &[MemoryPatch], game_version: Option<u16>) -> Option<&MemoryPatch> {
    let version = game_version?;
    table.iter().find(|p| p.game_version == version)
}

pub fn apply_patch(patch: &MemoryPatch, memory: &mut dyn ProcessMemory) -> Result<PatchOutcome> {
    let current = memory.read_byte(patch.address)?;

    if current == patch.patched {
        return Ok(PatchOutcome::AlreadyApplied);
    }
    if current != patch.original {
        return Err(GraphicsOptionsError::Patch(format!(
            "unexpected value {:#04x} at {:#x}, expected {:#04x}",
            current, patch.address, patch.original
        )));
    }

    memory.write_byte(patch.address, patch.patched)?;
    Ok(PatchOutcome::Applied)
}

/// DirectX 7 cannot create surfaces above 2048 in either dimension. A
/// `ddraw.dll` wrapper next to the executable lifts that limit, because
/// Windows searches the executable's folder before the system folders.
///
/// Returns `true` when a warning was logged.
pub fn check_directx7_resolution_limit(config: &DesiredConfiguration, app_folder: &Path) -> bool {
    if config.driver() != DriverBackend::DirectX {
        return false;
    }
    if config.window_width() <= DX7_TEXTURE_LIMIT && config.window_height() <= DX7_TEXTURE_LIMIT {
        return false;
    }

    let wrapper = app_folder.join(DDRAW_WRAPPER_FILE_NAME);
    if wrapper.exists() {
        debug!("Found DirectX wrapper at {}", wrapper.display());
        return false;
    }

    info!("{}", resolution_limit_warning(config));
    true
}

fn resolution_limit_warning(config: &DesiredConfiguration) -> String {
    format!(
        "Warning: A DirectX wrapper is required for the {}x{} resolution you are using.",
        config.window_width(),
        config.window_height()
    )
}

/// Forces the DirectX full screen color depth to 32-bit when the
/// configuration asks for it and the running build has a known patch.
pub fn fix_full_screen_color_depth(
    config: &DesiredConfiguration,
    game_version: Option<u16>,
    memory: &mut dyn ProcessMemory,
) -> Result<PatchOutcome> {
    if config.driver() != DriverBackend::DirectX
        || config.window_mode() != WindowMode::FullScreen
        || config.color_depth() != ColorDepth::Bits32
    {
        return Ok(PatchOutcome::NotRequired);
    }

    let patch = find_patch(FULL_SCREEN_COLOR_DEPTH_PATCHES, game_version)
        .ok_or(GraphicsOptionsError::VersionMismatch { found: game_version })?;

    apply_patch(patch, memory)
}

/// Runs both checks, logging instead of failing.
pub fn apply_compatibility_fixes(
    config: &DesiredConfiguration,
    game_version: Option<u16>,
    app_folder: &Path,
    memory: &mut dyn ProcessMemory,
) {
    check_directx7_resolution_limit(config, app_folder);

    match fix_full_screen_color_depth(config, game_version, memory) {
        Ok(PatchOutcome::Applied) => {
            info!("Forced the DirectX full screen color depth to 32-bit.")
        }
        Ok(PatchOutcome::AlreadyApplied) => {
            debug!("The DirectX full screen color depth is already 32-bit.")
        }
        Ok(PatchOutcome::NotRequired) => {}
        Err(GraphicsOptionsError::VersionMismatch { found }) => {
            let supported: Vec<String> = FULL_SCREEN_COLOR_DEPTH_PATCHES
                .iter()
                .map(|p| p.game_version.to_string())
                .collect();
            error!(
                "Unable to force the DirectX full screen color depth to 32-bit. Requires game \
                 version {}, found game version {}.",
                supported.join(" or "),
                found.map_or_else(|| "unknown".to_string(), |v| v.to_string())
            );
        }
        Err(e) => {
            error!("Failed to force the DirectX full screen color depth to 32-bit: {}", e);
        }
    }
}
