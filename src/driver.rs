//! Catalog of the host's three graphics drivers.
//!
//! Each backend maps to a fixed descriptor: the class id the host uses to
//! select the driver, a display name, whether it renders in hardware, and
//! the class/title pair of the main window the driver creates.

use crate::constants::{GDRIVER_DIRECTX_CLSID, GDRIVER_OPENGL_CLSID, GDRIVER_SOFTWARE_CLSID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverBackend {
    DirectX,
    OpenGL,
    Software,
}

#[derive(Debug, PartialEq, Eq)]
pub struct DriverDescriptor {
    pub backend: DriverBackend,
    pub class_id: u32,
    pub display_name: &'static str,
    pub is_hardware_accelerated: bool,
    pub window_class: &'static [u8],
    pub window_title: &'static [u8],
}

static DRIVERS: [DriverDescriptor; 3] = [
    DriverDescriptor {
        backend: DriverBackend::DirectX,
        class_id: GDRIVER_DIRECTX_CLSID,
        display_name: "DirectX",
        is_hardware_accelerated: true,
        window_class: b"GDriverClass--DirectX",
        window_title: b"GDriverWindow--DirectX",
    },
    DriverDescriptor {
        backend: DriverBackend::OpenGL,
        class_id: GDRIVER_OPENGL_CLSID,
        display_name: "OpenGL",
        is_hardware_accelerated: true,
        window_class: b"GDriverClass--OpenGL",
        window_title: b"GDriverWindow--OpenGL",
    },
    DriverDescriptor {
        backend: DriverBackend::Software,
        class_id: GDRIVER_SOFTWARE_CLSID,
        display_name: "Software",
        is_hardware_accelerated: false,
        window_class: b"GDriverClass--Software",
        window_title: b"GDriverWindow--Software",
    },
];

impl DriverBackend {
    pub const ALL: [DriverBackend; 3] =
        [DriverBackend::DirectX, DriverBackend::OpenGL, DriverBackend::Software];

    pub fn descriptor(self) -> &'static DriverDescriptor {
        match self {
            DriverBackend::DirectX => &DRIVERS[0],
            DriverBackend::OpenGL => &DRIVERS[1],
            DriverBackend::Software => &DRIVERS[2],
        }
    }

    pub fn class_id(self) -> u32 {
        self.descriptor().class_id
    }

    pub fn name(self) -> &'static str {
        self.descriptor().display_name
    }

    pub fn is_hardware_accelerated(self) -> bool {
        self.descriptor().is_hardware_accelerated
    }

    /// Parses a `Driver` value. SC4 itself only looks at the first four
    /// letters of "Software", so any value starting with "Soft" selects it.
    pub fn from_config_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("DirectX") {
            Some(DriverBackend::DirectX)
        } else if value.eq_ignore_ascii_case("OpenGL") || value.eq_ignore_ascii_case("SCGL") {
            Some(DriverBackend::OpenGL)
        } else if starts_with_ignore_ascii_case(value, "Soft") {
            Some(DriverBackend::Software)
        } else {
            None
        }
    }

    pub fn from_class_id(class_id: u32) -> Option<Self> {
        DRIVERS.iter().find(|d| d.class_id == class_id).map(|d| d.backend)
    }
}

/// Returns the driver whose main window uses exactly this title and class.
///
/// The title is compared first: some windows the host creates pass an atom
/// instead of a class string, so `class_name` is only evaluated once the
/// title is known to belong to a driver window.
pub fn match_driver_window<'a>(
    window_title: Option<&[u8]>,
    class_name: impl FnOnce() -> Option<&'a [u8]>,
) -> Option<DriverBackend> {
    let title = window_title?;
    let driver = DRIVERS.iter().find(|d| d.window_title == title)?;
    let class = class_name()?;
    (driver.window_class == class).then_some(driver.backend)
}

pub(crate) fn starts_with_ignore_ascii_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
