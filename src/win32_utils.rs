//! Win32 side of the plugin: module paths, primary display metrics, the
//! executable's version resource, process memory and the user32 window
//! calls.
//!
//! The user32 entry points are resolved by name from the already loaded
//! `user32.dll` instead of through import bindings, so the exact addresses
//! the host calls are the ones the window detours attach to.

use std::{
    ffi::{OsString, c_void},
    os::windows::ffi::{OsStrExt, OsStringExt},
    path::{Path, PathBuf},
    ptr,
};

use anyhow::{Context, Result, bail};
use libloading::os::windows::{Library, Symbol};
use log::{debug, warn};
use windows::{
    Win32::{
        Foundation::{HMODULE, MAX_PATH},
        Storage::FileSystem::{
            GetFileVersionInfoSizeW, GetFileVersionInfoW, VS_FIXEDFILEINFO, VerQueryValueW,
        },
        System::{
            LibraryLoader::{
                GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
                GetModuleFileNameW, GetModuleHandleExW,
            },
            Memory::{PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtect},
        },
        UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN},
    },
    core::{PCWSTR, w},
};

use crate::compat::ProcessMemory;
use crate::error::GraphicsOptionsError;
use crate::host::HostEnvironment;
use crate::settings::ScreenSize;
use crate::window_hooks::{CreateWindowRequest, WindowFactory, WindowHandle};

pub type CreateWindowExAFn = unsafe extern "system" fn(
    u32,
    *const u8,
    *const u8,
    u32,
    i32,
    i32,
    i32,
    i32,
    isize,
    isize,
    isize,
    *mut c_void,
) -> isize;
pub type SetWindowPosFn = unsafe extern "system" fn(isize, isize, i32, i32, i32, i32, u32) -> i32;
pub type ShowWindowFn = unsafe extern "system" fn(isize, i32) -> i32;
pub type GetWindowLongAFn = unsafe extern "system" fn(isize, i32) -> i32;
pub type SetWindowLongAFn = unsafe extern "system" fn(isize, i32, i32) -> i32;

const GWL_STYLE: i32 = -16;

/// Window functions exported by user32.
#[allow(non_snake_case)]
pub struct User32 {
    pub CreateWindowExA: CreateWindowExAFn,
    pub SetWindowPos: SetWindowPosFn,
    pub ShowWindow: ShowWindowFn,
    pub GetWindowLongA: GetWindowLongAFn,
    pub SetWindowLongA: SetWindowLongAFn,
}

impl User32 {
    #[allow(non_snake_case)]
    pub fn load() -> Result<Self> {
        let lib = Library::open_already_loaded("user32.dll").context("user32.dll is not loaded")?;

        unsafe {
            let CreateWindowExA: Symbol<CreateWindowExAFn> =
                lib.get(b"CreateWindowExA\0").context("Missing symbol: CreateWindowExA")?;
            let SetWindowPos: Symbol<SetWindowPosFn> =
                lib.get(b"SetWindowPos\0").context("Missing symbol: SetWindowPos")?;
            let ShowWindow: Symbol<ShowWindowFn> =
                lib.get(b"ShowWindow\0").context("Missing symbol: ShowWindow")?;
            let GetWindowLongA: Symbol<GetWindowLongAFn> =
                lib.get(b"GetWindowLongA\0").context("Missing symbol: GetWindowLongA")?;
            let SetWindowLongA: Symbol<SetWindowLongAFn> =
                lib.get(b"SetWindowLongA\0").context("Missing symbol: SetWindowLongA")?;

            let user32 = Self {
                CreateWindowExA: *CreateWindowExA,
                SetWindowPos: *SetWindowPos,
                ShowWindow: *ShowWindow,
                GetWindowLongA: *GetWindowLongA,
                SetWindowLongA: *SetWindowLongA,
            };

            // keep user32 pinned for the life of the process
            std::mem::forget(lib);
            Ok(user32)
        }
    }
}

/// Calls straight into user32. Calls made while the window detours are
/// enabled go through them like any other caller's.
pub struct Win32WindowFactory {
    user32: User32,
}

impl Win32WindowFactory {
    pub fn new() -> Result<Self> {
        Ok(Self { user32: User32::load()? })
    }
}

impl WindowFactory for Win32WindowFactory {
    fn create_window(&mut self, request: &CreateWindowRequest<'_>) -> WindowHandle {
        // Both strings must be NUL terminated for user32.
        let class = request.class_name.map(nul_terminated);
        let title = request.window_name.map(nul_terminated);
        let hwnd = unsafe {
            (self.user32.CreateWindowExA)(
                request.ex_style,
                class.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
                title.as_ref().map_or(ptr::null(), |t| t.as_ptr()),
                request.style,
                request.x,
                request.y,
                request.width,
                request.height,
                0,
                0,
                0,
                ptr::null_mut(),
            )
        };
        WindowHandle(hwnd)
    }

    fn set_window_pos(
        &mut self,
        window: WindowHandle,
        insert_after: WindowHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        flags: u32,
    ) -> bool {
        unsafe { (self.user32.SetWindowPos)(window.0, insert_after.0, x, y, width, height, flags) != 0 }
    }

    fn show_window(&mut self, window: WindowHandle, command: i32) -> bool {
        unsafe { (self.user32.ShowWindow)(window.0, command) != 0 }
    }

    fn window_style(&self, window: WindowHandle) -> u32 {
        unsafe { (self.user32.GetWindowLongA)(window.0, GWL_STYLE) as u32 }
    }

    fn set_window_style(&mut self, window: WindowHandle, style: u32) {
        unsafe { (self.user32.SetWindowLongA)(window.0, GWL_STYLE, style as i32) };
    }

    fn primary_display_size(&self) -> ScreenSize {
        primary_display_size()
    }
}

fn nul_terminated(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().chain(std::iter::once(0)).collect()
}

/// Current resolution of the primary monitor.
pub fn primary_display_size() -> ScreenSize {
    let (cx, cy) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    ScreenSize::new(cx.max(0) as u32, cy.max(0) as u32)
}

fn module_file_name(module: Option<HMODULE>) -> Result<PathBuf> {
    let mut buf = [0u16; MAX_PATH as usize];
    let len = unsafe { GetModuleFileNameW(module, &mut buf) } as usize;
    if len == 0 {
        return Err(std::io::Error::last_os_error()).context("GetModuleFileNameW failed");
    }
    Ok(PathBuf::from(OsString::from_wide(&buf[..len])))
}

/// Returns the directory containing this DLL.
pub fn dll_directory() -> Result<PathBuf> {
    let mut hmod = HMODULE::default();
    unsafe {
        // Grab module handle by address of this function.
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            PCWSTR(dll_directory as *const () as _),
            &mut hmod,
        )
        .context("GetModuleHandleExW failed")?;
    }
    parent_folder(module_file_name(Some(hmod))?)
}

/// Returns the path of the host executable.
pub fn app_executable() -> Result<PathBuf> {
    module_file_name(None)
}

fn parent_folder(path: PathBuf) -> Result<PathBuf> {
    path.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("{} has no parent directory", path.display()))
}

/// Reads the build number, the third field of the file version, from an
/// executable's version resource: 1.1.641.0 yields 641.
pub fn file_build_number(path: &Path) -> Result<u16> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let file_name = PCWSTR(wide.as_ptr());

    unsafe {
        let size = GetFileVersionInfoSizeW(file_name, None);
        if size == 0 {
            bail!("{} has no version resource", path.display());
        }

        let mut data = vec![0u8; size as usize];
        GetFileVersionInfoW(file_name, None, size, data.as_mut_ptr() as *mut c_void)
            .with_context(|| format!("reading the version resource of {}", path.display()))?;

        let mut info: *mut c_void = ptr::null_mut();
        let mut len = 0u32;
        let found = VerQueryValueW(data.as_ptr() as *const c_void, w!("\\"), &mut info, &mut len);
        if !found.as_bool()
            || info.is_null()
            || (len as usize) < std::mem::size_of::<VS_FIXEDFILEINFO>()
        {
            bail!("{} has no fixed file version", path.display());
        }

        let fixed = &*(info as *const VS_FIXEDFILEINFO);
        Ok((fixed.dwFileVersionLS >> 16) as u16)
    }
}

/// The running SC4 process.
pub struct Win32HostEnvironment {
    executable: Option<PathBuf>,
}

impl Win32HostEnvironment {
    pub fn new() -> Self {
        let executable = app_executable()
            .map_err(|e| warn!("Unable to locate the SC4 executable: {:#}", e))
            .ok();
        Self { executable }
    }
}

impl HostEnvironment for Win32HostEnvironment {
    fn game_version(&self) -> Option<u16> {
        let exe = self.executable.as_deref()?;
        match file_build_number(exe) {
            Ok(version) => {
                debug!("Detected game version {}", version);
                Some(version)
            }
            Err(e) => {
                warn!("Unable to detect the game version: {:#}", e);
                None
            }
        }
    }

    fn app_folder(&self) -> PathBuf {
        self.executable
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Reads and patches the host's own image.
pub struct Win32ProcessMemory;

impl ProcessMemory for Win32ProcessMemory {
    fn read_byte(&self, address: usize) -> crate::error::Result<u8> {
        // Patch addresses are inside the executable image, which is always mapped.
        Ok(unsafe { ptr::read_volatile(address as *const u8) })
    }

    fn write_byte(&mut self, address: usize, value: u8) -> crate::error::Result<()> {
        let mut old = PAGE_PROTECTION_FLAGS::default();
        unsafe {
            // Allow the executable memory to be written to.
            VirtualProtect(
                address as *const c_void,
                std::mem::size_of::<u8>(),
                PAGE_EXECUTE_READWRITE,
                &mut old,
            )
            .map_err(|e| {
                GraphicsOptionsError::Patch(format!("VirtualProtect({:#x}) failed: {}", address, e))
            })?;
            ptr::write_volatile(address as *mut u8, value);
        }
        debug!("Patched {:#x} = {:#04x} (protection was {:#x})", address, value, old.0);
        Ok(())
    }
}
