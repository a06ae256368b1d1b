//! Inline detours on user32's `CreateWindowExA`, `SetWindowPos` and
//! `ShowWindow`. The detours live for the rest of the process once created;
//! installing and removing interception only enables and disables them.

use std::ffi::{CStr, c_char, c_void};

use log::{debug, error};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use retour::GenericDetour;

use super::{CreateWindowRequest, InterceptionBackend, InterceptorState, WindowHandle};
use crate::error::{GraphicsOptionsError, Result};
use crate::win32_utils::{
    CreateWindowExAFn, SetWindowPosFn, ShowWindowFn, User32, primary_display_size,
};

struct User32Detours {
    create_window: GenericDetour<CreateWindowExAFn>,
    set_window_pos: GenericDetour<SetWindowPosFn>,
    show_window: GenericDetour<ShowWindowFn>,
}

static DETOURS: OnceCell<User32Detours> = OnceCell::new();
static STATE: Mutex<Option<InterceptorState>> = parking_lot::const_mutex(None);

fn hook_error(call: &str, e: retour::Error) -> GraphicsOptionsError {
    GraphicsOptionsError::Hook(format!("{}: {}", call, e))
}

impl User32Detours {
    fn create() -> Result<Self> {
        let user32 = User32::load()?;
        unsafe {
            Ok(Self {
                create_window: GenericDetour::new(
                    user32.CreateWindowExA,
                    hook_create_window_ex_a as CreateWindowExAFn,
                )
                .map_err(|e| hook_error("CreateWindowExA", e))?,
                set_window_pos: GenericDetour::new(
                    user32.SetWindowPos,
                    hook_set_window_pos as SetWindowPosFn,
                )
                .map_err(|e| hook_error("SetWindowPos", e))?,
                show_window: GenericDetour::new(user32.ShowWindow, hook_show_window as ShowWindowFn)
                    .map_err(|e| hook_error("ShowWindow", e))?,
            })
        }
    }

    /// Enables all three detours, or none of them.
    fn enable_all(&self) -> Result<()> {
        unsafe {
            self.create_window.enable().map_err(|e| hook_error("CreateWindowExA", e))?;
            if let Err(e) = self.set_window_pos.enable() {
                let _ = self.create_window.disable();
                return Err(hook_error("SetWindowPos", e));
            }
            if let Err(e) = self.show_window.enable() {
                let _ = self.set_window_pos.disable();
                let _ = self.create_window.disable();
                return Err(hook_error("ShowWindow", e));
            }
        }
        Ok(())
    }

    /// Disables all three detours, or none of them.
    fn disable_all(&self) -> Result<()> {
        unsafe {
            self.show_window.disable().map_err(|e| hook_error("ShowWindow", e))?;
            if let Err(e) = self.set_window_pos.disable() {
                let _ = self.show_window.enable();
                return Err(hook_error("SetWindowPos", e));
            }
            if let Err(e) = self.create_window.disable() {
                let _ = self.set_window_pos.enable();
                let _ = self.show_window.enable();
                return Err(hook_error("CreateWindowExA", e));
            }
        }
        Ok(())
    }
}

/// Window names and class names may be atoms rather than strings.
unsafe fn c_string_bytes<'a>(ptr: *const u8) -> Option<&'a [u8]> {
    if (ptr as usize) <= 0xFFFF {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr as *const c_char) }.to_bytes())
}

fn current_state() -> Option<InterceptorState> {
    *STATE.lock()
}

unsafe extern "system" fn hook_create_window_ex_a(
    ex_style: u32,
    class_name: *const u8,
    window_name: *const u8,
    style: u32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    parent: isize,
    menu: isize,
    instance: isize,
    param: *mut c_void,
) -> isize {
    let Some(detours) = DETOURS.get() else {
        return 0;
    };

    // The lock is not held across the call, window creation re-enters
    // ShowWindow and SetWindowPos on the same thread.
    let state = current_state();
    let title = unsafe { c_string_bytes(window_name) };
    let mut request = CreateWindowRequest {
        ex_style,
        class_name: None,
        window_name: title,
        style,
        x,
        y,
        width,
        height,
    };
    let matched = state.is_some_and(|s| {
        s.prepare_create(
            title,
            || unsafe { c_string_bytes(class_name) },
            &mut request,
            primary_display_size,
        )
    });

    let hwnd = unsafe {
        detours.create_window.call(
            request.ex_style,
            class_name,
            window_name,
            request.style,
            request.x,
            request.y,
            request.width,
            request.height,
            parent,
            menu,
            instance,
            param,
        )
    };

    if matched {
        if let Some(state) = STATE.lock().as_mut() {
            state.track_main_window(WindowHandle(hwnd));
        }
    }
    hwnd
}

unsafe extern "system" fn hook_set_window_pos(
    hwnd: isize,
    insert_after: isize,
    x: i32,
    y: i32,
    cx: i32,
    cy: i32,
    flags: u32,
) -> i32 {
    let Some(detours) = DETOURS.get() else {
        return 0;
    };
    let flags = current_state()
        .map_or(flags, |s| s.adjust_window_pos_flags(WindowHandle(hwnd), flags));
    unsafe { detours.set_window_pos.call(hwnd, insert_after, x, y, cx, cy, flags) }
}

unsafe extern "system" fn hook_show_window(hwnd: isize, command: i32) -> i32 {
    let Some(detours) = DETOURS.get() else {
        return 0;
    };
    let command =
        current_state().map_or(command, |s| s.adjust_show_command(WindowHandle(hwnd), command));
    unsafe { detours.show_window.call(hwnd, command) }
}

/// [`InterceptionBackend`] patching the real user32 entry points.
#[derive(Debug, Default)]
pub struct DetourBackend;

impl DetourBackend {
    pub fn new() -> Self {
        Self
    }

    fn detours() -> Result<&'static User32Detours> {
        DETOURS.get_or_try_init(User32Detours::create)
    }
}

impl InterceptionBackend for DetourBackend {
    fn attach(&mut self, state: InterceptorState) -> Result<()> {
        let detours = Self::detours()?;
        // State first, a window may be created as soon as the detours are live.
        *STATE.lock() = Some(state);
        if let Err(e) = detours.enable_all() {
            *STATE.lock() = None;
            error!("Failed to enable the user32 detours: {}", e);
            return Err(e);
        }
        debug!("user32 detours enabled");
        Ok(())
    }

    fn detach(&mut self) -> Result<()> {
        let detours = DETOURS
            .get()
            .ok_or_else(|| GraphicsOptionsError::Hook("detours were never created".into()))?;
        detours.disable_all()?;
        *STATE.lock() = None;
        debug!("user32 detours disabled");
        Ok(())
    }

    fn state(&self) -> Option<InterceptorState> {
        current_state()
    }
}

