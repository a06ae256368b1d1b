//! Borderless full screen support for SC4's main window.
//!
//! SC4's preferences only know windowed and exclusive full screen, so the
//! borderless mode is produced by rewriting the calls the host makes while
//! creating and showing its main window:
//!
//! - **create**: a driver main window gets `WS_VISIBLE | WS_POPUP |
//!   WS_MAXIMIZE` at (0,0) with the primary display size, and its handle
//!   is remembered.
//! - **set position**: moves and resizes of that window are suppressed,
//!   its geometry is already correct.
//! - **show**: that window is always shown maximized.
//!
//! Every other window passes through untouched. The policy lives in
//! [`InterceptorState`]; [`InterceptingWindowFactory`] applies it to any
//! [`WindowFactory`], and on Windows the `detours` module applies it to
//! the real user32 entry points.

#[cfg(windows)]
pub mod detours;

use log::{debug, info};

use crate::constants::{
    HWND_TOP, SW_MAXIMIZE, SW_SHOWMAXIMIZED, SWP_FRAMECHANGED, SWP_NOMOVE, SWP_NOSIZE,
    WS_MAXIMIZE, WS_OVERLAPPEDWINDOW, WS_POPUP, WS_VISIBLE,
};
use crate::driver::match_driver_window;
use crate::error::{GraphicsOptionsError, Result};
use crate::settings::{ScreenSize, WindowMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The parameters of a `CreateWindowExA` call the policy may rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWindowRequest<'a> {
    pub ex_style: u32,
    pub class_name: Option<&'a [u8]>,
    pub window_name: Option<&'a [u8]>,
    pub style: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The window management calls SC4 makes for its main window.
pub trait WindowFactory {
    fn create_window(&mut self, request: &CreateWindowRequest<'_>) -> WindowHandle;

    #[allow(clippy::too_many_arguments)]
    fn set_window_pos(
        &mut self,
        window: WindowHandle,
        insert_after: WindowHandle,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        flags: u32,
    ) -> bool;

    fn show_window(&mut self, window: WindowHandle, command: i32) -> bool;

    fn window_style(&self, window: WindowHandle) -> u32;
    fn set_window_style(&mut self, window: WindowHandle, style: u32);

    fn primary_display_size(&self) -> ScreenSize;
}

/// State shared by the intercepted calls while interception is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptorState {
    window_mode: WindowMode,
    main_window: Option<WindowHandle>,
}

impl InterceptorState {
    pub fn new(window_mode: WindowMode) -> Self {
        Self { window_mode, main_window: None }
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window_mode
    }

    pub fn main_window(&self) -> Option<WindowHandle> {
        self.main_window
    }

    fn is_borderless(&self) -> bool {
        self.window_mode == WindowMode::BorderlessFullScreen
    }

    fn is_main_window(&self, window: WindowHandle) -> bool {
        self.main_window == Some(window)
    }

    /// Rewrites `request` if it creates a driver main window. `class_name` is
    /// only read after the title matched. Returns whether it matched, in
    /// which case the created handle must be passed to [`Self::track_main_window`].
    pub fn prepare_create<'a>(
        &self,
        window_name: Option<&[u8]>,
        class_name: impl FnOnce() -> Option<&'a [u8]>,
        request: &mut CreateWindowRequest<'_>,
        display: impl FnOnce() -> ScreenSize,
    ) -> bool {
        let Some(driver) = match_driver_window(window_name, class_name) else {
            return false;
        };

        if self.is_borderless() {
            // WS_MAXIMIZE makes the OS hide the task bar; SC4 does not always
            // call ShowWindow on start up.
            let screen = display();
            request.style = WS_VISIBLE | WS_POPUP | WS_MAXIMIZE;
            request.x = 0;
            request.y = 0;
            request.width = screen.width as i32;
            request.height = screen.height as i32;
            debug!(
                "Creating the {} main window borderless at {}x{}",
                driver.name(),
                screen.width,
                screen.height
            );
        }
        true
    }

    /// The most recent driver window wins. A failed creation (null handle)
    /// clears the tracked window.
    pub fn track_main_window(&mut self, window: WindowHandle) {
        if window.is_null() {
            debug!("Main window creation failed, no window tracked");
            self.main_window = None;
        } else {
            debug!("Tracking main window {:?}", window);
            self.main_window = Some(window);
        }
    }

    pub fn adjust_window_pos_flags(&self, window: WindowHandle, flags: u32) -> u32 {
        if self.is_main_window(window) && self.is_borderless() {
            flags | SWP_NOMOVE | SWP_NOSIZE
        } else {
            flags
        }
    }

    pub fn adjust_show_command(&self, window: WindowHandle, command: i32) -> i32 {
        if self.is_main_window(window) && self.is_borderless() {
            SW_SHOWMAXIMIZED
        } else {
            command
        }
    }
}

/// Applies the interception policy in front of another [`WindowFactory`],
/// for hosts whose window calls can be substituted directly.
pub struct InterceptingWindowFactory<F> {
    inner: F,
    state: InterceptorState,
}

impl<F: WindowFactory> InterceptingWindowFactory<F> {
    pub fn new(inner: F, window_mode: WindowMode) -> Self {
        Self { inner, state: InterceptorState::new(window_mode) }
    }

    pub fn state(&self) -> &InterceptorState {
        &self.state
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: WindowFactory> WindowFactory for InterceptingWindowFactory<F> {
    fn create_window(&mut self, request: &CreateWindowRequest<'_>) -> WindowHandle {
        let mut request = request.clone();
        let (window_name, class_name) = (request.window_name, request.class_name);
        let inner = &self.inner;
        let matched = self.state.prepare_create(
            window_name,
            || class_name,
            &mut request,
            || inner.primary_display_size(),
        );

        let window = self.inner.create_window(&request);
        if matched {
            self.state.track_main_window(window);
        }
        window
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
        let flags = self.state.adjust_window_pos_flags(window, flags);
        self.inner.set_window_pos(window, insert_after, x, y, width, height, flags)
    }

    fn show_window(&mut self, window: WindowHandle, command: i32) -> bool {
        let command = self.state.adjust_show_command(window, command);
        self.inner.show_window(window, command)
    }

    fn window_style(&self, window: WindowHandle) -> u32 {
        self.inner.window_style(window)
    }

    fn set_window_style(&mut self, window: WindowHandle, style: u32) {
        self.inner.set_window_style(window, style)
    }

    fn primary_display_size(&self) -> ScreenSize {
        self.inner.primary_display_size()
    }
}

/// Mechanism that attaches the interception to the host's window calls.
/// `attach` and `detach` each cover all three calls or none of them.
pub trait InterceptionBackend {
    fn attach(&mut self, state: InterceptorState) -> Result<()>;
    fn detach(&mut self) -> Result<()>;
    /// Snapshot of the live state, if attached.
    fn state(&self) -> Option<InterceptorState>;
}

/// Installs and removes window interception as a single unit.
pub struct WindowInterceptor<B: InterceptionBackend> {
    backend: B,
    installed: bool,
}

impl<B: InterceptionBackend> WindowInterceptor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, installed: false }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn install(&mut self, window_mode: WindowMode) -> Result<()> {
        if self.installed {
            return Err(GraphicsOptionsError::Hook("already installed".into()));
        }
        self.backend.attach(InterceptorState::new(window_mode))?;
        self.installed = true;
        info!("Installed the window creation hooks ({:?}).", window_mode);
        Ok(())
    }

    pub fn remove(&mut self) -> Result<()> {
        if !self.installed {
            return Err(GraphicsOptionsError::Hook("not installed".into()));
        }
        self.backend.detach()?;
        self.installed = false;
        info!("Removed the window creation hooks.");
        Ok(())
    }

    pub fn main_window(&self) -> Option<WindowHandle> {
        self.backend.state().and_then(|s| s.main_window())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Turns an already created main window into a borderless full screen one.
pub fn convert_to_borderless(factory: &mut dyn WindowFactory, window: WindowHandle) {
    let style = (factory.window_style(window) & !WS_OVERLAPPEDWINDOW) | WS_POPUP;
    factory.set_window_style(window, style);

    // SC4 does not set any extended window styles.
    let screen = factory.primary_display_size();
    factory.set_window_pos(
        window,
        WindowHandle(HWND_TOP),
        0,
        0,
        screen.width as i32,
        screen.height as i32,
        SWP_FRAMECHANGED,
    );
    factory.show_window(window, SW_MAXIMIZE);
    debug!("Converted main window {:?} to borderless full screen", window);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVER_CLASS: &[u8] = b"GDriverClass--DirectX";
    const DRIVER_TITLE: &[u8] = b"GDriverWindow--DirectX";
    const SCREEN: ScreenSize = ScreenSize::new(2560, 1440);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create { style: u32, x: i32, y: i32, width: i32, height: i32, ex_style: u32 },
        SetPos { window: WindowHandle, x: i32, y: i32, width: i32, height: i32, flags: u32 },
        Show { window: WindowHandle, command: i32 },
        SetStyle { window: WindowHandle, style: u32 },
    }

    #[derive(Default)]
    struct RecordingFactory {
        calls: Vec<Call>,
        next_handle: isize,
        style: u32,
    }

    impl WindowFactory for RecordingFactory {
        fn create_window(&mut self, r: &CreateWindowRequest<'_>) -> WindowHandle {
            self.calls.push(Call::Create {
                style: r.style,
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                ex_style: r.ex_style,
            });
            self.next_handle += 0x10;
            WindowHandle(self.next_handle)
        }

        fn set_window_pos(
            &mut self,
            window: WindowHandle,
            _insert_after: WindowHandle,
            x: i32,
            y: i32,
            width: i32,
            height: i32,
            flags: u32,
        ) -> bool {
            self.calls.push(Call::SetPos { window, x, y, width, height, flags });
            true
        }

        fn show_window(&mut self, window: WindowHandle, command: i32) -> bool {
            self.calls.push(Call::Show { window, command });
            true
        }

        fn window_style(&self, _window: WindowHandle) -> u32 {
            self.style
        }

        fn set_window_style(&mut self, window: WindowHandle, style: u32) {
            self.style = style;
            self.calls.push(Call::SetStyle { window, style });
        }

        fn primary_display_size(&self) -> ScreenSize {
            SCREEN
        }
    }

    fn request<'a>(class: &'a [u8], title: &'a [u8]) -> CreateWindowRequest<'a> {
        CreateWindowRequest {
            ex_style: 0,
            class_name: Some(class),
            window_name: Some(title),
            style: WS_OVERLAPPEDWINDOW,
            x: 100,
            y: 50,
            width: 1024,
            height: 768,
        }
    }

    #[test]
    fn borderless_rewrites_driver_window_creation() {
        let mut factory =
            InterceptingWindowFactory::new(RecordingFactory::default(), WindowMode::BorderlessFullScreen);
        let window = factory.create_window(&request(DRIVER_CLASS, DRIVER_TITLE));

        assert_eq!(factory.state().main_window(), Some(window));
        assert_eq!(
            factory.into_inner().calls,
            vec![Call::Create {
                style: WS_VISIBLE | WS_POPUP | WS_MAXIMIZE,
                x: 0,
                y: 0,
                width: 2560,
                height: 1440,
                ex_style: 0,
            }]
        );
    }

    #[test]
    fn unrelated_windows_pass_through_unchanged() {
        let mut factory =
            InterceptingWindowFactory::new(RecordingFactory::default(), WindowMode::BorderlessFullScreen);
        let unrelated = [
            request(b"SC4Splash", b"SimCity 4"),
            request(b"GDriverClass--OpenGL", DRIVER_TITLE),
            request(DRIVER_CLASS, b"GDriverWindow--directx"),
            CreateWindowRequest { class_name: None, ..request(DRIVER_CLASS, DRIVER_TITLE) },
        ];
        for r in &unrelated {
            factory.create_window(r);
        }
        assert_eq!(factory.state().main_window(), None);

        let expected = Call::Create {
            style: WS_OVERLAPPEDWINDOW,
            x: 100,
            y: 50,
            width: 1024,
            height: 768,
            ex_style: 0,
        };
        let calls = factory.into_inner().calls;
        assert_eq!(calls.len(), unrelated.len());
        assert!(calls.iter().all(|c| *c == expected));
    }

    #[test]
    fn other_modes_track_but_do_not_rewrite() {
        for mode in [WindowMode::Windowed, WindowMode::FullScreen] {
            let mut factory = InterceptingWindowFactory::new(RecordingFactory::default(), mode);
            let window = factory.create_window(&request(DRIVER_CLASS, DRIVER_TITLE));
            factory.set_window_pos(window, WindowHandle(0), 10, 10, 800, 600, 0);
            factory.show_window(window, 1);

            assert_eq!(factory.state().main_window(), Some(window));
            let calls = factory.into_inner().calls;
            assert!(matches!(calls[0], Call::Create { style: WS_OVERLAPPEDWINDOW, x: 100, .. }));
            assert!(matches!(calls[1], Call::SetPos { flags: 0, .. }));
            assert!(matches!(calls[2], Call::Show { command: 1, .. }));
        }
    }

    #[test]
    fn main_window_repositioning_is_suppressed() {
        let mut factory =
            InterceptingWindowFactory::new(RecordingFactory::default(), WindowMode::BorderlessFullScreen);
        let main = factory.create_window(&request(DRIVER_CLASS, DRIVER_TITLE));
        let other = factory.create_window(&request(b"tooltips_class32", b""));

        factory.set_window_pos(main, WindowHandle(0), 100, 100, 800, 600, 0x0004);
        factory.set_window_pos(other, WindowHandle(0), 100, 100, 800, 600, 0x0004);
        factory.show_window(main, 1);
        factory.show_window(other, 1);

        let calls = factory.into_inner().calls;
        assert_eq!(
            calls[2],
            Call::SetPos {
                window: main,
                x: 100,
                y: 100,
                width: 800,
                height: 600,
                flags: 0x0004 | SWP_NOMOVE | SWP_NOSIZE,
            }
        );
        assert_eq!(
            calls[3],
            Call::SetPos { window: other, x: 100, y: 100, width: 800, height: 600, flags: 0x0004 }
        );
        assert_eq!(calls[4], Call::Show { window: main, command: SW_SHOWMAXIMIZED });
        assert_eq!(calls[5], Call::Show { window: other, command: 1 });
    }

    #[test]
    fn latest_driver_window_replaces_the_tracked_handle() {
        let mut factory =
            InterceptingWindowFactory::new(RecordingFactory::default(), WindowMode::BorderlessFullScreen);
        let first = factory.create_window(&request(DRIVER_CLASS, DRIVER_TITLE));
        let second =
            factory.create_window(&request(b"GDriverClass--Software", b"GDriverWindow--Software"));

        assert_ne!(first, second);
        assert_eq!(factory.state().main_window(), Some(second));
        assert_eq!(factory.state().adjust_show_command(first, 1), 1);
    }

    #[test]
    fn failed_creation_clears_the_tracked_handle() {
        let mut state = InterceptorState::new(WindowMode::BorderlessFullScreen);
        state.track_main_window(WindowHandle(0x10));
        state.track_main_window(WindowHandle(0));

        assert_eq!(state.main_window(), None);
        assert_eq!(state.adjust_show_command(WindowHandle(0x10), 1), 1);
        assert_eq!(state.adjust_window_pos_flags(WindowHandle(0), 0), 0);
    }

    #[test]
    fn prepare_create_does_not_query_display_for_other_windows() {
        let state = InterceptorState::new(WindowMode::BorderlessFullScreen);
        let mut r = request(b"Edit", b"Name");
        let matched = state.prepare_create(
            r.window_name,
            || Some(b"Edit".as_slice()),
            &mut r,
            || panic!("display must not be queried"),
        );
        assert!(!matched);
    }

    #[test]
    fn converts_existing_window_to_borderless() {
        let mut factory = RecordingFactory {
            style: WS_OVERLAPPEDWINDOW | WS_VISIBLE,
            ..Default::default()
        };
        convert_to_borderless(&mut factory, WindowHandle(0x42));

        assert_eq!(
            factory.calls,
            vec![
                Call::SetStyle { window: WindowHandle(0x42), style: WS_VISIBLE | WS_POPUP },
                Call::SetPos {
                    window: WindowHandle(0x42),
                    x: 0,
                    y: 0,
                    width: 2560,
                    height: 1440,
                    flags: SWP_FRAMECHANGED,
                },
                Call::Show { window: WindowHandle(0x42), command: SW_MAXIMIZE },
            ]
        );
    }

    #[derive(Default)]
    struct FakeBackend {
        state: Option<InterceptorState>,
        fail_attach: bool,
        fail_detach: bool,
    }

    impl InterceptionBackend for FakeBackend {
        fn attach(&mut self, state: InterceptorState) -> Result<()> {
            if self.fail_attach {
                return Err(GraphicsOptionsError::Hook("attach".into()));
            }
            self.state = Some(state);
            Ok(())
        }

        fn detach(&mut self) -> Result<()> {
            if self.fail_detach {
                return Err(GraphicsOptionsError::Hook("detach".into()));
            }
            self.state = None;
            Ok(())
        }

        fn state(&self) -> Option<InterceptorState> {
            self.state
        }
    }

    #[test]
    fn install_and_remove_are_a_single_transition() {
        let mut interceptor = WindowInterceptor::new(FakeBackend::default());
        assert!(!interceptor.is_installed());
        assert!(interceptor.remove().is_err());

        interceptor.install(WindowMode::BorderlessFullScreen).unwrap();
        assert!(interceptor.is_installed());
        assert_eq!(
            interceptor.backend().state().map(|s| s.window_mode()),
            Some(WindowMode::BorderlessFullScreen)
        );
        assert!(interceptor.install(WindowMode::Windowed).is_err());

        assert_eq!(interceptor.main_window(), None);
        interceptor.backend.state.as_mut().unwrap().track_main_window(WindowHandle(0x77));
        assert_eq!(interceptor.main_window(), Some(WindowHandle(0x77)));

        interceptor.remove().unwrap();
        assert!(!interceptor.is_installed());
        assert_eq!(interceptor.backend().state(), None);
        assert_eq!(interceptor.main_window(), None);
    }

    #[test]
    fn failed_transitions_leave_the_state_unchanged() {
        let mut interceptor =
            WindowInterceptor::new(FakeBackend { fail_attach: true, ..Default::default() });
        assert!(interceptor.install(WindowMode::BorderlessFullScreen).is_err());
        assert!(!interceptor.is_installed());

        let mut interceptor =
            WindowInterceptor::new(FakeBackend { fail_detach: true, ..Default::default() });
        interceptor.install(WindowMode::BorderlessFullScreen).unwrap();
        assert!(interceptor.remove().is_err());
        assert!(interceptor.is_installed());
    }
}
