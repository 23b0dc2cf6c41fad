use core::sync::atomic::{AtomicBool, Ordering};

use tracing::error;
use windows::Win32::{
    Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
    Graphics::Gdi::{BLACK_BRUSH, GetStockObject, HBRUSH},
    System::LibraryLoader::GetModuleHandleW,
    UI::WindowsAndMessaging::{
        CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DestroyWindow,
        GetClientRect, IDC_ARROW, IsWindowVisible, LoadCursorW, RegisterClassExW, SW_HIDE,
        SW_SHOW, ShowWindow, WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_SIZE, WNDCLASSEXW,
        WS_OVERLAPPEDWINDOW,
    },
};
use windows_core::{HSTRING, PCWSTR, w};

use crate::{
    error::{PlatformError, PlatformResult},
    platform::PreviewWindow,
};

const WINDOW_CLASS: PCWSTR = w!("DesktopDuplicatorPreview");

static CLASS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// A top level preview window.
///
/// Closing the window only hides it, it is destroyed when dropped. Resizes are picked up by the
/// preview on its next present.
#[derive(Debug)]
pub struct Win32Window {
    hwnd: HWND,
}

impl Win32Window {
    pub(super) fn new(title: &str, size: [u32; 2]) -> PlatformResult<Self> {
        let instance = register_class()?;
        let title = HSTRING::from(title);

        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS,
                &title,
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                size[0] as i32,
                size[1] as i32,
                None,
                None,
                Some(instance),
                None,
            )
        }
        .map_err(|e| PlatformError::new(e, "CreateWindowExW"))?;

        Ok(Self { hwnd })
    }

    /// The window's handle.
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }
}

impl PreviewWindow for Win32Window {
    fn is_visible(&self) -> bool {
        unsafe { IsWindowVisible(self.hwnd) }.as_bool()
    }

    fn client_size(&self) -> [u32; 2] {
        let mut rect = RECT::default();

        if let Err(e) = unsafe { GetClientRect(self.hwnd, &mut rect) } {
            error!("Failed to get preview client area:\n{e}");
            return [0, 0];
        }

        [
            rect.left.abs_diff(rect.right),
            rect.top.abs_diff(rect.bottom),
        ]
    }

    fn set_visible(&self, visible: bool) {
        let command = if visible { SW_SHOW } else { SW_HIDE };

        // Returns the previous visibility, not an error.
        let _ = unsafe { ShowWindow(self.hwnd, command) };
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        if let Err(e) = unsafe { DestroyWindow(self.hwnd) } {
            error!("Failed to destroy preview window:\n{e}");
        }
    }
}

/// Registers the preview window class on first use.
fn register_class() -> PlatformResult<HINSTANCE> {
    let instance: HINSTANCE = unsafe { GetModuleHandleW(None) }
        .map_err(|e| PlatformError::new(e, "GetModuleHandleW"))?
        .into();

    if CLASS_REGISTERED.load(Ordering::Acquire) {
        return Ok(instance);
    }

    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }
        .map_err(|e| PlatformError::new(e, "LoadCursorW"))?;

    let class = WNDCLASSEXW {
        cbSize: size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(window_procedure),
        hInstance: instance,
        hCursor: cursor,
        hbrBackground: HBRUSH(unsafe { GetStockObject(BLACK_BRUSH) }.0),
        lpszClassName: WINDOW_CLASS,
        ..Default::default()
    };

    if unsafe { RegisterClassExW(&class) } == 0 {
        let error = unsafe { GetLastError() };
        return Err(PlatformError::from_code(error.to_hresult().0, "RegisterClassExW"));
    }

    CLASS_REGISTERED.store(true, Ordering::Release);

    Ok(instance)
}

/// Holds no state, the preview reads everything it needs from the window when presenting.
unsafe extern "system" fn window_procedure(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match message {
        WM_CLOSE => {
            let _ = unsafe { ShowWindow(hwnd, SW_HIDE) };
            LRESULT(0)
        }
        WM_DESTROY | WM_SIZE => LRESULT(0),
        _ => unsafe { DefWindowProcW(hwnd, message, wparam, lparam) },
    }
}
