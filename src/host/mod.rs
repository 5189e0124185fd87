//! Win32 host glue
//!
//! Everything in here talks to the OS. The pure logic it drives lives in
//! `interaction`, `render`, `slot` and `theme`.

pub mod appearance;
pub mod gdi_text;
pub mod injection;
pub mod layered;
pub mod timers;
pub mod tray;
pub mod widget;

use std::cell::RefCell;
use std::mem;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{GetLastError, COLORREF, ERROR_CLASS_ALREADY_EXISTS, HWND, RECT};
use windows::Win32::Graphics::Gdi::HBRUSH;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongPtrW, LoadCursorW, RegisterClassExW, GWLP_USERDATA, HICON, IDC_ARROW, WM_APP,
    WNDCLASSEXW, WNDPROC,
};

use crate::error::{OverlayError, Result};
use crate::render::surface::{Argb, Rect};

/// Posted by the fetch thread when a new menu is waiting in the channel
pub const WM_APP_MENU_UPDATED: u32 = WM_APP + 1;

/// Null-terminated UTF-16 copy of `s`
pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

pub fn rect_from_win32(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top)
}

/// GDI stores colors as 0x00BBGGRR
pub fn argb_from_colorref(color: COLORREF) -> Argb {
    let c = color.0;
    Argb::new(255, (c & 0xFF) as u8, ((c >> 8) & 0xFF) as u8, ((c >> 16) & 0xFF) as u8)
}

pub fn colorref_from_argb(color: Argb) -> COLORREF {
    COLORREF(color.r() as u32 | (color.g() as u32) << 8 | (color.b() as u32) << 16)
}

/// Display scale of `hwnd`, 1.0 at 96 DPI
pub fn dpi_scale(hwnd: HWND) -> f32 {
    let dpi = unsafe { GetDpiForWindow(hwnd) };
    if dpi == 0 {
        1.0
    } else {
        dpi as f32 / 96.0
    }
}

/// Register a window class for `wndproc`. Re-registering is not an error.
pub fn register_class(class_name: &str, wndproc: WNDPROC) -> Result<()> {
    let class = wide(class_name);
    unsafe {
        let hinstance = GetModuleHandleW(None).map_err(|e| OverlayError::WindowCreation(e.to_string()))?;
        let wc = WNDCLASSEXW {
            cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: wndproc,
            hInstance: hinstance.into(),
            hIcon: HICON::default(),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hbrBackground: HBRUSH::default(),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: PCWSTR(class.as_ptr()),
            ..Default::default()
        };

        if RegisterClassExW(&wc) == 0 && GetLastError() != ERROR_CLASS_ALREADY_EXISTS {
            return Err(OverlayError::WindowCreation(format!(
                "RegisterClassExW failed for {}",
                class_name
            )));
        }
    }
    Ok(())
}

/// Run `f` on the `RefCell<S>` boxed into `hwnd`'s `GWLP_USERDATA`. `None`
/// when nothing is stored yet or a message arrives re-entrantly while the
/// state is borrowed.
///
/// # Safety
/// The user data of `hwnd` must be 0 or a live `Box<RefCell<S>>` pointer.
pub unsafe fn with_userdata<S, T>(hwnd: HWND, f: impl FnOnce(&mut S) -> T) -> Option<T> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const RefCell<S>;
    if ptr.is_null() {
        return None;
    }
    let Ok(mut state) = (*ptr).try_borrow_mut() else {
        tracing::trace!("Skipping re-entrant window message");
        return None;
    };
    Some(f(&mut state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, SetWindowLongPtrW, HMENU, WINDOW_EX_STYLE,
        WS_POPUP,
    };

    unsafe extern "system" fn plain_wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        DefWindowProcW(hwnd, msg, wparam, lparam)
    }

    #[test]
    fn test_wide_is_nul_terminated() {
        assert_eq!(wide("500"), vec![0x35, 0x30, 0x30, 0]);
    }

    #[test]
    fn test_nested_userdata_access_is_refused() {
        let class = "Menu500TrackerUserDataTest";
        register_class(class, Some(plain_wndproc)).unwrap();
        let class_w = wide(class);

        unsafe {
            let hinstance = GetModuleHandleW(None).unwrap();
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                PCWSTR(class_w.as_ptr()),
                PCWSTR::null(),
                WS_POPUP,
                0,
                0,
                10,
                10,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            );
            assert_ne!(hwnd, HWND::default());

            assert_eq!(with_userdata::<u32, ()>(hwnd, |_| ()), None);

            let ptr = Box::into_raw(Box::new(RefCell::new(7u32)));
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, ptr as isize);

            let outcome = with_userdata::<u32, _>(hwnd, |outer| {
                *outer += 1;
                with_userdata::<u32, _>(hwnd, |inner| *inner += 100)
            });
            assert_eq!(outcome, Some(None));
            assert_eq!(with_userdata::<u32, _>(hwnd, |state| *state), Some(8));

            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            drop(Box::from_raw(ptr));
            let _ = DestroyWindow(hwnd);
        }
    }
}
