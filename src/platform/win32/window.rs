// ── Message-only window ───────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the window class the NVDA add-on looks for.
//   • Create a message-only window (parent HWND_MESSAGE: never shown, never
//     enumerated, but reachable with FindWindowEx + SendMessage).
//   • Route protocol messages to `protocol::Responder`.
//   • Tear both down again on Drop.
//
// The host pumps messages on its UI thread, so the WndProc runs there too.

#![allow(unsafe_code)]

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassExW, UnregisterClassW,
            HMENU, HWND_MESSAGE, WINDOW_EX_STYLE, WINDOW_STYLE, WNDCLASSEXW,
        },
    },
};

use tracing::{debug, warn};

use super::{last_error, lifecycle, wide};
use crate::{error::Result, protocol};

// ── MessageWindow ─────────────────────────────────────────────────────────────

/// RAII owner of the registered class and the message-only window.
///
/// `DestroyWindow` and `UnregisterClassW` are called on `Drop`, in that order.
pub(crate) struct MessageWindow {
    hwnd: HWND,
    hinstance: HINSTANCE,
    /// Class and window name; must outlive the class registration.
    name: Vec<u16>,
}

impl MessageWindow {
    /// Register the class and create the window.
    pub(crate) fn create(hinstance: HINSTANCE) -> Result<Self> {
        let name = wide(protocol::WINDOW_NAME);
        register_class(hinstance, &name)?;

        match create_window(hinstance, &name) {
            Ok(hwnd) => {
                debug!(hwnd = ?hwnd.0, "created message window");
                Ok(Self {
                    hwnd,
                    hinstance,
                    name,
                })
            }
            Err(e) => {
                unregister_class(hinstance, &name);
                Err(e)
            }
        }
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        // SAFETY: hwnd was created by this struct on this thread and has not
        // been destroyed since.
        if let Err(e) = unsafe { DestroyWindow(self.hwnd) } {
            warn!(error = %crate::error::PluginError::from(e), "failed to destroy window");
        }
        unregister_class(self.hinstance, &self.name);
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE, name: &[u16]) -> Result<()> {
    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~80 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        lpszClassName: PCWSTR(name.as_ptr()),
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised; name is a null-terminated UTF-16
    // string that the caller keeps alive while the class is registered.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }
    Ok(())
}

fn unregister_class(hinstance: HINSTANCE, name: &[u16]) {
    // SAFETY: name is the null-terminated class name registered with
    // hinstance; no window of the class exists any more.
    if unsafe { UnregisterClassW(PCWSTR(name.as_ptr()), hinstance) }.is_err() {
        warn!(error = %last_error("UnregisterClassW"), "failed to unregister class");
    }
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE, name: &[u16]) -> Result<HWND> {
    // SAFETY: the class was just registered with hinstance; name is a valid
    // null-terminated string.  HWND_MESSAGE makes this a message-only window,
    // so size, position and style are irrelevant.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            PCWSTR(name.as_ptr()),
            PCWSTR(name.as_ptr()),
            WINDOW_STYLE(0),
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(|_| last_error("CreateWindowExW"))?;
    Ok(hwnd)
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some(responder) = lifecycle::responder() {
        // SAFETY: the responder only writes to addresses memory::is_writable
        // has checked against this process's address-space map.
        if let Some(ret) = unsafe { responder.handle(msg, wparam.0, lparam.0) } {
            return LRESULT(ret);
        }
    }

    // Default processing for all other messages.
    // SAFETY: hwnd and message parameters are valid — provided by Windows.
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

#[cfg(test)]
mod tests {
    use windows::Win32::UI::WindowsAndMessaging::WM_USER;

    use crate::protocol;

    #[test]
    fn protocol_base_is_wm_user() {
        assert_eq!(protocol::WM_USER, WM_USER);
    }
}
