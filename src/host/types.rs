// ── Host ABI types ────────────────────────────────────────────────────────────
//
// Source of truth: the Becky! plug-in SDK header (BeckyApi.h).
// Plain C aliases keep the table free of `windows` types so the core builds
// and tests on every target; on Windows they are layout-identical to the
// Win32 types of the same name.

use std::ffi::{c_char, c_int, c_void};

/// `HWND`.
pub type Hwnd = *mut c_void;
/// Win32 `BOOL` (not `bool`: 4 bytes, any non-zero value is true).
pub type Bool = c_int;
/// `DWORD`.
pub type Dword = u32;
/// `UINT`.
pub type Uint = u32;
/// `LPARAM`.
pub type Lparam = isize;
/// `LPCSTR` / `LPCTSTR` (the host is an ANSI application).
pub type Pcstr = *const c_char;
/// `LPSTR`.
pub type Pstr = *mut c_char;
/// `LPVOID`.
pub type Pvoid = *mut c_void;

pub const FALSE: Bool = 0;

/// Callback passed to `BKA_RegisterCommand`.
pub type CommandCallback = unsafe extern "system" fn(Hwnd, Lparam);
/// Callback passed to `BKA_RegisterUICallback`.
pub type UiCallback = unsafe extern "system" fn(Hwnd, Lparam) -> Uint;

// ── Message status flags (`BKA_GetStatus`) ────────────────────────────────────

pub const MESSAGE_READ: Dword = 0x0000_0001;
pub const MESSAGE_FORWARDED: Dword = 0x0000_0002;
pub const MESSAGE_REPLIED: Dword = 0x0000_0004;
pub const MESSAGE_ATTACHMENT: Dword = 0x0000_0008;
pub const MESSAGE_PARTIAL: Dword = 0x0000_0100;
pub const MESSAGE_REDIRECT: Dword = 0x0000_0200;

/// Status word of a single message, as returned by `BKA_GetStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStatus(pub Dword);

impl MessageStatus {
    pub fn is_read(self) -> bool {
        self.0 & MESSAGE_READ != 0
    }

    pub fn is_forwarded(self) -> bool {
        self.0 & MESSAGE_FORWARDED != 0
    }

    pub fn is_replied(self) -> bool {
        self.0 & MESSAGE_REPLIED != 0
    }

    pub fn has_attachment(self) -> bool {
        self.0 & MESSAGE_ATTACHMENT != 0
    }

    /// Only part of the message has been downloaded.
    pub fn is_partial(self) -> bool {
        self.0 & MESSAGE_PARTIAL != 0
    }

    pub fn is_redirected(self) -> bool {
        self.0 & MESSAGE_REDIRECT != 0
    }
}
