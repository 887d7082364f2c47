// ── Win32 platform implementation ─────────────────────────────────────────────
//
// One of the few modules where `unsafe` code is permitted.  Every `unsafe`
// block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod lifecycle; // DllMain, BKC_OnStart, BKC_OnExit
pub mod window; // message-only window and its WndProc

pub(crate) mod debug; // OutputDebugStringW
pub(crate) mod exports; // GetProcAddress on the host executable
pub(crate) mod memory; // VirtualQuery check of reply buffers

// ── Shared helpers ────────────────────────────────────────────────────────────

use windows::Win32::Foundation::GetLastError;

use crate::error::PluginError;

/// Null-terminated UTF-16 copy of `s`.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Capture the current Win32 last-error code and wrap it in a `PluginError`.
///
/// Call immediately after a Win32 function that signals failure — `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
pub(crate) fn last_error(function: &'static str) -> PluginError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    PluginError::Win32 {
        function,
        code: code.0,
    }
}
