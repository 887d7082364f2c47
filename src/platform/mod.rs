// ── Platform layer ────────────────────────────────────────────────────────────
//
// The OS side of the plug-in: export lookup in the host executable, the
// debug-string channel, the message-only window and the DLL entry points.
// No `unsafe` lives here; all Win32 FFI is confined to the `win32`
// sub-module and never leaks outward.

#[cfg(windows)]
pub mod win32;
