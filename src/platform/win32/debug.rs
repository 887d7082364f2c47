#![allow(unsafe_code)]

use windows::{core::PCWSTR, Win32::System::Diagnostics::Debug::OutputDebugStringW};

use super::wide;

/// Send one line to the OS debug channel.
pub(crate) fn output(line: &str) {
    let line = wide(line);
    // SAFETY: line is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the call.
    unsafe { OutputDebugStringW(PCWSTR(line.as_ptr())) };
}
