// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in the plug-in return `error::Result<T>`.  No
// panics in production paths; every exported entry point logs the error to
// the debug channel and degrades to a zero / FALSE return.

use thiserror::Error;

/// Every error the plug-in can produce.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The host executable does not export a function the plug-in needs.
    #[error("host does not export {name}")]
    MissingExport { name: String },

    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// IAccessible child IDs are 1-based; anything below that is a caller bug.
    #[error("invalid list child ID {0}")]
    InvalidChildId(i64),

    /// `BKA_GetNextMail` reported that no message follows the requested one.
    #[error("no next message after index {start}")]
    NoNextMessage { start: i32 },

    /// The host zero-fills a buffer that cannot hold the requested value.
    #[error("{what} does not fit in {capacity} bytes")]
    BufferTooShort { what: &'static str, capacity: usize },

    /// `BKA_GetCharSet` returned -1.
    #[error("host could not determine the character set")]
    CharsetUnavailable,

    /// The host returns an empty charset name for partially downloaded and
    /// mixed-charset multipart messages; the numeric code page is then only
    /// the system ANSI default.
    #[error("host returned an empty character set name")]
    EmptyCharsetName,

    /// The reply does not fit in the requester's buffer.
    #[error("reply of {len} bytes exceeds the {capacity}-byte reply buffer")]
    ReplyTooLarge { len: usize, capacity: usize },

    /// The reply address is not committed, writable memory of this process.
    #[error("reply buffer at {addr:#x} is not writable")]
    BadReplyBuffer { addr: usize },

    /// A request that needs a reply buffer arrived without one.
    #[error("request carries no reply buffer")]
    NoReplyBuffer,

    /// The configured log filter could not be parsed or applied.
    #[error("log filter: {0}")]
    LogFilter(String),

    /// A standard I/O error (settings file read, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON for `Settings`.
    #[error("settings: {0}")]
    Json(#[from] serde_json::Error),
}

// Convert a windows-crate error (HRESULT) directly into a PluginError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for PluginError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win32_code_is_shown_as_hex() {
        let e = PluginError::Win32 {
            function: "RegisterClassExW",
            code: 1410,
        };
        assert_eq!(e.to_string(), "RegisterClassExW failed (error 0x00000582)");
    }

    #[test]
    fn buffer_too_short_names_the_value() {
        let e = PluginError::BufferTooShort {
            what: "message ID",
            capacity: 256,
        };
        assert_eq!(e.to_string(), "message ID does not fit in 256 bytes");
    }
}
