// ── Message property queries ──────────────────────────────────────────────────
//
// Everything the screen-reader add-on can ask about a message in the host's
// list view, expressed against `HostApi`.  The add-on identifies messages by
// IAccessible child ID (1-based row number); the host identifies them by a
// message-ID string.

#![allow(unsafe_code)]

use std::ffi::{c_int, CString};

use tracing::trace;

use crate::{
    config::Limits,
    error::{PluginError, Result},
    host::{
        types::{MessageStatus, FALSE},
        HostApi,
    },
};

/// Code page information of a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePage {
    /// Windows code page the host used to decode the list-view columns.
    pub id: i32,
    /// Charset name as written in the message source, e.g. `"ISO-2022-JP"`.
    pub name: String,
}

/// Bytes before the first NUL, or `None` when the buffer starts with one.
fn until_nul(buf: &[u8]) -> Option<&[u8]> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    (end > 0).then(|| &buf[..end])
}

fn buffer_len(capacity: usize) -> c_int {
    c_int::try_from(capacity).unwrap_or(c_int::MAX)
}

/// The host's message ID for list row `child_id`.
///
/// The host has no lookup by index, only `BKA_GetNextMail(start)`, which
/// returns the message *after* `start`.  Host indices are 0-based, so row
/// `child_id` is reached by starting from `child_id - 2`.
pub fn message_id(api: &HostApi, child_id: i64, capacity: usize) -> Result<CString> {
    if child_id < 1 {
        return Err(PluginError::InvalidChildId(child_id));
    }
    let start = c_int::try_from(child_id - 2).map_err(|_| PluginError::InvalidChildId(child_id))?;

    let mut buf = vec![0u8; capacity];
    // SAFETY: buf is writable for `capacity` bytes and outlives the call;
    // buffer_len never reports more than buf.len().
    let next = unsafe {
        (api.get_next_mail)(start, buf.as_mut_ptr().cast(), buffer_len(capacity), FALSE)
    };
    if next == -1 {
        return Err(PluginError::NoNextMessage { start });
    }

    // A buffer too short for the ID comes back zero-filled.
    let id = until_nul(&buf).ok_or(PluginError::BufferTooShort {
        what: "message ID",
        capacity,
    })?;
    trace!(child_id, id = %String::from_utf8_lossy(id), "resolved message ID");
    // until_nul stops at the first NUL, so `id` has none.
    CString::new(id).map_err(|_| PluginError::BufferTooShort {
        what: "message ID",
        capacity,
    })
}

/// Code page of the message in list row `child_id`.
///
/// The host reports the charset of the message *body*.  For a message that
/// is not fully downloaded, or a multipart message whose parts disagree, the
/// name comes back empty and the numeric ID is just the system ANSI default,
/// so that case is an error rather than a guess.
pub fn code_page(api: &HostApi, child_id: i64, limits: &Limits) -> Result<CodePage> {
    let id = message_id(api, child_id, limits.message_id_capacity)?;

    let capacity = limits.charset_name_capacity;
    let mut name = vec![0u8; capacity];
    // SAFETY: id is NUL-terminated; name is writable for `capacity` bytes.
    let cp = unsafe {
        (api.get_char_set)(id.as_ptr(), name.as_mut_ptr().cast(), buffer_len(capacity))
    };
    if cp == -1 {
        return Err(PluginError::CharsetUnavailable);
    }

    // Names that do not fit are silently truncated by the host.
    let name = until_nul(&name).ok_or(PluginError::EmptyCharsetName)?;
    Ok(CodePage {
        id: cp,
        name: String::from_utf8_lossy(name).into_owned(),
    })
}

/// Status flags of the message in list row `child_id`.
pub fn status(api: &HostApi, child_id: i64, limits: &Limits) -> Result<MessageStatus> {
    let id = message_id(api, child_id, limits.message_id_capacity)?;
    // SAFETY: id is a NUL-terminated message ID that outlives the call.
    let flags = unsafe { (api.get_status)(id.as_ptr()) };
    Ok(MessageStatus(flags))
}
