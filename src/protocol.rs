// ── Window-message protocol ───────────────────────────────────────────────────
//
// The NVDA add-on finds the plug-in's message-only window by class name and
// sends it one of the messages below with `SendMessage`.  `wParam` is always
// the IAccessible child ID of a row in the host's message list.
//
// Strings cannot travel in an `LRESULT`, so for string replies the add-on
// allocates `REPLY_BUFFER_LEN` bytes inside the host process
// (`VirtualAllocEx`) and passes that address as `lParam`; the plug-in runs in
// the same process and writes the NUL-terminated reply there.
//
// Any failure returns 0 and is logged to the debug channel.  Nothing is
// retried.
//
// `lParam` comes from whoever sent the message, so an address is only written
// after the platform's `BufferCheck` has accepted it.  Unsafe is permitted
// here for those writes.

#![allow(unsafe_code)]

use tracing::{debug, warn};

use crate::{
    config::Limits,
    error::{PluginError, Result},
    host::HostApi,
    query,
};

// ── Identity ──────────────────────────────────────────────────────────────────

/// Class and window name of the message-only window.
pub const WINDOW_NAME: &str = "becky2nvda";

/// Win32 `WM_USER`; private messages start here.
pub const WM_USER: u32 = 0x0400;

// ── Messages ──────────────────────────────────────────────────────────────────

/// Write the row's message ID into the buffer at `lParam`.
/// Returns the ID length in bytes, without the NUL.
pub const WM_GET_MESSAGE_ID: u32 = WM_USER + 1;
/// Return the row's Windows code page.  When `lParam` is non-zero, the
/// charset name is also written into the buffer it points to.
pub const WM_GET_MESSAGE_CHARSET: u32 = WM_USER + 2;
/// Return the row's status flags or'ed with `STATUS_VALID`.
pub const WM_GET_MESSAGE_STATUS: u32 = WM_USER + 3;

/// Size of every requester-allocated reply buffer, NUL included.
pub const REPLY_BUFFER_LEN: usize = 256;

/// Set on every successful status reply so that "no flags" is not 0.
pub const STATUS_VALID: isize = 0x4000_0000;

/// Decides whether `len` bytes at `addr` in this process may be written.
pub type BufferCheck = fn(addr: usize, len: usize) -> bool;

// ── Requests ──────────────────────────────────────────────────────────────────

/// A decoded protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    MessageId { child_id: i64, reply: usize },
    Charset { child_id: i64, reply: Option<usize> },
    Status { child_id: i64 },
}

impl Request {
    /// Decode a window message, or `None` when it is not part of the protocol.
    pub fn decode(msg: u32, wparam: usize, lparam: isize) -> Option<Self> {
        // Out-of-range IDs are caught by the query as invalid.
        let child_id = i64::try_from(wparam).unwrap_or(-1);
        let reply = lparam as usize;
        match msg {
            WM_GET_MESSAGE_ID => Some(Self::MessageId { child_id, reply }),
            WM_GET_MESSAGE_CHARSET => Some(Self::Charset {
                child_id,
                reply: (reply != 0).then_some(reply),
            }),
            WM_GET_MESSAGE_STATUS => Some(Self::Status { child_id }),
            _ => None,
        }
    }
}

/// Copy `bytes` plus a terminating NUL to the requester's buffer.
///
/// # Safety
///
/// Every address `writable` accepts must be valid for `REPLY_BUFFER_LEN`
/// bytes of writes that nothing else accesses for the duration of the call.
unsafe fn write_reply(writable: BufferCheck, addr: usize, bytes: &[u8]) -> Result<usize> {
    if addr == 0 {
        return Err(PluginError::NoReplyBuffer);
    }
    if !writable(addr, REPLY_BUFFER_LEN) {
        return Err(PluginError::BadReplyBuffer { addr });
    }
    if bytes.len() >= REPLY_BUFFER_LEN {
        return Err(PluginError::ReplyTooLarge {
            len: bytes.len(),
            capacity: REPLY_BUFFER_LEN,
        });
    }
    // SAFETY: addr passed `writable`, so per the caller's contract it is
    // valid for REPLY_BUFFER_LEN bytes; bytes.len() + 1 <= REPLY_BUFFER_LEN.
    let out = unsafe { std::slice::from_raw_parts_mut(addr as *mut u8, REPLY_BUFFER_LEN) };
    out[..bytes.len()].copy_from_slice(bytes);
    out[bytes.len()] = 0;
    Ok(bytes.len())
}

// ── Responder ─────────────────────────────────────────────────────────────────

/// Answers protocol requests against the bound host API.
pub struct Responder<'a> {
    api: &'a HostApi,
    limits: Limits,
    writable: BufferCheck,
}

impl<'a> Responder<'a> {
    pub fn new(api: &'a HostApi, limits: Limits, writable: BufferCheck) -> Self {
        Self {
            api,
            limits,
            writable,
        }
    }

    /// Handle a window message.  `None` means the message is not ours and
    /// should go to the default window procedure.
    ///
    /// # Safety
    ///
    /// The `BufferCheck` given to `new` must only accept addresses that are
    /// writable for the whole length asked about.  `lparam` itself may be
    /// anything.
    pub unsafe fn handle(&self, msg: u32, wparam: usize, lparam: isize) -> Option<isize> {
        let request = Request::decode(msg, wparam, lparam)?;
        // SAFETY: forwarded from this function's contract.
        let result = unsafe { self.answer(request) };
        Some(match result {
            Ok(value) => {
                debug!(?request, value, "answered request");
                value
            }
            Err(e) => {
                warn!(?request, error = %e, "request failed");
                0
            }
        })
    }

    /// Host buffer sizes for a request; anything that must land in a reply
    /// buffer is asked for no larger than that buffer.
    fn limits_for(&self, request: &Request) -> Limits {
        let mut limits = self.limits;
        match request {
            Request::MessageId { .. } => {
                limits.message_id_capacity = limits.message_id_capacity.min(REPLY_BUFFER_LEN);
            }
            Request::Charset { reply: Some(_), .. } => {
                limits.charset_name_capacity = limits.charset_name_capacity.min(REPLY_BUFFER_LEN);
            }
            Request::Charset { reply: None, .. } | Request::Status { .. } => {}
        }
        limits
    }

    /// # Safety
    ///
    /// See `handle`.
    unsafe fn answer(&self, request: Request) -> Result<isize> {
        let limits = self.limits_for(&request);
        match request {
            Request::MessageId { child_id, reply } => {
                let id = query::message_id(self.api, child_id, limits.message_id_capacity)?;
                // SAFETY: forwarded from the caller.
                let len = unsafe { write_reply(self.writable, reply, id.to_bytes()) }?;
                Ok(len as isize)
            }
            Request::Charset { child_id, reply } => {
                let cp = query::code_page(self.api, child_id, &limits)?;
                if let Some(addr) = reply {
                    // SAFETY: forwarded from the caller.
                    unsafe { write_reply(self.writable, addr, cp.name.as_bytes()) }?;
                }
                Ok(cp.id as isize)
            }
            Request::Status { child_id } => {
                let status = query::status(self.api, child_id, &limits)?;
                Ok(status.0 as isize | STATUS_VALID)
            }
        }
    }
}
