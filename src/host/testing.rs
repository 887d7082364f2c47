// ── Test host ─────────────────────────────────────────────────────────────────
//
// A stand-in for the host executable: `FakeExports` resolves every export
// name, and `HostStub` backs the handful of exports the plug-in actually
// calls with thread-local state.  Each test runs on its own thread, so tests
// never see each other's stub state.

#![allow(unsafe_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::{c_int, c_void, CStr, CString},
    ptr::NonNull,
};

use super::{
    symbols::{RawSymbol, SymbolSource},
    types::{Bool, Dword, Pcstr, Pstr},
    OPTIONAL_EXPORTS, REQUIRED_EXPORTS, VERSIONED_EXPORTS,
};

/// What `BKA_GetNextMail` does on the next call.
#[derive(Debug, Clone)]
pub(crate) enum NextMail {
    /// Write this ID and return the index after `start`.
    Id(String),
    /// Return -1: no message follows.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NextMailCall {
    pub(crate) start: c_int,
    pub(crate) capacity: c_int,
    pub(crate) selected: Bool,
}

struct StubState {
    version: CString,
    data_folder: CString,
    next_mail: NextMail,
    charset: Option<(c_int, String)>,
    status: Dword,
    next_mail_calls: Vec<NextMailCall>,
    /// Message IDs passed to `BKA_GetCharSet` / `BKA_GetStatus`.
    queried_ids: Vec<String>,
}

thread_local! {
    static STATE: RefCell<Option<StubState>> = const { RefCell::new(None) };
}

fn with_state<R>(f: impl FnOnce(&mut StubState) -> R) -> R {
    STATE.with(|s| {
        let mut s = s.borrow_mut();
        let state = s.as_mut().expect("HostStub not installed on this thread");
        f(state)
    })
}

/// Installs stub host state for the current thread; removed on drop.
pub(crate) struct HostStub(());

impl HostStub {
    pub(crate) fn new(version: &str) -> Self {
        STATE.with(|s| {
            *s.borrow_mut() = Some(StubState {
                version: CString::new(version).expect("version"),
                data_folder: CString::new("").expect("folder"),
                next_mail: NextMail::Id("<1@example.org>".to_owned()),
                charset: Some((65001, "UTF-8".to_owned())),
                status: 0,
                next_mail_calls: Vec::new(),
                queried_ids: Vec::new(),
            });
        });
        Self(())
    }

    pub(crate) fn with_data_folder(self, folder: &str) -> Self {
        with_state(|s| s.data_folder = CString::new(folder).expect("folder"));
        self
    }

    pub(crate) fn with_next_mail(self, next: NextMail) -> Self {
        with_state(|s| s.next_mail = next);
        self
    }

    pub(crate) fn with_charset(self, charset: Option<(c_int, &str)>) -> Self {
        with_state(|s| s.charset = charset.map(|(cp, name)| (cp, name.to_owned())));
        self
    }

    pub(crate) fn with_status(self, status: Dword) -> Self {
        with_state(|s| s.status = status);
        self
    }

    pub(crate) fn next_mail_calls(&self) -> Vec<NextMailCall> {
        with_state(|s| s.next_mail_calls.clone())
    }

    pub(crate) fn queried_ids(&self) -> Vec<String> {
        with_state(|s| s.queried_ids.clone())
    }
}

impl Drop for HostStub {
    fn drop(&mut self) {
        STATE.with(|s| *s.borrow_mut() = None);
    }
}

// ── Stub exports ──────────────────────────────────────────────────────────────

unsafe extern "system" fn unused_export() {
    panic!("test called a host export that has no stub");
}

unsafe extern "system" fn get_version() -> Pcstr {
    with_state(|s| s.version.as_ptr())
}

unsafe extern "system" fn get_data_folder() -> Pcstr {
    with_state(|s| s.data_folder.as_ptr())
}

/// Copy `value` plus a NUL into `buf`, or zero-fill `buf` when it does not
/// fit, the way the host does.
unsafe fn write_host_string(value: &str, buf: Pstr, capacity: c_int) {
    let capacity = usize::try_from(capacity).unwrap_or(0);
    // SAFETY: the plug-in passes a writable buffer of `capacity` bytes.
    let out = unsafe { std::slice::from_raw_parts_mut(buf.cast::<u8>(), capacity) };
    out.fill(0);
    if value.len() < capacity {
        out[..value.len()].copy_from_slice(value.as_bytes());
    }
}

unsafe extern "system" fn get_next_mail(
    start: c_int,
    buf: Pstr,
    capacity: c_int,
    selected: Bool,
) -> c_int {
    let next = with_state(|s| {
        s.next_mail_calls.push(NextMailCall {
            start,
            capacity,
            selected,
        });
        s.next_mail.clone()
    });
    match next {
        NextMail::Id(id) => {
            // SAFETY: forwarded from the caller's buffer contract.
            unsafe { write_host_string(&id, buf, capacity) };
            start + 1
        }
        NextMail::End => -1,
    }
}

unsafe fn record_id(id: Pcstr) {
    // SAFETY: the plug-in always passes a NUL-terminated message ID.
    let id = unsafe { CStr::from_ptr(id) }.to_string_lossy().into_owned();
    with_state(|s| s.queried_ids.push(id));
}

unsafe extern "system" fn get_char_set(id: Pcstr, buf: Pstr, capacity: c_int) -> c_int {
    // SAFETY: see record_id.
    unsafe { record_id(id) };
    match with_state(|s| s.charset.clone()) {
        Some((cp, name)) => {
            // The host truncates rather than zero-filling charset names.
            let capacity_usize = usize::try_from(capacity).unwrap_or(0);
            let truncated = &name[..name.len().min(capacity_usize.saturating_sub(1))];
            // SAFETY: forwarded from the caller's buffer contract.
            unsafe { write_host_string(truncated, buf, capacity) };
            cp
        }
        None => -1,
    }
}

unsafe extern "system" fn get_status(id: Pcstr) -> Dword {
    // SAFETY: see record_id.
    unsafe { record_id(id) };
    with_state(|s| s.status)
}

fn raw(f: *const c_void) -> RawSymbol {
    NonNull::new(f.cast_mut()).expect("function address is never null")
}

// ── FakeExports ───────────────────────────────────────────────────────────────

/// A `SymbolSource` that knows every host export.
pub(crate) struct FakeExports {
    symbols: HashMap<&'static CStr, RawSymbol>,
}

impl FakeExports {
    /// Every export present; the ones the plug-in calls are backed by `_stub`.
    pub(crate) fn complete(_stub: &HostStub) -> Self {
        let mut symbols = HashMap::new();
        let names = REQUIRED_EXPORTS
            .iter()
            .copied()
            .chain(VERSIONED_EXPORTS.iter().map(|e| e.name))
            .chain(OPTIONAL_EXPORTS.iter().map(|e| e.name));
        for name in names {
            symbols.insert(name, raw(unused_export as *const c_void));
        }
        symbols.insert(c"BKA_GetVersion", raw(get_version as *const c_void));
        symbols.insert(c"BKA_GetDataFolder", raw(get_data_folder as *const c_void));
        symbols.insert(c"BKA_GetNextMail", raw(get_next_mail as *const c_void));
        symbols.insert(c"BKA_GetCharSet", raw(get_char_set as *const c_void));
        symbols.insert(c"BKA_GetStatus", raw(get_status as *const c_void));
        Self { symbols }
    }

    /// Drop one export, as an older host would.
    pub(crate) fn without(mut self, name: &CStr) -> Self {
        self.symbols.retain(|k, _| *k != name);
        self
    }
}

impl SymbolSource for FakeExports {
    fn resolve(&self, name: &CStr) -> Option<RawSymbol> {
        self.symbols.get(name).copied()
    }
}

/// A bound `HostApi` over a complete fake host.
pub(crate) fn bound_api(stub: &HostStub) -> super::HostApi {
    super::HostApi::bind(&FakeExports::complete(stub)).expect("bind fake host")
}
