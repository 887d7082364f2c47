// ── Host export lookup ────────────────────────────────────────────────────────
//
// The host publishes `BKA_*` from its own executable, i.e. the module that
// started the process, not from a DLL.

#![allow(unsafe_code)]

use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
};

use windows::{
    core::{PCSTR, PCWSTR},
    Win32::{
        Foundation::HMODULE,
        System::LibraryLoader::{GetModuleHandleW, GetProcAddress},
    },
};

use crate::{
    error::Result,
    host::symbols::{RawSymbol, SymbolSource},
};

/// Exports of the process executable.
pub(crate) struct ProcessExports {
    module: HMODULE,
}

impl ProcessExports {
    pub(crate) fn current() -> Result<Self> {
        // SAFETY: a null name asks for the .exe's own HMODULE, which is valid
        // for the process lifetime; no reference count is taken.
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }?;
        Ok(Self { module })
    }
}

impl SymbolSource for ProcessExports {
    fn resolve(&self, name: &CStr) -> Option<RawSymbol> {
        // SAFETY: module is a loaded module handle; name is a valid
        // NUL-terminated ANSI string for the duration of the call.
        let address = unsafe { GetProcAddress(self.module, PCSTR(name.as_ptr().cast())) }?;
        NonNull::new(address as *mut c_void)
    }
}
