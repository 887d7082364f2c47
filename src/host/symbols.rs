// ── Export lookup ─────────────────────────────────────────────────────────────
//
// The host publishes its plug-in API as named exports of its own executable.
// Lookup is behind a trait so the table can be bound against something other
// than a live host process.

use std::{
    ffi::{c_void, CStr},
    ptr::NonNull,
};

/// Address of an exported function, before it is given a type.
pub type RawSymbol = NonNull<c_void>;

/// Something that can resolve an exported name to a function address.
pub trait SymbolSource {
    /// Return the address exported under `name`, or `None` when the export
    /// does not exist.
    fn resolve(&self, name: &CStr) -> Option<RawSymbol>;
}
