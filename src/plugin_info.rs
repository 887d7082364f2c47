// ── Plug-in identity ──────────────────────────────────────────────────────────
//
// `BKC_OnPlugInInfo` is the first export the host calls: it shows the result
// in its plug-in manager.  The struct layout is fixed by the host SDK.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int};

pub const NAME: &str = "Becky_NVDA_connector";
pub const VENDOR: &str = "Lukasz Golonka";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "Interfaces NVDA plug-in with Becky! Internet Mail.";

/// `BKPLUGININFO`, filled in by the plug-in.
#[repr(C)]
pub struct PluginInfo {
    pub name: [c_char; 80],
    pub vendor: [c_char; 80],
    pub version: [c_char; 80],
    pub description: [c_char; 256],
}

/// Copy `src` into `dst` as a C string, truncating so the NUL always fits.
fn copy_truncated(dst: &mut [c_char], src: &str) {
    let Some(room) = dst.len().checked_sub(1) else {
        return;
    };
    let len = src.len().min(room);
    for (d, s) in dst.iter_mut().zip(&src.as_bytes()[..len]) {
        *d = *s as c_char;
    }
    dst[len..].fill(0);
}

impl PluginInfo {
    /// Write this plug-in's identity into every field.
    pub fn fill(&mut self) {
        copy_truncated(&mut self.name, NAME);
        copy_truncated(&mut self.vendor, VENDOR);
        copy_truncated(&mut self.version, VERSION);
        copy_truncated(&mut self.description, DESCRIPTION);
    }
}

/// Host export: describe the plug-in.  Always returns 0.
///
/// # Safety
///
/// `info` must be null or point to a writable `BKPLUGININFO`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn BKC_OnPlugInInfo(info: *mut PluginInfo) -> c_int {
    // SAFETY: per the host contract, info is null or a valid, exclusive
    // pointer for the duration of this call.
    match unsafe { info.as_mut() } {
        Some(info) => info.fill(),
        None => tracing::warn!("BKC_OnPlugInInfo called with a null pointer"),
    }
    0
}
