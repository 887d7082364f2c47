// ── Host API table ────────────────────────────────────────────────────────────
//
// The host exports its plug-in API (`BKA_*`) by name from the executable.
// `HostApi` holds one typed function pointer per export and is bound once,
// when the plug-in DLL is attached.
//
// Three tiers:
//   • required  – binding fails if any is missing.
//   • versioned – mandatory once the host reports the listed version.
//   • optional  – added in later host releases; a miss is only logged.
//
// Unsafe is permitted here: turning raw addresses into typed pointers and
// calling into the host.  Every `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

pub mod symbols;
pub mod types;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

use std::{
    ffi::{c_int, CStr},
    path::PathBuf,
};

use tracing::{debug, info, warn};

use crate::error::{PluginError, Result};

use symbols::{RawSymbol, SymbolSource};
use types::{
    Bool, CommandCallback, Dword, Hwnd, Pcstr, Pstr, Pvoid, Uint, UiCallback,
};
use version::HostVersion;

/// An export that only exists from a given host release on.
#[derive(Debug, Clone, Copy)]
pub struct VersionedExport {
    pub name: &'static CStr,
    pub since: &'static str,
}

fn missing(name: &CStr) -> PluginError {
    PluginError::MissingExport {
        name: name.to_string_lossy().into_owned(),
    }
}

macro_rules! host_api {
    (
        required {
            $( $rfield:ident = $rname:literal : $rty:ty; )*
        }
        versioned {
            $( $vfield:ident = $vname:literal since $vsince:literal : $vty:ty; )*
        }
        optional {
            $( $ofield:ident = $oname:literal since $osince:literal : $oty:ty; )*
        }
    ) => {
        /// Typed view of every export the host publishes to plug-ins.
        ///
        /// Field names follow the export names (`BKA_GetNextMail` →
        /// `get_next_mail`).  Function pointers are only valid inside the
        /// host process that produced them.
        #[derive(Clone)]
        pub struct HostApi {
            $( pub $rfield: $rty, )*
            $( pub $vfield: Option<$vty>, )*
            $( pub $ofield: Option<$oty>, )*
            version: HostVersion,
        }

        /// Exports without which the plug-in refuses to load.
        pub const REQUIRED_EXPORTS: &[&CStr] = &[$( $rname ),*];

        /// Exports that become mandatory from the listed host version on.
        pub const VERSIONED_EXPORTS: &[VersionedExport] = &[
            $( VersionedExport { name: $vname, since: $vsince } ),*
        ];

        /// Exports added by later releases that the plug-in can live without.
        pub const OPTIONAL_EXPORTS: &[VersionedExport] = &[
            $( VersionedExport { name: $oname, since: $osince } ),*
        ];

        impl HostApi {
            fn resolve(source: &dyn SymbolSource) -> Result<Self> {
                Ok(Self {
                    $( $rfield: {
                        let sym = source.resolve($rname).ok_or_else(|| missing($rname))?;
                        // SAFETY: the host SDK declares this export with
                        // exactly this signature; a function address and a
                        // function pointer have the same size and layout.
                        unsafe { std::mem::transmute::<RawSymbol, $rty>(sym) }
                    }, )*
                    $( $vfield: source.resolve($vname).map(|sym| {
                        // SAFETY: as above.
                        unsafe { std::mem::transmute::<RawSymbol, $vty>(sym) }
                    }), )*
                    $( $ofield: source.resolve($oname).map(|sym| {
                        // SAFETY: as above.
                        unsafe { std::mem::transmute::<RawSymbol, $oty>(sym) }
                    }), )*
                    version: HostVersion::parse(""),
                })
            }

            /// Whether a versioned or optional export was found.
            /// Required exports are always present once bound.
            pub fn has_export(&self, name: &CStr) -> bool {
                $( if name == $vname { return self.$vfield.is_some(); } )*
                $( if name == $oname { return self.$ofield.is_some(); } )*
                REQUIRED_EXPORTS.iter().any(|e| *e == name)
            }
        }
    };
}

host_api! {
    required {
        get_version = c"BKA_GetVersion": unsafe extern "system" fn() -> Pcstr;
        command = c"BKA_Command": unsafe extern "system" fn(Hwnd, Pcstr);
        get_window_handles = c"BKA_GetWindowHandles":
            unsafe extern "system" fn(*mut Hwnd, *mut Hwnd, *mut Hwnd, *mut Hwnd) -> Bool;
        register_command = c"BKA_RegisterCommand":
            unsafe extern "system" fn(Pcstr, c_int, Option<CommandCallback>) -> Uint;
        register_ui_callback = c"BKA_RegisterUICallback":
            unsafe extern "system" fn(Uint, Option<UiCallback>) -> Uint;
        get_data_folder = c"BKA_GetDataFolder": unsafe extern "system" fn() -> Pcstr;
        get_temp_folder = c"BKA_GetTempFolder": unsafe extern "system" fn() -> Pcstr;
        get_temp_file_name = c"BKA_GetTempFileName": unsafe extern "system" fn(Pcstr) -> Pcstr;
        get_current_mail_box = c"BKA_GetCurrentMailBox": unsafe extern "system" fn() -> Pcstr;
        set_current_mail_box = c"BKA_SetCurrentMailBox": unsafe extern "system" fn(Pcstr);
        get_current_folder = c"BKA_GetCurrentFolder": unsafe extern "system" fn() -> Pcstr;
        set_current_folder = c"BKA_SetCurrentFolder": unsafe extern "system" fn(Pcstr);
        get_folder_display_name = c"BKA_GetFolderDisplayName":
            unsafe extern "system" fn(Pcstr) -> Pcstr;
        set_message_text = c"BKA_SetMessageText": unsafe extern "system" fn(Hwnd, Pcstr);
        get_current_mail = c"BKA_GetCurrentMail": unsafe extern "system" fn() -> Pcstr;
        set_current_mail = c"BKA_SetCurrentMail": unsafe extern "system" fn(Pcstr);
        get_next_mail = c"BKA_GetNextMail":
            unsafe extern "system" fn(c_int, Pstr, c_int, Bool) -> c_int;
        set_sel = c"BKA_SetSel": unsafe extern "system" fn(Pcstr, Bool);
        append_message = c"BKA_AppendMessage": unsafe extern "system" fn(Pcstr, Pcstr) -> Bool;
        move_selected_messages = c"BKA_MoveSelectedMessages":
            unsafe extern "system" fn(Pcstr, Bool) -> Bool;
        get_status = c"BKA_GetStatus": unsafe extern "system" fn(Pcstr) -> Dword;
        compose_mail = c"BKA_ComposeMail": unsafe extern "system" fn(Pcstr) -> Hwnd;
        get_char_set = c"BKA_GetCharSet": unsafe extern "system" fn(Pcstr, Pstr, c_int) -> c_int;
        get_source = c"BKA_GetSource": unsafe extern "system" fn(Pcstr) -> Pstr;
        set_source = c"BKA_SetSource": unsafe extern "system" fn(Pcstr, Pcstr);
        get_header = c"BKA_GetHeader": unsafe extern "system" fn(Pcstr) -> Pstr;
        get_text = c"BKA_GetText": unsafe extern "system" fn(Pstr, c_int) -> Pstr;
        set_text = c"BKA_SetText": unsafe extern "system" fn(c_int, Pcstr);
        get_specified_header = c"BKA_GetSpecifiedHeader":
            unsafe extern "system" fn(Pcstr, Pstr, c_int);
        set_specified_header = c"BKA_SetSpecifiedHeader": unsafe extern "system" fn(Pcstr, Pcstr);
        comp_get_char_set = c"BKA_CompGetCharSet":
            unsafe extern "system" fn(Hwnd, Pstr, c_int) -> c_int;
        comp_get_source = c"BKA_CompGetSource": unsafe extern "system" fn(Hwnd) -> Pstr;
        comp_set_source = c"BKA_CompSetSource": unsafe extern "system" fn(Hwnd, Pcstr);
        comp_get_header = c"BKA_CompGetHeader": unsafe extern "system" fn(Hwnd) -> Pstr;
        comp_get_specified_header = c"BKA_CompGetSpecifiedHeader":
            unsafe extern "system" fn(Hwnd, Pcstr, Pstr, c_int);
        comp_set_specified_header = c"BKA_CompSetSpecifiedHeader":
            unsafe extern "system" fn(Hwnd, Pcstr, Pcstr);
        comp_get_text = c"BKA_CompGetText": unsafe extern "system" fn(Hwnd, Pstr, c_int) -> Pstr;
        comp_set_text = c"BKA_CompSetText": unsafe extern "system" fn(Hwnd, c_int, Pcstr);
        comp_attach_file = c"BKA_CompAttachFile": unsafe extern "system" fn(Hwnd, Pcstr, Pcstr);
        alloc = c"BKA_Alloc": unsafe extern "system" fn(Dword) -> Pvoid;
        re_alloc = c"BKA_ReAlloc": unsafe extern "system" fn(Pvoid, Dword) -> Pvoid;
        free = c"BKA_Free": unsafe extern "system" fn(Pvoid);
        iso_2022_jp = c"BKA_ISO_2022_JP": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        iso_2022_kr = c"BKA_ISO_2022_KR": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        hz_gb2312 = c"BKA_HZ_GB2312": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        iso_8859_2 = c"BKA_ISO_8859_2": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        euc_jp = c"BKA_EUC_JP": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        utf_7 = c"BKA_UTF_7": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        utf_8 = c"BKA_UTF_8": unsafe extern "system" fn(Pcstr, Bool) -> Pstr;
        b64_convert = c"BKA_B64Convert": unsafe extern "system" fn(Pcstr, Pcstr, Bool) -> Bool;
        qp_convert = c"BKA_QPConvert": unsafe extern "system" fn(Pcstr, Pcstr, Bool) -> Bool;
        mime_header = c"BKA_MIMEHeader":
            unsafe extern "system" fn(Pcstr, Pstr, c_int, Bool) -> Pstr;
        serialize_rcpts = c"BKA_SerializeRcpts": unsafe extern "system" fn(Pcstr) -> Pstr;
        connect = c"BKA_Connect": unsafe extern "system" fn(Bool) -> Bool;
    }
    versioned {
        set_status = c"BKA_SetStatus" since "2.00.06":
            unsafe extern "system" fn(Pcstr, Dword, Dword) -> Dword;
    }
    optional {
        next_unread = c"BKA_NextUnread" since "2.05": unsafe extern "system" fn(Bool, Bool) -> Bool;
        process_mail = c"BKA_ProcessMail" since "2.40":
            unsafe extern "system" fn(Pcstr, c_int, Pcstr);
        get_size = c"BKA_GetSize" since "2.43": unsafe extern "system" fn(Pcstr) -> Dword;
        move_messages = c"BKA_MoveMessages" since "2.50":
            unsafe extern "system" fn(Pcstr, Pcstr, Bool) -> c_int;
    }
}

impl HostApi {
    /// Resolve every export through `source` and check the result against the
    /// version the host reports.
    pub fn bind(source: &dyn SymbolSource) -> Result<Self> {
        let mut api = Self::resolve(source)?;

        // SAFETY: get_version takes no arguments and returns a pointer to a
        // static, NUL-terminated string owned by the host (or null).
        let raw = unsafe { host_str((api.get_version)()) }.unwrap_or_default();
        api.version = HostVersion::parse(&raw);

        for export in VERSIONED_EXPORTS {
            if api.version.at_least(export.since) && !api.has_export(export.name) {
                return Err(missing(export.name));
            }
        }

        for export in OPTIONAL_EXPORTS {
            if api.version.at_least(export.since) && !api.has_export(export.name) {
                warn!(
                    export = %export.name.to_string_lossy(),
                    since = export.since,
                    host = %api.version,
                    "export missing although the host should provide it"
                );
            }
        }

        info!(host = %api.version, "bound host API");
        Ok(api)
    }

    /// Version string the host reported at bind time.
    pub fn version(&self) -> &HostVersion {
        &self.version
    }

    /// The host's data folder, from `BKA_GetDataFolder`.
    pub fn data_folder(&self) -> Option<PathBuf> {
        // SAFETY: get_data_folder takes no arguments and returns a host-owned
        // NUL-terminated string (or null) that stays valid for this call.
        let folder = unsafe { host_str((self.get_data_folder)()) }?;
        if folder.is_empty() {
            debug!("host reported an empty data folder");
            return None;
        }
        Some(PathBuf::from(folder))
    }
}

/// Copy a host-owned C string.  Returns `None` for a null pointer.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn host_str(ptr: Pcstr) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeExports, HostStub};
    use super::*;

    #[test]
    fn table_lists_every_export_once() {
        let mut all: Vec<&CStr> = REQUIRED_EXPORTS.to_vec();
        all.extend(VERSIONED_EXPORTS.iter().map(|e| e.name));
        all.extend(OPTIONAL_EXPORTS.iter().map(|e| e.name));
        let count = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), count);
        assert_eq!(REQUIRED_EXPORTS.len(), 54);
        assert_eq!(count, 59);
    }

    #[test]
    fn binds_against_a_complete_host() {
        let stub = HostStub::new("2.75.03");
        let api = HostApi::bind(&FakeExports::complete(&stub)).expect("bind");
        assert_eq!(api.version().as_str(), "2.75.03");
        assert!(api.set_status.is_some());
        assert!(api.move_messages.is_some());
    }

    #[test]
    fn missing_required_export_is_named() {
        let stub = HostStub::new("2.75.03");
        let exports = FakeExports::complete(&stub).without(c"BKA_GetCharSet");
        match HostApi::bind(&exports) {
            Err(PluginError::MissingExport { name }) => assert_eq!(name, "BKA_GetCharSet"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("bind should fail"),
        }
    }

    #[test]
    fn set_status_is_mandatory_from_2_00_06() {
        let stub = HostStub::new("2.00.06");
        let exports = FakeExports::complete(&stub).without(c"BKA_SetStatus");
        assert!(matches!(
            HostApi::bind(&exports),
            Err(PluginError::MissingExport { .. })
        ));
    }

    #[test]
    fn set_status_may_be_absent_on_older_hosts() {
        let stub = HostStub::new("2.00.05");
        let exports = FakeExports::complete(&stub).without(c"BKA_SetStatus");
        let api = HostApi::bind(&exports).expect("bind");
        assert!(api.set_status.is_none());
        assert!(!api.has_export(c"BKA_SetStatus"));
    }

    #[test]
    fn long_version_string_requires_set_status() {
        let stub = HostStub::new("1.99.99.9");
        let exports = FakeExports::complete(&stub).without(c"BKA_SetStatus");
        assert!(HostApi::bind(&exports).is_err());
    }

    #[test]
    fn padded_old_version_still_counts_as_long() {
        let stub = HostStub::new(" 2.00.05");
        let exports = FakeExports::complete(&stub).without(c"BKA_SetStatus");
        assert!(matches!(
            HostApi::bind(&exports),
            Err(PluginError::MissingExport { .. })
        ));
    }

    #[test]
    fn optional_exports_never_fail_binding() {
        let stub = HostStub::new("2.75.03");
        let exports = FakeExports::complete(&stub)
            .without(c"BKA_NextUnread")
            .without(c"BKA_MoveMessages");
        let api = HostApi::bind(&exports).expect("bind");
        assert!(api.next_unread.is_none());
        assert!(api.move_messages.is_none());
        assert!(api.get_size.is_some());
    }

    #[test]
    fn data_folder_comes_from_the_host() {
        let stub = HostStub::new("2.75.03").with_data_folder(r"C:\Becky\Data\");
        let api = HostApi::bind(&FakeExports::complete(&stub)).expect("bind");
        assert_eq!(api.data_folder(), Some(PathBuf::from(r"C:\Becky\Data\")));
    }

    #[test]
    fn empty_data_folder_is_none() {
        let stub = HostStub::new("2.75.03").with_data_folder("");
        let api = HostApi::bind(&FakeExports::complete(&stub)).expect("bind");
        assert_eq!(api.data_folder(), None);
    }
}
