//! Becky! Internet Mail plug-in for the NVDA screen reader add-on.
//!
//! The host loads this DLL and publishes its plug-in API (`BKA_*`) as exports
//! of its own executable.  The plug-in binds that table once, then answers a
//! few questions about rows of the host's message list (message ID, code page,
//! status flags) through a private window-message protocol, see [`protocol`].
//!
//! Everything except the [`platform`] layer is plain Rust over the bound
//! [`host::HostApi`] and builds and tests on any target.

// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `host`             – typing raw export addresses, calling the host
//   • `query`            – passing buffers to host exports
//   • `protocol`         – writing into the requester's reply buffer
//   • `plugin_info`      – the BKC_OnPlugInInfo export
//   • `platform::win32`  – Win32 FFI and the remaining DLL exports
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod platform;
pub mod plugin_info;
pub mod protocol;
pub mod query;

pub use error::{PluginError, Result};
