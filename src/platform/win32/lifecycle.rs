// ── Plug-in lifecycle ─────────────────────────────────────────────────────────
//
// Entry points the host and the loader call, in order:
//   1. DllMain(DLL_PROCESS_ATTACH) – install logging, bind the host API.
//      Returning FALSE makes the host drop the plug-in.
//   2. BKC_OnPlugInInfo            – see `plugin_info`.
//   3. BKC_OnStart                 – read settings, create the message window.
//   4. BKC_OnExit                  – destroy the window.
//
// The host calls everything from its UI thread.  The bound API is
// process-wide; the window and buffer limits belong to that thread.

#![allow(unsafe_code)]

use std::{
    cell::{Cell, RefCell},
    ffi::{c_int, c_void},
    sync::{
        atomic::{AtomicUsize, Ordering},
        OnceLock,
    },
};

use tracing::{debug, error, info, warn};
use windows::Win32::{
    Foundation::{BOOL, FALSE, HINSTANCE, TRUE},
    System::SystemServices::DLL_PROCESS_ATTACH,
};

use super::{exports::ProcessExports, memory, window::MessageWindow};
use crate::{config, config::Limits, error::Result, host::HostApi, logging, protocol::Responder};

static HOST: OnceLock<HostApi> = OnceLock::new();

/// This DLL's HINSTANCE, stored as an address so it can live in a static.
static MODULE: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static WINDOW: RefCell<Option<MessageWindow>> = const { RefCell::new(None) };
    static LIMITS: Cell<Limits> = Cell::new(Limits::default());
}

fn module() -> HINSTANCE {
    HINSTANCE(MODULE.load(Ordering::Relaxed) as *mut c_void)
}

fn limits() -> Limits {
    LIMITS.with(Cell::get)
}

/// Responder for the window procedure, once the host API is bound.
pub(crate) fn responder() -> Option<Responder<'static>> {
    let api = HOST.get()?;
    Some(Responder::new(api, limits(), memory::is_writable))
}

// ── Steps ─────────────────────────────────────────────────────────────────────

fn attach(module: HINSTANCE) -> Result<()> {
    MODULE.store(module.0 as usize, Ordering::Relaxed);
    logging::init();

    if HOST.get().is_some() {
        return Ok(());
    }
    let api = HostApi::bind(&ProcessExports::current()?)?;
    let _ = HOST.set(api);
    Ok(())
}

fn start() -> Result<()> {
    let Some(api) = HOST.get() else {
        warn!("started without a bound host API");
        return Ok(());
    };

    if open(config::configure(api.data_folder().as_deref()))? {
        info!(host = %api.version(), "ready");
    }
    Ok(())
}

/// Install `limits` and create the message window unless it already exists.
/// Returns whether a window was created.
fn open(limits: Limits) -> Result<bool> {
    LIMITS.with(|l| l.set(limits));
    WINDOW.with(|w| -> Result<bool> {
        let mut w = w.borrow_mut();
        if w.is_some() {
            debug!("message window already exists");
            return Ok(false);
        }
        *w = Some(MessageWindow::create(module())?);
        Ok(true)
    })
}

fn exit() {
    // Take the window out first: DestroyWindow re-enters the WndProc.
    let window = WINDOW.with(|w| w.borrow_mut().take());
    if window.is_some() {
        drop(window);
        info!("stopped");
    }
}

// ── Exports ───────────────────────────────────────────────────────────────────

/// Host export: the host has finished starting.  Always returns 0.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "system" fn BKC_OnStart() -> c_int {
    if let Err(e) = start() {
        error!(error = %e, "start failed");
    }
    0
}

/// Host export: the host is shutting down.  Always returns 0.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "system" fn BKC_OnExit() -> c_int {
    exit();
    0
}

/// DLL entry point.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "system" fn DllMain(module: HINSTANCE, reason: u32, _reserved: *mut c_void) -> BOOL {
    if reason != DLL_PROCESS_ATTACH {
        return TRUE;
    }
    match attach(module) {
        Ok(()) => TRUE,
        Err(e) => {
            error!(error = %e, "refusing to load");
            FALSE
        }
    }
}
