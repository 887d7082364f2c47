// ── Logging ───────────────────────────────────────────────────────────────────
//
// The plug-in has no console and no window of its own, so `tracing` events go
// to the OS debug channel (`OutputDebugStringW`, visible in DebugView or an
// attached debugger).  One event becomes one debug string.  Off Windows the
// same lines go to stderr.
//
// The level filter sits behind a reload layer: logging is installed in
// `DllMain`, before the settings file can be read, and the configured filter
// is applied once the host has started the plug-in.

use std::{io, sync::OnceLock};

use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::{
    config::DEFAULT_LOG_FILTER,
    error::{PluginError, Result},
};

const PREFIX: &str = "[becky2nvda] ";

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber with the default filter.
///
/// Safe to call more than once; later calls do nothing.  If another
/// subscriber is already installed in the process, that one stays in place.
pub fn init() {
    FILTER.get_or_init(|| {
        let (filter, handle) = reload::Layer::new(EnvFilter::new(DEFAULT_LOG_FILTER));
        let output = fmt::layer()
            .with_writer(DebugChannel::default())
            .with_ansi(false)
            .without_time();
        // Err only means another subscriber won; the handle is then inert.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(output)
            .try_init();
        handle
    });
}

/// Replace the active filter with `directives` (`EnvFilter` syntax).
pub fn set_filter(directives: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(directives).map_err(|e| PluginError::LogFilter(e.to_string()))?;
    let handle = FILTER
        .get()
        .ok_or_else(|| PluginError::LogFilter("logging is not initialised".to_owned()))?;
    handle
        .reload(filter)
        .map_err(|e| PluginError::LogFilter(e.to_string()))
}

// ── Debug channel writer ──────────────────────────────────────────────────────

/// Where a finished line goes.
type Sink = fn(&str);

fn os_sink(line: &str) {
    #[cfg(windows)]
    crate::platform::win32::debug::output(line);
    #[cfg(not(windows))]
    eprint!("{line}");
}

/// `MakeWriter` handing out one `DebugLine` per event.
#[derive(Debug, Clone, Copy)]
pub struct DebugChannel {
    sink: Sink,
}

impl Default for DebugChannel {
    fn default() -> Self {
        Self { sink: os_sink }
    }
}

impl<'a> MakeWriter<'a> for DebugChannel {
    type Writer = DebugLine;

    fn make_writer(&'a self) -> Self::Writer {
        DebugLine {
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

/// Buffers one formatted event and hands it to the sink on flush or drop.
pub struct DebugLine {
    buf: Vec<u8>,
    sink: Sink,
}

impl DebugLine {
    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = format!("{PREFIX}{}", String::from_utf8_lossy(&self.buf));
        (self.sink)(&line);
        self.buf.clear();
    }
}

impl io::Write for DebugLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for DebugLine {
    fn drop(&mut self) {
        self.emit();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, io::Write};

    use super::*;

    thread_local! {
        static LINES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(line: &str) {
        LINES.with(|l| l.borrow_mut().push(line.to_owned()));
    }

    fn captured() -> Vec<String> {
        LINES.with(|l| l.borrow().clone())
    }

    #[test]
    fn one_event_becomes_one_prefixed_line() {
        let channel = DebugChannel { sink: capture };
        {
            let mut w = channel.make_writer();
            write!(w, " INFO bound host API").expect("write");
            writeln!(w, " host=2.75.03").expect("write");
        }
        assert_eq!(
            captured(),
            vec!["[becky2nvda]  INFO bound host API host=2.75.03\n".to_owned()]
        );
    }

    #[test]
    fn empty_writer_emits_nothing() {
        let channel = DebugChannel { sink: capture };
        drop(channel.make_writer());
        assert!(captured().is_empty());
    }

    #[test]
    fn flush_emits_and_resets() {
        let channel = DebugChannel { sink: capture };
        let mut w = channel.make_writer();
        w.write_all(b"first\n").expect("write");
        w.flush().expect("flush");
        w.write_all(b"second\n").expect("write");
        drop(w);
        assert_eq!(captured().len(), 2);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        init();
        assert!(matches!(
            set_filter("becky2nvda=loud"),
            Err(PluginError::LogFilter(_))
        ));
    }

    #[test]
    fn valid_filter_is_applied() {
        init();
        init();
        set_filter("becky2nvda=debug").expect("reload filter");
    }
}
