//! Byte sinks behind guest output streams
//!
//! A `PrintStream` instance never talks to the process console directly; it
//! writes through an [`OutputSink`]. The VM hands the catalog a sink for
//! standard output, and tests hand it a [`CaptureSink`] instead.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for bytes written by a guest stream
///
/// Each `write_all` call is one guest-visible write. Sinks shared between
/// threads must not interleave the bytes of two calls.
pub trait OutputSink: Send + Sync {
    /// Write the whole buffer
    fn write_all(&self, bytes: &[u8]) -> io::Result<()>;

    /// Flush anything buffered
    fn flush(&self) -> io::Result<()>;

    /// Short name used in diagnostics
    fn name(&self) -> &str;
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn OutputSink>;

/// Whether two handles point at the same sink
pub fn same_sink(a: &SharedSink, b: &SharedSink) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const u8,
        Arc::as_ptr(b) as *const u8,
    )
}

/// The process's standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(bytes)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// In-memory sink that keeps everything written to it
#[derive(Default)]
pub struct CaptureSink {
    buffer: Mutex<Vec<u8>>,
}

impl CaptureSink {
    /// Create an empty capture sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a capture sink behind a shared handle
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Copy of the captured bytes
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    /// Captured bytes as text, with invalid UTF-8 replaced
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Take the captured bytes, leaving the sink empty
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.lock())
    }
}

impl OutputSink for CaptureSink {
    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.buffer.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "capture"
    }
}

impl fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSink")
            .field("len", &self.buffer.lock().len())
            .finish()
    }
}
