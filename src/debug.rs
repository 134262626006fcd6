//! Debug output for scenario runs
//!
//! When a context carries a [`DebugSink`], the engine and plugins write
//! human-readable trace lines to it. Every line is also emitted as a
//! `tracing` debug event so `RUST_LOG` captures it without a sink.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::context::Context;

const PREFIX: &str = "(yamltest) ";

/// A shareable writer for debug lines
#[derive(Clone)]
pub struct DebugSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl DebugSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// A sink backed by an in-memory buffer, and a handle to read it back
    pub fn buffer() -> (Self, SharedBuffer) {
        let buf = SharedBuffer::default();
        (Self::new(buf.clone()), buf)
    }

    /// Write one prefixed, newline-terminated line
    pub fn write_line(&self, msg: &str) {
        let mut line = String::with_capacity(PREFIX.len() + msg.len() + 1);
        if !msg.starts_with(PREFIX) {
            line.push_str(PREFIX);
        }
        line.push_str(msg);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            tracing::warn!("failed to write debug output: {}", e);
        }
    }
}

impl std::fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DebugSink")
    }
}

/// Write a debug line to the context's sink, if it has one
pub fn println(ctx: &Context, msg: &str) {
    tracing::debug!("{}", msg);
    if let Some(sink) = ctx.debug() {
        sink.write_line(msg);
    }
}

/// In-memory writer whose contents can be read from another handle
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
