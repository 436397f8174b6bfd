//! Mutex-serialized log sinks and scoped log entries.
//!
//! A [`Writer`] is a fan-in sink: many threads hand it complete messages
//! and it serializes them internally. [`StreamWriter`] guards an
//! `io::Write` stream with its own mutex; [`BufferedWriter`] decorates any
//! writer with in-memory batching, forwarding once a threshold of entries
//! has accumulated and flushing the remainder when dropped.
//!
//! A [`LogEntry`] builds one message — timestamp and source location
//! prefix, then whatever the caller appends — and emits it to its writer
//! exactly once, when the entry goes out of scope. The trailing newline is
//! part of the entry; sinks never rewrite payload. The [`log_entry!`]
//! macro captures the call site and targets the process-wide stdout writer
//! by default.
//!
//! ```
//! use workgraph::log_entry;
//!
//! let _ = log_entry!().append("worker count: ").append(4);
//! ```

use std::fmt::{self, Write as _};
use std::io;
use std::sync::{Arc, OnceLock};

use chrono::Local;

use crate::sync::Mutex;

/// A serialized sink for complete log messages.
///
/// Implementations take `&self` and guard their state internally, so one
/// writer can fan in messages from any number of threads.
pub trait Writer: Send + Sync {
    /// Writes one complete message to the sink.
    fn write(&self, message: &str);
}

impl<W: Writer + ?Sized> Writer for &W {
    fn write(&self, message: &str) {
        (**self).write(message);
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&self, message: &str) {
        (**self).write(message);
    }
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, message: &str) {
        (**self).write(message);
    }
}

/// Writer over an `io::Write` stream, serialized by a private mutex.
pub struct StreamWriter<W: io::Write> {
    stream: Mutex<W>,
}

impl<W: io::Write> StreamWriter<W> {
    /// Takes ownership of `stream`; all writes go through this writer.
    pub fn new(stream: W) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }

    /// Direct access to the stream. Requires exclusive access, so no
    /// serialization is needed.
    pub fn get_mut(&mut self) -> &mut W {
        self.stream.get_mut()
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.stream.into_inner()
    }
}

impl<W: io::Write + Send> Writer for StreamWriter<W> {
    fn write(&self, message: &str) {
        // Sink failures are not surfaced to logging call sites.
        let _ = self.stream.lock().write_all(message.as_bytes());
    }
}

struct BufferState {
    buffer: String,
    entries: usize,
}

/// Batching decorator over another writer.
///
/// Accumulates entries in memory and forwards the whole batch downstream
/// once more than `CAPACITY` entries are buffered. Whatever remains when
/// the decorator is dropped is forwarded then.
pub struct BufferedWriter<W: Writer, const CAPACITY: usize = 16> {
    base: W,
    state: Mutex<BufferState>,
}

impl<W: Writer, const CAPACITY: usize> BufferedWriter<W, CAPACITY> {
    /// Wraps `base`, taking ownership of it for the decorator's lifetime.
    pub fn new(base: W) -> Self {
        Self {
            base,
            state: Mutex::new(BufferState {
                buffer: String::new(),
                entries: 0,
            }),
        }
    }

    fn forward_batch(&self, state: &mut BufferState) {
        if state.entries == 0 {
            return;
        }
        self.base.write(&state.buffer);
        state.buffer.clear();
        state.entries = 0;
    }
}

impl<W: Writer, const CAPACITY: usize> Writer for BufferedWriter<W, CAPACITY> {
    fn write(&self, message: &str) {
        let mut state = self.state.lock();
        state.buffer.push_str(message);
        state.entries += 1;
        if state.entries > CAPACITY {
            self.forward_batch(&mut state);
        }
    }
}

impl<W: Writer, const CAPACITY: usize> Drop for BufferedWriter<W, CAPACITY> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        self.forward_batch(&mut state);
    }
}

/// One log message under construction, emitted on scope exit.
///
/// Created with the originating file and line; the prefix is
/// `[<local-time> <file>:<line>] `. Payload is added with
/// [`LogEntry::append`] or via `std::fmt::Write`. Exactly one write reaches
/// the sink, when the entry is dropped — a partially built entry that is
/// never dropped writes nothing.
pub struct LogEntry<'w> {
    message: String,
    writer: &'w dyn Writer,
}

impl<'w> LogEntry<'w> {
    /// Starts an entry against `writer`, stamped with the local time and
    /// the given source location.
    pub fn new(writer: &'w dyn Writer, file: &str, line: u32) -> Self {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        Self {
            message: format!("[{timestamp} {file}:{line}] "),
            writer,
        }
    }

    /// Appends a displayable value to the entry's payload.
    #[must_use = "the entry emits when dropped; an unused return drops immediately"]
    pub fn append(mut self, value: impl fmt::Display) -> Self {
        let _ = write!(self.message, "{value}");
        self
    }
}

impl fmt::Write for LogEntry<'_> {
    fn write_str(&mut self, payload: &str) -> fmt::Result {
        self.message.push_str(payload);
        Ok(())
    }
}

impl Drop for LogEntry<'_> {
    fn drop(&mut self) {
        self.message.push('\n');
        self.writer.write(&self.message);
    }
}

/// The process-wide stdout writer, initialized on first use.
pub fn stdout_writer() -> &'static StreamWriter<io::Stdout> {
    static WRITER: OnceLock<StreamWriter<io::Stdout>> = OnceLock::new();
    WRITER.get_or_init(|| StreamWriter::new(io::stdout()))
}

/// Builds a [`LogEntry`] stamped with the current file and line.
///
/// With no argument the entry targets [`stdout_writer`]; otherwise pass a
/// reference to any [`Writer`].
#[macro_export]
macro_rules! log_entry {
    () => {
        $crate::logger::LogEntry::new($crate::logger::stdout_writer(), file!(), line!())
    };
    ($writer:expr) => {
        $crate::logger::LogEntry::new($writer, file!(), line!())
    };
}
