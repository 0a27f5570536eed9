//! Byte-count progress reporting.
//!
//! The pipeline only reports numbers; how they are rendered is up to the
//! caller's callback.

use std::io::{self, Write};
use std::sync::Arc;

/// Progress event emitted during download and extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A transfer began. `total` is the expected byte count, if known.
    Started {
        /// Archive name or entry path.
        label: String,
        /// Expected size in bytes.
        total: Option<u64>,
    },
    /// More bytes were written.
    Advanced {
        /// Bytes written so far in the current transfer.
        done: u64,
        /// Expected size in bytes.
        total: Option<u64>,
    },
    /// A transfer completed.
    Finished {
        /// Archive name or entry path.
        label: String,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Write sink that turns byte counts into [`ProgressEvent::Advanced`] events.
///
/// It discards the bytes themselves; it is meant to sit at the end of a
/// [`FanoutWriter`](crate::stream::FanoutWriter).
pub struct ProgressWriter {
    callback: Option<ProgressCallback>,
    done: u64,
    total: Option<u64>,
}

impl ProgressWriter {
    /// Creates a counter for a transfer of `total` bytes.
    #[must_use]
    pub fn new(callback: Option<ProgressCallback>, total: Option<u64>) -> Self {
        Self {
            callback,
            done: 0,
            total,
        }
    }

    /// Bytes counted so far.
    #[must_use]
    pub fn done(&self) -> u64 {
        self.done
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.done += buf.len() as u64;
        if let Some(callback) = &self.callback {
            callback(ProgressEvent::Advanced {
                done: self.done,
                total: self.total,
            });
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub(crate) fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn progress_writer_reports_running_total() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback =
            Arc::new(move |e: ProgressEvent| sink.lock().unwrap().push(e));

        let mut writer = ProgressWriter::new(Some(callback), Some(10));
        writer.write_all(b"abcd").unwrap();
        writer.write_all(b"efghij").unwrap();
        assert_eq!(writer.done(), 10);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                ProgressEvent::Advanced {
                    done: 4,
                    total: Some(10)
                },
                ProgressEvent::Advanced {
                    done: 10,
                    total: Some(10)
                },
            ]
        );
    }

    #[test]
    fn progress_writer_without_callback_still_counts() {
        let mut writer = ProgressWriter::new(None, None);
        writer.write_all(&[0u8; 42]).unwrap();
        assert_eq!(writer.done(), 42);
    }
}
