//! Chunked copying into several sinks at once.
//!
//! Both the download and the extraction stage move bytes through a single
//! blocking loop: read one chunk, hand it to every sink in order, repeat. The
//! loop checks a [`CancellationToken`] before each chunk, so an external signal
//! can stop it between chunks but never in the middle of one.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Size of the buffer used by [`copy_chunks`].
pub const CHUNK_SIZE: usize = 32 * 1024;

/// A writer that forwards every chunk to an ordered list of sinks.
///
/// Each call to [`Write::write`] pushes the whole buffer into every sink with
/// `write_all` before returning, so every sink observes exactly the same bytes
/// in exactly the same order. A failure in any sink aborts the write and is
/// returned as-is; later sinks do not see that chunk.
pub struct FanoutWriter<'a> {
    sinks: Vec<&'a mut dyn Write>,
}

impl<'a> FanoutWriter<'a> {
    /// Creates a writer over the given sinks, written in the order given.
    #[must_use]
    pub fn new(sinks: Vec<&'a mut dyn Write>) -> Self {
        Self { sinks }
    }
}

impl Write for FanoutWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

/// Cloneable flag used to abort a running copy loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why [`copy_chunks`] stopped early.
#[derive(Debug)]
pub enum CopyError {
    /// Reading from the source failed.
    Read(io::Error),
    /// Writing to the sink failed.
    Write(io::Error),
    /// The token was cancelled between two chunks.
    Cancelled,
}

/// Copies `reader` into `writer` in [`CHUNK_SIZE`] chunks until end of input.
///
/// Returns the number of bytes copied. Interrupted reads are retried.
///
/// # Errors
///
/// Returns [`CopyError::Cancelled`] if `cancel` is set before a chunk is read,
/// and [`CopyError::Read`] or [`CopyError::Write`] depending on which side of
/// the copy failed.
pub fn copy_chunks<R, W>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled);
        }

        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        copied += n as u64;
    }

    writer.flush().map_err(CopyError::Write)?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TrickleReader;

    #[test]
    fn fanout_delivers_identical_bytes_to_every_sink() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut third = Vec::new();

        {
            let sinks: Vec<&mut dyn Write> = vec![&mut first, &mut second, &mut third];
            let mut fanout = FanoutWriter::new(sinks);
            let mut reader = TrickleReader::new(data.clone(), 7);
            let copied =
                copy_chunks(&mut reader, &mut fanout, &CancellationToken::new()).unwrap();
            assert_eq!(copied, data.len() as u64);
        }

        assert_eq!(first, data);
        assert_eq!(second, data);
        assert_eq!(third, data);
    }

    #[test]
    fn cancelled_token_stops_before_first_chunk() {
        let token = CancellationToken::new();
        token.clone().cancel();
        assert!(token.is_cancelled());

        let mut out = Vec::new();
        let result = copy_chunks(&mut &b"payload"[..], &mut out, &token);
        assert!(matches!(result, Err(CopyError::Cancelled)));
        assert!(out.is_empty());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct Flaky {
            interrupted: bool,
            data: &'static [u8],
        }

        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
                self.data.read(buf)
            }
        }

        let mut reader = Flaky {
            interrupted: false,
            data: b"go",
        };
        let mut out = Vec::new();
        copy_chunks(&mut reader, &mut out, &CancellationToken::new()).unwrap();
        assert_eq!(out, b"go");
    }

    #[test]
    fn read_and_write_failures_are_distinguished() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::StorageFull, "full"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let token = CancellationToken::new();
        let mut sink = Vec::new();
        assert!(matches!(
            copy_chunks(&mut Broken, &mut sink, &token),
            Err(CopyError::Read(_))
        ));
        assert!(matches!(
            copy_chunks(&mut &b"data"[..], &mut Broken, &token),
            Err(CopyError::Write(_))
        ));
    }
}
