use std::io::{ErrorKind, Write};
use std::time::Duration;

use serframe_transport::TransportError;
use tracing::debug;

use crate::error::{FrameError, Result};

/// Default maximum bytes handed to the channel per write.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default pause between consecutive chunks.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(2);

/// What a completed [`ChunkedWriter::send`] pushed to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Total bytes written.
    pub bytes: usize,
    /// Number of writes issued.
    pub chunks: usize,
}

/// Writes a byte buffer to any `Write` stream in bounded, paced chunks.
///
/// There is no acknowledgment: the delay between chunks is the only thing
/// keeping a slow receiver from being overrun.
pub struct ChunkedWriter<T> {
    inner: T,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl<T: Write> ChunkedWriter<T> {
    /// Create a chunked writer with default chunk size and delay.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
        }
    }

    /// Create a chunked writer with explicit pacing.
    pub fn with_pacing(inner: T, chunk_size: usize, chunk_delay: Duration) -> Self {
        Self {
            inner,
            chunk_size,
            chunk_delay,
        }
    }

    /// Write `data` chunk by chunk, flushing after each and sleeping between them.
    ///
    /// A chunk the stream only partially accepts aborts the send with
    /// [`TransportError::ShortWrite`]; nothing is retried.
    pub fn send(&mut self, data: &[u8]) -> Result<SendReport> {
        self.send_with_progress(data, |_, _| {})
    }

    /// Like [`send`](Self::send), calling `on_chunk(index, total)` (1-based)
    /// before each chunk is written.
    pub fn send_with_progress<F>(&mut self, data: &[u8], mut on_chunk: F) -> Result<SendReport>
    where
        F: FnMut(usize, usize),
    {
        if self.chunk_size == 0 {
            return Err(FrameError::Validation {
                field: "chunk_size",
                value: 0,
                min: 1,
                max: usize::MAX as u64,
            });
        }

        let total = data.chunks(self.chunk_size).len();
        let mut report = SendReport {
            bytes: 0,
            chunks: 0,
        };

        for (index, chunk) in data.chunks(self.chunk_size).enumerate() {
            if index > 0 && !self.chunk_delay.is_zero() {
                std::thread::sleep(self.chunk_delay);
            }

            on_chunk(index + 1, total);
            debug!(chunk = index + 1, of = total, len = chunk.len(), "writing chunk");
            self.write_chunk(chunk)?;
            self.flush()?;

            report.bytes += chunk.len();
            report.chunks += 1;
        }

        Ok(report)
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        loop {
            match self.inner.write(chunk) {
                Ok(n) if n == chunk.len() => return Ok(()),
                Ok(n) => {
                    return Err(TransportError::ShortWrite {
                        written: n,
                        expected: chunk.len(),
                    }
                    .into())
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Instant;

    use super::*;
    use crate::error::ErrorKind as FrameErrorKind;

    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<(usize, Instant)>,
        flushes: usize,
        data: Vec<u8>,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes.push((buf.len(), Instant::now()));
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn splits_into_bounded_chunks_in_order() {
        let delay = Duration::from_millis(5);
        let data: Vec<u8> = (0..770u32).map(|i| i as u8).collect();
        let mut writer = ChunkedWriter::with_pacing(RecordingWriter::default(), 256, delay);

        let report = writer.send(&data).unwrap();
        assert_eq!(
            report,
            SendReport {
                bytes: 770,
                chunks: 4
            }
        );

        let inner = writer.into_inner();
        let sizes: Vec<usize> = inner.writes.iter().map(|(len, _)| *len).collect();
        assert_eq!(sizes, vec![256, 256, 256, 2]);
        assert_eq!(inner.data, data);
        assert_eq!(inner.flushes, 4);

        for pair in inner.writes.windows(2) {
            assert!(pair[1].1.duration_since(pair[0].1) >= delay);
        }
    }

    #[test]
    fn progress_reports_each_chunk() {
        let mut seen = Vec::new();
        let mut writer =
            ChunkedWriter::with_pacing(RecordingWriter::default(), 4, Duration::ZERO);

        writer
            .send_with_progress(&[0u8; 10], |index, total| seen.push((index, total)))
            .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn frame_smaller_than_chunk_is_one_write() {
        let mut writer = ChunkedWriter::new(RecordingWriter::default());
        let report = writer.send(&[0u8; 16]).unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(writer.get_ref().writes.len(), 1);
    }

    #[test]
    fn empty_buffer_writes_nothing() {
        let mut writer = ChunkedWriter::new(Cursor::new(Vec::<u8>::new()));
        let report = writer.send(&[]).unwrap();
        assert_eq!(report, SendReport { bytes: 0, chunks: 0 });
    }

    #[test]
    fn zero_chunk_size_rejected_before_io() {
        let mut writer =
            ChunkedWriter::with_pacing(RecordingWriter::default(), 0, Duration::ZERO);
        let err = writer.send(b"abc").unwrap_err();
        assert_eq!(err.kind(), FrameErrorKind::Validation);
        assert!(writer.get_ref().writes.is_empty());
    }

    struct HalfWriter;

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_write_is_fatal() {
        let mut writer = ChunkedWriter::with_pacing(HalfWriter, 8, Duration::ZERO);
        let err = writer.send(&[1u8; 20]).unwrap_err();
        assert_eq!(err.kind(), FrameErrorKind::Transport);
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ShortWrite {
                written: 4,
                expected: 8
            })
        ));
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn interrupted_write_is_retried() {
        let mut writer = ChunkedWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.send(b"retry").unwrap();
        assert_eq!(writer.into_inner().data, b"retry");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_error_surfaces_as_transport() {
        let mut writer = ChunkedWriter::new(BrokenPipe);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Io(_))));
    }
}
