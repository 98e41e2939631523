use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::Result;

/// Default maximum bytes requested per poll.
pub const DEFAULT_READ_SIZE: usize = 512;

/// Default pause after a poll that yielded nothing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Collects whatever a `Read` stream produces within a time window.
///
/// The bytes are not interpreted; a device may answer with text, a frame, or
/// nothing at all.
pub struct ReplyReader<T> {
    inner: T,
    read_size: usize,
    poll_interval: Duration,
}

impl<T: Read> ReplyReader<T> {
    /// Create a reply reader with default read size and poll interval.
    pub fn new(inner: T) -> Self {
        Self::with_polling(inner, DEFAULT_READ_SIZE, DEFAULT_POLL_INTERVAL)
    }

    /// Create a reply reader with explicit polling parameters.
    pub fn with_polling(inner: T, read_size: usize, poll_interval: Duration) -> Self {
        Self {
            inner,
            read_size: read_size.max(1),
            poll_interval,
        }
    }

    /// Poll until `timeout` elapses, returning everything read in arrival order.
    ///
    /// Silence for the whole window yields an empty buffer, not an error.
    /// An empty poll (`Ok(0)`, `TimedOut` or `WouldBlock`) sleeps for the poll
    /// interval, clamped to the remaining window.
    ///
    /// No read starts after the deadline, but one started just before it
    /// blocks for up to the stream's own read timeout, so the call may return
    /// that much later than `timeout`. Keep the port's read timeout short
    /// relative to the reply window.
    pub fn receive(&mut self, timeout: Duration) -> Result<Bytes> {
        let deadline = Instant::now() + timeout;
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        let mut chunk = vec![0u8; self.read_size];

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    0
                }
                Err(err) => return Err(err.into()),
            };

            if read > 0 {
                debug!(len = read, total = buf.len() + read, "reply bytes received");
                buf.extend_from_slice(&chunk[..read]);
                continue;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            std::thread::sleep(self.poll_interval.min(remaining));
        }

        Ok(buf.freeze())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use super::*;
    use crate::error::{ErrorKind as FrameErrorKind, FrameError};

    /// Yields scripted reads, then reports `TimedOut` like an idle serial port.
    struct ScriptedPort {
        script: VecDeque<std::io::Result<Vec<u8>>>,
        polls: usize,
    }

    impl ScriptedPort {
        fn new(script: Vec<std::io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
                polls: 0,
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.polls += 1;
            match self.script.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(Err(err)) => Err(err),
                None => Err(std::io::Error::from(ErrorKind::TimedOut)),
            }
        }
    }

    #[test]
    fn silent_channel_yields_empty_reply() {
        let mut reader =
            ReplyReader::with_polling(ScriptedPort::new(Vec::new()), 512, Duration::from_millis(5));

        let started = Instant::now();
        let reply = reader.receive(Duration::from_millis(40)).unwrap();

        assert!(reply.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(reader.get_ref().polls > 1);
    }

    #[test]
    fn eof_counts_as_silence() {
        let mut reader =
            ReplyReader::with_polling(Cursor::new(Vec::<u8>::new()), 16, Duration::from_millis(5));
        let reply = reader.receive(Duration::from_millis(20)).unwrap();
        assert!(reply.is_empty());
    }

    #[test]
    fn accumulates_in_arrival_order() {
        let port = ScriptedPort::new(vec![
            Ok(b"OK ".to_vec()),
            Err(std::io::Error::from(ErrorKind::WouldBlock)),
            Ok(b"cfg v2".to_vec()),
            Err(std::io::Error::from(ErrorKind::Interrupted)),
            Ok(b"\r\n".to_vec()),
        ]);
        let mut reader = ReplyReader::with_polling(port, 512, Duration::from_millis(1));

        let reply = reader.receive(Duration::from_millis(50)).unwrap();
        assert_eq!(reply.as_ref(), b"OK cfg v2\r\n");
    }

    #[test]
    fn reads_are_bounded_by_read_size() {
        let port = ScriptedPort::new(vec![Ok(vec![7u8; 40])]);
        let mut reader = ReplyReader::with_polling(port, 16, Duration::from_millis(1));

        let reply = reader.receive(Duration::from_millis(20)).unwrap();
        assert_eq!(reply.len(), 16);
    }

    #[test]
    fn zero_timeout_does_not_poll() {
        let mut reader = ReplyReader::new(ScriptedPort::new(vec![Ok(b"late".to_vec())]));
        let reply = reader.receive(Duration::ZERO).unwrap();
        assert!(reply.is_empty());
        assert_eq!(reader.get_ref().polls, 0);
    }

    /// Blocks for a fixed time on every read, like a port with a long read timeout.
    struct SlowPort {
        block: Duration,
        polls: usize,
    }

    impl Read for SlowPort {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            self.polls += 1;
            std::thread::sleep(self.block);
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }

    #[test]
    fn read_started_before_deadline_runs_to_completion() {
        let port = SlowPort {
            block: Duration::from_millis(30),
            polls: 0,
        };
        let mut reader = ReplyReader::with_polling(port, 16, Duration::from_millis(1));

        let started = Instant::now();
        let reply = reader.receive(Duration::from_millis(5)).unwrap();

        assert!(reply.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(reader.get_ref().polls, 1);
    }

    #[test]
    fn platform_error_is_transport_error() {
        let port = ScriptedPort::new(vec![Err(std::io::Error::from(ErrorKind::BrokenPipe))]);
        let mut reader = ReplyReader::new(port);

        let err = reader.receive(Duration::from_millis(50)).unwrap_err();
        assert_eq!(err.kind(), FrameErrorKind::Transport);
        assert!(matches!(err, FrameError::Transport(_)));
    }
}
