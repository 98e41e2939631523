use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serframe_transport::{ByteChannel, LinkConfig, SerialStream, TransportError};
use tracing::{debug, info};

use crate::error::{FrameError, Result};
use crate::reader::{ReplyReader, DEFAULT_POLL_INTERVAL, DEFAULT_READ_SIZE};
use crate::writer::{ChunkedWriter, SendReport, DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE};

/// Default pause between opening the port and draining its buffers.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Default window for collecting a device reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything a send/receive session needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Which port to open and how.
    pub link: LinkConfig,
    /// Maximum bytes per write. Default: 256.
    pub chunk_size: usize,
    /// Pause between consecutive chunks. Default: 2 ms.
    pub chunk_delay: Duration,
    /// Pause after opening, before buffers are drained. Default: 50 ms.
    pub settle_delay: Duration,
    /// How long to listen for a reply after sending. Default: 2 s.
    pub reply_timeout: Duration,
    /// Pause after a poll that yielded nothing. Default: 50 ms.
    pub poll_interval: Duration,
    /// Maximum bytes requested per poll. Default: 512.
    pub read_size: usize,
}

impl SessionConfig {
    /// Session settings for `port` with every other field at its default.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            link: LinkConfig::new(port),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_size: DEFAULT_READ_SIZE,
        }
    }

    /// Check the settings that would otherwise only fail mid-exchange.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FrameError::Validation {
                field: "chunk_size",
                value: 0,
                min: 1,
                max: usize::MAX as u64,
            });
        }
        Ok(())
    }
}

/// Where a session is in its open / drain / send / listen / close sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    /// Channel acquired; nothing sent or drained yet.
    Open,
    Draining,
    Sending { chunk: usize, of: usize },
    WaitingForReply,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Opening => f.write_str("opening"),
            SessionState::Open => f.write_str("open"),
            SessionState::Draining => f.write_str("draining"),
            SessionState::Sending { chunk, of } => write!(f, "sending chunk {chunk} of {of}"),
            SessionState::WaitingForReply => f.write_str("waiting-for-reply"),
            SessionState::Closed => f.write_str("closed"),
        }
    }
}

/// Outcome of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// What was written.
    pub sent: SendReport,
    /// Raw reply bytes, empty when the device stayed silent.
    pub reply: Bytes,
    /// Wall time from the first write to the end of the reply window.
    pub elapsed: Duration,
}

/// One send/receive exchange over a channel it owns.
///
/// The channel is released when [`exchange`](Self::exchange) returns, on
/// success and on failure alike, and in any case when the session is dropped.
pub struct Session<C: ByteChannel> {
    config: SessionConfig,
    state: SessionState,
    channel: Option<C>,
}

impl Session<SerialStream> {
    /// Open the serial port named in `config`.
    pub fn open_serial(config: SessionConfig) -> Result<Self> {
        Self::open(config, SerialStream::open)
    }
}

impl<C: ByteChannel> Session<C> {
    /// Acquire a channel through `opener`.
    ///
    /// `config` is validated first; an invalid config never reaches `opener`.
    /// On success the session is `Open`, on failure it goes to `Closed` and
    /// the error is returned.
    pub fn open<F>(config: SessionConfig, opener: F) -> Result<Self>
    where
        F: FnOnce(&LinkConfig) -> serframe_transport::Result<C>,
    {
        config.validate()?;

        let mut state = SessionState::Idle;
        transition(&mut state, SessionState::Opening);

        match opener(&config.link) {
            Ok(channel) => {
                transition(&mut state, SessionState::Open);
                Ok(Self {
                    config,
                    state,
                    channel: Some(channel),
                })
            }
            Err(err) => {
                transition(&mut state, SessionState::Closed);
                Err(err.into())
            }
        }
    }

    /// Drain the channel, send `frame` in paced chunks, then collect the reply.
    ///
    /// The channel is closed before this returns.
    pub fn exchange(&mut self, frame: &[u8]) -> Result<SessionReport> {
        let result = self.run(frame);
        self.close();
        result
    }

    fn run(&mut self, frame: &[u8]) -> Result<SessionReport> {
        let config = &self.config;
        let state = &mut self.state;
        let channel = self
            .channel
            .as_mut()
            .ok_or(FrameError::Transport(TransportError::Closed))?;

        if !config.settle_delay.is_zero() {
            std::thread::sleep(config.settle_delay);
        }

        transition(state, SessionState::Draining);
        channel.clear_input()?;
        channel.clear_output()?;

        info!(bytes = frame.len(), port = %channel.describe(), "sending frame");
        let started = Instant::now();
        let sent = ChunkedWriter::with_pacing(&mut *channel, config.chunk_size, config.chunk_delay)
            .send_with_progress(frame, |chunk, of| {
                transition(state, SessionState::Sending { chunk, of })
            })?;

        transition(state, SessionState::WaitingForReply);
        info!(
            bytes = sent.bytes,
            chunks = sent.chunks,
            "send complete, waiting for device response"
        );
        let reply = ReplyReader::with_polling(&mut *channel, config.read_size, config.poll_interval)
            .receive(config.reply_timeout)?;
        info!(bytes = reply.len(), "reply window closed");

        Ok(SessionReport {
            sent,
            reply,
            elapsed: started.elapsed(),
        })
    }

    /// Release the channel. Idempotent.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            debug!(port = %channel.describe(), "releasing channel");
            drop(channel);
        }
        transition(&mut self.state, SessionState::Closed);
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }
}

impl<C: ByteChannel> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}

fn transition(state: &mut SessionState, next: SessionState) {
    if *state != next {
        debug!(from = %state, to = %next, "session state");
        *state = next;
    }
}
