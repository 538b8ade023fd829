//! Blocking byte streams bound to an open port.
//!
//! Each stream owns its own endpoint cloned from the session handle, so the
//! input, the output and the handle can be closed one after another.

use super::error::PortError;
use super::traits::{PortHandle, SerialPortAdapter};
use crate::shutdown::ShutdownSignal;
use std::io::{self, Read, Write};
use std::thread;

/// Which way bytes flow through a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    Input,
    Output,
}

impl std::fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// How stream calls wait for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Reads wait until at least one byte arrives; writes wait until the
    /// device accepts the data. Poll timeouts of the port are retried.
    #[default]
    Blocking,
}

fn closed_stream() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "stream is closed")
}

fn to_io_error(err: PortError) -> io::Error {
    match err {
        PortError::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// Reading half of a session.
#[derive(Debug)]
pub struct InByteStream {
    port: Option<PortHandle>,
    mode: StreamMode,
    shutdown: Option<ShutdownSignal>,
}

impl InByteStream {
    pub fn new(port: PortHandle, mode: StreamMode) -> Self {
        Self {
            port: Some(port),
            mode,
            shutdown: None,
        }
    }

    /// End blocked reads with `Ok(0)` once `signal` fires.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Name of the underlying endpoint, if still open.
    pub fn name(&self) -> Option<&str> {
        self.port.as_deref().map(|p| p.name())
    }

    /// Release the endpoint. The stream is unusable afterwards even if the
    /// endpoint reported an error while closing.
    pub fn close(&mut self) -> Result<(), PortError> {
        let mut port = self.port.take().ok_or(PortError::NotOpen)?;
        port.close()
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }
}

impl Read for InByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let port = self.port.as_mut().ok_or_else(closed_stream)?;
            match port.read_bytes(buf) {
                Ok(0) => {}
                Ok(n) => return Ok(n),
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(to_io_error(e)),
            }

            if self.shutdown_requested() {
                return Ok(0);
            }
            thread::yield_now();
        }
    }
}

/// Writing half of a session.
#[derive(Debug)]
pub struct OutByteStream {
    port: Option<PortHandle>,
    mode: StreamMode,
    shutdown: Option<ShutdownSignal>,
}

impl OutByteStream {
    pub fn new(port: PortHandle, mode: StreamMode) -> Self {
        Self {
            port: Some(port),
            mode,
            shutdown: None,
        }
    }

    /// Abort blocked writes once `signal` fires.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.port.as_deref().map(|p| p.name())
    }

    /// Release the endpoint. The stream is unusable afterwards even if the
    /// endpoint reported an error while closing.
    pub fn close(&mut self) -> Result<(), PortError> {
        let mut port = self.port.take().ok_or(PortError::NotOpen)?;
        port.close()
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }
}

impl Write for OutByteStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let port = self.port.as_mut().ok_or_else(closed_stream)?;
            match port.write_bytes(buf) {
                Ok(0) => {}
                Ok(n) => return Ok(n),
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(to_io_error(e)),
            }

            if self.shutdown_requested() {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "shutdown requested",
                ));
            }
            thread::yield_now();
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(closed_stream)?;
        port.flush().map_err(to_io_error)
    }
}

/// A stream of either direction, as returned by [`open_stream`].
#[derive(Debug)]
pub enum ByteStream {
    Input(InByteStream),
    Output(OutByteStream),
}

impl ByteStream {
    pub fn direction(&self) -> StreamDirection {
        match self {
            Self::Input(_) => StreamDirection::Input,
            Self::Output(_) => StreamDirection::Output,
        }
    }

    pub fn into_input(self) -> Option<InByteStream> {
        match self {
            Self::Input(stream) => Some(stream),
            Self::Output(_) => None,
        }
    }

    pub fn into_output(self) -> Option<OutByteStream> {
        match self {
            Self::Output(stream) => Some(stream),
            Self::Input(_) => None,
        }
    }
}

/// Create a stream for `direction` on a fresh endpoint of `handle`.
pub fn open_stream(
    handle: &dyn SerialPortAdapter,
    direction: StreamDirection,
    mode: StreamMode,
) -> Result<ByteStream, PortError> {
    let endpoint = handle.try_clone_endpoint()?;
    Ok(match direction {
        StreamDirection::Input => ByteStream::Input(InByteStream::new(endpoint, mode)),
        StreamDirection::Output => ByteStream::Output(OutByteStream::new(endpoint, mode)),
    })
}

/// Shorthand for `open_stream(handle, StreamDirection::Input, mode)`.
pub fn open_input(handle: &dyn SerialPortAdapter, mode: StreamMode) -> Result<InByteStream, PortError> {
    Ok(InByteStream::new(handle.try_clone_endpoint()?, mode))
}

/// Shorthand for `open_stream(handle, StreamDirection::Output, mode)`.
pub fn open_output(
    handle: &dyn SerialPortAdapter,
    mode: StreamMode,
) -> Result<OutByteStream, PortError> {
    Ok(OutByteStream::new(handle.try_clone_endpoint()?, mode))
}

/// The two streams of one session, bound to the same device.
#[derive(Debug)]
pub struct StreamPair {
    pub input: InByteStream,
    pub output: OutByteStream,
}
