//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware. Supports configurable read queues, logs of
//! writes, configuration calls and closes, and failure injection.

use super::error::PortError;
use super::traits::{
    ControlSettings, DataSettings, OpenOptions, PortHandle, PortOpener, SerialPortAdapter,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// One call made through the configuration methods of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCall {
    Data(DataSettings),
    Control(ControlSettings),
}

/// State shared by every endpoint cloned from the same mock device.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Configuration calls, in order.
    config_log: Vec<ConfigCall>,
    /// Names of endpoints, in the order they were closed.
    close_log: Vec<String>,
    /// Whether the next read/write should time out.
    should_timeout: bool,
    /// Configured timeout duration.
    timeout: Duration,
    /// Reject configuration calls with this message.
    reject_config: Option<String>,
    /// Number of upcoming close calls that fail.
    close_failures: usize,
    /// Fail the next endpoint clone.
    fail_clone: bool,
    /// Number of endpoints cloned so far.
    clones: usize,
}

/// Mock serial port implementation for testing.
///
/// Cloning the struct (`Clone`) gives another view of the same endpoint so a
/// test can keep inspecting the logs after handing the port away. Cloning
/// through [`SerialPortAdapter::try_clone_endpoint`] creates a new endpoint
/// named `<device>#<n>` that is closed independently.
///
/// # Example
/// ```
/// use serial_plot::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"42\n");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"42\n");
///
/// port.close().unwrap();
/// assert_eq!(port.close_log(), vec!["MOCK0".to_string()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The endpoint name.
    name: String,
    /// Device name shared by all endpoints.
    device: String,
    /// Whether this endpoint is still open.
    open: bool,
    /// The internal state, shared between endpoints.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            device: name.clone(),
            name,
            open: true,
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Configuration calls received by any endpoint.
    pub fn config_log(&self) -> Vec<ConfigCall> {
        self.state.lock().config_log.clone()
    }

    /// Endpoint names in close order.
    pub fn close_log(&self) -> Vec<String> {
        self.state.lock().close_log.clone()
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Make every configuration call fail with `PortError::Config(message)`.
    pub fn reject_configuration(&mut self, message: impl Into<String>) {
        self.state.lock().reject_config = Some(message.into());
    }

    /// Make the next `count` close calls fail.
    pub fn fail_next_closes(&mut self, count: usize) {
        self.state.lock().close_failures = count;
    }

    /// Make the next endpoint clone fail.
    pub fn fail_next_clone(&mut self) {
        self.state.lock().fail_clone = true;
    }

    /// Current timeout setting.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn ensure_open(&self) -> Result<(), PortError> {
        if self.open {
            Ok(())
        } else {
            Err(PortError::NotOpen)
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Same shape as a serial read that hit its timeout with no data.
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.ensure_open()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.ensure_open()?;
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn configure_data(&mut self, settings: &DataSettings) -> Result<(), PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if let Some(message) = &state.reject_config {
            return Err(PortError::config(message.clone()));
        }
        state.config_log.push(ConfigCall::Data(*settings));
        Ok(())
    }

    fn configure_control(&mut self, settings: &ControlSettings) -> Result<(), PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if let Some(message) = &state.reject_config {
            return Err(PortError::config(message.clone()));
        }
        state.config_log.push(ConfigCall::Control(*settings));
        Ok(())
    }

    fn try_clone_endpoint(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state.fail_clone {
            state.fail_clone = false;
            return Err(PortError::Io(std::io::Error::other("injected clone failure")));
        }
        state.clones += 1;

        Ok(Box::new(Self {
            name: format!("{}#{}", self.device, state.clones),
            device: self.device.clone(),
            open: true,
            state: Arc::clone(&self.state),
        }))
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state.close_failures > 0 {
            state.close_failures -= 1;
            return Err(PortError::Io(std::io::Error::other("injected close failure")));
        }
        state.close_log.push(self.name.clone());
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("open", &self.open)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// A [`PortOpener`] that hands out a prepared mock device.
#[derive(Debug, Clone)]
pub struct MockOpener {
    port: Option<MockSerialPort>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl MockOpener {
    /// Every `open` returns a view of `port`.
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port: Some(port),
            opened: Arc::default(),
        }
    }

    /// Every `open` fails with `PortError::NotFound`.
    pub fn missing_device() -> Self {
        Self {
            port: None,
            opened: Arc::default(),
        }
    }

    /// Paths passed to `open`, in call order.
    pub fn opened_paths(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl PortOpener for MockOpener {
    fn open(&self, path: &str, _options: &OpenOptions) -> Result<PortHandle, PortError> {
        self.opened.lock().push(path.to_string());
        match &self.port {
            Some(port) => Ok(Box::new(port.clone())),
            None => Err(PortError::not_found(path)),
        }
    }
}
