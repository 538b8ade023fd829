//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own `SerialPortAdapter`
//! trait for dependency injection and testing.

use super::error::PortError;
use super::traits::{
    ControlSettings, DataSettings, FlowControl, OpenOptions, PortHandle, PortOpener,
    SerialPortAdapter, DEFAULT_BAUD_RATE, XOFF, XON,
};
use serialport::{SerialPortInfo, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Poll interval used until the session sets its own.
const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port; `None` once closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port for reading and writing.
    ///
    /// The port starts at 115200 8N1; line settings are applied afterwards
    /// through [`SerialPortAdapter::configure_data`] and
    /// [`SerialPortAdapter::configure_control`].
    ///
    /// # Example
    /// ```no_run
    /// use serial_plot::port::{OpenOptions, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &OpenOptions::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, options: &OpenOptions) -> Result<Self, PortError> {
        let builder = serialport::new(port_name, DEFAULT_BAUD_RATE).timeout(OPEN_TIMEOUT);
        let port = open_builder(builder, options).map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
            serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
            _ => PortError::Serial(e),
        })?;

        debug!(port = port_name, exclusive = options.exclusive, "Serial port opened");

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }

    fn wrap(port: Box<dyn serialport::SerialPort>, name: String) -> Self {
        Self {
            port: Some(port),
            name,
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }
}

#[cfg(unix)]
fn open_builder(
    builder: serialport::SerialPortBuilder,
    options: &OpenOptions,
) -> serialport::Result<Box<dyn serialport::SerialPort>> {
    let mut port = builder.open_native()?;
    port.set_exclusive(options.exclusive)?;
    Ok(Box::new(port))
}

// COM ports are exclusive by construction on Windows.
#[cfg(not(unix))]
fn open_builder(
    builder: serialport::SerialPortBuilder,
    _options: &OpenOptions,
) -> serialport::Result<Box<dyn serialport::SerialPort>> {
    builder.open()
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port_mut()?.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port_mut()?.read(buffer).map_err(PortError::Io)
    }

    fn flush(&mut self) -> Result<(), PortError> {
        self.port_mut()?.flush().map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port_mut()?
            .set_timeout(timeout)
            .map_err(PortError::Serial)
    }

    fn configure_data(&mut self, settings: &DataSettings) -> Result<(), PortError> {
        let port = self.port_mut()?;
        port.set_baud_rate(settings.baud_rate)?;
        port.set_data_bits(settings.data_bits.into())?;
        port.set_stop_bits(settings.stop_bits.into())?;
        port.set_parity(settings.parity.into())?;
        Ok(())
    }

    fn configure_control(&mut self, settings: &ControlSettings) -> Result<(), PortError> {
        if settings.substitute_errors {
            return Err(PortError::config(
                "parity/framing error substitution is not supported by the native backend",
            ));
        }
        if settings.flow_control == FlowControl::Software
            && (settings.xon != XON || settings.xoff != XOFF)
        {
            return Err(PortError::config(format!(
                "custom XON/XOFF characters ({:#04x}/{:#04x}) are not supported",
                settings.xon, settings.xoff
            )));
        }

        let port = self.port_mut()?;
        port.set_flow_control(settings.flow_control.into())?;
        if settings.toggle_control_lines {
            port.write_data_terminal_ready(true)?;
            port.write_request_to_send(true)?;
        }
        Ok(())
    }

    fn try_clone_endpoint(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let port = self.port.as_ref().ok_or(PortError::NotOpen)?;
        let clone = port.try_clone()?;
        Ok(Box::new(Self::wrap(clone, self.name.clone())))
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the boxed port releases the file descriptor / handle.
        match self.port.take() {
            Some(port) => {
                drop(port);
                debug!(port = %self.name, "Serial endpoint closed");
                Ok(())
            }
            None => Err(PortError::NotOpen),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field(
                "baud_rate",
                &self.port.as_ref().and_then(|p| p.baud_rate().ok()),
            )
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// Opens real devices through the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl PortOpener for NativeOpener {
    fn open(&self, path: &str, options: &OpenOptions) -> Result<PortHandle, PortError> {
        Ok(Box::new(SyncSerialPort::open(path, options)?))
    }
}

/// One line of `--list-ports` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
}

impl From<SerialPortInfo> for PortSummary {
    fn from(info: SerialPortInfo) -> Self {
        let (kind, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let label = match (usb.manufacturer, usb.product) {
                    (Some(m), Some(p)) => Some(format!("{m} {p}")),
                    (Some(m), None) => Some(m),
                    (None, p) => p,
                };
                (
                    format!("usb {:04x}:{:04x}", usb.vid, usb.pid),
                    label,
                )
            }
            SerialPortType::BluetoothPort => ("bluetooth".to_string(), None),
            SerialPortType::PciPort => ("pci".to_string(), None),
            SerialPortType::Unknown => ("unknown".to_string(), None),
        };
        Self {
            name: info.port_name,
            kind,
            description,
        }
    }
}

/// Enumerate the serial ports visible to this process.
pub fn list_ports() -> Result<Vec<PortSummary>, PortError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(PortSummary::from)
        .collect())
}
