//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows both real serial ports
//! and mock implementations to be used interchangeably, together with the
//! line settings applied to them.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Standard XON character (DC1).
pub const XON: u8 = 0x11;

/// Standard XOFF character (DC3).
pub const XOFF: u8 = 0x13;

/// Default line speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Framing and speed, applied in a single configuration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSettings {
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub baud_rate: u32,
}

/// Flow control and the options that only matter for some flow modes.
///
/// `xon`/`xoff` are used by software flow control. `substitute_errors`
/// asks the driver to replace bytes with parity or framing errors, and
/// `toggle_control_lines` asserts DTR and RTS once the port is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSettings {
    pub flow_control: FlowControl,
    pub xon: u8,
    pub xoff: u8,
    pub substitute_errors: bool,
    pub toggle_control_lines: bool,
}

impl ControlSettings {
    /// No flow control and every optional behaviour switched off.
    pub const fn disabled() -> Self {
        Self {
            flow_control: FlowControl::None,
            xon: XON,
            xoff: XOFF,
            substitute_errors: false,
            toggle_control_lines: false,
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

/// The full set of line parameters for one session.
///
/// Built once and applied once; there are no setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfiguration {
    data: DataSettings,
    control: ControlSettings,
}

impl LineConfiguration {
    pub const fn new(data: DataSettings, control: ControlSettings) -> Self {
        Self { data, control }
    }

    /// 115200 baud, 8 data bits, no parity, 1 stop bit, no flow control.
    pub const fn standard_8n1(baud_rate: u32) -> Self {
        Self::new(
            DataSettings {
                data_bits: DataBits::Eight,
                stop_bits: StopBits::One,
                parity: Parity::None,
                baud_rate,
            },
            ControlSettings::disabled(),
        )
    }

    pub fn data(&self) -> &DataSettings {
        &self.data
    }

    pub fn control(&self) -> &ControlSettings {
        &self.control
    }

    pub fn baud_rate(&self) -> u32 {
        self.data.baud_rate
    }
}

impl Default for LineConfiguration {
    fn default() -> Self {
        Self::standard_8n1(DEFAULT_BAUD_RATE)
    }
}

/// Options used when the device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Ask the OS for exclusive ownership of the device (TIOCEXCL on unix).
    pub exclusive: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { exclusive: true }
    }
}

/// Trait for serial port I/O operations.
///
/// This trait abstracts over synchronous serial port operations, allowing both
/// real hardware ports and mock implementations for testing.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Push any buffered output to the device.
    fn flush(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the read/write timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Apply speed and framing.
    fn configure_data(&mut self, settings: &DataSettings) -> Result<(), PortError>;

    /// Apply flow control and its related options.
    fn configure_control(&mut self, settings: &ControlSettings) -> Result<(), PortError>;

    /// Open a second endpoint onto the same device.
    ///
    /// The clone shares the device but is closed independently.
    fn try_clone_endpoint(&self) -> Result<Box<dyn SerialPortAdapter>, PortError>;

    /// Release this endpoint. Closing twice returns `PortError::NotOpen`.
    fn close(&mut self) -> Result<(), PortError>;

    /// Whether `close` has not yet been called.
    fn is_open(&self) -> bool;
}

/// An open port handle, owned by exactly one session.
pub type PortHandle = Box<dyn SerialPortAdapter>;

/// Opens devices by path. Lets setup run against real hardware or a mock.
pub trait PortOpener {
    fn open(&self, path: &str, options: &OpenOptions) -> Result<PortHandle, PortError>;
}
