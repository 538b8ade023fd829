//! Serial Plot Library
//!
//! Opens a serial device, configures the line, wraps it in a pair of
//! blocking byte streams and hands them to a plotting consumer. A cleanup
//! handler closes everything again when the application exits.
//!
//! # Modules
//!
//! - `platform`: default device path per operating system
//! - `port`: adapter trait, native and mock ports, line configuration, streams
//! - `setup`: the open/configure/bind sequence producing a `PortSession`
//! - `cleanup`: ordered, best-effort teardown
//! - `consumer`: sample decoding and the text plotter
//! - `tui`: sparkline plotter (when `tui` feature is enabled)
//! - `config`: Configuration management with TOML support
//! - `logging`: tracing subscriber setup
//! - `error`: Unified error handling
//!
//! # Example
//!
//! ```no_run
//! use serial_plot::consumer::{StreamConsumer, TextPlotter};
//! use serial_plot::config::SampleFormat;
//! use serial_plot::port::NativeOpener;
//! use serial_plot::setup::{begin, SetupRequest};
//!
//! let request = SetupRequest::new(None);
//! let mut session = begin(&request, &NativeOpener)?;
//! let mut plotter = TextPlotter::new(std::io::stdout(), SampleFormat::Raw, 200, 60);
//! plotter.consume(session.streams_mut(), &request.shutdown)?;
//! let report = session.into_cleanup().on_app_exit();
//! assert!(report.is_clean());
//! # Ok::<(), serial_plot::AppError>(())
//! ```

pub mod cleanup;
pub mod config;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod platform;
pub mod port;
pub mod setup;
pub mod shutdown;

// TUI module
#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types for convenience
pub use cleanup::{CleanupHandler, CleanupReport, Resource};
pub use error::{AppError, AppResult};
pub use platform::{resolve_port_path, OsFamily};
pub use port::{
    configure, DataBits, FlowControl, LineConfiguration, MockSerialPort, Parity, PortError,
    SerialPortAdapter, StopBits, StreamPair, SyncSerialPort,
};
pub use setup::{begin, PortSession, SetupError, SetupRequest};
pub use shutdown::ShutdownSignal;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
