//! Configuration module for serial-plot.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `--config <FILE>` on the command line
//! 2. `SERIAL_PLOT_CONFIG` environment variable (explicit path)
//! 3. `./serial-plot.toml` (current directory)
//! 4. `serial-plot/config.toml` in the platform config directory
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `SERIAL_PLOT_SERIAL_BAUD_RATE=9600`
//! - `SERIAL_PLOT_SERIAL_POLL_TIMEOUT_MS=250`
//! - `SERIAL_PLOT_PLOT_FORMAT=ascii`
//! - `SERIAL_PLOT_LOGGING_LEVEL=debug`
//! - `SERIAL_PLOT_LOGGING_FILE=/tmp/serial-plot.log`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_plot::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load(None)?;
//! println!("Baud: {}", loader.config().serial.baud_rate);
//! # Ok::<(), serial_plot::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, PlotConfig, SampleFormat, SerialConfig};
