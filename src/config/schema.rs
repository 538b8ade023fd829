//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::{
    ControlSettings, DataBits, DataSettings, FlowControl, LineConfiguration, OpenOptions, Parity,
    StopBits, DEFAULT_BAUD_RATE, XOFF, XON,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial line configuration
    pub serial: SerialConfig,
    /// Plotting configuration
    pub plot: PlotConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that cannot produce a working session.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation("serial.baud_rate", "must be greater than 0"));
        }
        if self.serial.poll_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.poll_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.plot.history == 0 {
            return Err(ConfigError::validation("plot.history", "must be greater than 0"));
        }
        if self.plot.refresh_rate_hz == 0 {
            return Err(ConfigError::validation(
                "plot.refresh_rate_hz",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    /// XON character for software flow control
    pub xon: u8,
    /// XOFF character for software flow control
    pub xoff: u8,
    /// Replace bytes received with parity/framing errors
    pub substitute_errors: bool,
    /// Assert DTR and RTS after configuring
    pub toggle_control_lines: bool,
    /// Request exclusive access to the device
    pub exclusive: bool,
    /// How long a single blocking read waits before re-checking for shutdown
    pub poll_timeout_ms: u64,
    /// Port aliases applied to the resolved device path
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            xon: XON,
            xoff: XOFF,
            substitute_errors: false,
            toggle_control_lines: false,
            exclusive: true,
            poll_timeout_ms: 100,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Line settings described by this section.
    pub fn line_configuration(&self) -> LineConfiguration {
        LineConfiguration::new(
            DataSettings {
                data_bits: self.data_bits,
                stop_bits: self.stop_bits,
                parity: self.parity,
                baud_rate: self.baud_rate,
            },
            ControlSettings {
                flow_control: self.flow_control,
                xon: self.xon,
                xoff: self.xoff,
                substitute_errors: self.substitute_errors,
                toggle_control_lines: self.toggle_control_lines,
            },
        )
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            exclusive: self.exclusive,
        }
    }

    /// Get the poll timeout as Duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// How incoming bytes become samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Every byte is one sample (0..=255)
    #[default]
    Raw,
    /// Newline-delimited decimal numbers
    Ascii,
}

impl std::str::FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "ascii" => Ok(Self::Ascii),
            other => Err(format!("unknown sample format '{other}' (expected raw or ascii)")),
        }
    }
}

/// Plotting configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub format: SampleFormat,
    /// Number of samples kept on screen
    pub history: usize,
    /// Redraw rate of the terminal plotter in Hz
    pub refresh_rate_hz: u32,
    /// Width of the bars printed by the text plotter
    pub bar_width: usize,
    /// Written to the device once before plotting starts
    pub start_command: Option<String>,
    /// Colour palette of the terminal plotter
    pub theme: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            format: SampleFormat::Raw,
            history: 200,
            refresh_rate_hz: 30,
            bar_width: 60,
            start_command: None,
            theme: "dark".to_string(),
        }
    }
}

impl PlotConfig {
    /// Get refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.refresh_rate_hz.max(1)))
    }

    /// Bytes of `start_command`, with `\n` and `\r` escapes expanded.
    pub fn start_bytes(&self) -> Option<Vec<u8>> {
        self.start_command
            .as_deref()
            .filter(|cmd| !cmd.is_empty())
            .map(|cmd| cmd.replace("\\r", "\r").replace("\\n", "\n").into_bytes())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.poll_timeout_ms, 100);
        assert_eq!(config.plot.format, SampleFormat::Raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_line_configuration_from_section() {
        let serial = SerialConfig {
            baud_rate: 9600,
            parity: Parity::Even,
            flow_control: FlowControl::Hardware,
            toggle_control_lines: true,
            ..Default::default()
        };
        let line = serial.line_configuration();
        assert_eq!(line.baud_rate(), 9600);
        assert_eq!(line.data().parity, Parity::Even);
        assert_eq!(line.control().flow_control, FlowControl::Hardware);
        assert!(line.control().toggle_control_lines);
    }

    #[test]
    fn test_port_aliases_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [serial.port_aliases]
            "/dev/ttyUSB0" = "/dev/ttyACM0"
        "#,
        )
        .unwrap();
        assert_eq!(
            config.serial.port_aliases.get("/dev/ttyUSB0").map(String::as_str),
            Some("/dev/ttyACM0")
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[plot]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            baud_rate = 9600
            parity = "odd"

            [plot]
            format = "ascii"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.parity, Parity::Odd);
        assert_eq!(config.plot.format, SampleFormat::Ascii);
        // Defaults should still work
        assert_eq!(config.plot.history, 200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { key, .. }) if key == "serial.baud_rate"
        ));

        let mut config = Config::default();
        config.plot.history = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_command_escapes() {
        let plot = PlotConfig {
            start_command: Some("go\\r\\n".to_string()),
            ..Default::default()
        };
        assert_eq!(plot.start_bytes(), Some(b"go\r\n".to_vec()));
        assert_eq!(PlotConfig::default().start_bytes(), None);
    }

    #[test]
    fn test_sample_format_from_str() {
        assert_eq!("ASCII".parse::<SampleFormat>(), Ok(SampleFormat::Ascii));
        assert_eq!("raw".parse::<SampleFormat>(), Ok(SampleFormat::Raw));
        assert!("csv".parse::<SampleFormat>().is_err());
    }
}
