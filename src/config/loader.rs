//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, SampleFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_PLOT";

/// Config file name inside the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "serial-plot.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_PLOT_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `explicit` (the `--config` flag); must exist
    /// 2. `SERIAL_PLOT_CONFIG` environment variable
    /// 3. `./serial-plot.toml`
    /// 4. `<platform config dir>/serial-plot/config.toml`
    /// 5. Built-in defaults
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => resolve_config_path(),
        };

        let mut config = match &config_path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                load_from_file(path)?
            }
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Platform config directory for this program, e.g. `~/.config/serial-plot`.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-plot").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn env_var(suffix: &str) -> Option<(String, String)> {
    let name = format!("{ENV_PREFIX}_{suffix}");
    std::env::var(&name).ok().map(|value| (name, value))
}

/// Apply environment variable overrides to the configuration.
///
/// Pattern: `SERIAL_PLOT_<SECTION>_<KEY>`, e.g. `SERIAL_PLOT_SERIAL_BAUD_RATE=9600`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((name, val)) = env_var("SERIAL_BAUD_RATE") {
        config.serial.baud_rate = val
            .parse()
            .map_err(|_| ConfigError::env_parse(name, "Invalid baud rate"))?;
    }
    if let Some((name, val)) = env_var("SERIAL_POLL_TIMEOUT_MS") {
        config.serial.poll_timeout_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(name, "Invalid timeout"))?;
    }
    if let Some((name, val)) = env_var("PLOT_FORMAT") {
        config.plot.format = val
            .parse::<SampleFormat>()
            .map_err(|message| ConfigError::env_parse(name, message))?;
    }
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((_, val)) = env_var("LOGGING_FILE") {
        config.logging.file = Some(PathBuf::from(val));
    }

    Ok(())
}
