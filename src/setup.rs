//! Session setup: resolve the device, open it, configure the line and bind
//! the two blocking streams.
//!
//! Failures come back as [`SetupError`]; anything acquired before the
//! failing step is closed again before returning.

use crate::cleanup::CleanupHandler;
use crate::config::Config;
use crate::platform::{resolve_port_path, OsFamily};
use crate::port::{
    configure, open_input, open_output, LineConfiguration, OpenOptions, PortError, PortHandle,
    PortOpener, StreamDirection, StreamMode, StreamPair,
};
use crate::shutdown::ShutdownSignal;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a session could not be set up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no default serial port is known for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("failed to open serial port '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: PortError,
    },

    #[error("serial port '{path}' rejected the line configuration: {source}")]
    Configure {
        path: String,
        #[source]
        source: PortError,
    },

    #[error("failed to create {direction} stream: {source}")]
    Stream {
        direction: StreamDirection,
        #[source]
        source: PortError,
    },
}

/// Everything `begin` needs to know.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub os: OsFamily,
    /// Device path from the command line; only used on Windows.
    pub port_argument: Option<String>,
    pub line: LineConfiguration,
    pub open: OpenOptions,
    pub poll_timeout: Duration,
    pub port_aliases: HashMap<String, String>,
    pub shutdown: ShutdownSignal,
}

impl SetupRequest {
    /// Defaults: detected OS, 115200 8N1, exclusive open, 100 ms polls.
    pub fn new(port_argument: Option<String>) -> Self {
        Self {
            os: OsFamily::detect(),
            port_argument,
            line: LineConfiguration::default(),
            open: OpenOptions::default(),
            poll_timeout: Duration::from_millis(100),
            port_aliases: HashMap::new(),
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Build a request from the loaded configuration.
    pub fn from_config(config: &Config, port_argument: Option<String>) -> Self {
        Self {
            line: config.serial.line_configuration(),
            open: config.serial.open_options(),
            poll_timeout: config.serial.poll_timeout(),
            port_aliases: config.serial.port_aliases.clone(),
            ..Self::new(port_argument)
        }
    }

    pub fn with_os(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// An open, configured port and its two streams.
///
/// Dropping a session without calling [`PortSession::into_cleanup`] still
/// tears it down in order.
#[derive(Debug)]
pub struct PortSession {
    path: String,
    line: LineConfiguration,
    resources: CleanupHandler,
}

impl PortSession {
    /// Device path the session is bound to.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line(&self) -> &LineConfiguration {
        &self.line
    }

    /// Lend the streams to a consumer.
    pub fn streams_mut(&mut self) -> &mut StreamPair {
        self.resources.streams_mut()
    }

    /// Hand every resource to the cleanup handler.
    pub fn into_cleanup(self) -> CleanupHandler {
        self.resources
    }
}

fn release(mut handle: PortHandle) {
    if let Err(error) = handle.close() {
        warn!(port = handle.name(), %error, "Failed to release port after setup error");
    }
}

/// Resolve, open, configure and bind streams.
pub fn begin(request: &SetupRequest, opener: &dyn PortOpener) -> Result<PortSession, SetupError> {
    info!(os = %request.os, "Setting up serial session");

    let resolved = resolve_port_path(&request.os, request.port_argument.as_deref())
        .map_err(|_| SetupError::UnsupportedPlatform(request.os.to_string()))?;
    let path = request
        .port_aliases
        .get(&resolved)
        .cloned()
        .unwrap_or(resolved);

    info!(port = %path, "Open port");
    let mut handle = opener
        .open(&path, &request.open)
        .map_err(|source| SetupError::Open {
            path: path.clone(),
            source,
        })?;

    let configured = configure(handle.as_mut(), &request.line)
        .and_then(|()| handle.set_timeout(request.poll_timeout));
    if let Err(source) = configured {
        release(handle);
        return Err(SetupError::Configure { path, source });
    }

    let mut output = match open_output(handle.as_ref(), StreamMode::Blocking) {
        Ok(stream) => stream.with_shutdown(request.shutdown.clone()),
        Err(source) => {
            release(handle);
            return Err(SetupError::Stream {
                direction: StreamDirection::Output,
                source,
            });
        }
    };
    let input = match open_input(handle.as_ref(), StreamMode::Blocking) {
        Ok(stream) => stream.with_shutdown(request.shutdown.clone()),
        Err(source) => {
            if let Err(error) = output.close() {
                debug!(%error, "Output stream close failed during setup rollback");
            }
            release(handle);
            return Err(SetupError::Stream {
                direction: StreamDirection::Input,
                source,
            });
        }
    };

    info!(port = %path, baud = request.line.baud_rate(), "Serial session ready");
    Ok(PortSession {
        resources: CleanupHandler::new(path.clone(), StreamPair { input, output }, handle),
        path,
        line: request.line,
    })
}
