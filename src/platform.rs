//! Default device paths per operating system.

use crate::port::PortError;

/// First USB serial adapter on Linux.
pub const LINUX_DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// FTDI adapter used during development on macOS.
pub const MACOS_DEFAULT_PORT: &str = "/dev/cu.usbserial-A70362A3";

/// Used on Windows when no port is given on the command line.
pub const WINDOWS_DEFAULT_PORT: &str = "COM13";

/// Operating system families with a known device naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    Windows,
    MacOs,
    Other(String),
}

impl OsFamily {
    /// The family this binary was built for.
    pub fn detect() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Map an identifier in the form of `std::env::consts::OS`.
    pub fn from_identifier(os: &str) -> Self {
        match os {
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the device path for `os`.
///
/// Only Windows honours `requested`; Linux and macOS always use their fixed
/// path. Families without a known path are an error.
pub fn resolve_port_path(os: &OsFamily, requested: Option<&str>) -> Result<String, PortError> {
    match os {
        OsFamily::Linux => Ok(LINUX_DEFAULT_PORT.to_string()),
        OsFamily::MacOs => Ok(MACOS_DEFAULT_PORT.to_string()),
        OsFamily::Windows => Ok(requested.unwrap_or(WINDOWS_DEFAULT_PORT).to_string()),
        OsFamily::Other(name) => Err(PortError::UnsupportedPlatform(name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_linux_path() {
        let path = resolve_port_path(&OsFamily::from_identifier("linux"), None).unwrap();
        assert_eq!(path, "/dev/ttyUSB0");
    }

    #[test]
    fn test_windows_uses_argument() {
        let path = resolve_port_path(&OsFamily::from_identifier("windows"), Some("COM7")).unwrap();
        assert_eq!(path, "COM7");
    }

    #[test]
    fn test_windows_default() {
        let path = resolve_port_path(&OsFamily::Windows, None).unwrap();
        assert_eq!(path, "COM13");
    }

    #[test]
    fn test_macos_path() {
        let path = resolve_port_path(&OsFamily::from_identifier("macos"), None).unwrap();
        assert_eq!(path, "/dev/cu.usbserial-A70362A3");
    }

    #[test]
    fn test_unknown_platform_is_error() {
        let err = resolve_port_path(&OsFamily::from_identifier("freebsd"), Some("COM1")).unwrap_err();
        assert!(matches!(err, PortError::UnsupportedPlatform(name) if name == "freebsd"));
    }

    #[test]
    fn test_detect_round_trips_identifier() {
        assert_eq!(OsFamily::detect().as_str(), std::env::consts::OS);
    }

    proptest! {
        #[test]
        fn fixed_platforms_ignore_argument(arg in "\\PC{0,24}") {
            prop_assert_eq!(
                resolve_port_path(&OsFamily::Linux, Some(&arg)).unwrap(),
                LINUX_DEFAULT_PORT
            );
            prop_assert_eq!(
                resolve_port_path(&OsFamily::MacOs, Some(&arg)).unwrap(),
                MACOS_DEFAULT_PORT
            );
        }

        #[test]
        fn windows_returns_argument(arg in "COM[0-9]{1,3}") {
            prop_assert_eq!(resolve_port_path(&OsFamily::Windows, Some(&arg)).unwrap(), arg);
        }
    }
}
