//! Shared test utilities for serial-plot tests.

#![allow(dead_code)]

use serial_plot::platform::OsFamily;
use serial_plot::port::{MockOpener, MockSerialPort};
use serial_plot::setup::SetupRequest;

/// Create a mock serial port with pre-programmed read data.
///
/// # Example
/// ```ignore
/// let mock = create_mock_port_with_responses("MOCK0", vec![b"1\n", b"2\n"]);
/// ```
pub fn create_mock_port_with_responses(port_name: &str, responses: Vec<&[u8]>) -> MockSerialPort {
    let mut mock = MockSerialPort::new(port_name);
    for response in responses {
        mock.enqueue_read(response);
    }
    mock
}

/// An opener handing out `mock`, plus a view on the same device for assertions.
pub fn mock_opener(mock: &MockSerialPort) -> MockOpener {
    MockOpener::new(mock.clone())
}

/// A request resolving as if running on `os`, with a short poll timeout.
pub fn request_for(os: OsFamily, port_argument: Option<&str>) -> SetupRequest {
    let mut request = SetupRequest::new(port_argument.map(str::to_string)).with_os(os);
    request.poll_timeout = std::time::Duration::from_millis(5);
    request
}
