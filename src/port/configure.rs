//! Applies a [`LineConfiguration`] to an open port.

use super::error::PortError;
use super::traits::{LineConfiguration, SerialPortAdapter};
use tracing::debug;

/// Apply `line` to `port` in two calls: speed and framing first, then flow
/// control. Stops at the first rejection.
pub fn configure(port: &mut dyn SerialPortAdapter, line: &LineConfiguration) -> Result<(), PortError> {
    let data = line.data();
    port.configure_data(data)?;
    debug!(
        port = port.name(),
        baud = data.baud_rate,
        data_bits = ?data.data_bits,
        stop_bits = ?data.stop_bits,
        parity = ?data.parity,
        "Data settings applied"
    );

    let control = line.control();
    port.configure_control(control)?;
    debug!(
        port = port.name(),
        flow_control = ?control.flow_control,
        toggle_control_lines = control.toggle_control_lines,
        "Control settings applied"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::{ConfigCall, MockSerialPort};
    use crate::port::{ControlSettings, DataBits, FlowControl, Parity, StopBits};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_line_applies_two_calls() {
        let mut port = MockSerialPort::new("MOCK0");
        let line = LineConfiguration::standard_8n1(115_200);

        configure(&mut port, &line).unwrap();

        let log = port.config_log();
        assert_eq!(log.len(), 2);
        match log[0] {
            ConfigCall::Data(data) => {
                assert_eq!(data.baud_rate, 115_200);
                assert_eq!(data.data_bits, DataBits::Eight);
                assert_eq!(data.stop_bits, StopBits::One);
                assert_eq!(data.parity, Parity::None);
            }
            other => panic!("expected data settings first, got {:?}", other),
        }
        match log[1] {
            ConfigCall::Control(control) => {
                assert_eq!(control.flow_control, FlowControl::None);
                assert!(!control.substitute_errors);
                assert!(!control.toggle_control_lines);
                assert_eq!(control, ControlSettings::disabled());
            }
            other => panic!("expected control settings second, got {:?}", other),
        }
    }

    #[test]
    fn test_rejection_propagates() {
        let mut port = MockSerialPort::new("MOCK0");
        port.reject_configuration("unsupported baud");

        let err = configure(&mut port, &LineConfiguration::standard_8n1(12_345)).unwrap_err();
        assert!(matches!(err, PortError::Config(_)));
        assert!(port.config_log().is_empty());
    }
}
