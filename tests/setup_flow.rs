//! Setup, consumption and cleanup of a whole session against the mock port.

mod common;

use common::{create_mock_port_with_responses, mock_opener, request_for};
use pretty_assertions::assert_eq;
use serial_plot::cleanup::Resource;
use serial_plot::config::SampleFormat;
use serial_plot::consumer::{StreamConsumer, TextPlotter};
use serial_plot::platform::OsFamily;
use serial_plot::port::{
    ConfigCall, ControlSettings, DataBits, DataSettings, FlowControl, MockOpener, MockSerialPort,
    Parity, PortError, StopBits,
};
use serial_plot::setup::{begin, SetupError};
use serial_plot::shutdown::ShutdownSignal;
use std::io::{Read, Write};

#[test]
fn test_default_session_configures_115200_8n1() {
    let mock = MockSerialPort::new("MOCK0");
    let session = begin(&request_for(OsFamily::Linux, None), &mock_opener(&mock)).unwrap();

    assert_eq!(session.line().baud_rate(), 115_200);
    assert_eq!(
        mock.config_log(),
        vec![
            ConfigCall::Data(DataSettings {
                data_bits: DataBits::Eight,
                stop_bits: StopBits::One,
                parity: Parity::None,
                baud_rate: 115_200,
            }),
            ConfigCall::Control(ControlSettings {
                flow_control: FlowControl::None,
                xon: 0x11,
                xoff: 0x13,
                substitute_errors: false,
                toggle_control_lines: false,
            }),
        ]
    );
}

#[test]
fn test_platform_paths_reach_the_opener() {
    let cases = [
        (OsFamily::Linux, Some("COM7"), "/dev/ttyUSB0"),
        (OsFamily::MacOs, None, "/dev/cu.usbserial-A70362A3"),
        (OsFamily::Windows, Some("COM7"), "COM7"),
        (OsFamily::Windows, None, "COM13"),
    ];

    for (os, argument, expected) in cases {
        let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
        let session = begin(&request_for(os.clone(), argument), &opener).unwrap();
        assert_eq!(session.path(), expected, "{os}");
        assert_eq!(opener.opened_paths(), vec![expected.to_string()]);
    }
}

#[test]
fn test_unknown_platform_is_reported() {
    let opener = MockOpener::new(MockSerialPort::new("MOCK0"));
    let err = begin(&request_for(OsFamily::from_identifier("freebsd"), None), &opener).unwrap_err();

    assert!(matches!(err, SetupError::UnsupportedPlatform(ref os) if os == "freebsd"));
    assert!(opener.opened_paths().is_empty());
}

#[test]
fn test_open_failure_names_the_path() {
    let err = begin(&request_for(OsFamily::Linux, None), &MockOpener::missing_device()).unwrap_err();

    match err {
        SetupError::Open { path, source } => {
            assert_eq!(path, "/dev/ttyUSB0");
            assert!(matches!(source, PortError::NotFound(_)));
        }
        other => panic!("expected open error, got {other:?}"),
    }
}

#[test]
fn test_rejected_configuration_releases_handle() {
    let mut mock = MockSerialPort::new("MOCK0");
    mock.reject_configuration("unsupported baud rate");

    let err = begin(&request_for(OsFamily::Linux, None), &mock_opener(&mock)).unwrap_err();
    assert!(matches!(err, SetupError::Configure { .. }));
    assert_eq!(mock.close_log(), vec!["MOCK0"]);
}

#[test]
fn test_streams_share_the_device() {
    let mock = create_mock_port_with_responses("MOCK0", vec![b"ping"]);
    let mut session = begin(&request_for(OsFamily::Linux, None), &mock_opener(&mock)).unwrap();

    let streams = session.streams_mut();
    streams.output.write_all(b"hello").unwrap();
    let mut buf = [0u8; 4];
    streams.input.read_exact(&mut buf).unwrap();

    assert_eq!(&buf, b"ping");
    assert_eq!(mock.get_write_log(), vec![b"hello".to_vec()]);
}

#[test]
fn test_plot_then_cleanup() {
    let mock = create_mock_port_with_responses("MOCK0", vec![b"1\n2\n", b"3\n"]);
    let shutdown = ShutdownSignal::new();
    let request = request_for(OsFamily::Linux, None).with_shutdown(shutdown.clone());
    let mut session = begin(&request, &mock_opener(&mock)).unwrap();

    let mut plotter = TextPlotter::new(Vec::new(), SampleFormat::Ascii, 10, 8).with_limit(Some(3));
    let summary = plotter.consume(session.streams_mut(), &shutdown).unwrap();
    assert_eq!(summary.samples, 3);
    assert_eq!(String::from_utf8(plotter.into_inner()).unwrap().lines().count(), 3);

    let mut cleanup = session.into_cleanup();
    let report = cleanup.on_app_exit();
    assert!(report.attempted && report.is_clean());
    // Output was opened first, so the input endpoint is `#2`.
    assert_eq!(mock.close_log(), vec!["MOCK0#2", "MOCK0#1", "MOCK0"]);

    let again = cleanup.on_app_exit();
    assert!(!again.attempted);
}

#[test]
fn test_cleanup_continues_after_first_failure() {
    let mut mock = MockSerialPort::new("MOCK0");
    let session = begin(&request_for(OsFamily::Linux, None), &mock_opener(&mock)).unwrap();
    mock.fail_next_closes(1);

    let report = session.into_cleanup().on_app_exit();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, Resource::InputStream);
    assert_eq!(mock.close_log(), vec!["MOCK0#1", "MOCK0"]);
}

#[test]
fn test_shutdown_ends_blocked_consumer() {
    let mock = MockSerialPort::new("MOCK0");
    let shutdown = ShutdownSignal::new();
    let request = request_for(OsFamily::Linux, None).with_shutdown(shutdown.clone());
    let mut session = begin(&request, &mock_opener(&mock)).unwrap();

    let trigger = shutdown.clone();
    let summary = std::thread::scope(|scope| {
        let worker = scope.spawn(|| {
            TextPlotter::new(std::io::sink(), SampleFormat::Raw, 10, 8)
                .consume(session.streams_mut(), &shutdown)
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        trigger.trigger();
        worker.join().unwrap()
    })
    .unwrap();

    assert_eq!(summary.bytes_read, 0);
    assert!(session.into_cleanup().on_app_exit().is_clean());
}

#[test]
fn test_abandoned_session_still_tears_down_in_order() {
    let mock = create_mock_port_with_responses("MOCK0", vec![b"7\n"]);
    let shutdown = ShutdownSignal::new();
    let request = request_for(OsFamily::Linux, None).with_shutdown(shutdown.clone());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut session = begin(&request, &mock_opener(&mock)).unwrap();
        let mut plotter = TextPlotter::new(Vec::new(), SampleFormat::Ascii, 4, 4).with_limit(Some(1));
        plotter.consume(session.streams_mut(), &shutdown).unwrap();
        panic!("consumer gave up");
    }));

    assert!(result.is_err());
    assert_eq!(mock.close_log(), vec!["MOCK0#2", "MOCK0#1", "MOCK0"]);
}
