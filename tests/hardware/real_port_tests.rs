//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0          # or COM3 on Windows
//! export TEST_BAUD=115200                # optional, default: 115200
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! cargo test --features hardware-tests -- --ignored
//! ```

use serial_plot::cleanup::CleanupHandler;
use serial_plot::port::{
    configure, list_ports, open_input, open_output, LineConfiguration, OpenOptions, PortOpener,
    NativeOpener, SerialPortAdapter, StreamMode, StreamPair,
};
use std::env;
use std::io::{Read, Write};
use std::time::Duration;

fn get_test_port() -> Option<String> {
    env::var("TEST_PORT").ok()
}

fn get_test_baud() -> u32 {
    env::var("TEST_BAUD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(115_200)
}

fn is_loopback_enabled() -> bool {
    env::var("TEST_LOOPBACK").ok().as_deref() == Some("1")
}

/// Skip test if hardware is not available.
fn skip_without_hardware() -> Option<String> {
    let port = get_test_port();
    if port.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    port
}

#[test]
#[ignore]
fn test_list_ports_includes_test_port() {
    let Some(port_name) = skip_without_hardware() else {
        return;
    };
    let ports = list_ports().unwrap();
    assert!(
        ports.iter().any(|p| p.name == port_name),
        "{port_name} not in {ports:?}"
    );
}

#[test]
#[ignore]
fn test_real_port_session_lifecycle() {
    let Some(port_name) = skip_without_hardware() else {
        return;
    };

    let mut handle = NativeOpener.open(&port_name, &OpenOptions::default()).unwrap();
    configure(handle.as_mut(), &LineConfiguration::standard_8n1(get_test_baud())).unwrap();
    handle.set_timeout(Duration::from_millis(50)).unwrap();

    let mut streams = StreamPair {
        output: open_output(handle.as_ref(), StreamMode::Blocking).unwrap(),
        input: open_input(handle.as_ref(), StreamMode::Blocking).unwrap(),
    };

    if is_loopback_enabled() {
        streams.output.write_all(b"42\n").unwrap();
        streams.output.flush().unwrap();
        let mut echoed = [0u8; 3];
        streams.input.read_exact(&mut echoed).unwrap();
        assert_eq!(&echoed, b"42\n");
    }

    let report = CleanupHandler::new(port_name, streams, handle).on_app_exit();
    assert!(report.is_clean(), "{:?}", report.failures);
}

#[test]
#[ignore]
fn test_exclusive_open_blocks_second_open() {
    let Some(port_name) = skip_without_hardware() else {
        return;
    };
    if !cfg!(unix) {
        return;
    }

    let _first = NativeOpener.open(&port_name, &OpenOptions::default()).unwrap();
    assert!(NativeOpener.open(&port_name, &OpenOptions::default()).is_err());
}
