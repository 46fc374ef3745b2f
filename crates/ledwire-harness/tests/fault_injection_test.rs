//! Fault injection tests.
//!
//! Failed opens, failed writes, unplugged devices and transport errors must
//! surface as alerts and leave the session usable.

use ledwire_app::Runtime;
use ledwire_core::{DiscoveryMode, SerialEvent, SessionConfig, SessionState};
use ledwire_harness::{ScriptedDriver, SimDevice, SimTransport};
use ledwire_proto::SerialParams;

fn alerts<D, T>(runtime: &Runtime<D, T>) -> Vec<String>
where
    D: ledwire_app::Driver,
    T: ledwire_core::SerialTransport,
{
    runtime.app().alerts().map(ToString::to_string).collect()
}

#[tokio::test]
async fn failed_connect_can_be_retried() {
    let mut transport = SimTransport::with_seed(1).with_device(SimDevice::led_board(1));
    transport.fail_next_connect("permission denied");
    let driver = ScriptedDriver::new(["/search", "/search", "/on"]);
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    assert_eq!(
        alerts(&runtime),
        vec![
            "Failed to connect: failed to open device 1: permission denied",
            "Device connected: LED Controller",
        ]
    );
    assert_eq!(
        runtime.app().history().map(|l| l.line.clone()).collect::<Vec<_>>(),
        vec!["OK LED ON"]
    );
}

#[tokio::test]
async fn invalid_params_never_reach_the_transport() {
    let config = SessionConfig {
        params: SerialParams::default().with_baud_rate(0),
        ..SessionConfig::default()
    };
    let transport = SimTransport::with_seed(1).with_device(SimDevice::led_board(1));
    let driver = ScriptedDriver::new(["/search"]);
    let mut runtime = Runtime::new(driver, transport, config);

    runtime.run().await.unwrap();

    assert!(runtime.transport().params(1).is_none());
    assert_eq!(alerts(&runtime), vec!["Failed to connect: invalid baud rate: 0"]);
    assert_eq!(runtime.session().state(), SessionState::Idle);
}

#[tokio::test]
async fn write_failure_is_reported() {
    let mut transport = SimTransport::with_seed(1).with_device(SimDevice::led_board(1));
    transport.set_write_failure(true);
    let driver = ScriptedDriver::new(["/search", "/on"]);
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    assert!(runtime.transport().writes().is_empty());
    assert_eq!(
        runtime.app().last_alert().map(ToString::to_string),
        Some("Failed to send: I/O error: simulated write failure".to_string())
    );
    assert_eq!(runtime.app().history().count(), 0);
}

#[tokio::test]
async fn search_without_supported_device() {
    let transport = SimTransport::with_seed(1).with_device(SimDevice::unsupported(1));
    let driver = ScriptedDriver::new(["/search"]);
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    assert_eq!(alerts(&runtime), vec!["No supported USB device found."]);
    assert!(!runtime.transport().is_open(1));
}

#[tokio::test]
async fn command_before_connect_is_rejected() {
    let transport = SimTransport::with_seed(1).with_device(SimDevice::led_board(1));
    let driver = ScriptedDriver::new(["/on", "/send hello"]);
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    assert!(runtime.transport().writes().is_empty());
    assert_eq!(
        alerts(&runtime),
        vec![
            "Not connected: Please connect a device first.",
            "Not connected: Please connect a device first.",
        ]
    );
}

#[tokio::test]
async fn detach_mid_line_discards_partial_data() {
    let config = SessionConfig { discovery: DiscoveryMode::Auto, ..SessionConfig::default() };
    let mut transport = SimTransport::with_seed(4);
    transport.attach(SimDevice::led_board(1));
    transport.push_data(1, 1, "OK LE");
    transport.inject(SerialEvent::DeviceDetached { device_id: 1 });
    let driver = ScriptedDriver::new(Vec::<String>::new());
    let mut runtime = Runtime::new(driver, transport, config);

    runtime.run().await.unwrap();

    assert_eq!(runtime.app().history().count(), 0);
    assert!(alerts(&runtime).contains(&"Device detached: device 1".to_string()));
    assert_eq!(runtime.session().state(), SessionState::Idle);
}

#[tokio::test]
async fn read_failure_closes_the_port() {
    let config = SessionConfig { discovery: DiscoveryMode::Auto, ..SessionConfig::default() };
    let mut transport = SimTransport::with_seed(2);
    transport.attach(SimDevice::led_board(1));
    transport.inject(SerialEvent::Disconnected { device_id: 1 });
    let driver = ScriptedDriver::new(Vec::<String>::new());
    let mut runtime = Runtime::new(driver, transport, config);

    runtime.run().await.unwrap();

    assert!(!runtime.transport().is_open(1));
    assert!(alerts(&runtime).contains(&"Device disconnected: device 1".to_string()));
    assert_eq!(runtime.session().state(), SessionState::Idle);
}

#[tokio::test]
async fn serial_error_is_shown() {
    let mut transport = SimTransport::with_seed(1);
    transport.inject(SerialEvent::Error { code: -3, message: "Permission denied".into() });
    let driver = ScriptedDriver::new(Vec::<String>::new());
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    assert_eq!(alerts(&runtime), vec!["Serial Error: Permission denied"]);
}

#[tokio::test]
async fn transport_shutdown_ends_the_run() {
    let mut transport = SimTransport::with_seed(1).with_device(SimDevice::led_board(1));
    transport.shut_down();
    let driver = ScriptedDriver::new(["/search", "/on"]);
    let mut runtime = Runtime::new(driver, transport, SessionConfig::default());

    runtime.run().await.unwrap();

    // Device traffic is polled first, so the closed transport wins.
    assert!(runtime.transport().params(1).is_none());
    assert!(runtime.transport().writes().is_empty());
    assert!(runtime.driver().is_stopped());
}
