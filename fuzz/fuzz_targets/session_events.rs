//! Arbitrary transport notifications must never panic the session, and a
//! disconnect always returns it to idle with no buffered input.

#![no_main]

use ledwire_core::{
    DiscoveryMode, SerialEvent, Session, SessionConfig, SessionState, SourceId,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (bool, Vec<(u8, u8, u8, String)>)| {
    let (auto, events) = input;
    let discovery = if auto { DiscoveryMode::Auto } else { DiscoveryMode::Manual };
    let mut session = Session::new(SessionConfig { discovery, ..SessionConfig::default() });

    for (kind, device, interface, data) in events {
        let device_id = u32::from(device % 4);
        let interface = u16::from(interface % 3);
        let event = match kind % 6 {
            0 => SerialEvent::DeviceAttached { device_id },
            1 => SerialEvent::DeviceDetached { device_id },
            2 => SerialEvent::Connected { device_id, interface },
            3 => SerialEvent::Disconnected { device_id },
            4 => SerialEvent::ReadData { device_id, interface, data },
            _ => SerialEvent::Error { code: -1, message: data },
        };
        let _ = session.handle(event);

        if let SessionState::Connecting { device_id } = session.state() {
            if device % 2 == 0 {
                let _ = session.connect_succeeded(device_id);
            } else {
                let _ = session.connect_failed(device_id, "fuzz");
            }
        }
    }

    let _ = session.disconnect();
    assert_eq!(session.state(), SessionState::Idle);
    for device_id in 0..4 {
        for interface in 0..3 {
            assert_eq!(session.pending(SourceId::new(device_id, interface)), None);
        }
    }
});
