//! Picks the one device a run operates on

use tracing::debug;

use crate::adb::{Device, TransportKind};
use crate::error::{AdbError, Result};

/// Choose a device from the adb server's listing.
///
/// With an explicit serial the device must be present and online. Otherwise
/// only online devices count, USB-attached ones shadow TCP ones (the same
/// phone shows up twice after a previous wireless setup), and more than one
/// remaining candidate is an error rather than a guess.
pub fn select_device(devices: &[Device], serial: Option<&str>) -> Result<Device> {
    if let Some(serial) = serial {
        return match devices.iter().find(|d| d.serial == serial) {
            Some(device) if device.is_online() => Ok(device.clone()),
            Some(device) => Err(AdbError::DeviceNotFound(format!(
                "{} is {}",
                serial, device.state
            ))),
            None => Err(AdbError::DeviceNotFound(serial.to_string())),
        };
    }

    let online: Vec<&Device> = devices.iter().filter(|d| d.is_online()).collect();
    let usb: Vec<&Device> = online
        .iter()
        .copied()
        .filter(|d| d.transport == TransportKind::Usb)
        .collect();
    let candidates = if usb.is_empty() { online } else { usb };

    debug!(
        "{} device(s) listed, {} candidate(s)",
        devices.len(),
        candidates.len()
    );

    match candidates.as_slice() {
        [] => Err(AdbError::NoDeviceConnected),
        [device] => Ok((*device).clone()),
        many => Err(AdbError::AmbiguousDevice(
            many.iter().map(|d| d.serial.clone()).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::DeviceState;
    use crate::error::ErrorKind;

    fn device(serial: &str, state: DeviceState) -> Device {
        Device::new(serial, state)
    }

    #[test]
    fn test_single_online_device_is_selected() {
        let devices = vec![
            device("R58M123ABC", DeviceState::Device),
            device("emulator-5554", DeviceState::Offline),
            device("0123456789ABCDEF", DeviceState::Unauthorized),
        ];
        let selected = select_device(&devices, None).unwrap();
        assert_eq!(selected.serial, "R58M123ABC");
    }

    #[test]
    fn test_no_online_device() {
        assert_eq!(
            select_device(&[], None).unwrap_err().kind(),
            ErrorKind::NoDeviceConnected
        );

        let devices = vec![device("0123456789ABCDEF", DeviceState::Unauthorized)];
        assert_eq!(
            select_device(&devices, None).unwrap_err().kind(),
            ErrorKind::NoDeviceConnected
        );
    }

    #[test]
    fn test_two_online_devices_are_ambiguous() {
        let devices = vec![
            device("R58M123ABC", DeviceState::Device),
            device("emulator-5554", DeviceState::Device),
        ];
        match select_device(&devices, None) {
            Err(AdbError::AmbiguousDevice(serials)) => {
                assert_eq!(serials, vec!["R58M123ABC", "emulator-5554"]);
            }
            other => panic!("expected AmbiguousDevice, got {:?}", other),
        }
    }

    #[test]
    fn test_usb_device_shadows_its_wireless_twin() {
        let devices = vec![
            device("192.168.1.42:5555", DeviceState::Device),
            device("adb-R58M123ABC-x1Yz2._adb-tls-connect._tcp", DeviceState::Device),
            device("R58M123ABC", DeviceState::Device),
        ];
        assert_eq!(select_device(&devices, None).unwrap().serial, "R58M123ABC");
    }

    #[test]
    fn test_wireless_only_device_is_selected() {
        let devices = vec![device("192.168.1.42:5555", DeviceState::Device)];
        let selected = select_device(&devices, None).unwrap();
        assert!(selected.is_tcp());
    }

    #[test]
    fn test_explicit_serial() {
        let devices = vec![
            device("R58M123ABC", DeviceState::Device),
            device("emulator-5554", DeviceState::Device),
            device("0123456789ABCDEF", DeviceState::Unauthorized),
        ];

        let selected = select_device(&devices, Some("emulator-5554")).unwrap();
        assert_eq!(selected.serial, "emulator-5554");

        let err = select_device(&devices, Some("0123456789ABCDEF")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceNotFound);
        assert!(err.to_string().contains("unauthorized"));

        let err = select_device(&devices, Some("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceNotFound);
    }
}
