//! Finding the address a device can be reached on over Wi-Fi

use std::net::Ipv4Addr;
use tracing::{debug, warn};

use crate::adb::DeviceBridge;
use crate::endpoint::NetworkCandidate;
use crate::error::{AdbError, ErrorKind, Result};

/// Wireless interfaces, most likely first. Anything else follows in device order.
pub const INTERFACE_PRIORITY: &[&str] = &["wlan0", "wlan1", "wifi0"];

fn priority_rank(interface: &str) -> usize {
    INTERFACE_PRIORITY
        .iter()
        .position(|name| *name == interface)
        .unwrap_or(INTERFACE_PRIORITY.len())
}

/// Order candidates by interface priority, dropping loopback interfaces.
/// The sort is stable, so non-preferred interfaces keep the device's order.
pub fn prioritize(mut candidates: Vec<NetworkCandidate>) -> Vec<NetworkCandidate> {
    candidates.retain(|c| c.interface != "lo");
    candidates.sort_by_key(|c| priority_rank(&c.interface));
    candidates
}

/// First candidate satisfying `accept`, or `None` when nothing matches
pub fn first_matching<'a, P>(candidates: &'a [NetworkCandidate], accept: P) -> Option<&'a NetworkCandidate>
where
    P: Fn(&NetworkCandidate) -> bool,
{
    candidates.iter().find(|c| accept(*c))
}

/// First routable candidate in the given order
pub fn first_usable(candidates: &[NetworkCandidate]) -> Option<&NetworkCandidate> {
    first_matching(candidates, NetworkCandidate::is_routable)
}

/// Candidate for an address the user typed in
pub fn manual_candidate(ip: Ipv4Addr) -> NetworkCandidate {
    NetworkCandidate::new("manual", ip)
}

/// Discover a usable address on the selected device.
///
/// Interface addresses are tried first, then the source addresses of the
/// routing table. A source that times out or errors contributes nothing;
/// only an unreachable adb server aborts discovery.
pub async fn discover<B>(bridge: &B, serial: &str) -> Result<NetworkCandidate>
where
    B: DeviceBridge + ?Sized,
{
    let from_interfaces = tolerate(bridge.interface_addresses(serial).await, "ip addr")?;
    let ordered = prioritize(from_interfaces);
    debug!("Interface candidates: {:?}", ordered);

    if let Some(candidate) = first_usable(&ordered) {
        return Ok(candidate.clone());
    }

    let from_routes = tolerate(bridge.route_sources(serial).await, "ip route")?;
    let ordered = prioritize(from_routes);
    debug!("Route candidates: {:?}", ordered);

    first_usable(&ordered)
        .cloned()
        .ok_or_else(|| AdbError::NoNetworkFound(serial.to_string()))
}

fn tolerate(result: Result<Vec<NetworkCandidate>>, source: &str) -> Result<Vec<NetworkCandidate>> {
    match result {
        Ok(candidates) => Ok(candidates),
        Err(e) if e.kind() == ErrorKind::BridgeUnavailable => Err(e),
        Err(e) => {
            warn!("{} query failed: {}", source, e);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBridge;

    fn candidate(interface: &str, ip: [u8; 4]) -> NetworkCandidate {
        NetworkCandidate::new(interface, Ipv4Addr::from(ip))
    }

    #[test]
    fn test_prioritize_prefers_wireless() {
        let ordered = prioritize(vec![
            candidate("lo", [127, 0, 0, 1]),
            candidate("rmnet_data0", [10, 71, 3, 9]),
            candidate("eth0", [172, 16, 0, 2]),
            candidate("wlan1", [192, 168, 49, 1]),
            candidate("wlan0", [192, 168, 1, 42]),
        ]);
        let names: Vec<&str> = ordered.iter().map(|c| c.interface.as_str()).collect();
        assert_eq!(names, vec!["wlan0", "wlan1", "rmnet_data0", "eth0"]);
    }

    #[test]
    fn test_first_usable_skips_link_local_and_loopback() {
        let candidates = vec![
            candidate("wlan0", [169, 254, 3, 3]),
            candidate("wlan1", [127, 0, 0, 1]),
            candidate("eth0", [10, 0, 0, 7]),
            candidate("eth1", [10, 0, 0, 8]),
        ];
        assert_eq!(first_usable(&candidates).unwrap().interface, "eth0");
    }

    #[test]
    fn test_first_usable_none_matched() {
        let candidates = vec![
            candidate("wlan0", [169, 254, 3, 3]),
            candidate("eth0", [0, 0, 0, 0]),
        ];
        assert!(first_usable(&candidates).is_none());
        assert!(first_usable(&[]).is_none());
    }

    #[test]
    fn test_first_usable_follows_every_ordering() {
        let good = candidate("a", [192, 168, 1, 2]);
        let other = candidate("b", [192, 168, 1, 3]);
        let bad = candidate("c", [169, 254, 0, 1]);

        let orderings = [
            vec![good.clone(), other.clone(), bad.clone()],
            vec![bad.clone(), good.clone(), other.clone()],
            vec![bad.clone(), other.clone(), good.clone()],
        ];
        for ordering in orderings.iter() {
            let expected = ordering.iter().find(|c| c.is_routable()).unwrap();
            assert_eq!(first_usable(ordering), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_discover_wireless_interface() {
        let bridge = FakeBridge::new()
            .with_interface("lo", [127, 0, 0, 1])
            .with_interface("rmnet_data0", [10, 71, 3, 9])
            .with_interface("wlan0", [192, 168, 1, 42]);

        let found = discover(&bridge, "R58M123ABC").await.unwrap();
        assert_eq!(found, candidate("wlan0", [192, 168, 1, 42]));
        assert!(!bridge.called("route_sources"));
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_routes() {
        let mut bridge = FakeBridge::new().with_route("wlan0", [192, 168, 1, 42]);
        bridge.interfaces_fail = true;

        let found = discover(&bridge, "R58M123ABC").await.unwrap();
        assert_eq!(found.address, Ipv4Addr::new(192, 168, 1, 42));
    }

    #[tokio::test]
    async fn test_discover_aborts_when_bridge_goes_away() {
        let mut bridge = FakeBridge::new().with_route("wlan0", [192, 168, 1, 42]);
        bridge.discovery_bridge_down = true;

        let err = discover(&bridge, "R58M123ABC").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BridgeUnavailable);
        assert!(!bridge.called("route_sources"));
    }

    #[tokio::test]
    async fn test_discover_no_network() {
        let bridge = FakeBridge::new()
            .with_interface("lo", [127, 0, 0, 1])
            .with_interface("wlan0", [169, 254, 7, 7]);

        let err = discover(&bridge, "R58M123ABC").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoNetworkFound);
        assert!(bridge.called("route_sources"));
    }
}
