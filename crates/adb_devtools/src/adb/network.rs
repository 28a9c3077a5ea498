//! Parsing of the device's `ip` command output

use lazy_static::lazy_static;
use regex::Regex;
use std::net::Ipv4Addr;

use crate::endpoint::NetworkCandidate;

lazy_static! {
    // "3: wlan0: <BROADCAST,...>" or "12: rmnet_data0@if3: <...>"
    static ref INTERFACE_HEADER: Regex = Regex::new(r"^\d+:\s+([^\s:@]+)(?:@\S*)?:").unwrap();
    static ref INET_LINE: Regex = Regex::new(r"^\s+inet\s+(\d+\.\d+\.\d+\.\d+)/").unwrap();
}

/// Parse `ip addr show` into (interface, IPv4) pairs, in the order the device lists them
pub fn parse_interface_addresses(output: &str) -> Vec<NetworkCandidate> {
    let mut candidates = Vec::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        if let Some(caps) = INTERFACE_HEADER.captures(line) {
            current = Some(caps[1].to_string());
            continue;
        }

        let (Some(interface), Some(caps)) = (current.as_ref(), INET_LINE.captures(line)) else {
            continue;
        };

        if let Ok(address) = caps[1].parse::<Ipv4Addr>() {
            candidates.push(NetworkCandidate::new(interface.clone(), address));
        }
    }

    candidates
}

/// Parse the `src` addresses out of `ip route`
pub fn parse_route_sources(output: &str) -> Vec<NetworkCandidate> {
    let mut candidates = Vec::new();

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let value_after = |key: &str| {
            tokens
                .iter()
                .position(|t| *t == key)
                .and_then(|i| tokens.get(i + 1))
                .copied()
        };

        let Some(src) = value_after("src") else {
            continue;
        };
        let Ok(address) = src.parse::<Ipv4Addr>() else {
            continue;
        };
        let interface = value_after("dev").unwrap_or("route");
        candidates.push(NetworkCandidate::new(interface, address));
    }

    candidates
}
