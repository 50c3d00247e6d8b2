// src/core/discovery.rs

//! The `/serverinfo` payload that clients use to find a server on the local network.

use crate::config::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, UdpSocket};
use sysinfo::System;

/// Body of `GET /serverinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub ip: Option<String>,
    #[serde(rename = "machineName")]
    pub machine_name: String,
}

impl ServerInfo {
    /// Builds the payload from config overrides, falling back to what the host reports.
    pub fn resolve(config: &DiscoveryConfig) -> Self {
        let ip = config
            .announce_ip
            .clone()
            .or_else(|| detect_local_ip().map(|ip| ip.to_string()));
        let machine_name = config
            .machine_name
            .clone()
            .unwrap_or_else(machine_name);
        Self { ip, machine_name }
    }
}

/// Finds the IPv4 address of the interface that would carry outbound traffic.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn detect_local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}

/// The host name as reported by the OS, or `"unknown"`.
pub fn machine_name() -> String {
    System::host_name().unwrap_or_else(|| "unknown".to_string())
}
