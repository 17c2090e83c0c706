// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("CIDR has host bits set: {0}")]
    HostBitsSet(String),
}

/// Parse an address literal as found in CMDB and JumpServer records.
///
/// Surrounding whitespace is ignored.
pub fn parse_address(address: &str) -> Result<IpAddr, NetworkError> {
    IpAddr::from_str(address.trim())
        .map_err(|_| NetworkError::InvalidIpAddress(address.to_string()))
}

/// IP network in CIDR notation
///
/// Invariants:
/// - Valid network address
/// - Prefix length within range for the address family
/// - No host bits set below the prefix
///
/// A bare address is accepted as a host network (`/32` or `/128`).
///
/// # Examples
///
/// ```rust
/// use cim_asset_sync::domain::IpNetwork;
///
/// let net = IpNetwork::new("10.0.0.0/24").unwrap();
/// assert!(net.contains(&"10.0.0.5".parse().unwrap()));
/// assert!(!net.contains(&"10.0.1.5".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    network: IpAddr,
    prefix_length: u8,
}

impl IpNetwork {
    /// Create a new network from CIDR notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref().trim();

        let (network, prefix_length) = match cidr.split_once('/') {
            Some((addr_str, prefix_str)) => {
                let network = IpAddr::from_str(addr_str)
                    .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;
                let prefix_length = prefix_str
                    .parse::<u8>()
                    .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
                (network, prefix_length)
            }
            None => {
                let network = IpAddr::from_str(cidr)
                    .map_err(|_| NetworkError::InvalidIpAddress(cidr.to_string()))?;
                (network, max_prefix(&network))
            }
        };

        if prefix_length > max_prefix(&network) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        if to_bits(&network) & !mask(&network, prefix_length) != 0 {
            return Err(NetworkError::HostBitsSet(cidr.to_string()));
        }

        Ok(Self {
            network,
            prefix_length,
        })
    }

    /// Prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check whether `address` falls inside this network.
    ///
    /// Addresses of the other family never match.
    pub fn contains(&self, address: &IpAddr) -> bool {
        if self.network.is_ipv4() != address.is_ipv4() {
            return false;
        }
        let mask = mask(address, self.prefix_length);
        to_bits(address) & mask == to_bits(&self.network)
    }
}

fn max_prefix(address: &IpAddr) -> u8 {
    match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn to_bits(address: &IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn mask(address: &IpAddr, prefix_length: u8) -> u128 {
    let width = u32::from(max_prefix(address));
    let prefix = u32::from(prefix_length);
    if prefix == 0 {
        return 0;
    }
    let all = if width == 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    };
    all & !((1u128 << (width - prefix)).wrapping_sub(1))
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_length)
    }
}

impl FromStr for IpNetwork {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for IpNetwork {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IpNetwork {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}
