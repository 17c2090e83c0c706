// Copyright (c) 2025 - Cowboy AI, Inc.
//! Account template selection by address

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::error;
use uuid::Uuid;

use super::network::{parse_address, IpNetwork};

/// Account name and template id attached to a synced host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateRef {
    pub account_name: String,
    pub template_id: Uuid,
}

/// One configured CIDR set → template rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMapping {
    /// Label used in logs
    pub name: String,
    pub networks: Vec<IpNetwork>,
    pub template: TemplateRef,
}

impl TemplateMapping {
    pub fn matches(&self, address: &IpAddr) -> bool {
        self.networks.iter().any(|net| net.contains(address))
    }
}

/// Picks the account template for a host address.
///
/// Rules are scanned in configured order and the first rule with any
/// matching network wins, even when a later rule has a longer prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
    mappings: Vec<TemplateMapping>,
    default: TemplateRef,
}

impl TemplateResolver {
    pub fn new(mappings: Vec<TemplateMapping>, default: TemplateRef) -> Self {
        Self { mappings, default }
    }

    pub fn mappings(&self) -> &[TemplateMapping] {
        &self.mappings
    }

    /// Resolve the template for `address`.
    ///
    /// Unparsable addresses fall back to the default template and are
    /// logged at error level.
    pub fn resolve(&self, address: &str) -> &TemplateRef {
        let ip = match parse_address(address) {
            Ok(ip) => ip,
            Err(e) => {
                error!(address, error = %e, "Invalid IP address, using default template");
                return &self.default;
            }
        };

        self.mappings
            .iter()
            .find(|mapping| mapping.matches(&ip))
            .map(|mapping| &mapping.template)
            .unwrap_or(&self.default)
    }
}
