// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host records on both sides of the sync
//!
//! - [`CmdbHost`] is what the CMDB reports
//! - [`HostSpec`] is the JumpServer asset we want to exist
//! - [`RemoteHost`] is what JumpServer already has
//!
//! Hosts are joined by address. The JumpServer `name` is the remote
//! identity and must be unique there.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::node::NodeRef;
use super::path::PathSet;
use super::platform::{Platform, Protocol, SecretType};
use super::template::TemplateRef;

/// Host as reported by the CMDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdbHost {
    pub hostname: String,
    pub address: String,
    /// Raw OS string; absent when the CMDB has none
    pub os: Option<String>,
    /// Departments from the comma-joined tree field
    pub departments: PathSet,
    pub environment: Option<String>,
    pub owner: Option<String>,
}

impl CmdbHost {
    /// Only hosts whose OS is literally `linux` are synced as assets.
    pub fn is_linux_scoped(&self) -> bool {
        self.os
            .as_deref()
            .is_some_and(|os| os.trim().eq_ignore_ascii_case("linux"))
    }

    pub fn platform(&self) -> Platform {
        Platform::from_os_name(self.os.as_deref().unwrap_or("Linux"))
    }
}

/// Privileged account attached to a synced asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAccount {
    pub name: String,
    pub username: String,
    pub template_id: Uuid,
    pub secret_type: SecretType,
    pub privileged: bool,
}

impl HostAccount {
    pub fn for_platform(platform: Platform, template: &TemplateRef) -> Self {
        Self {
            name: template.account_name.clone(),
            username: platform.admin_username().to_string(),
            template_id: template.template_id,
            secret_type: platform.secret_type(),
            privileged: true,
        }
    }
}

/// Desired JumpServer asset for one CMDB host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub name: String,
    pub address: String,
    pub platform: Platform,
    pub accounts: Vec<HostAccount>,
    pub protocols: Vec<Protocol>,
    pub nodes: Vec<NodeRef>,
    pub is_active: bool,
    pub comment: String,
    pub environment: Option<String>,
    pub owner: Option<String>,
}

impl HostSpec {
    pub fn sync_comment(at: DateTime<Local>) -> String {
        format!("Synced from OpenC3 on {}", at.format("%Y-%m-%d %H:%M:%S"))
    }

    /// Name used for the single retry after a uniqueness conflict
    pub fn disambiguated_name(&self) -> String {
        format!("{}-{}", self.name, self.address)
    }
}

/// Asset already present in JumpServer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHost {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

/// Addresses that are never deleted from JumpServer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedAddresses(HashSet<String>);

impl ExcludedAddresses {
    pub fn new(addresses: impl IntoIterator<Item = String>) -> Self {
        Self(
            addresses
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, address: &str) -> bool {
        self.0.contains(address.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
