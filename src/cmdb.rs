// Copyright (c) 2025 - Cowboy AI, Inc.

//! CMDB Reader - the C3 side of the sync
//!
//! The CMDB is authoritative for hosts, the department tree and user
//! authorization levels. It is read once per run; everything downstream is
//! derived from that snapshot.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::{CmdbHost, CmdbUser, PathSet};

/// Errors returned by CMDB reads
#[derive(Debug, Error)]
pub enum CmdbError {
    /// Request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("CMDB returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Envelope reported `stat: false`
    #[error("CMDB rejected the request: {0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode CMDB response: {0}")]
    Decode(String),
}

/// Read side of the CMDB
#[async_trait]
pub trait CmdbReader: Send + Sync {
    async fn list_hosts(&self) -> Result<Vec<CmdbHost>, CmdbError>;

    async fn list_users(&self) -> Result<Vec<CmdbUser>, CmdbError>;
}

/// Every department referenced by any host
pub fn cmdb_departments(hosts: &[CmdbHost]) -> PathSet {
    hosts
        .iter()
        .flat_map(|host| host.departments.iter().cloned())
        .collect()
}

/// Addresses of the hosts that are synced as assets
pub fn cmdb_addresses(hosts: &[CmdbHost]) -> HashSet<String> {
    hosts
        .iter()
        .filter(|host| host.is_linux_scoped())
        .map(|host| host.address.trim().to_string())
        .collect()
}
