// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-asset-sync
//!
//! In-memory [`RemoteStore`] and [`CmdbReader`] implementations plus
//! deterministic test data.
//!
//! # Design Principles
//! - Ids are allocated from a counter, timestamps are fixed constants
//! - Every mutating call is recorded so tests can assert idempotence
//! - Failures are injected per item, mirroring the store contract

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use cim_asset_sync::cmdb::{CmdbError, CmdbReader};
use cim_asset_sync::config::{RawConfig, SyncConfig};
use cim_asset_sync::domain::{
    AccessLevel, CmdbHost, CmdbUser, HostSpec, PathSet, PermissionGrant, PermissionSummary,
    RemoteHost, RemoteNode, RemotePath,
};
use cim_asset_sync::store::{PermissionFilter, RemoteStore, StoreError, StoreResult};

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const DEFAULT_TEMPLATE_ID: &str = "7478fed0-e9d3-4abc-a237-2d758bc428fe";
pub const OFFICE_TEMPLATE_ID: &str = "11111111-1111-4111-8111-111111111111";

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Validated configuration with one office mapping and one excluded address
pub fn sync_config(settle_nodes: bool) -> SyncConfig {
    let toml = format!(
        r#"
[jumpserver]
url = "https://jump.example.com"
key_id = "key"
secret = "secret"

[cmdb]
url = "https://c3.example.com"
api_key = "api"

[settings]
excluded_ips = ["10.9.9.9"]
settle_nodes = {settle_nodes}

[templates.default]
account_name = "jumpserver"
template_id = "{DEFAULT_TEMPLATE_ID}"

[[templates.mapping]]
name = "office"
cidr = ["10.0.0.0/24"]
account_name = "ops"
template_id = "{OFFICE_TEMPLATE_ID}"
"#
    );
    RawConfig::from_toml_str(&toml)
        .and_then(RawConfig::validate)
        .expect("Invalid config in test fixture")
}

pub fn cmdb_host(hostname: &str, address: &str, os: &str, tree: &str) -> CmdbHost {
    CmdbHost {
        hostname: hostname.to_string(),
        address: address.to_string(),
        os: Some(os.to_string()),
        departments: PathSet::parse(tree).expect("Invalid tree in test fixture"),
        environment: None,
        owner: None,
    }
}

pub fn cmdb_user(name: &str, department: &str, level: &str) -> CmdbUser {
    CmdbUser {
        name: name.to_string(),
        department: department.to_string(),
        level: AccessLevel::parse(level),
    }
}

// ============================================================================
// Fake CMDB
// ============================================================================

/// CMDB snapshot; `None` makes the corresponding read fail
#[derive(Debug, Clone, Default)]
pub struct FakeCmdb {
    pub hosts: Option<Vec<CmdbHost>>,
    pub users: Option<Vec<CmdbUser>>,
}

impl FakeCmdb {
    pub fn new(hosts: Vec<CmdbHost>, users: Vec<CmdbUser>) -> Self {
        Self {
            hosts: Some(hosts),
            users: Some(users),
        }
    }
}

#[async_trait]
impl CmdbReader for FakeCmdb {
    async fn list_hosts(&self) -> Result<Vec<CmdbHost>, CmdbError> {
        self.hosts
            .clone()
            .ok_or_else(|| CmdbError::Rejected("stat false".to_string()))
    }

    async fn list_users(&self) -> Result<Vec<CmdbUser>, CmdbError> {
        self.users
            .clone()
            .ok_or_else(|| CmdbError::Rejected("stat false".to_string()))
    }
}

// ============================================================================
// Fake JumpServer
// ============================================================================

/// Mutating call recorded by [`FakeStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateNode(String),
    DeleteNode(String),
    CreateHost(String),
    DeleteHost(String),
    CreatePermission(String),
    UpdatePermission(String),
    DeletePermission(String),
}

#[derive(Debug, Default)]
struct State {
    next_id: u128,
    nodes: Vec<RemoteNode>,
    hosts: Vec<RemoteHost>,
    /// Node ids each created host was attached to, by host name
    host_nodes: HashMap<String, Vec<Uuid>>,
    permissions: Vec<(Uuid, PermissionGrant)>,
    users: HashMap<String, Uuid>,
    calls: Vec<Call>,
    user_lookups: usize,
    /// Names rejected as duplicates even though no host carries them
    reserved_names: HashSet<String>,
    /// Node paths whose creation fails
    failing_nodes: HashSet<String>,
    /// Addresses whose creation fails with a non-conflict error
    failing_hosts: HashSet<String>,
    fail_list_nodes: bool,
    fail_list_hosts: bool,
    fail_list_permissions: bool,
}

impl State {
    fn allocate(&mut self) -> Uuid {
        self.next_id += 1;
        Uuid::from_u128(0x0193_4f4a_0000_7000_8000_0000_0000_0000 + self.next_id)
    }
}

/// In-memory JumpServer
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().expect("fake store poisoned");
        f(&mut state)
    }

    /// Seed a node without recording a call
    pub fn seed_node(&self, full_value: &str) -> Uuid {
        self.with(|s| {
            let id = s.allocate();
            let full_value = RemotePath::new(full_value);
            s.nodes.push(RemoteNode {
                id,
                value: full_value.name().to_string(),
                full_value,
            });
            id
        })
    }

    pub fn seed_host(&self, name: &str, address: &str) -> Uuid {
        self.with(|s| {
            let id = s.allocate();
            s.hosts.push(RemoteHost {
                id,
                name: name.to_string(),
                address: address.to_string(),
            });
            id
        })
    }

    pub fn seed_user(&self, username: &str) -> Uuid {
        self.with(|s| {
            let id = s.allocate();
            s.users.insert(username.to_string(), id);
            id
        })
    }

    pub fn seed_permission(&self, grant: PermissionGrant) -> Uuid {
        self.with(|s| {
            let id = s.allocate();
            s.permissions.push((id, grant));
            id
        })
    }

    pub fn reserve_name(&self, name: &str) {
        self.with(|s| s.reserved_names.insert(name.to_string()));
    }

    pub fn fail_node(&self, full_value: &str) {
        self.with(|s| s.failing_nodes.insert(full_value.to_string()));
    }

    pub fn fail_host(&self, address: &str) {
        self.with(|s| s.failing_hosts.insert(address.to_string()));
    }

    pub fn fail_list_nodes(&self) {
        self.with(|s| s.fail_list_nodes = true);
    }

    pub fn fail_list_hosts(&self) {
        self.with(|s| s.fail_list_hosts = true);
    }

    pub fn fail_list_permissions(&self) {
        self.with(|s| s.fail_list_permissions = true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    pub fn user_lookups(&self) -> usize {
        self.with(|s| s.user_lookups)
    }

    /// Sorted node paths
    pub fn node_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> =
            self.with(|s| s.nodes.iter().map(|n| n.full_value.to_string()).collect());
        paths.sort();
        paths
    }

    pub fn node_id(&self, full_value: &str) -> Option<Uuid> {
        self.with(|s| {
            s.nodes
                .iter()
                .find(|n| n.full_value.as_str() == full_value)
                .map(|n| n.id)
        })
    }

    pub fn hosts(&self) -> Vec<RemoteHost> {
        self.with(|s| s.hosts.clone())
    }

    pub fn host_nodes(&self, name: &str) -> Vec<Uuid> {
        self.with(|s| s.host_nodes.get(name).cloned().unwrap_or_default())
    }

    pub fn permission(&self, name: &str) -> Option<PermissionGrant> {
        self.with(|s| {
            s.permissions
                .iter()
                .find(|(_, g)| g.name == name)
                .map(|(_, g)| g.clone())
        })
    }

    pub fn permission_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.with(|s| s.permissions.iter().map(|(_, g)| g.name.clone()).collect());
        names.sort();
        names
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Status {
        status: 503,
        body: format!("{what} unavailable"),
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list_nodes(&self) -> StoreResult<Vec<RemoteNode>> {
        self.with(|s| {
            if s.fail_list_nodes {
                return Err(unavailable("nodes"));
            }
            Ok(s.nodes.clone())
        })
    }

    async fn create_node(&self, name: &str, full_path: &RemotePath) -> StoreResult<RemoteNode> {
        self.with(|s| {
            s.calls.push(Call::CreateNode(full_path.to_string()));
            if s.failing_nodes.contains(full_path.as_str()) {
                return Err(unavailable("node"));
            }
            let node = RemoteNode {
                id: s.allocate(),
                full_value: full_path.clone(),
                value: name.to_string(),
            };
            s.nodes.push(node.clone());
            Ok(node)
        })
    }

    async fn delete_node(&self, id: Uuid) -> StoreResult<()> {
        self.with(|s| {
            let pos = s
                .nodes
                .iter()
                .position(|n| n.id == id)
                .ok_or_else(|| StoreError::Status {
                    status: 404,
                    body: "node not found".to_string(),
                })?;
            let node = s.nodes.remove(pos);
            s.calls.push(Call::DeleteNode(node.full_value.to_string()));
            Ok(())
        })
    }

    async fn list_hosts(&self, _node: Option<Uuid>) -> StoreResult<Vec<RemoteHost>> {
        self.with(|s| {
            if s.fail_list_hosts {
                return Err(unavailable("hosts"));
            }
            Ok(s.hosts.clone())
        })
    }

    async fn create_host(&self, host: &HostSpec) -> StoreResult<Uuid> {
        self.with(|s| {
            s.calls.push(Call::CreateHost(host.name.clone()));
            if s.failing_hosts.contains(&host.address) {
                return Err(unavailable("host"));
            }
            let taken = s.reserved_names.contains(&host.name)
                || s.hosts.iter().any(|h| h.name == host.name);
            if taken {
                return Err(StoreError::NameConflict(format!(
                    r#"{{"name": ["{} 字段必须唯一"]}}"#,
                    host.name
                )));
            }
            let id = s.allocate();
            s.hosts.push(RemoteHost {
                id,
                name: host.name.clone(),
                address: host.address.clone(),
            });
            s.host_nodes
                .insert(host.name.clone(), host.nodes.iter().map(|n| n.id).collect());
            Ok(id)
        })
    }

    async fn delete_host(&self, id: Uuid) -> StoreResult<()> {
        self.with(|s| {
            let pos = s
                .hosts
                .iter()
                .position(|h| h.id == id)
                .ok_or_else(|| StoreError::Status {
                    status: 404,
                    body: "host not found".to_string(),
                })?;
            let host = s.hosts.remove(pos);
            s.calls.push(Call::DeleteHost(host.address));
            Ok(())
        })
    }

    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> StoreResult<Vec<PermissionSummary>> {
        self.with(|s| {
            if s.fail_list_permissions {
                return Err(unavailable("permissions"));
            }
            Ok(s.permissions
                .iter()
                .filter(|(_, g)| filter.name.as_ref().map_or(true, |n| g.name.contains(n)))
                .map(|(id, g)| PermissionSummary {
                    id: *id,
                    name: g.name.clone(),
                })
                .collect())
        })
    }

    async fn get_permission(&self, id: Uuid) -> StoreResult<PermissionGrant> {
        self.with(|s| {
            s.permissions
                .iter()
                .find(|(pid, _)| *pid == id)
                .map(|(_, g)| g.clone())
                .ok_or_else(|| StoreError::Status {
                    status: 404,
                    body: "permission not found".to_string(),
                })
        })
    }

    async fn create_permission(&self, grant: &PermissionGrant) -> StoreResult<Uuid> {
        self.with(|s| {
            s.calls.push(Call::CreatePermission(grant.name.clone()));
            let id = s.allocate();
            s.permissions.push((id, grant.clone()));
            Ok(id)
        })
    }

    async fn update_permission(&self, id: Uuid, grant: &PermissionGrant) -> StoreResult<()> {
        self.with(|s| {
            s.calls.push(Call::UpdatePermission(grant.name.clone()));
            let slot = s
                .permissions
                .iter_mut()
                .find(|(pid, _)| *pid == id)
                .ok_or_else(|| StoreError::Status {
                    status: 404,
                    body: "permission not found".to_string(),
                })?;
            slot.1 = grant.clone();
            Ok(())
        })
    }

    async fn delete_permission(&self, id: Uuid) -> StoreResult<()> {
        self.with(|s| {
            let pos = s
                .permissions
                .iter()
                .position(|(pid, _)| *pid == id)
                .ok_or_else(|| StoreError::Status {
                    status: 404,
                    body: "permission not found".to_string(),
                })?;
            let (_, grant) = s.permissions.remove(pos);
            s.calls.push(Call::DeletePermission(grant.name));
            Ok(())
        })
    }

    async fn find_user_id(&self, username: &str) -> StoreResult<Option<Uuid>> {
        self.with(|s| {
            s.user_lookups += 1;
            Ok(s.users.get(username).copied())
        })
    }
}
