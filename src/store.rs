// Copyright (c) 2025 - Cowboy AI, Inc.

//! Remote Store - the JumpServer side of the sync
//!
//! The reconcilers only ever talk to JumpServer through [`RemoteStore`].
//! The HTTP implementation lives in [`crate::adapters::jumpserver`]; tests
//! drive the reconcilers against an in-memory implementation.
//!
//! # Contract
//!
//! - Calls are issued one at a time; no call is made while another is in
//!   flight.
//! - Every error is scoped to the single item it concerns. Callers log it,
//!   count it and carry on.
//! - [`StoreError::NameConflict`] is reserved for host creation rejected
//!   because the asset name is already taken.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    HostSpec, PermissionGrant, PermissionSummary, RemoteHost, RemoteNode, RemotePath,
};

/// Result type for remote store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by remote store calls
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("JumpServer returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Asset name already taken
    #[error("Name already exists: {0}")]
    NameConflict(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    pub fn is_name_conflict(&self) -> bool {
        matches!(self, Self::NameConflict(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Filter for listing permission grants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionFilter {
    /// Name search; the store may match loosely, callers compare exactly
    pub name: Option<String>,
}

impl PermissionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// JumpServer operations used by the reconcilers
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every node in the tree
    async fn list_nodes(&self) -> StoreResult<Vec<RemoteNode>>;

    /// Create one node named `name` at `full_path`
    async fn create_node(&self, name: &str, full_path: &RemotePath) -> StoreResult<RemoteNode>;

    async fn delete_node(&self, id: Uuid) -> StoreResult<()>;

    /// Hosts, optionally restricted to one node
    async fn list_hosts(&self, node: Option<Uuid>) -> StoreResult<Vec<RemoteHost>>;

    /// Create a host and return its id
    async fn create_host(&self, host: &HostSpec) -> StoreResult<Uuid>;

    async fn delete_host(&self, id: Uuid) -> StoreResult<()>;

    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> StoreResult<Vec<PermissionSummary>>;

    async fn get_permission(&self, id: Uuid) -> StoreResult<PermissionGrant>;

    /// Create a grant and return its id
    async fn create_permission(&self, grant: &PermissionGrant) -> StoreResult<Uuid>;

    async fn update_permission(&self, id: Uuid, grant: &PermissionGrant) -> StoreResult<()>;

    async fn delete_permission(&self, id: Uuid) -> StoreResult<()>;

    /// Id of the user with this exact username, if any
    async fn find_user_id(&self, username: &str) -> StoreResult<Option<Uuid>>;
}
