// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sync Domain Models
//!
//! Value objects and records shared by the reconcilers. Nothing here does
//! I/O; the adapters convert wire payloads into these types.
//!
//! # Value Objects with Invariants
//!
//! - [`DottedPath`] - CMDB department path (`Region.Team.Sub`)
//! - [`RemotePath`] - JumpServer node path (`/DEFAULT/C3/Region/Team/Sub`)
//! - [`PathSet`] - department set with minimal cover and full expansion
//! - [`IpNetwork`] - CIDR network with membership test
//!
//! # Records
//!
//! - [`CmdbHost`] / [`HostSpec`] / [`RemoteHost`] - assets
//! - [`CmdbUser`] / [`PermissionGrant`] - authorization
//! - [`RemoteNode`] / [`NodeIndex`] - tree inventory

pub mod host;
pub mod network;
pub mod node;
pub mod path;
pub mod permission;
pub mod platform;
pub mod template;

pub use host::{CmdbHost, ExcludedAddresses, HostAccount, HostSpec, RemoteHost};
pub use network::{parse_address, IpNetwork, NetworkError};
pub use node::{NodeIndex, NodeRef, RemoteNode};
pub use path::{DottedPath, PathCodec, PathError, PathSet, RemotePath, DEFAULT_ROOT_PATH};
pub use permission::{
    group_users, grant_name, AccessLevel, CmdbUser, PermissionGrant, PermissionGroup,
    PermissionSummary, ValidityWindow, DEFAULT_GRANT_PREFIX, GRANT_ACTIONS,
};
pub use platform::{Platform, Protocol, SecretType};
pub use template::{TemplateMapping, TemplateRef, TemplateResolver};
