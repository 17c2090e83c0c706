//! Asset sync between the OpenC3 CMDB and JumpServer
//!
//! The CMDB is authoritative for hosts, the department tree and user
//! authorization levels. Each run mirrors that state into JumpServer as
//! tree nodes, assets and asset permission grants.
//!
//! - [`domain`]: paths, hosts, grants and other value objects
//! - [`reconcile`]: pure planning plus best-effort apply, per entity
//! - [`sync`]: phase orchestration and the run report
//! - [`adapters`]: HTTP clients for both systems

pub mod adapters;
pub mod cmdb;
pub mod config;
pub mod domain;
pub mod errors;
pub mod reconcile;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use adapters::{JumpServerClient, OpenC3Client};
pub use cmdb::{CmdbError, CmdbReader};
pub use config::{ConfigError, SyncConfig};
pub use errors::{SyncError, SyncResult};
pub use store::{PermissionFilter, RemoteStore, StoreError, StoreResult};
pub use sync::{Phase, SyncReport, SyncRunner};
