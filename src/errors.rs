// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for sync operations

use thiserror::Error;

use crate::cmdb::CmdbError;
use crate::config::ConfigError;
use crate::domain::{NetworkError, PathError};
use crate::store::StoreError;

/// Errors that can occur anywhere in a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// CMDB read failed
    #[error("CMDB error: {0}")]
    Cmdb(#[from] CmdbError),

    /// Remote store call failed
    #[error("JumpServer error: {0}")]
    Store(#[from] StoreError),

    /// Tree path outside the expected alphabet or root
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// Address or CIDR could not be parsed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
