// Copyright (c) 2025 - Cowboy AI, Inc.

//! HTTP adapters for both systems of record
//!
//! - [`jumpserver`] implements [`crate::store::RemoteStore`]
//! - [`openc3`] implements [`crate::cmdb::CmdbReader`]

pub mod jumpserver;
pub mod openc3;

pub use jumpserver::JumpServerClient;
pub use openc3::OpenC3Client;
