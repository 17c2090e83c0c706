// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconcilers
//!
//! Each reconciler splits into a pure planning step and an apply step
//! that issues remote calls one at a time:
//!
//! ```text
//! CMDB snapshot + remote inventory ──plan──> operations ──apply──> report
//! ```
//!
//! A failed call is logged and counted against its single item; the pass
//! carries on. Only the initial inventory read can fail a whole pass.

pub mod hosts;
pub mod nodes;
pub mod permissions;

pub use hosts::{plan_hosts, HostContext, HostPlan, HostReconciler, HostReport};
pub use nodes::{plan_nodes, NodePlan, NodeReconciler, NodeReport};
pub use permissions::{
    grant_nodes, refresh_grant, stale_grants, PermissionReconciler, PermissionReport,
};
