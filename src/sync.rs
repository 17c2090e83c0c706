// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sync Runner
//!
//! Drives one reconciliation run:
//!
//! ```text
//! CMDB hosts ──> nodes ──> hosts
//! CMDB users ─────────────────────> permissions
//!                          settle ──> nodes again
//! ```
//!
//! The CMDB is read once per run. Each phase reads the JumpServer
//! inventory it needs once, then mutates item by item.

use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

use crate::cmdb::{cmdb_departments, CmdbReader};
use crate::config::SyncConfig;
use crate::domain::{CmdbHost, NodeIndex};
use crate::reconcile::{
    HostContext, HostReconciler, HostReport, NodeReconciler, NodeReport, PermissionReconciler,
    PermissionReport,
};
use crate::store::RemoteStore;

/// A selectable part of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Nodes,
    Hosts,
    Permissions,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Nodes, Phase::Hosts, Phase::Permissions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Hosts => "hosts",
            Self::Permissions => "permissions",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nodes" => Ok(Self::Nodes),
            "hosts" => Ok(Self::Hosts),
            "permissions" => Ok(Self::Permissions),
            other => Err(format!("Unknown phase: {}", other)),
        }
    }
}

/// Aggregate outcome of a run
///
/// A phase that did not run (not selected, or its input could not be
/// read) is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub nodes: Option<NodeReport>,
    pub hosts: Option<HostReport>,
    pub permissions: Option<PermissionReport>,
    pub settle: Option<NodeReport>,
    /// False when a CMDB or inventory read failed
    pub success: bool,
}

/// Runs the reconcilers in order against one CMDB and one remote store
pub struct SyncRunner<'a, C: CmdbReader + ?Sized, S: RemoteStore + ?Sized> {
    cmdb: &'a C,
    store: &'a S,
    config: &'a SyncConfig,
}

impl<'a, C: CmdbReader + ?Sized, S: RemoteStore + ?Sized> SyncRunner<'a, C, S> {
    pub fn new(cmdb: &'a C, store: &'a S, config: &'a SyncConfig) -> Self {
        Self {
            cmdb,
            store,
            config,
        }
    }

    pub async fn run(&self, phases: &[Phase]) -> SyncReport {
        self.run_at(phases, Utc::now()).await
    }

    /// Run the selected phases with `now` as the sync timestamp
    pub async fn run_at(&self, phases: &[Phase], now: DateTime<Utc>) -> SyncReport {
        let wants = |phase: Phase| phases.contains(&phase);
        let mut report = SyncReport {
            success: true,
            ..SyncReport::default()
        };
        let nodes = NodeReconciler::new(self.store, &self.config.codec);

        let hosts = if wants(Phase::Nodes) || wants(Phase::Hosts) {
            match self.cmdb.list_hosts().await {
                Ok(hosts) => Some(hosts),
                Err(e) => {
                    error!("Failed to fetch hosts from CMDB: {}", e);
                    report.success = false;
                    None
                }
            }
        } else {
            None
        };

        let mut index: Option<NodeIndex> = None;

        if wants(Phase::Nodes) {
            if let Some(hosts) = &hosts {
                info!("Syncing nodes");
                match nodes.reconcile(&cmdb_departments(hosts)).await {
                    Ok((node_report, updated)) => {
                        report.nodes = Some(node_report);
                        index = Some(updated);
                    }
                    Err(e) => {
                        error!("Failed to list JumpServer nodes: {}", e);
                        report.success = false;
                    }
                }
            }
        }

        if wants(Phase::Hosts) {
            if let Some(hosts) = &hosts {
                if let Some(index) = self.ensure_index(&nodes, &mut index, &mut report).await {
                    info!("Syncing hosts");
                    report.hosts = self.sync_hosts(hosts, index, now, &mut report.success).await;
                }
            }
        }

        if wants(Phase::Permissions) {
            match self.cmdb.list_users().await {
                Ok(users) => {
                    if let Some(index) = self.ensure_index(&nodes, &mut index, &mut report).await
                    {
                        info!("Syncing permissions");
                        let mut reconciler = PermissionReconciler::new(
                            self.store,
                            &self.config.codec,
                            &self.config.permission_prefix,
                        );
                        match reconciler.reconcile(&users, index, now).await {
                            Ok(permission_report) => report.permissions = Some(permission_report),
                            Err(e) => {
                                error!("Failed to list JumpServer permissions: {}", e);
                                report.success = false;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to fetch user authorizations from CMDB: {}", e);
                    report.success = false;
                }
            }
        }

        if self.config.settle_nodes && report.nodes.is_some() {
            if let Some(hosts) = &hosts {
                info!("Settling nodes");
                match nodes.reconcile(&cmdb_departments(hosts)).await {
                    Ok((settle_report, _)) => report.settle = Some(settle_report),
                    Err(e) => {
                        error!("Failed to list JumpServer nodes: {}", e);
                        report.success = false;
                    }
                }
            }
        }

        if report.success {
            info!("Sync completed");
        } else {
            warn!("Sync completed with phases skipped");
        }
        report
    }

    /// Node index from the node phase, or a fresh read when it did not run
    async fn ensure_index<'i>(
        &self,
        nodes: &NodeReconciler<'_, S>,
        index: &'i mut Option<NodeIndex>,
        report: &mut SyncReport,
    ) -> Option<&'i NodeIndex> {
        if index.is_none() {
            match nodes.load_index().await {
                Ok(loaded) => *index = Some(loaded),
                Err(e) => {
                    error!("Failed to list JumpServer nodes: {}", e);
                    report.success = false;
                }
            }
        }
        index.as_ref()
    }

    async fn sync_hosts(
        &self,
        hosts: &[CmdbHost],
        index: &NodeIndex,
        now: DateTime<Utc>,
        success: &mut bool,
    ) -> Option<HostReport> {
        let context = HostContext {
            codec: &self.config.codec,
            templates: &self.config.templates,
            excluded: &self.config.excluded,
            root_node_id: self.config.jumpserver.root_node_id,
        };
        let reconciler = HostReconciler::new(self.store, context);
        match reconciler
            .reconcile(hosts, index, now.with_timezone(&Local))
            .await
        {
            Ok(host_report) => Some(host_report),
            Err(e) => {
                error!("Failed to list JumpServer hosts: {}", e);
                *success = false;
                None
            }
        }
    }
}
