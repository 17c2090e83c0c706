// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Reconciler
//!
//! Hosts are joined by address. Only Linux-scoped CMDB hosts become
//! assets; every CMDB host still contributes departments to the tree.
//!
//! - address missing remotely, not excluded → create (one rename retry)
//! - address already present, or missing but excluded → counted as
//!   updated, no call
//! - remote address unknown to the CMDB, not excluded → delete
//!
//! Remote hosts without an address are never deleted.

use chrono::{DateTime, Local};
use std::collections::HashSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cmdb::cmdb_addresses;
use crate::domain::{
    CmdbHost, ExcludedAddresses, HostAccount, HostSpec, NodeIndex, NodeRef, PathCodec,
    RemoteHost, RemotePath, TemplateResolver,
};
use crate::store::{RemoteStore, StoreResult};

/// Outcome of a host pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostReport {
    pub added: usize,
    /// Already present or excluded; no call is made for these
    pub updated: usize,
    pub failed: usize,
    pub deleted: usize,
    pub delete_failed: usize,
}

/// Host operations for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPlan {
    pub creates: Vec<HostSpec>,
    /// Addresses already in JumpServer (or planned earlier in this run)
    pub present: Vec<HostSpec>,
    /// Missing but excluded; left alone
    pub excluded: Vec<HostSpec>,
    pub deletes: Vec<RemoteHost>,
}

/// Everything needed to turn a CMDB host into a [`HostSpec`]
#[derive(Debug, Clone, Copy)]
pub struct HostContext<'a> {
    pub codec: &'a PathCodec,
    pub templates: &'a TemplateResolver,
    pub excluded: &'a ExcludedAddresses,
    /// Fallback node for hosts whose departments resolve to nothing
    pub root_node_id: Option<Uuid>,
}

impl<'a> HostContext<'a> {
    /// Desired asset for one CMDB host
    pub fn host_spec(&self, host: &CmdbHost, index: &NodeIndex, at: DateTime<Local>) -> HostSpec {
        let platform = host.platform();
        let template = self.templates.resolve(&host.address);

        let mut nodes = index.resolve(self.codec, &host.departments);
        if nodes.is_empty() {
            if let Some(id) = self.root_node_id {
                let root = RemotePath::new(self.codec.root());
                nodes.push(NodeRef {
                    id,
                    name: root.name().to_string(),
                });
            }
        }

        HostSpec {
            name: host.hostname.clone(),
            address: host.address.clone(),
            platform,
            accounts: vec![HostAccount::for_platform(platform, template)],
            protocols: platform.protocols(),
            nodes,
            is_active: true,
            comment: HostSpec::sync_comment(at),
            environment: host.environment.clone(),
            owner: host.owner.clone(),
        }
    }
}

/// Classify desired hosts against the remote inventory.
///
/// An address is planned for creation at most once per run.
pub fn plan_hosts(
    specs: Vec<HostSpec>,
    remote: &[RemoteHost],
    cmdb_addresses: &HashSet<String>,
    excluded: &ExcludedAddresses,
) -> HostPlan {
    let mut plan = HostPlan::default();
    let mut present: HashSet<String> = remote.iter().map(|h| h.address.trim().to_string()).collect();

    for spec in specs {
        if present.contains(spec.address.trim()) {
            plan.present.push(spec);
        } else if excluded.contains(&spec.address) {
            plan.excluded.push(spec);
        } else {
            present.insert(spec.address.trim().to_string());
            plan.creates.push(spec);
        }
    }

    plan.deletes = remote
        .iter()
        .filter(|h| {
            let address = h.address.trim();
            !address.is_empty()
                && !cmdb_addresses.contains(address)
                && !excluded.contains(address)
        })
        .cloned()
        .collect();

    plan
}

/// Applies host plans against a [`RemoteStore`]
pub struct HostReconciler<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    context: HostContext<'a>,
}

impl<'a, S: RemoteStore + ?Sized> HostReconciler<'a, S> {
    pub fn new(store: &'a S, context: HostContext<'a>) -> Self {
        Self { store, context }
    }

    /// Read the host inventory, then plan and apply.
    ///
    /// Empty CMDB input skips the pass so an outage never deletes every
    /// asset. Only the inventory read can fail the call.
    pub async fn reconcile(
        &self,
        hosts: &[CmdbHost],
        index: &NodeIndex,
        at: DateTime<Local>,
    ) -> StoreResult<HostReport> {
        if hosts.is_empty() {
            warn!("No hosts from CMDB, skipping host sync");
            return Ok(HostReport::default());
        }

        let remote = self.store.list_hosts(self.context.root_node_id).await?;
        info!("Found {} hosts in JumpServer", remote.len());

        let specs: Vec<HostSpec> = hosts
            .iter()
            .filter(|host| host.is_linux_scoped())
            .map(|host| self.context.host_spec(host, index, at))
            .collect();
        let plan = plan_hosts(specs, &remote, &cmdb_addresses(hosts), self.context.excluded);

        Ok(self.apply(plan).await)
    }

    pub async fn apply(&self, plan: HostPlan) -> HostReport {
        let mut report = HostReport {
            updated: plan.present.len() + plan.excluded.len(),
            ..HostReport::default()
        };

        for spec in &plan.excluded {
            info!("Skipping excluded host: {} ({})", spec.name, spec.address);
        }

        for spec in &plan.creates {
            if self.create(spec).await {
                report.added += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            "Sync result: Added {}, Updated {}, Failed {}",
            report.added, report.updated, report.failed
        );

        for host in &plan.deletes {
            match self.store.delete_host(host.id).await {
                Ok(()) => {
                    info!("Deleted host: {} ({})", host.name, host.address);
                    report.deleted += 1;
                }
                Err(e) => {
                    error!("Failed to delete host {} ({}): {}", host.name, host.address, e);
                    report.delete_failed += 1;
                }
            }
        }

        info!(
            "Deleted {} hosts, {} deletions failed",
            report.deleted, report.delete_failed
        );
        report
    }

    async fn create(&self, spec: &HostSpec) -> bool {
        let err = match self.store.create_host(spec).await {
            Ok(id) => {
                info!("Added host: {} ({}) as {}", spec.name, spec.address, id);
                return true;
            }
            Err(e) => e,
        };

        if !err.is_name_conflict() {
            error!("Failed to add host {} ({}): {}", spec.name, spec.address, err);
            return false;
        }

        let renamed = HostSpec {
            name: spec.disambiguated_name(),
            ..spec.clone()
        };
        warn!("Host name {} already taken, retrying as {}", spec.name, renamed.name);
        match self.store.create_host(&renamed).await {
            Ok(id) => {
                info!("Added host: {} ({}) as {}", renamed.name, renamed.address, id);
                true
            }
            Err(e) => {
                error!("Failed to add host {} ({}): {}", renamed.name, renamed.address, e);
                false
            }
        }
    }
}
