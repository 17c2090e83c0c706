// Copyright (c) 2025 - Cowboy AI, Inc.
//! Permission Reconciler
//!
//! One managed grant per (department, level) group, named
//! `<prefix><department>_level_<level>`. Managed grants whose group no
//! longer exists are deleted; hand-made grants (no prefix) are never
//! touched.
//!
//! Existing grants keep every field except their member list, which only
//! grows, and their validity window, which is re-stamped to
//! `[now, now + 100 years]` on every run.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    group_users, CmdbUser, NodeIndex, PathCodec, PathSet, PermissionGrant, PermissionGroup,
    PermissionSummary, ValidityWindow,
};
use crate::store::{PermissionFilter, RemoteStore, StoreResult};

/// Outcome of a permission pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    /// Groups none of whose members exist in JumpServer
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantOutcome {
    Created,
    Updated,
    Failed,
}

/// Managed grants with no current group
pub fn stale_grants(
    prefix: &str,
    existing: &[PermissionSummary],
    groups: &BTreeMap<String, PermissionGroup>,
) -> Vec<PermissionSummary> {
    existing
        .iter()
        .filter(|grant| grant.name.starts_with(prefix) && !groups.contains_key(&grant.name))
        .cloned()
        .collect()
}

/// Node ids for a group's department, from the minimal cover of its paths
pub fn grant_nodes(codec: &PathCodec, index: &NodeIndex, department: &str) -> Vec<Uuid> {
    let (departments, errors) = PathSet::parse_lenient(department);
    for e in errors {
        warn!(department, "Skipping department: {}", e);
    }
    index
        .resolve(codec, &departments.minimal_cover())
        .into_iter()
        .map(|node| node.id)
        .collect()
}

/// Merge members into an existing grant and re-stamp its validity.
///
/// Returns the number of members actually added.
pub fn refresh_grant(grant: &mut PermissionGrant, members: &[Uuid], now: DateTime<Utc>) -> usize {
    let added = members.iter().filter(|&&id| grant.add_user(id)).count();
    grant.validity = ValidityWindow::permanent_from(now);
    added
}

/// Applies grant changes against a [`RemoteStore`]
pub struct PermissionReconciler<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    codec: &'a PathCodec,
    prefix: &'a str,
    user_ids: HashMap<String, Option<Uuid>>,
}

impl<'a, S: RemoteStore + ?Sized> PermissionReconciler<'a, S> {
    pub fn new(store: &'a S, codec: &'a PathCodec, prefix: &'a str) -> Self {
        Self {
            store,
            codec,
            prefix,
            user_ids: HashMap::new(),
        }
    }

    /// Read the grant inventory and remove stale grants, then look up each
    /// group by exact name and create or update its grant.
    ///
    /// Empty CMDB input skips the pass. Only the inventory read can fail
    /// the call.
    pub async fn reconcile(
        &mut self,
        users: &[CmdbUser],
        index: &NodeIndex,
        now: DateTime<Utc>,
    ) -> StoreResult<PermissionReport> {
        if users.is_empty() {
            warn!("No user authorizations from CMDB, skipping permission sync");
            return Ok(PermissionReport::default());
        }

        let groups = group_users(self.prefix, users);
        let existing = self.store.list_permissions(&PermissionFilter::all()).await?;
        info!(
            "Syncing {} permission groups, {} grants in JumpServer",
            groups.len(),
            existing.len()
        );

        let mut report = PermissionReport::default();

        for grant in stale_grants(self.prefix, &existing, &groups) {
            match self.store.delete_permission(grant.id).await {
                Ok(()) => {
                    info!("Deleted stale permission: {}", grant.name);
                    report.deleted += 1;
                }
                Err(e) => {
                    error!("Failed to delete permission {}: {}", grant.name, e);
                    report.failed += 1;
                }
            }
        }

        for group in groups.values() {
            let members = self.member_ids(&group.users).await;
            if members.is_empty() {
                warn!("No JumpServer users for {}, skipping", group.name);
                report.skipped += 1;
                continue;
            }

            let outcome = match self.find_grant(&group.name).await {
                Ok(Some(id)) => self.update(id, group, &members, now).await,
                Ok(None) => self.create(group, &members, index, now).await,
                Err(e) => {
                    error!("Failed to look up permission {}: {}", group.name, e);
                    GrantOutcome::Failed
                }
            };
            match outcome {
                GrantOutcome::Created => report.created += 1,
                GrantOutcome::Updated => report.updated += 1,
                GrantOutcome::Failed => report.failed += 1,
            }
        }

        info!(
            "Permission sync result: Created {}, Updated {}, Deleted {}, Failed {}, Skipped {}",
            report.created, report.updated, report.deleted, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Id of the grant named exactly `name`; the store search may match loosely
    async fn find_grant(&self, name: &str) -> StoreResult<Option<Uuid>> {
        let matches = self
            .store
            .list_permissions(&PermissionFilter::by_name(name))
            .await?;
        Ok(matches.into_iter().find(|grant| grant.name == name).map(|grant| grant.id))
    }

    async fn update(
        &self,
        id: Uuid,
        group: &PermissionGroup,
        members: &[Uuid],
        now: DateTime<Utc>,
    ) -> GrantOutcome {
        let mut grant = match self.store.get_permission(id).await {
            Ok(grant) => grant,
            Err(e) => {
                error!("Failed to fetch permission {}: {}", group.name, e);
                return GrantOutcome::Failed;
            }
        };

        let added = refresh_grant(&mut grant, members, now);
        match self.store.update_permission(id, &grant).await {
            Ok(()) => {
                info!("Updated permission {} ({} new members)", group.name, added);
                GrantOutcome::Updated
            }
            Err(e) => {
                error!("Failed to update permission {}: {}", group.name, e);
                GrantOutcome::Failed
            }
        }
    }

    async fn create(
        &self,
        group: &PermissionGroup,
        members: &[Uuid],
        index: &NodeIndex,
        now: DateTime<Utc>,
    ) -> GrantOutcome {
        let nodes = grant_nodes(self.codec, index, &group.department);
        if nodes.is_empty() {
            warn!("No nodes found for {}", group.department);
        }

        let mut grant = PermissionGrant::for_group(group, nodes, now);
        for &id in members {
            grant.add_user(id);
        }

        match self.store.create_permission(&grant).await {
            Ok(id) => {
                info!("Created permission {} as {}", group.name, id);
                GrantOutcome::Created
            }
            Err(e) => {
                error!("Failed to create permission {}: {}", group.name, e);
                GrantOutcome::Failed
            }
        }
    }

    /// Resolved, deduplicated member ids in CMDB order
    async fn member_ids(&mut self, users: &[CmdbUser]) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for user in users {
            if let Some(id) = self.user_id(&user.name).await {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    async fn user_id(&mut self, username: &str) -> Option<Uuid> {
        if let Some(cached) = self.user_ids.get(username) {
            return *cached;
        }

        let id = match self.store.find_user_id(username).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                warn!("User {} not found in JumpServer", username);
                None
            }
            Err(e) => {
                error!("Failed to look up user {}: {}", username, e);
                None
            }
        };
        debug!(username, ?id, "Resolved user");
        self.user_ids.insert(username.to_string(), id);
        id
    }
}
