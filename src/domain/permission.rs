// Copyright (c) 2025 - Cowboy AI, Inc.
//! Asset permission grants derived from CMDB authorization levels
//!
//! Every (department, level) pair in the CMDB becomes exactly one named
//! grant in JumpServer. The grant name doubles as the grouping key, so it
//! is namespaced with a fixed prefix to tell managed grants apart from
//! hand-made ones.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::path::PathSet;

/// Default namespace for managed grant names
pub const DEFAULT_GRANT_PREFIX: &str = "C3_";

/// Actions granted on every managed grant
pub const GRANT_ACTIONS: [&str; 6] = ["connect", "upload", "download", "copy", "paste", "delete"];

/// Validity span stamped on every sync (100 × 365 days)
pub const GRANT_VALIDITY_DAYS: i64 = 365 * 100;

/// CMDB authorization level
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessLevel {
    /// `"1"`: backend account
    Backend,
    /// `"2"`: root account
    Root,
    /// `"3"`: every account
    All,
    /// Anything else, kept verbatim for the grant name
    Other(String),
}

impl AccessLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1" => Self::Backend,
            "2" => Self::Root,
            "3" => Self::All,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Backend => "1",
            Self::Root => "2",
            Self::All => "3",
            Self::Other(raw) => raw,
        }
    }

    /// JumpServer account privileges for this level.
    ///
    /// Unknown levels get the level-1 privileges.
    pub fn accounts(&self) -> Vec<String> {
        let accounts: &[&str] = match self {
            Self::Backend | Self::Other(_) => &["@SPEC", "backend"],
            Self::Root => &["@SPEC", "root"],
            Self::All => &["@ALL"],
        };
        accounts.iter().map(|a| a.to_string()).collect()
    }
}

impl From<String> for AccessLevel {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<AccessLevel> for String {
    fn from(level: AccessLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User authorization as reported by the CMDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdbUser {
    pub name: String,
    /// Department as written in the CMDB, used verbatim in the grant name
    pub department: String,
    pub level: AccessLevel,
}

/// Users sharing one (department, level) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGroup {
    pub name: String,
    pub department: String,
    pub level: AccessLevel,
    /// In CMDB order; the first one seeds a new grant
    pub users: Vec<CmdbUser>,
}

/// Grant name for a (department, level) pair
pub fn grant_name(prefix: &str, department: &str, level: &AccessLevel) -> String {
    format!("{prefix}{department}_level_{level}")
}

/// Group users by grant name
pub fn group_users(prefix: &str, users: &[CmdbUser]) -> BTreeMap<String, PermissionGroup> {
    let mut groups: BTreeMap<String, PermissionGroup> = BTreeMap::new();
    for user in users {
        let name = grant_name(prefix, &user.department, &user.level);
        groups
            .entry(name.clone())
            .or_insert_with(|| PermissionGroup {
                name,
                department: user.department.clone(),
                level: user.level.clone(),
                users: Vec::new(),
            })
            .users
            .push(user.clone());
    }
    groups
}

/// Grant validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub date_start: DateTime<Utc>,
    pub date_expired: DateTime<Utc>,
}

impl ValidityWindow {
    /// `[now, now + 100 years]`
    pub fn permanent_from(now: DateTime<Utc>) -> Self {
        Self {
            date_start: now,
            date_expired: now + Duration::days(GRANT_VALIDITY_DAYS),
        }
    }
}

/// Grant as listed by JumpServer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSummary {
    pub id: Uuid,
    pub name: String,
}

/// Full asset permission grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub name: String,
    pub users: Vec<Uuid>,
    pub user_groups: Vec<Uuid>,
    pub nodes: Vec<Uuid>,
    pub assets: Vec<Uuid>,
    pub accounts: Vec<String>,
    pub actions: Vec<String>,
    pub is_active: bool,
    pub validity: ValidityWindow,
}

impl PermissionGrant {
    /// New managed grant for `group`, with no members yet
    pub fn for_group(group: &PermissionGroup, nodes: Vec<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            name: group.name.clone(),
            users: Vec::new(),
            user_groups: Vec::new(),
            nodes,
            assets: Vec::new(),
            accounts: group.level.accounts(),
            actions: GRANT_ACTIONS.iter().map(|a| a.to_string()).collect(),
            is_active: true,
            validity: ValidityWindow::permanent_from(now),
        }
    }

    /// Add a member unless already present. Returns true when added.
    pub fn add_user(&mut self, user_id: Uuid) -> bool {
        if self.users.contains(&user_id) {
            return false;
        }
        self.users.push(user_id);
        true
    }
}
