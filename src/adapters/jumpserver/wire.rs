// Copyright (c) 2025 - Cowboy AI, Inc.

//! JumpServer REST payloads
//!
//! Wire records mirror the JSON the API speaks. They are converted to and
//! from the domain records at the client boundary and never leak into the
//! reconcilers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    HostSpec, PermissionGrant, PermissionSummary, RemoteHost, RemoteNode, RemotePath,
    ValidityWindow,
};
use crate::store::StoreError;

/// Timestamp format accepted by the permission endpoints
pub const GRANT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Reference to another object, either a bare id or `{id|pk: ..}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefRecord {
    Id(Uuid),
    Object {
        #[serde(alias = "pk")]
        id: Uuid,
    },
}

impl RefRecord {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Id(id) | Self::Object { id } => *id,
        }
    }
}

fn ref_ids(refs: &[RefRecord]) -> Vec<Uuid> {
    refs.iter().map(RefRecord::id).collect()
}

/// `{"pk": ..}` as sent on writes
#[derive(Debug, Clone, Serialize)]
pub struct PkRef {
    pub pk: Uuid,
}

fn pk_refs(ids: &[Uuid]) -> Vec<PkRef> {
    ids.iter().map(|&pk| PkRef { pk }).collect()
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: Uuid,
    #[serde(default)]
    pub value: String,
    pub full_value: String,
}

impl From<NodeRecord> for RemoteNode {
    fn from(record: NodeRecord) -> Self {
        let full_value = RemotePath::new(record.full_value);
        let value = if record.value.is_empty() {
            full_value.name().to_string()
        } else {
            record.value
        };
        Self {
            id: record.id,
            full_value,
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodePayload<'a> {
    pub value: &'a str,
    pub full_value: &'a str,
}

// ============================================================================
// Hosts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl From<HostRecord> for RemoteHost {
    fn from(record: HostRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            address: record.address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformPayload {
    pub id: u32,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretTypePayload {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountPayload {
    pub template: Uuid,
    pub name: String,
    pub username: String,
    pub secret_type: SecretTypePayload,
    pub privileged: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolPayload {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeRefPayload {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostPayload {
    pub name: String,
    pub address: String,
    pub platform: PlatformPayload,
    pub accounts: Vec<AccountPayload>,
    pub nodes: Vec<NodeRefPayload>,
    pub is_active: bool,
    pub protocols: Vec<ProtocolPayload>,
    pub comment: String,
    #[serde(rename = "specific_system_environments", skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(rename = "specific_owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl From<&HostSpec> for HostPayload {
    fn from(spec: &HostSpec) -> Self {
        Self {
            name: spec.name.clone(),
            address: spec.address.clone(),
            platform: PlatformPayload {
                id: spec.platform.id(),
                name: spec.platform.name(),
            },
            accounts: spec
                .accounts
                .iter()
                .map(|account| AccountPayload {
                    template: account.template_id,
                    name: account.name.clone(),
                    username: account.username.clone(),
                    secret_type: SecretTypePayload {
                        value: account.secret_type.as_str(),
                        label: match account.secret_type {
                            crate::domain::SecretType::SshKey => "SSH Key",
                            crate::domain::SecretType::Password => "Password",
                        },
                    },
                    privileged: account.privileged,
                })
                .collect(),
            nodes: spec
                .nodes
                .iter()
                .map(|node| NodeRefPayload {
                    id: node.id,
                    name: node.name.clone(),
                })
                .collect(),
            is_active: spec.is_active,
            protocols: spec
                .protocols
                .iter()
                .map(|p| ProtocolPayload {
                    name: p.name.clone(),
                    port: p.port,
                })
                .collect(),
            comment: spec.comment.clone(),
            environment: spec.environment.clone(),
            owner: spec.owner.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRecord {
    pub id: Uuid,
}

/// Classify a rejected host creation.
///
/// JumpServer answers a duplicate asset name with HTTP 400 and a `name`
/// error list such as `{"name": ["This field must be unique."]}` (or the
/// localized `字段必须唯一`).
pub fn classify_host_error(status: u16, body: &str) -> StoreError {
    if status == 400 {
        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
            let name_errors = fields
                .get("name")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors.iter().filter_map(Value::as_str).any(|msg| {
                        msg.to_ascii_lowercase().contains("unique")
                            || msg.contains("唯一")
                            || msg.to_ascii_lowercase().contains("already exists")
                    })
                })
                .unwrap_or(false);
            if name_errors {
                return StoreError::NameConflict(body.to_string());
            }
        }
    }
    StoreError::Status {
        status,
        body: body.to_string(),
    }
}

// ============================================================================
// Permissions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionSummaryRecord {
    pub id: Uuid,
    pub name: String,
}

impl From<PermissionSummaryRecord> for PermissionSummary {
    fn from(record: PermissionSummaryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

/// Action as listed: either `"connect"` or `{"value": "connect", "label": ..}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionRecord {
    Plain(String),
    Labeled { value: String },
}

impl ActionRecord {
    fn into_value(self) -> String {
        match self {
            Self::Plain(value) | Self::Labeled { value } => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRecord {
    pub name: String,
    #[serde(default)]
    pub users: Vec<RefRecord>,
    #[serde(default)]
    pub user_groups: Vec<RefRecord>,
    #[serde(default)]
    pub nodes: Vec<RefRecord>,
    #[serde(default)]
    pub assets: Vec<RefRecord>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
    #[serde(default)]
    pub is_active: bool,
    pub date_start: String,
    pub date_expired: String,
}

/// Parse a grant timestamp as returned by JumpServer.
///
/// Accepts RFC 3339 and the `2025/03/04 05:06:07 +0800` display form.
pub fn parse_grant_date(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S %z") {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(at.and_utc());
    }
    Err(StoreError::Decode(format!("Unrecognised grant date: {raw}")))
}

impl TryFrom<PermissionRecord> for PermissionGrant {
    type Error = StoreError;

    fn try_from(record: PermissionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            users: ref_ids(&record.users),
            user_groups: ref_ids(&record.user_groups),
            nodes: ref_ids(&record.nodes),
            assets: ref_ids(&record.assets),
            accounts: record.accounts,
            actions: record
                .actions
                .into_iter()
                .map(ActionRecord::into_value)
                .collect(),
            is_active: record.is_active,
            validity: ValidityWindow {
                date_start: parse_grant_date(&record.date_start)?,
                date_expired: parse_grant_date(&record.date_expired)?,
            },
            name: record.name,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionPayload {
    pub name: String,
    pub users: Vec<PkRef>,
    pub user_groups: Vec<PkRef>,
    pub nodes: Vec<PkRef>,
    pub assets: Vec<PkRef>,
    pub accounts: Vec<String>,
    pub actions: Vec<String>,
    pub is_active: bool,
    pub date_start: String,
    pub date_expired: String,
}

impl From<&PermissionGrant> for PermissionPayload {
    fn from(grant: &PermissionGrant) -> Self {
        Self {
            name: grant.name.clone(),
            users: pk_refs(&grant.users),
            user_groups: pk_refs(&grant.user_groups),
            nodes: pk_refs(&grant.nodes),
            assets: pk_refs(&grant.assets),
            accounts: grant.accounts.clone(),
            actions: grant.actions.clone(),
            is_active: grant.is_active,
            date_start: grant.validity.date_start.format(GRANT_DATE_FORMAT).to_string(),
            date_expired: grant.validity.date_expired.format(GRANT_DATE_FORMAT).to_string(),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
}
