// Copyright (c) 2025 - Cowboy AI, Inc.

//! OpenC3 CMDB Adapter
//!
//! Reads hosts and user authorization from the OpenC3 API:
//!
//! ```text
//! list_hosts = GET /api/ci/c3mc/jumpserver
//! list_users = GET /api/connector/default/auth/tree/userauth
//! ```
//!
//! Both endpoints answer with an envelope `{"stat": bool, "info": .., "data": [..]}`.
//! Requests are authenticated with the `appkey` / `appname` headers.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cmdb::{CmdbError, CmdbReader};
use crate::config::CmdbConfig;
use crate::domain::{AccessLevel, CmdbHost, CmdbUser, PathSet};

const HOSTS: &str = "/api/ci/c3mc/jumpserver";
const USERS: &str = "/api/connector/default/auth/tree/userauth";

/// Response envelope shared by the OpenC3 endpoints
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub stat: bool,
    #[serde(default)]
    pub info: Option<String>,
    pub data: Option<Vec<T>>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload. `stat: false` is a rejection; `data: null` is empty.
    pub fn into_data(self) -> Result<Vec<T>, CmdbError> {
        if !self.stat {
            return Err(CmdbError::Rejected(
                self.info.unwrap_or_else(|| "stat false".to_string()),
            ));
        }
        Ok(self.data.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostRecord {
    #[serde(rename = "hostName", default)]
    pub host_name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub tree: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl From<HostRecord> for CmdbHost {
    fn from(record: HostRecord) -> Self {
        let (departments, errors) = PathSet::parse_lenient(record.tree.as_deref().unwrap_or(""));
        for error in errors {
            warn!(host = %record.host_name, "Skipping department: {}", error);
        }
        Self {
            hostname: record.host_name.trim().to_string(),
            address: record.ip.trim().to_string(),
            os: record.os.filter(|os| !os.trim().is_empty()),
            departments,
            environment: record.environment,
            owner: record.owner,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub treename: String,
    /// `"1"` or `1`, depending on the OpenC3 version
    #[serde(default)]
    pub level: Value,
}

impl From<UserRecord> for CmdbUser {
    fn from(record: UserRecord) -> Self {
        let level = match &record.level {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            name: record.name,
            department: record.treename,
            level: AccessLevel::parse(&level),
        }
    }
}

/// OpenC3 API client
pub struct OpenC3Client {
    base_url: String,
    client: Client,
}

impl OpenC3Client {
    pub fn new(config: &CmdbConfig) -> Result<Self, CmdbError> {
        info!("Connecting to OpenC3 at {}", config.url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    "appkey",
                    config.api_key.parse().map_err(|e| {
                        CmdbError::Transport(format!("Invalid API key: {}", e))
                    })?,
                );
                headers.insert(
                    "appname",
                    config.app_name.parse().map_err(|e| {
                        CmdbError::Transport(format!("Invalid app name: {}", e))
                    })?,
                );
                headers
            })
            .build()
            .map_err(|e| CmdbError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CmdbError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CmdbError::Transport(format!("OpenC3 API error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CmdbError::Transport(format!("Failed to read body: {}", e)))?;
        if !status.is_success() {
            return Err(CmdbError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| CmdbError::Decode(e.to_string()))?;
        envelope.into_data()
    }

    /// Verify the host endpoint answers with a valid envelope
    pub async fn health_check(&self) -> Result<(), CmdbError> {
        self.fetch::<Value>(HOSTS).await?;
        debug!("OpenC3 health check passed");
        Ok(())
    }
}

#[async_trait]
impl CmdbReader for OpenC3Client {
    async fn list_hosts(&self) -> Result<Vec<CmdbHost>, CmdbError> {
        let records: Vec<HostRecord> = self.fetch(HOSTS).await?;
        info!("Fetched {} hosts from CMDB", records.len());
        Ok(records.into_iter().map(CmdbHost::from).collect())
    }

    async fn list_users(&self) -> Result<Vec<CmdbUser>, CmdbError> {
        let records: Vec<UserRecord> = self.fetch(USERS).await?;
        info!("Fetched {} user authorizations from CMDB", records.len());
        Ok(records.into_iter().map(CmdbUser::from).collect())
    }
}
