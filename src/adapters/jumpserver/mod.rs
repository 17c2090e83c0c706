// Copyright (c) 2025 - Cowboy AI, Inc.

//! JumpServer Remote Store Adapter
//!
//! Implements [`RemoteStore`] over the JumpServer v3 REST API.
//!
//! ```text
//! list_nodes        = GET    /api/v1/assets/nodes/
//! create_node       = POST   /api/v1/assets/nodes/
//! delete_node       = DELETE /api/v1/assets/nodes/{id}/
//! list_hosts        = GET    /api/v1/assets/hosts/?node={id}
//! create_host       = POST   /api/v1/assets/hosts/
//! delete_host       = DELETE /api/v1/assets/hosts/{id}/
//! list_permissions  = GET    /api/v1/perms/asset-permissions/?name={name}
//! get_permission    = GET    /api/v1/perms/asset-permissions/{id}/
//! create_permission = POST   /api/v1/perms/asset-permissions/
//! update_permission = PUT    /api/v1/perms/asset-permissions/{id}/
//! delete_permission = DELETE /api/v1/perms/asset-permissions/{id}/
//! find_user_id      = GET    /api/v1/users/users/?username={name}
//! ```
//!
//! Every request carries `Accept`, `Date` and an HTTP Signature
//! `Authorization` header (see [`signing`]).

pub mod signing;
pub mod wire;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::JumpServerConfig;
use crate::domain::{
    HostSpec, PermissionGrant, PermissionSummary, RemoteHost, RemoteNode, RemotePath,
};
use crate::store::{PermissionFilter, RemoteStore, StoreError, StoreResult};

pub use signing::RequestSigner;
use wire::{
    classify_host_error, CreatedRecord, HostPayload, HostRecord, NodePayload, NodeRecord,
    PermissionPayload, PermissionRecord, PermissionSummaryRecord, UserRecord,
};

const NODES: &str = "/api/v1/assets/nodes/";
const HOSTS: &str = "/api/v1/assets/hosts/";
const PERMISSIONS: &str = "/api/v1/perms/asset-permissions/";
const USERS: &str = "/api/v1/users/users/";

/// Signed JumpServer API client
pub struct JumpServerClient {
    base_url: String,
    client: Client,
    signer: RequestSigner,
}

impl JumpServerClient {
    pub fn new(config: &JumpServerConfig) -> StoreResult<Self> {
        info!("Connecting to JumpServer at {}", config.url);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
            signer: RequestSigner::new(&config.key_id, &config.secret),
        })
    }

    /// Verify the API answers and accepts our key
    pub async fn health_check(&self) -> StoreResult<()> {
        let response = self
            .send(Method::GET, NODES, &[("limit", "1".to_string())], None::<&()>)
            .await?;
        Self::ensure_success(response).await?;
        debug!("JumpServer health check passed");
        Ok(())
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> StoreResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| StoreError::InvalidRequest(format!("Invalid URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> StoreResult<Response> {
        let url = self.url(path, query)?;
        let target = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        let date = signing::http_date(Utc::now());
        let authorization = self.signer.authorization(method.as_str(), &target, &date)?;

        debug!("{} {}", method, target);
        let mut request = self
            .client
            .request(method, url)
            .header("Accept", signing::ACCEPT)
            .header("Date", date)
            .header("Authorization", authorization);
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("JumpServer API error: {}", e)))
    }

    async fn ensure_success(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to read body: {}", e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> StoreResult<T> {
        let response = self.send(Method::GET, path, query, None::<&()>).await?;
        Self::decode(Self::ensure_success(response).await?).await
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let response = self.send(Method::DELETE, path, &[], None::<&()>).await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for JumpServerClient {
    async fn list_nodes(&self) -> StoreResult<Vec<RemoteNode>> {
        let records: Vec<NodeRecord> = self.get(NODES, &[]).await?;
        Ok(records.into_iter().map(RemoteNode::from).collect())
    }

    async fn create_node(&self, name: &str, full_path: &RemotePath) -> StoreResult<RemoteNode> {
        let payload = NodePayload {
            value: name,
            full_value: full_path.as_str(),
        };
        let response = self.send(Method::POST, NODES, &[], Some(&payload)).await?;
        let record: NodeRecord = Self::decode(Self::ensure_success(response).await?).await?;
        Ok(record.into())
    }

    async fn delete_node(&self, id: Uuid) -> StoreResult<()> {
        self.delete(&format!("{NODES}{id}/")).await
    }

    async fn list_hosts(&self, node: Option<Uuid>) -> StoreResult<Vec<RemoteHost>> {
        let query: Vec<(&str, String)> = node
            .map(|id| vec![("node", id.to_string())])
            .unwrap_or_default();
        let records: Vec<HostRecord> = self.get(HOSTS, &query).await?;
        Ok(records.into_iter().map(RemoteHost::from).collect())
    }

    async fn create_host(&self, host: &HostSpec) -> StoreResult<Uuid> {
        let payload = HostPayload::from(host);
        let response = self.send(Method::POST, HOSTS, &[], Some(&payload)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_host_error(status.as_u16(), &body));
        }
        let created: CreatedRecord = Self::decode(response).await?;
        Ok(created.id)
    }

    async fn delete_host(&self, id: Uuid) -> StoreResult<()> {
        self.delete(&format!("{HOSTS}{id}/")).await
    }

    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> StoreResult<Vec<PermissionSummary>> {
        let query: Vec<(&str, String)> = filter
            .name
            .as_ref()
            .map(|name| vec![("name", name.clone())])
            .unwrap_or_default();
        let records: Vec<PermissionSummaryRecord> = self.get(PERMISSIONS, &query).await?;
        Ok(records.into_iter().map(PermissionSummary::from).collect())
    }

    async fn get_permission(&self, id: Uuid) -> StoreResult<PermissionGrant> {
        let record: PermissionRecord = self.get(&format!("{PERMISSIONS}{id}/"), &[]).await?;
        PermissionGrant::try_from(record)
    }

    async fn create_permission(&self, grant: &PermissionGrant) -> StoreResult<Uuid> {
        let payload = PermissionPayload::from(grant);
        let response = self
            .send(Method::POST, PERMISSIONS, &[], Some(&payload))
            .await?;
        let created: CreatedRecord = Self::decode(Self::ensure_success(response).await?).await?;
        Ok(created.id)
    }

    async fn update_permission(&self, id: Uuid, grant: &PermissionGrant) -> StoreResult<()> {
        let payload = PermissionPayload::from(grant);
        let response = self
            .send(
                Method::PUT,
                &format!("{PERMISSIONS}{id}/"),
                &[],
                Some(&payload),
            )
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn delete_permission(&self, id: Uuid) -> StoreResult<()> {
        self.delete(&format!("{PERMISSIONS}{id}/")).await
    }

    async fn find_user_id(&self, username: &str) -> StoreResult<Option<Uuid>> {
        let users: Vec<UserRecord> = self
            .get(USERS, &[("username", username.to_string())])
            .await?;
        // The filter is a search; only an exact username counts
        Ok(users
            .into_iter()
            .find(|user| user.username == username)
            .map(|user| user.id))
    }
}
