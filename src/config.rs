// Copyright (c) 2025 - Cowboy AI, Inc.

//! Sync configuration
//!
//! Loaded once from a TOML file, overlaid with environment variables for
//! the endpoints and secrets, then validated into [`SyncConfig`]. Nothing
//! downstream re-checks these fields.
//!
//! ```toml
//! [jumpserver]
//! url = "https://jump.example.com"
//! key_id = "a1b2"
//! secret = "s3cr3t"
//!
//! [cmdb]
//! url = "https://c3.example.com"
//! api_key = "k3y"
//!
//! [settings]
//! excluded_ips = ["10.0.0.1"]
//!
//! [templates.default]
//! account_name = "jumpserver"
//! template_id = "7478fed0-e9d3-4abc-a237-2d758bc428fe"
//!
//! [[templates.mapping]]
//! name = "office"
//! cidr = ["10.0.0.0/24"]
//! account_name = "ops"
//! template_id = "1a2b3c4d-0000-4000-8000-000000000001"
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    parse_address, ExcludedAddresses, IpNetwork, NetworkError, PathCodec, PathError,
    TemplateMapping, TemplateRef, TemplateResolver, DEFAULT_GRANT_PREFIX, DEFAULT_ROOT_PATH,
};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Invalid template id in {field}: {value}")]
    InvalidTemplateId { field: String, value: String },

    #[error("Invalid CIDR in template mapping {mapping}: {source}")]
    InvalidCidr {
        mapping: String,
        #[source]
        source: NetworkError,
    },

    #[error("Invalid root path: {0}")]
    InvalidRoot(#[from] PathError),
}

fn default_timeout() -> u64 {
    30
}

fn default_app_name() -> String {
    "jobx".to_string()
}

fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.to_string()
}

fn default_prefix() -> String {
    DEFAULT_GRANT_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

/// `[jumpserver]` section as written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JumpServerSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub key_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_root_path")]
    pub root_path: String,
    #[serde(default)]
    pub root_node_id: Option<Uuid>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// `[cmdb]` section as written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CmdbSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// `[settings]` section as written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSection {
    #[serde(default)]
    pub excluded_ips: Vec<String>,
    #[serde(default = "default_prefix")]
    pub permission_prefix: String,
    #[serde(default = "default_true")]
    pub settle_nodes: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            excluded_ips: Vec::new(),
            permission_prefix: default_prefix(),
            settle_nodes: true,
        }
    }
}

/// Template reference as written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateSection {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub template_id: String,
}

/// `[[templates.mapping]]` entry as written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingSection {
    pub name: String,
    pub cidr: Vec<String>,
    pub account_name: String,
    pub template_id: String,
}

/// `[templates]` section as written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesSection {
    #[serde(default)]
    pub default: TemplateSection,
    #[serde(default)]
    pub mapping: Vec<MappingSection>,
}

/// Configuration file as written, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub jumpserver: JumpServerSection,
    #[serde(default)]
    pub cmdb: CmdbSection,
    #[serde(default)]
    pub settings: SettingsSection,
    #[serde(default)]
    pub templates: TemplatesSection,
}

impl RawConfig {
    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay endpoint and secret values from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 5] = [
            ("JUMPSERVER_URL", &mut self.jumpserver.url),
            ("JUMPSERVER_KEY_ID", &mut self.jumpserver.key_id),
            ("JUMPSERVER_SECRET", &mut self.jumpserver.secret),
            ("CMDB_URL", &mut self.cmdb.url),
            ("CMDB_API_KEY", &mut self.cmdb.api_key),
        ];
        for (var, field) in fields {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    /// Validate into a [`SyncConfig`]
    pub fn validate(self) -> Result<SyncConfig, ConfigError> {
        let jumpserver = JumpServerConfig {
            url: require_url("jumpserver.url", &self.jumpserver.url)?,
            key_id: require("jumpserver.key_id", &self.jumpserver.key_id)?,
            secret: require("jumpserver.secret", &self.jumpserver.secret)?,
            root_node_id: self.jumpserver.root_node_id,
            timeout_secs: self.jumpserver.timeout_secs,
        };

        let cmdb = CmdbConfig {
            url: require_url("cmdb.url", &self.cmdb.url)?,
            api_key: require("cmdb.api_key", &self.cmdb.api_key)?,
            app_name: require("cmdb.app_name", &self.cmdb.app_name)?,
            timeout_secs: self.cmdb.timeout_secs,
        };

        let codec = PathCodec::new(self.jumpserver.root_path.trim())?;

        let default = TemplateRef {
            account_name: require(
                "templates.default.account_name",
                &self.templates.default.account_name,
            )?,
            template_id: parse_template_id(
                "templates.default.template_id",
                &self.templates.default.template_id,
            )?,
        };

        let mut mappings = Vec::with_capacity(self.templates.mapping.len());
        for section in self.templates.mapping {
            let networks = section
                .cidr
                .iter()
                .map(IpNetwork::new)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConfigError::InvalidCidr {
                    mapping: section.name.clone(),
                    source,
                })?;
            let template_id = parse_template_id(
                &format!("templates.mapping.{}.template_id", section.name),
                &section.template_id,
            )?;
            mappings.push(TemplateMapping {
                name: section.name,
                networks,
                template: TemplateRef {
                    account_name: section.account_name,
                    template_id,
                },
            });
        }
        info!("Loaded {} template mappings from config", mappings.len());

        let excluded = ExcludedAddresses::new(self.settings.excluded_ips.iter().filter_map(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            if parse_address(trimmed).is_err() {
                warn!(address = trimmed, "Excluded address is not an IP literal");
            }
            Some(trimmed.to_string())
        }));

        Ok(SyncConfig {
            jumpserver,
            cmdb,
            codec,
            templates: TemplateResolver::new(mappings, default),
            excluded,
            permission_prefix: require("settings.permission_prefix", &self.settings.permission_prefix)?,
            settle_nodes: self.settings.settle_nodes,
        })
    }
}

fn require(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(field));
    }
    Ok(value.to_string())
}

fn require_url(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = require(field, value)?;
    Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
        field,
        value: value.clone(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_template_id(field: &str, value: &str) -> Result<Uuid, ConfigError> {
    Uuid::parse_str(value.trim()).map_err(|_| ConfigError::InvalidTemplateId {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// JumpServer connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpServerConfig {
    /// Base URL without trailing slash
    pub url: String,
    pub key_id: String,
    pub secret: String,
    /// Node attached to hosts whose departments resolve to nothing
    pub root_node_id: Option<Uuid>,
    pub timeout_secs: u64,
}

/// CMDB connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdbConfig {
    /// Base URL without trailing slash
    pub url: String,
    pub api_key: String,
    pub app_name: String,
    pub timeout_secs: u64,
}

/// Validated configuration, built once at startup
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub jumpserver: JumpServerConfig,
    pub cmdb: CmdbConfig,
    /// Managed JumpServer subtree
    pub codec: PathCodec,
    pub templates: TemplateResolver,
    /// Addresses never deleted from JumpServer
    pub excluded: ExcludedAddresses,
    /// Namespace of managed grant names
    pub permission_prefix: String,
    /// Re-run node reconciliation at the end of a run
    pub settle_nodes: bool,
}

impl SyncConfig {
    /// Load a file, overlay the process environment and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut raw = RawConfig::from_file(path)?;
        raw.apply_env_overrides(|var| std::env::var(var).ok());
        raw.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
[jumpserver]
url = "https://jump.example.com/"
key_id = "key"
secret = "secret"
root_node_id = "0b7a3c2e-5d1f-4a8b-9c6d-1e2f3a4b5c6d"

[cmdb]
url = "https://c3.example.com"
api_key = "api"

[settings]
excluded_ips = ["10.0.0.1", " ", "10.0.0.2 "]

[templates.default]
account_name = "jumpserver"
template_id = "7478fed0-e9d3-4abc-a237-2d758bc428fe"

[[templates.mapping]]
name = "office"
cidr = ["10.0.0.0/24", "10.1.0.0/16"]
account_name = "ops"
template_id = "11111111-1111-4111-8111-111111111111"

[[templates.mapping]]
name = "dc"
cidr = ["10.0.0.0/8"]
account_name = "dc"
template_id = "22222222-2222-4222-8222-222222222222"
"#;

    #[test]
    fn test_full_config_validates() {
        let config = RawConfig::from_toml_str(FULL).unwrap().validate().unwrap();
        assert_eq!(config.jumpserver.url, "https://jump.example.com");
        assert_eq!(config.jumpserver.timeout_secs, 30);
        assert!(config.jumpserver.root_node_id.is_some());
        assert_eq!(config.cmdb.app_name, "jobx");
        assert_eq!(config.codec.root(), "/DEFAULT/C3");
        assert_eq!(config.permission_prefix, "C3_");
        assert!(config.settle_nodes);
        assert_eq!(config.excluded.len(), 2);
        assert!(config.excluded.contains("10.0.0.2"));

        let names: Vec<_> = config.templates.mappings().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["office", "dc"]);
        assert_eq!(config.templates.resolve("10.0.0.9").account_name, "ops");
        assert_eq!(config.templates.resolve("10.9.0.9").account_name, "dc");
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let content = FULL.replace("secret = \"secret\"", "");
        let err = RawConfig::from_toml_str(&content).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("jumpserver.secret")));
    }

    #[test]
    fn test_invalid_cidr_names_mapping() {
        let content = FULL.replace("10.1.0.0/16", "10.1.0.1/16");
        let err = RawConfig::from_toml_str(&content).unwrap().validate().unwrap_err();
        match err {
            ConfigError::InvalidCidr { mapping, .. } => assert_eq!(mapping, "office"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let content = FULL.replace("https://c3.example.com", "not a url");
        let err = RawConfig::from_toml_str(&content).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field: "cmdb.url", .. }));
    }

    #[test]
    fn test_invalid_template_id_rejected() {
        let content = FULL.replace("7478fed0-e9d3-4abc-a237-2d758bc428fe", "seven");
        let err = RawConfig::from_toml_str(&content).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplateId { .. }));
    }

    #[test]
    fn test_env_overrides_secrets() {
        let mut raw = RawConfig::from_toml_str(FULL).unwrap();
        let env: HashMap<&str, &str> =
            [("JUMPSERVER_SECRET", "from-env"), ("CMDB_API_KEY", "")].into_iter().collect();
        raw.apply_env_overrides(|var| env.get(var).map(|v| v.to_string()));
        let config = raw.validate().unwrap();
        assert_eq!(config.jumpserver.secret, "from-env");
        assert_eq!(config.cmdb.api_key, "api");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let raw = RawConfig::from_file(file.path()).unwrap();
        assert_eq!(raw.templates.mapping.len(), 2);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RawConfig::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.toml"));
    }
}
