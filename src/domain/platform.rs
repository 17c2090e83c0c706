// Copyright (c) 2025 - Cowboy AI, Inc.
//! Asset Platform Domain Model
//!
//! Maps CMDB operating system names onto the JumpServer platform catalogue
//! and derives the connection protocol and privileged account shape that
//! each platform uses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// JumpServer asset platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Resolve a CMDB OS string, case-insensitively.
    ///
    /// Unknown names resolve to [`Platform::Linux`].
    pub fn from_os_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "windows" | "windows server" => Self::Windows,
            "linux" | "centos" | "ubuntu" | "redhat" => Self::Linux,
            _ => Self::Linux,
        }
    }

    /// JumpServer platform id
    pub fn id(&self) -> u32 {
        match self {
            Self::Linux => 1,
            Self::Windows => 2,
        }
    }

    /// JumpServer platform name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Windows => "Windows",
        }
    }

    /// Connection protocols offered for assets of this platform
    pub fn protocols(&self) -> Vec<Protocol> {
        match self {
            Self::Windows => vec![Protocol::rdp()],
            Self::Linux => vec![Protocol::ssh()],
        }
    }

    /// Privileged account username
    pub fn admin_username(&self) -> &'static str {
        match self {
            Self::Linux => "root",
            Self::Windows => "administrator",
        }
    }

    /// Secret kind for the privileged account
    pub fn secret_type(&self) -> SecretType {
        match self {
            Self::Linux => SecretType::SshKey,
            Self::Windows => SecretType::Password,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection protocol descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protocol {
    pub name: String,
    pub port: u16,
}

impl Protocol {
    pub fn ssh() -> Self {
        Self {
            name: "ssh".to_string(),
            port: 22,
        }
    }

    pub fn rdp() -> Self {
        Self {
            name: "rdp".to_string(),
            port: 3389,
        }
    }
}

/// Account secret kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    SshKey,
    Password,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SshKey => "ssh_key",
            Self::Password => "password",
        }
    }
}
