//! Configuration loading and representation.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What deleting a product or location does to ledger entries that still
/// reference it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionPolicy {
    /// Delete the record and keep the ledger untouched; entries referencing
    /// it become dangling references.
    #[default]
    PreserveHistory,
    /// Refuse to delete a record any ledger entry still references.
    RejectReferenced,
}

impl DeletionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            DeletionPolicy::PreserveHistory => "preserve-history",
            DeletionPolicy::RejectReferenced => "reject-referenced",
        }
    }
}

impl core::fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preserve-history" | "preserve" => Ok(DeletionPolicy::PreserveHistory),
            "reject-referenced" | "reject" => Ok(DeletionPolicy::RejectReferenced),
            other => Err(format!(
                "unknown deletion policy '{other}' (expected preserve-history or reject-referenced)"
            )),
        }
    }
}

/// Engine configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub deletion_policy: DeletionPolicy,
}

impl InventoryConfig {
    pub const DEFAULT_DATABASE_URL: &'static str = "sqlite://inventory.sqlite?mode=rwc";

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_DATABASE_URL.to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            Err(_) => 5,
        };
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let busy_timeout_ms: u64 = match env::var("DATABASE_BUSY_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse()
                .context("DATABASE_BUSY_TIMEOUT_MS must be a number of milliseconds")?,
            Err(_) => 5_000,
        };

        let deletion_policy = match env::var("LOCATION_DELETION_POLICY") {
            Ok(raw) => raw
                .parse::<DeletionPolicy>()
                .map_err(anyhow::Error::msg)
                .context("invalid LOCATION_DELETION_POLICY")?,
            Err(_) => DeletionPolicy::default(),
        };

        Ok(Self {
            database_url,
            max_connections,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            deletion_policy,
        })
    }

    /// Ephemeral single-connection database (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            busy_timeout: Duration::from_millis(5_000),
            deletion_policy: DeletionPolicy::default(),
        }
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = policy;
        self
    }

    /// An in-memory SQLite database lives and dies with its connection.
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            database_url: Self::DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            busy_timeout: Duration::from_millis(5_000),
            deletion_policy: DeletionPolicy::default(),
        }
    }
}
