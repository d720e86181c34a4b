//! Engine configuration via `seatbook.toml`
//!
//! The engine is in-memory only, so the configuration is small: a label used
//! in log fields and the default bound on the commit-lock wait.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use seatbook_core::{Error, Result};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "seatbook.toml";

fn default_name() -> String {
    "seatbook".to_string()
}

fn default_commit_timeout_ms() -> u64 {
    5000
}

/// Engine configuration
///
/// # Example
///
/// ```toml
/// name = "seatbook"
/// commit_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Label attached to engine log events
    #[serde(default = "default_name")]
    pub name: String,
    /// Default bound on the commit-lock wait, in milliseconds
    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            commit_timeout_ms: default_commit_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(s)
            .map_err(|e| Error::EngineInit(format!("Invalid {}: {}", CONFIG_FILE_NAME, e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::EngineInit(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# SeatBook engine configuration
#
# Label attached to engine log events.
name = "seatbook"

# Maximum time a commit waits for the commit lock, in milliseconds.
# Transactions that cannot commit in time fail with a timeout and apply nothing.
commit_timeout_ms = 5000
"#
    }

    /// Builder-style override of the commit timeout
    pub fn with_commit_timeout(mut self, timeout: Duration) -> Self {
        self.commit_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder-style override of the engine name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Default commit timeout as a `Duration`
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.commit_timeout_ms == 0 {
            return Err(Error::EngineInit(
                "commit_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(Error::EngineInit("name must not be empty".to_string()));
        }
        Ok(())
    }
}
