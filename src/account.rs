//! Account records served by the directory.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Region used when an account has none configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A target account entry.
///
/// Records are immutable once resolved for an invocation. An empty
/// `role_chain` is a valid record that has nothing to assume; an account
/// that does not exist is represented by the directory returning `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Numeric account identifier
    pub id: i64,

    /// Alias, unique within the directory
    pub name: String,

    /// Roles to assume in order; the last one yields the final credentials
    #[serde(rename = "role")]
    pub role_chain: Vec<String>,

    /// Allowed regions; the first is the default
    #[serde(rename = "region")]
    pub regions: Vec<String>,
}

impl AccountRecord {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        role_chain: Vec<String>,
        regions: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role_chain,
            regions,
        }
    }

    /// Whether reaching the target requires more than one hop.
    pub fn is_chained(&self) -> bool {
        self.role_chain.len() > 1
    }

    /// The account's default region, falling back to [`DEFAULT_REGION`]
    /// with a warning when none is configured.
    pub fn default_region(&self) -> &str {
        match self.regions.first() {
            Some(region) => region,
            None => {
                warn!(
                    "default region not set for account {}, using {}",
                    self.name, DEFAULT_REGION
                );
                DEFAULT_REGION
            }
        }
    }
}
