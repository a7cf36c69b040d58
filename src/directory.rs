//! Account directory trait and configuration.
//!
//! This module defines the [`Directory`] trait that every account source
//! implements. The assumption engine only talks to this trait, so it does
//! not know whether a record came from the live DynamoDB table or from the
//! local cache file.

use crate::account::AccountRecord;
use crate::context::Context;
use crate::{paths, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Directory represents a source of account records.
///
/// All implementations must be `Send + Sync`.
///
/// # Implementations
///
/// - **Remote**: DynamoDB table scan
/// - **Local**: flat cache file rebuilt by `letme init`
/// - **Testing**: in-memory mock with error injection
#[async_trait]
pub trait Directory: Send + Sync {
    /// Returns the directory name (e.g., "dynamodb", "cache-file").
    fn name(&self) -> &str;

    /// Prepares the directory: builds SDK clients or loads the cache file.
    ///
    /// # Errors
    ///
    /// Returns [`LetmeError::Configuration`](crate::LetmeError::Configuration)
    /// if the backing store cannot be reached or read.
    async fn init(&mut self) -> Result<()>;

    /// Looks up an account by alias.
    ///
    /// Returns `Ok(None)` when no record matches. When several records share
    /// the alias, the first one wins.
    async fn lookup(&self, account: &str) -> Result<Option<AccountRecord>>;

    /// Lists every account in the directory.
    async fn list(&self) -> Result<Vec<AccountRecord>>;
}

/// Directory type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryType {
    /// Live DynamoDB table scan
    DynamoDb,
    /// Local flat-file cache
    CacheFile,
    /// In-memory test directory
    Mock,
}

impl std::fmt::Display for DirectoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DynamoDb => write!(f, "dynamodb"),
            Self::CacheFile => write!(f, "cache-file"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Configuration for creating a directory.
///
/// ```
/// use letme::directory::{DirectoryConfig, DirectoryType};
///
/// let config = DirectoryConfig::new(DirectoryType::DynamoDb)
///     .with_table("letme-accounts")
///     .with_source_profile("default")
///     .with_source_region("eu-west-1");
/// assert_eq!(config.table, "letme-accounts");
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub kind: DirectoryType,

    /// DynamoDB table name
    pub table: String,

    /// Shared-config profile used to reach the table
    pub source_profile: Option<String>,

    /// Region of the table
    pub source_region: Option<String>,

    /// Local cache file location
    pub cache_path: Option<PathBuf>,

    /// DynamoDB endpoint override (LocalStack)
    pub endpoint: Option<String>,
}

impl DirectoryConfig {
    pub fn new(kind: DirectoryType) -> Self {
        Self {
            kind,
            table: String::new(),
            source_profile: None,
            source_region: None,
            cache_path: None,
            endpoint: None,
        }
    }

    /// DynamoDB configuration for a context.
    pub fn remote(context: &Context) -> Self {
        let mut config = Self::new(DirectoryType::DynamoDb)
            .with_table(context.backing_table.clone())
            .with_source_profile(context.source_profile.clone());
        config.source_region = context.source_region.clone();
        config
    }

    /// Picks the directory for a context: the local cache file when one has
    /// been built for it, DynamoDB otherwise.
    pub async fn for_context(context: &Context) -> Result<Self> {
        if let Some(path) = paths::directory_cache_file(&context.name) {
            if tokio::fs::try_exists(&path).await? {
                return Ok(Self::new(DirectoryType::CacheFile).with_cache_path(path));
            }
        }
        Ok(Self::remote(context))
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_source_profile(mut self, profile: impl Into<String>) -> Self {
        self.source_profile = Some(profile.into());
        self
    }

    pub fn with_source_region(mut self, region: impl Into<String>) -> Self {
        self.source_region = Some(region.into());
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context {
            name: "dev".into(),
            source_profile: "corp".into(),
            source_region: Some("eu-west-1".into()),
            backing_table: "accounts".into(),
            mfa_arn: None,
            session_duration_seconds: Some(3600),
            session_name: None,
        }
    }

    #[test]
    fn test_remote_config_from_context() {
        let config = DirectoryConfig::remote(&context());
        assert_eq!(config.kind, DirectoryType::DynamoDb);
        assert_eq!(config.table, "accounts");
        assert_eq!(config.source_profile.as_deref(), Some("corp"));
        assert_eq!(config.source_region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_directory_type_display() {
        assert_eq!(DirectoryType::DynamoDb.to_string(), "dynamodb");
        assert_eq!(DirectoryType::CacheFile.to_string(), "cache-file");
        assert_eq!(DirectoryType::Mock.to_string(), "mock");
    }
}
