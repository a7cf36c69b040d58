//! Credential cache.
//!
//! The most recently issued credentials are persisted per
//! `(context, account)` so that invocations inside the session window do not
//! re-assume (and, with MFA, do not re-prompt).
//!
//! # Concurrency
//!
//! Independent invocations may race on the cache file. Every `put` rewrites
//! the whole file through [`paths::write_atomic`], so the last writer wins and
//! a reader never sees a torn file. A lost update only costs one extra
//! assumption later.

use crate::auth::AuthMethod;
use crate::credentials::CredentialSet;
use crate::{paths, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A persisted credential set with the parameters used to obtain it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCredentialEntry {
    #[serde(flatten)]
    pub credentials: CredentialSet,
    pub session_name: String,
    pub auth_method: AuthMethod,
}

impl CachedCredentialEntry {
    pub fn expiration(&self) -> DateTime<Utc> {
        self.credentials.expiration
    }
}

/// context name → account name → entry
type CacheDocument = BTreeMap<String, BTreeMap<String, CachedCredentialEntry>>;

/// File-backed credential cache.
///
/// # Security
///
/// - The cache file is written with mode 0600 on Unix
/// - A missing parent directory is created with mode 0700
/// - A corrupt file is treated as empty and replaced on the next `put`
///
/// # Example
///
/// ```no_run
/// use letme::cache::CredentialCache;
///
/// #[tokio::main]
/// async fn main() -> letme::Result<()> {
///     let cache = CredentialCache::new("/tmp/letme-credentials-cache.json");
///
///     if let Some(entry) = cache.get("dev", "prod-readonly").await? {
///         if CredentialCache::is_valid(&entry, chrono::Utc::now()) {
///             println!("cached until {}", entry.expiration());
///         }
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Cache at the default location under letme's home directory.
    pub fn open_default() -> Result<Self> {
        let path = paths::require(paths::credential_cache_file(), "credential cache")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff `now` is strictly before the entry's expiration.
    pub fn is_valid(entry: &CachedCredentialEntry, now: DateTime<Utc>) -> bool {
        entry.credentials.is_fresh_at(now)
    }

    /// Returns the entry for `(context, account)`, if any. Stale entries are
    /// returned too; validity is the caller's decision.
    pub async fn get(&self, context: &str, account: &str) -> Result<Option<CachedCredentialEntry>> {
        let mut document = self.read().await?;
        Ok(document
            .get_mut(context)
            .and_then(|accounts| accounts.remove(account)))
    }

    /// Stores `entry` for `(context, account)`, replacing any previous one.
    pub async fn put(&self, context: &str, account: &str, entry: CachedCredentialEntry) -> Result<()> {
        let mut document = self.read().await?;
        document
            .entry(context.to_string())
            .or_default()
            .insert(account.to_string(), entry);

        let json = serde_json::to_vec_pretty(&document)?;
        paths::write_atomic(&self.path, &json).await?;
        debug!("cached credentials for {}/{}", context, account);
        Ok(())
    }

    async fn read(&self) -> Result<CacheDocument> {
        let Some(text) = paths::read_optional(&self.path).await? else {
            return Ok(CacheDocument::new());
        };

        match serde_json::from_str(&text) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(
                    "ignoring unreadable credential cache {}: {}",
                    self.path.display(),
                    e
                );
                Ok(CacheDocument::new())
            }
        }
    }
}
