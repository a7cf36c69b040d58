//! Mock directory for testing.
//!
//! In-memory account records with error injection, so code that depends on
//! a [`Directory`] can be exercised without AWS.

use crate::account::AccountRecord;
use crate::directory::Directory;
use crate::{LetmeError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock directory for testing.
///
/// # Example
///
/// ```
/// use letme::account::AccountRecord;
/// use letme::directories::mock::MockDirectory;
/// use letme::directory::Directory;
///
/// #[tokio::main]
/// async fn main() -> letme::Result<()> {
///     let directory = MockDirectory::new();
///     directory
///         .set_account(AccountRecord::new(
///             1,
///             "prod",
///             vec!["arn:aws:iam::111111111111:role/readonly".into()],
///             vec!["eu-west-1".into()],
///         ))
///         .await;
///
///     assert!(directory.lookup("prod").await?.is_some());
///     assert!(directory.lookup("absent").await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct MockDirectory {
    accounts: Arc<RwLock<Vec<AccountRecord>>>,
    lookups: AtomicUsize,

    /// Error message to return from `lookup()` and `list()`
    pub lookup_error: Option<String>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Duplicate names are kept; lookups return the first.
    pub async fn set_account(&self, record: AccountRecord) {
        self.accounts.write().await.push(record);
    }

    /// Number of `lookup()` calls made so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Directory for MockDirectory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    async fn lookup(&self, account: &str) -> Result<Option<AccountRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(ref err) = self.lookup_error {
            return Err(LetmeError::directory("mock", err.clone()));
        }

        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|r| r.name == account).cloned())
    }

    async fn list(&self) -> Result<Vec<AccountRecord>> {
        if let Some(ref err) = self.lookup_error {
            return Err(LetmeError::directory("mock", err.clone()));
        }
        Ok(self.accounts.read().await.clone())
    }
}

/// Registers the mock directory with the factory.
pub fn register() {
    crate::factory::register_directory("mock", |_cfg| Ok(Box::new(MockDirectory::new())));
}
