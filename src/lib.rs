//! letme - obtain temporary AWS credentials for named accounts.
//!
//! letme resolves an account name to its role chain through an account
//! directory, assumes the chain with STS (optionally presenting MFA on the
//! first hop), caches the result, and hands the credentials either to the
//! shared AWS profile files or to an AWS SDK through the credential-process
//! protocol.
//!
//! # Features
//!
//! - **Contexts**: Several independent configurations, one active at a time
//! - **Role Chaining**: Any number of hops, each authorized by the previous
//! - **Credential Cache**: Reuse credentials until they expire
//! - **Credential Process**: JSON v1 output for SDK-driven refresh
//! - **Atomic Writes**: Profile and cache files are never left half-written
//!
//! # Quick Start
//!
//! ```no_run
//! use letme::auth::token_source;
//! use letme::cache::CredentialCache;
//! use letme::config::{ConfigFile, UserSettings};
//! use letme::context::ContextResolver;
//! use letme::directory::{Directory, DirectoryConfig};
//! use letme::engine::{AssumptionEngine, ObtainRequest};
//! use letme::issuer::StsIssuer;
//! use letme::sink::ProfileStore;
//! use letme::{factory, paths};
//!
//! #[tokio::main]
//! async fn main() -> letme::Result<()> {
//!     let config = ConfigFile::load_default().await?;
//!     let settings =
//!         UserSettings::load(&paths::require(paths::user_settings_file(), "settings")?).await?;
//!     let context = ContextResolver::new(&config, &settings).resolve(None)?;
//!
//!     let mut directory = factory::new_directory(DirectoryConfig::for_context(&context).await?)?;
//!     directory.init().await?;
//!
//!     let issuer = StsIssuer::for_context(&context).await;
//!     let cache = CredentialCache::open_default()?;
//!     let tokens = token_source(None);
//!
//!     let engine = AssumptionEngine::new(&context, &*directory, &issuer, &cache, &*tokens);
//!     let obtained = engine.obtain(&ObtainRequest::new("prod-readonly")).await?;
//!
//!     ProfileStore::open_default()?
//!         .write_profile(&obtained.account.name, &obtained.credentials, &obtained.region)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Account Directories
//!
//! | Directory | Feature Flag | Notes |
//! |-----------|-------------|-------|
//! | Mock | `mock` (default) | In-memory testing directory |
//! | Cache file | always | Local snapshot written by `letme init` |
//! | DynamoDB | `aws` (default) | Paginated table scan |

pub mod account;
pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod credentials;
pub mod directories;
pub mod directory;
pub mod engine;
pub mod error;
pub mod factory;
pub mod issuer;
pub mod paths;
pub mod sink;
pub mod validation;

#[cfg(feature = "aws")]
pub mod sdk;

#[cfg(feature = "aws")]
pub mod cli;

#[cfg(feature = "aws")]
pub mod commands;

pub use account::AccountRecord;
pub use context::Context;
pub use credentials::CredentialSet;
pub use directory::{Directory, DirectoryConfig, DirectoryType};
pub use error::{ErrorKind, LetmeError, Result};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the letme library.
///
/// This registers all compiled account directories with the factory. It's
/// called automatically by [`factory::new_directory`], but can be called
/// explicitly if needed (it's idempotent).
pub fn init() {
    INIT.call_once(directories::register_all);
}
