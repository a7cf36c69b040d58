//! Credential sink.
//!
//! Delivers obtained credentials in one of two modes:
//!
//! - [`SinkMode::Standard`]: a named profile in the shared credentials file
//!   plus its region in the shared config file. Other profiles are preserved
//!   and both files are replaced atomically.
//! - [`SinkMode::CredentialProcessV1`]: a single JSON document on stdout in
//!   the credential-process v1 format. No file is touched.

use crate::auth::AuthMethod;
use crate::credentials::CredentialSet;
use crate::{paths, LetmeError, Result};
use ini::Ini;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const KEY_SESSION_TOKEN: &str = "aws_session_token";
const KEY_SESSION_EXPIRATION: &str = "aws_session_expiration";
const KEY_REGION: &str = "region";
const KEY_CREDENTIAL_PROCESS: &str = "credential_process";

/// Output mode, derived from the authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Standard,
    CredentialProcessV1,
}

impl From<AuthMethod> for SinkMode {
    fn from(method: AuthMethod) -> Self {
        if method.is_credential_process() {
            Self::CredentialProcessV1
        } else {
            Self::Standard
        }
    }
}

/// The credential-process v1 document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialProcessOutput<'a> {
    pub version: u8,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: &'a str,
    pub expiration: String,
}

impl<'a> From<&'a CredentialSet> for CredentialProcessOutput<'a> {
    fn from(creds: &'a CredentialSet) -> Self {
        Self {
            version: 1,
            access_key_id: &creds.access_key_id,
            secret_access_key: &creds.secret_access_key,
            session_token: &creds.session_token,
            expiration: creds.expiration_rfc3339(),
        }
    }
}

/// Writes the credential-process v1 document, followed by a newline.
pub fn write_credential_process(out: &mut dyn Write, creds: &CredentialSet) -> Result<()> {
    serde_json::to_writer(&mut *out, &CredentialProcessOutput::from(creds))?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Section name of a profile in the shared config file.
fn config_section(profile: &str) -> String {
    if profile == "default" {
        profile.to_string()
    } else {
        format!("profile {profile}")
    }
}

/// The shared credentials and config files.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    credentials_path: PathBuf,
    config_path: PathBuf,
}

impl ProfileStore {
    pub fn new(credentials_path: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            config_path: config_path.into(),
        }
    }

    /// Store at the standard locations (env overrides respected).
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(
            paths::require(paths::aws_credentials_file(), "AWS credentials file")?,
            paths::require(paths::aws_config_file(), "AWS config file")?,
        ))
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Writes `creds` under `profile` and points the profile at `region`.
    ///
    /// A `credential_process` entry left by an earlier
    /// [`configure_credential_process`](Self::configure_credential_process)
    /// is removed so the static credentials take effect.
    pub async fn write_profile(
        &self,
        profile: &str,
        creds: &CredentialSet,
        region: &str,
    ) -> Result<()> {
        let mut credentials = load_ini(&self.credentials_path).await?;
        credentials
            .with_section(Some(profile))
            .set(KEY_ACCESS_KEY_ID, creds.access_key_id.as_str())
            .set(KEY_SECRET_ACCESS_KEY, creds.secret_access_key.as_str())
            .set(KEY_SESSION_TOKEN, creds.session_token.as_str())
            .set(KEY_SESSION_EXPIRATION, creds.expiration_rfc3339());
        save_ini(&self.credentials_path, &credentials).await?;
        debug!("Wrote credentials for {} to {}", profile, self.credentials_path.display());

        let section = config_section(profile);
        let mut config = load_ini(&self.config_path).await?;
        config.delete_from(Some(section.as_str()), KEY_CREDENTIAL_PROCESS);
        config.with_section(Some(section.as_str())).set(KEY_REGION, region);
        save_ini(&self.config_path, &config).await?;
        debug!("Wrote region {} for {} to {}", region, profile, self.config_path.display());

        Ok(())
    }

    /// Makes `profile` source its credentials from `command`.
    ///
    /// Any static credentials stored for the profile are removed, since they
    /// would take precedence over the process.
    pub async fn configure_credential_process(
        &self,
        profile: &str,
        region: &str,
        command: &str,
    ) -> Result<()> {
        let section = config_section(profile);
        let mut config = load_ini(&self.config_path).await?;
        config
            .with_section(Some(section.as_str()))
            .set(KEY_CREDENTIAL_PROCESS, command)
            .set(KEY_REGION, region);
        save_ini(&self.config_path, &config).await?;

        let mut credentials = load_ini(&self.credentials_path).await?;
        if credentials.delete(Some(profile)).is_some() {
            save_ini(&self.credentials_path, &credentials).await?;
            info!("Removed static credentials for {}", profile);
        }

        Ok(())
    }
}

async fn load_ini(path: &Path) -> Result<Ini> {
    match paths::read_optional(path).await? {
        Some(text) => Ok(Ini::load_from_str(&text)?),
        None => Ok(Ini::new()),
    }
}

async fn save_ini(path: &Path, ini: &Ini) -> Result<()> {
    let mut buf = Vec::new();
    ini.write_to(&mut buf)?;
    paths::write_atomic(path, &buf).await
}

/// Destination for obtained credentials.
pub struct CredentialSink<'a> {
    store: &'a ProfileStore,
    out: &'a mut dyn Write,
}

impl<'a> CredentialSink<'a> {
    pub fn new(store: &'a ProfileStore, out: &'a mut dyn Write) -> Self {
        Self { store, out }
    }

    /// Delivers `creds` for `account` in `mode`.
    pub async fn deliver(
        &mut self,
        mode: SinkMode,
        account: &str,
        creds: &CredentialSet,
        region: &str,
    ) -> Result<()> {
        match mode {
            SinkMode::Standard => {
                if account.is_empty() {
                    return Err(LetmeError::InvalidAccountName(account.to_string()));
                }
                self.store.write_profile(account, creds, region).await
            }
            SinkMode::CredentialProcessV1 => write_credential_process(self.out, creds),
        }
    }
}
