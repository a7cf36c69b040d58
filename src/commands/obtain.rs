//! `letme obtain`: assume an account's roles and deliver the credentials.

use std::io::Write;

use clap::Args;
use tracing::info;

use crate::auth::token_source;
use crate::cache::CredentialCache;
use crate::context::Context;
use crate::directory::Directory;
use crate::engine::{AssumptionEngine, ObtainRequest, Provenance};
use crate::issuer::StsIssuer;
use crate::sink::{CredentialSink, ProfileStore, SinkMode};
use crate::validation::{validate_account_name, validate_role_chain};
use crate::{LetmeError, Result};

/// Program name used in `credential_process` entries.
const PROGRAM: &str = "letme";

#[derive(Debug, Clone, Args)]
pub struct ObtainCommand {
    #[arg(help = "Account name to obtain credentials for")]
    pub account: String,

    #[arg(long, value_name = "TOKEN", help = "MFA one time pass code")]
    pub inline_mfa: Option<String>,

    #[arg(long, help = "Ignore cached credentials and assume the role again")]
    pub renew: bool,

    #[arg(
        long,
        conflicts_with = "v1",
        help = "Configure the profile to obtain credentials through letme on demand"
    )]
    pub credential_process: bool,

    #[arg(long, help = "Print credentials as credential-process v1 JSON")]
    pub v1: bool,

    #[arg(long, help = "Session name for this invocation")]
    pub session_name: Option<String>,

    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u32).range(900..=43200),
        help = "Session duration for this invocation"
    )]
    pub duration: Option<u32>,
}

impl ObtainCommand {
    pub async fn execute(self, context: Option<&str>) -> Result<()> {
        let ctx = super::resolve_context(context).await?;
        let directory = super::open_directory(&ctx).await?;
        let store = ProfileStore::open_default()?;
        let mut stdout = std::io::stdout();

        if self.credential_process {
            return self
                .configure_credential_process(&ctx, &*directory, &store, context, &mut stdout)
                .await;
        }

        let issuer = StsIssuer::for_context(&ctx).await;
        let cache = CredentialCache::open_default()?;
        let tokens = token_source(self.inline_mfa.as_deref());
        let engine = AssumptionEngine::new(&ctx, &*directory, &issuer, &cache, &*tokens);

        self.run(&engine, &store, &mut stdout).await
    }

    pub fn request(&self) -> ObtainRequest {
        ObtainRequest {
            account: self.account.clone(),
            renew: self.renew,
            credential_process_v1: self.v1,
            session_name: self.session_name.clone(),
            duration_seconds: self.duration,
        }
    }

    /// Obtains credentials and delivers them. In v1 mode `out` receives the
    /// JSON document and nothing else.
    pub async fn run(
        &self,
        engine: &AssumptionEngine<'_>,
        store: &ProfileStore,
        out: &mut dyn Write,
    ) -> Result<()> {
        let ctx = engine.context();
        if !self.v1 && self.session_name.is_none() && ctx.session_name.is_none() {
            eprintln!(
                "letme: using default session name '{}'",
                ctx.session_name_for(&self.account)
            );
        }

        let obtained = engine.obtain(&self.request()).await?;
        if let Provenance::Issued { hops } = obtained.provenance {
            info!(
                "Obtained credentials for {} through {} role(s) using {}",
                obtained.account.name, hops, obtained.auth_method
            );
        }

        let mode = SinkMode::from(obtained.auth_method);
        CredentialSink::new(store, out)
            .deliver(
                mode,
                &obtained.account.name,
                &obtained.credentials,
                &obtained.region,
            )
            .await?;

        if mode == SinkMode::Standard {
            writeln!(
                out,
                "letme: use the argument '--profile {}' to interact with the account.",
                obtained.account.name
            )?;
        }
        Ok(())
    }

    /// Points the account's profile at `letme obtain <account> --v1`
    /// instead of assuming now. Accounts with nothing to assume are
    /// rejected before the profile store is touched.
    pub async fn configure_credential_process(
        &self,
        ctx: &Context,
        directory: &dyn Directory,
        store: &ProfileStore,
        pinned_context: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<()> {
        validate_account_name(&self.account)?;
        let account = directory
            .lookup(&self.account)
            .await?
            .ok_or_else(|| LetmeError::AccountNotFound(self.account.clone()))?;
        validate_role_chain(&account.name, &account.role_chain)?;

        let mut command = format!("{PROGRAM} obtain {} --v1", account.name);
        if pinned_context.is_some() {
            command.push_str(&format!(" --context {}", ctx.name));
        }

        store
            .configure_credential_process(&account.name, account.default_region(), &command)
            .await?;

        writeln!(
            out,
            "letme: profile '{}' now runs '{}' when credentials are needed.",
            account.name, command
        )?;
        Ok(())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::account::AccountRecord;
    use crate::auth::InlineToken;
    use crate::directories::mock::MockDirectory;
    use crate::issuer::mock::MockIssuer;
    use ini::Ini;
    use tempfile::tempdir;

    const ROLE: &str = "arn:aws:iam::111111111111:role/readonly";

    fn command(args: &str) -> ObtainCommand {
        ObtainCommand {
            account: "prod-readonly".to_string(),
            inline_mfa: None,
            renew: args.contains("renew"),
            credential_process: args.contains("credential-process"),
            v1: args.contains("v1"),
            session_name: None,
            duration: None,
        }
    }

    fn context() -> Context {
        Context {
            name: "dev".into(),
            source_profile: "default".into(),
            source_region: None,
            backing_table: "accounts".into(),
            mfa_arn: None,
            session_duration_seconds: None,
            session_name: Some("alice".into()),
        }
        .normalized()
    }

    async fn directory() -> MockDirectory {
        let directory = MockDirectory::new();
        directory
            .set_account(AccountRecord::new(
                111,
                "prod-readonly",
                vec![ROLE.to_string()],
                vec!["eu-west-1".to_string()],
            ))
            .await;
        directory
    }

    #[test]
    fn test_request_carries_flags() {
        let request = ObtainCommand {
            duration: Some(900),
            ..command("renew v1")
        }
        .request();

        assert!(request.renew);
        assert!(request.credential_process_v1);
        assert_eq!(request.duration_seconds, Some(900));
    }

    #[tokio::test]
    async fn test_v1_output_is_only_json() {
        let dir = tempdir().unwrap();
        let ctx = context();
        let directory = directory().await;
        let issuer = MockIssuer::new();
        let cache = CredentialCache::new(dir.path().join("cache.json"));
        let tokens = InlineToken::new("");
        let store = ProfileStore::new(dir.path().join("credentials"), dir.path().join("config"));
        let engine = AssumptionEngine::new(&ctx, &directory, &issuer, &cache, &tokens);

        let mut out = Vec::new();
        command("v1").run(&engine, &store, &mut out).await.unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["Version"], 1);
        assert!(!store.credentials_path().exists());
        assert!(!store.config_path().exists());
    }

    #[tokio::test]
    async fn test_standard_run_writes_profile() {
        let dir = tempdir().unwrap();
        let ctx = context();
        let directory = directory().await;
        let issuer = MockIssuer::new();
        let cache = CredentialCache::new(dir.path().join("cache.json"));
        let tokens = InlineToken::new("");
        let store = ProfileStore::new(dir.path().join("credentials"), dir.path().join("config"));
        let engine = AssumptionEngine::new(&ctx, &directory, &issuer, &cache, &tokens);

        let mut out = Vec::new();
        command("").run(&engine, &store, &mut out).await.unwrap();

        let credentials = Ini::load_from_file(store.credentials_path()).unwrap();
        assert_eq!(
            credentials.get_from(Some("prod-readonly"), "aws_access_key_id"),
            Some("ASIAMOCK1")
        );
        assert!(String::from_utf8(out).unwrap().contains("--profile prod-readonly"));
        assert_eq!(issuer.calls()[0].request.session_name, "alice");
    }

    #[tokio::test]
    async fn test_configure_credential_process() {
        let dir = tempdir().unwrap();
        let ctx = context();
        let directory = directory().await;
        let store = ProfileStore::new(dir.path().join("credentials"), dir.path().join("config"));

        let mut out = Vec::new();
        command("credential-process")
            .configure_credential_process(&ctx, &directory, &store, None, &mut out)
            .await
            .unwrap();

        let config = Ini::load_from_file(store.config_path()).unwrap();
        assert_eq!(
            config.get_from(Some("profile prod-readonly"), "credential_process"),
            Some("letme obtain prod-readonly --v1")
        );
        assert_eq!(
            config.get_from(Some("profile prod-readonly"), "region"),
            Some("eu-west-1")
        );

        command("credential-process")
            .configure_credential_process(&ctx, &directory, &store, Some("dev"), &mut out)
            .await
            .unwrap();
        let config = Ini::load_from_file(store.config_path()).unwrap();
        assert_eq!(
            config.get_from(Some("profile prod-readonly"), "credential_process"),
            Some("letme obtain prod-readonly --v1 --context dev")
        );
    }

    #[tokio::test]
    async fn test_configure_credential_process_unknown_account() {
        let dir = tempdir().unwrap();
        let ctx = context();
        let directory = MockDirectory::new();
        let store = ProfileStore::new(dir.path().join("credentials"), dir.path().join("config"));

        let mut out = Vec::new();
        let err = command("credential-process")
            .configure_credential_process(&ctx, &directory, &store, None, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, LetmeError::AccountNotFound(_)));
        assert!(!store.config_path().exists());
    }

    #[tokio::test]
    async fn test_configure_credential_process_empty_chain() {
        let dir = tempdir().unwrap();
        let ctx = context();
        let directory = MockDirectory::new();
        directory
            .set_account(AccountRecord::new(1, "hollow", vec![], vec![]))
            .await;
        let store = ProfileStore::new(dir.path().join("credentials"), dir.path().join("config"));

        let mut out = Vec::new();
        let err = ObtainCommand {
            account: "hollow".to_string(),
            ..command("credential-process")
        }
        .configure_credential_process(&ctx, &directory, &store, None, &mut out)
        .await
        .unwrap_err();

        assert!(matches!(err, LetmeError::EmptyRoleChain(_)));
        assert!(!store.config_path().exists());
        assert!(out.is_empty());
    }
}
