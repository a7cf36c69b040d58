//! Offline end-to-end tests: configuration on disk, mock directory and
//! issuer, real cache and profile files in a temp directory.

#![cfg(feature = "mock")]

use chrono::Utc;
use ini::Ini;
use letme::account::AccountRecord;
use letme::auth::{AuthMethod, InlineToken};
use letme::cache::CredentialCache;
use letme::config::{ConfigFile, UserSettings};
use letme::context::ContextResolver;
use letme::directories::cache_file;
use letme::directories::mock::MockDirectory;
use letme::directory::{DirectoryConfig, DirectoryType};
use letme::engine::{AssumptionEngine, ObtainRequest, Provenance};
use letme::issuer::mock::{MockIssuer, RecordedCaller};
use letme::sink::{CredentialSink, ProfileStore, SinkMode};
use letme::{factory, Directory, ErrorKind, LetmeError};
use serial_test::serial;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const CONFIG: &str = r#"
[dev]
aws_source_profile = "default"
aws_source_profile_region = "eu-west-1"
dynamodb_table = "letme-accounts"

[secure]
aws_source_profile = "default"
dynamodb_table = "letme-accounts"
mfa_arn = "arn:aws:iam::123456789012:mfa/alice"
session_name = "alice"
session_duration = 1800
"#;

const READONLY: &str = "arn:aws:iam::111111111111:role/readonly";
const HUB: &str = "arn:aws:iam::222222222222:role/hub";
const TARGET: &str = "arn:aws:iam::333333333333:role/target";

struct Fixture {
    _dir: TempDir,
    config: ConfigFile,
    settings: UserSettings,
    cache: CredentialCache,
    store: ProfileStore,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".letme").join("letme-config");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, CONFIG).unwrap();

        let settings_path = dir.path().join(".letme").join("letme-usersettings");
        std::fs::write(&settings_path, "current_context = \"dev\"\n").unwrap();

        Self {
            config: ConfigFile::load(&config_path).await.unwrap(),
            settings: UserSettings::load(&settings_path).await.unwrap(),
            cache: CredentialCache::new(dir.path().join(".letme").join("cache.json")),
            store: ProfileStore::new(
                dir.path().join(".aws").join("credentials"),
                dir.path().join(".aws").join("config"),
            ),
            _dir: dir,
        }
    }
}

async fn directory() -> MockDirectory {
    let directory = MockDirectory::new();
    directory
        .set_account(AccountRecord::new(
            111111111111,
            "prod-readonly",
            vec![READONLY.to_string()],
            vec!["eu-west-1".to_string()],
        ))
        .await;
    directory
        .set_account(AccountRecord::new(
            333333333333,
            "deep",
            vec![HUB.to_string(), TARGET.to_string()],
            vec![],
        ))
        .await;
    directory
}

fn read(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}

#[tokio::test]
async fn test_prod_readonly_scenario() {
    let fx = Fixture::new().await;
    let context = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(None)
        .unwrap();
    assert_eq!(context.name, "dev");

    let directory = directory().await;
    let issuer = MockIssuer::new();
    let tokens = InlineToken::new("");
    let engine = AssumptionEngine::new(&context, &directory, &issuer, &fx.cache, &tokens);

    // First run: one STS call, profile written, cache populated.
    let obtained = engine
        .obtain(&ObtainRequest::new("prod-readonly"))
        .await
        .unwrap();
    assert_eq!(obtained.provenance, Provenance::Issued { hops: 1 });
    assert_eq!(obtained.auth_method, AuthMethod::AssumeRole);

    let mut stdout = Vec::new();
    CredentialSink::new(&fx.store, &mut stdout)
        .deliver(
            SinkMode::from(obtained.auth_method),
            &obtained.account.name,
            &obtained.credentials,
            &obtained.region,
        )
        .await
        .unwrap();
    assert!(stdout.is_empty());

    let credentials = Ini::load_from_file(fx.store.credentials_path()).unwrap();
    assert_eq!(
        credentials.get_from(Some("prod-readonly"), "aws_access_key_id"),
        Some("ASIAMOCK1")
    );
    let config = Ini::load_from_file(fx.store.config_path()).unwrap();
    assert_eq!(
        config.get_from(Some("profile prod-readonly"), "region"),
        Some("eu-west-1")
    );

    let call = &issuer.calls()[0];
    assert_eq!(call.caller, RecordedCaller::Source);
    assert_eq!(call.request.role_arn, READONLY);
    assert_eq!(call.request.session_name, "prod-readonly-letme-session");
    assert!(call.request.mfa.is_none());

    // Second run inside the window: served from cache.
    let again = engine
        .obtain(&ObtainRequest::new("prod-readonly"))
        .await
        .unwrap();
    assert_eq!(again.provenance, Provenance::Cache);
    assert_eq!(again.credentials, obtained.credentials);
    assert_eq!(issuer.call_count(), 1);

    // Renew: fresh issuance even though the cache is valid.
    let renewed = engine
        .obtain(&ObtainRequest::new("prod-readonly").renew(true))
        .await
        .unwrap();
    assert_eq!(renewed.credentials.access_key_id, "ASIAMOCK2");
    assert_eq!(issuer.call_count(), 2);
}

#[tokio::test]
async fn test_credential_process_leaves_profile_store_unchanged() {
    let fx = Fixture::new().await;
    std::fs::create_dir_all(fx.store.credentials_path().parent().unwrap()).unwrap();
    std::fs::write(
        fx.store.credentials_path(),
        "[personal]\naws_access_key_id = AKIAPERSONAL\n",
    )
    .unwrap();
    let before = (read(fx.store.credentials_path()), read(fx.store.config_path()));

    let context = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(Some("dev"))
        .unwrap();
    let directory = directory().await;
    let issuer = MockIssuer::new();
    let tokens = InlineToken::new("");
    let engine = AssumptionEngine::new(&context, &directory, &issuer, &fx.cache, &tokens);

    let obtained = engine
        .obtain(&ObtainRequest::new("deep").credential_process_v1(true))
        .await
        .unwrap();
    assert_eq!(obtained.auth_method, AuthMethod::CredentialProcessV1);
    assert_eq!(obtained.region, "us-east-1");

    let mut stdout = Vec::new();
    CredentialSink::new(&fx.store, &mut stdout)
        .deliver(
            SinkMode::from(obtained.auth_method),
            &obtained.account.name,
            &obtained.credentials,
            &obtained.region,
        )
        .await
        .unwrap();

    let doc: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(doc["Version"], 1);
    assert_eq!(doc["AccessKeyId"], "ASIAMOCK2");
    let expiration = chrono::DateTime::parse_from_rfc3339(doc["Expiration"].as_str().unwrap())
        .unwrap();
    assert!(expiration > Utc::now());

    let after = (read(fx.store.credentials_path()), read(fx.store.config_path()));
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_mfa_context_chain() {
    let fx = Fixture::new().await;
    let context = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(Some("secure"))
        .unwrap();
    assert!(context.mfa_configured());

    let directory = directory().await;
    let issuer = MockIssuer::new().expected_mfa_code("654321");
    let tokens = InlineToken::new("654321");
    let engine = AssumptionEngine::new(&context, &directory, &issuer, &fx.cache, &tokens);

    let obtained = engine.obtain(&ObtainRequest::new("deep")).await.unwrap();
    assert_eq!(obtained.auth_method, AuthMethod::Mfa);
    assert_eq!(obtained.session_name, "alice");

    let calls = issuer.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].request.mfa.is_some());
    assert!(calls[1].request.mfa.is_none());
    assert_eq!(calls[1].caller, RecordedCaller::Session("ASIAMOCK1".to_string()));
    assert!(calls.iter().all(|c| c.request.duration_seconds == 1800));
}

#[tokio::test]
async fn test_wrong_mfa_code_is_authentication_error() {
    let fx = Fixture::new().await;
    let context = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(Some("secure"))
        .unwrap();
    let directory = directory().await;
    let issuer = MockIssuer::new().expected_mfa_code("654321");
    let tokens = InlineToken::new("000000");
    let engine = AssumptionEngine::new(&context, &directory, &issuer, &fx.cache, &tokens);

    let err = engine
        .obtain(&ObtainRequest::new("prod-readonly"))
        .await
        .unwrap_err();
    assert!(matches!(err, LetmeError::Hop { hop: 0, .. }));
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(fx.cache.get("secure", "prod-readonly").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_context() {
    let fx = Fixture::new().await;
    let err = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(Some("staging"))
        .unwrap_err();
    assert!(matches!(err, LetmeError::ContextNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.hint().is_some());
}

#[tokio::test]
#[serial]
async fn test_local_cache_file_is_preferred() {
    let home = tempdir().unwrap();
    std::env::set_var("LETME_HOME", home.path());

    let fx = Fixture::new().await;
    let context = ContextResolver::new(&fx.config, &fx.settings)
        .resolve(Some("dev"))
        .unwrap();

    let remote = DirectoryConfig::for_context(&context).await.unwrap();
    assert_eq!(remote.kind, DirectoryType::DynamoDb);
    assert_eq!(remote.table, "letme-accounts");

    let records = directory().await;
    let path = home.path().join("directory-cache").join("dev");
    cache_file::write(&path, &records.list().await.unwrap())
        .await
        .unwrap();

    let local = DirectoryConfig::for_context(&context).await.unwrap();
    assert_eq!(local.kind, DirectoryType::CacheFile);

    let mut directory = factory::new_directory(local).unwrap();
    directory.init().await.unwrap();
    let record = directory.lookup("deep").await.unwrap().unwrap();
    assert_eq!(record.role_chain, vec![HUB.to_string(), TARGET.to_string()]);

    std::env::remove_var("LETME_HOME");
}
