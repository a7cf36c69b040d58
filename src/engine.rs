//! Assumption engine.
//!
//! Given a resolved [`Context`], the engine looks the account up, decides
//! whether cached credentials can be reused, and otherwise assumes the
//! account's role chain:
//!
//! ```text
//! Start → AuthMethodSelected → { SingleHop | ChainHop(0..n) } → Persisted
//!                    ↘ Failed(kind) from any state
//! ```
//!
//! A single-role account is assumed in one call authorized by the source
//! profile. A chain is assumed hop by hop; hop `k` is authorized by the
//! credentials of hop `k - 1`, only the first hop presents MFA, and only the
//! last hop's credentials survive. Any failing hop aborts the invocation.
//! Nothing is retried.

use crate::account::AccountRecord;
use crate::auth::{AuthMethod, MfaTokenSource};
use crate::cache::{CachedCredentialEntry, CredentialCache};
use crate::context::Context;
use crate::credentials::CredentialSet;
use crate::directory::Directory;
use crate::issuer::{AssumeRoleRequest, Caller, CredentialIssuer, MfaChallenge};
use crate::validation::{validate_account_name, validate_role_chain};
use crate::{LetmeError, Result};
use chrono::Utc;
use tracing::{debug, info};

/// Engine progress, reported through tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Start,
    AuthMethodSelected(AuthMethod),
    SingleHop,
    ChainHop(usize),
    Persisted,
}

/// How the role chain will be walked. The two shapes are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopPlan<'a> {
    Single(&'a str),
    Chain(&'a [String]),
}

impl<'a> HopPlan<'a> {
    /// Plans a non-empty chain; `None` for an empty one.
    pub fn for_chain(chain: &'a [String]) -> Option<Self> {
        match chain {
            [] => None,
            [role] => Some(Self::Single(role)),
            roles => Some(Self::Chain(roles)),
        }
    }

    pub fn hops(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Chain(roles) => roles.len(),
        }
    }
}

/// One invocation's inputs beyond the context.
#[derive(Debug, Clone, Default)]
pub struct ObtainRequest {
    pub account: String,
    /// Force a fresh assumption even when the cache holds valid credentials
    pub renew: bool,
    /// Produce credential-process v1 output
    pub credential_process_v1: bool,
    /// Per-invocation session name override
    pub session_name: Option<String>,
    /// Per-invocation session duration override
    pub duration_seconds: Option<u32>,
}

impl ObtainRequest {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    pub fn renew(mut self, renew: bool) -> Self {
        self.renew = renew;
        self
    }

    pub fn credential_process_v1(mut self, v1: bool) -> Self {
        self.credential_process_v1 = v1;
        self
    }
}

/// Where the returned credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    Issued { hops: usize },
}

/// Result of a successful invocation.
#[derive(Debug, Clone)]
pub struct Obtained {
    pub account: AccountRecord,
    pub credentials: CredentialSet,
    pub auth_method: AuthMethod,
    pub session_name: String,
    /// Destination region (the account's default)
    pub region: String,
    pub provenance: Provenance,
}

/// The assumption/renewal decision engine.
///
/// # Example
///
/// ```
/// use letme::account::AccountRecord;
/// use letme::auth::InlineToken;
/// use letme::cache::CredentialCache;
/// use letme::context::Context;
/// use letme::directories::mock::MockDirectory;
/// use letme::engine::{AssumptionEngine, ObtainRequest, Provenance};
/// use letme::issuer::mock::MockIssuer;
///
/// #[tokio::main]
/// async fn main() -> letme::Result<()> {
///     let context = Context {
///         name: "dev".into(),
///         source_profile: "default".into(),
///         source_region: None,
///         backing_table: "accounts".into(),
///         mfa_arn: None,
///         session_duration_seconds: None,
///         session_name: None,
///     }
///     .normalized();
///
///     let directory = MockDirectory::new();
///     directory
///         .set_account(AccountRecord::new(
///             111,
///             "prod-readonly",
///             vec!["arn:aws:iam::111111111111:role/readonly".into()],
///             vec!["eu-west-1".into()],
///         ))
///         .await;
///
///     let issuer = MockIssuer::new();
///     let dir = std::env::temp_dir().join(format!("letme-doc-{}", std::process::id()));
///     let cache = CredentialCache::new(dir.join("cache.json"));
///     let tokens = InlineToken::new("");
///
///     let engine = AssumptionEngine::new(&context, &directory, &issuer, &cache, &tokens);
///     let obtained = engine.obtain(&ObtainRequest::new("prod-readonly")).await?;
///
///     assert_eq!(obtained.provenance, Provenance::Issued { hops: 1 });
///     assert_eq!(obtained.region, "eu-west-1");
///     # let _ = std::fs::remove_dir_all(dir);
///     Ok(())
/// }
/// ```
pub struct AssumptionEngine<'a> {
    context: &'a Context,
    directory: &'a dyn Directory,
    issuer: &'a dyn CredentialIssuer,
    cache: &'a CredentialCache,
    tokens: &'a dyn MfaTokenSource,
}

impl<'a> AssumptionEngine<'a> {
    pub fn new(
        context: &'a Context,
        directory: &'a dyn Directory,
        issuer: &'a dyn CredentialIssuer,
        cache: &'a CredentialCache,
        tokens: &'a dyn MfaTokenSource,
    ) -> Self {
        Self {
            context,
            directory,
            issuer,
            cache,
            tokens,
        }
    }

    pub fn context(&self) -> &Context {
        self.context
    }

    /// Resolves the account and returns usable credentials for it, issuing
    /// new ones when the cache cannot serve the request.
    ///
    /// On issuance the cache is updated before returning; writing the
    /// profile store is left to the [`sink`](crate::sink).
    ///
    /// # Errors
    ///
    /// - [`LetmeError::AccountNotFound`] / [`LetmeError::EmptyRoleChain`] /
    ///   [`LetmeError::InvalidRoleArn`] before any issuance call
    /// - [`LetmeError::MfaTokenRequired`] when MFA is configured and no
    ///   token is available
    /// - [`LetmeError::Hop`] wrapping the issuer's rejection
    pub async fn obtain(&self, request: &ObtainRequest) -> Result<Obtained> {
        self.transition(EngineState::Start);
        validate_account_name(&request.account)?;

        let account = self
            .directory
            .lookup(&request.account)
            .await?
            .ok_or_else(|| LetmeError::AccountNotFound(request.account.clone()))?;

        // Fail fast on malformed chains, before any network call.
        validate_role_chain(&account.name, &account.role_chain)?;
        let plan = HopPlan::for_chain(&account.role_chain)
            .ok_or_else(|| LetmeError::EmptyRoleChain(account.name.clone()))?;

        let auth_method =
            AuthMethod::select(self.context.mfa_configured(), request.credential_process_v1);
        self.transition(EngineState::AuthMethodSelected(auth_method));

        let session_name = request
            .session_name
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.context.session_name_for(&account.name));
        let region = account.default_region().to_string();

        if request.renew {
            info!("Renew requested, ignoring cached credentials");
        } else if let Some(entry) = self.cache.get(&self.context.name, &account.name).await? {
            if CredentialCache::is_valid(&entry, Utc::now()) {
                info!(
                    "Using cached credentials for {} (valid until {})",
                    account.name,
                    entry.credentials.expiration_rfc3339()
                );
                return Ok(Obtained {
                    credentials: entry.credentials,
                    auth_method,
                    session_name: entry.session_name,
                    region,
                    account,
                    provenance: Provenance::Cache,
                });
            }
            debug!("Cached credentials for {} are stale", account.name);
        }

        let mfa = if auth_method.requires_mfa() {
            let serial_number = self.context.mfa_arn.clone().unwrap_or_default();
            let token_code = self.tokens.token(&serial_number)?;
            if token_code.is_empty() {
                return Err(LetmeError::MfaTokenRequired);
            }
            Some(MfaChallenge {
                serial_number,
                token_code,
            })
        } else {
            None
        };

        let duration_seconds = request
            .duration_seconds
            .filter(|d| *d > 0)
            .unwrap_or_else(|| self.context.session_duration());

        let hops = plan.hops();
        let credentials = match plan {
            HopPlan::Single(role) => {
                self.single_hop(role, &session_name, duration_seconds, mfa)
                    .await?
            }
            HopPlan::Chain(roles) => {
                self.chained(roles, &session_name, duration_seconds, mfa)
                    .await?
            }
        };

        self.cache
            .put(
                &self.context.name,
                &account.name,
                CachedCredentialEntry {
                    credentials: credentials.clone(),
                    session_name: session_name.clone(),
                    auth_method,
                },
            )
            .await?;
        self.transition(EngineState::Persisted);

        Ok(Obtained {
            credentials,
            auth_method,
            session_name,
            region,
            account,
            provenance: Provenance::Issued { hops },
        })
    }

    async fn single_hop(
        &self,
        role: &str,
        session_name: &str,
        duration_seconds: u32,
        mfa: Option<MfaChallenge>,
    ) -> Result<CredentialSet> {
        self.transition(EngineState::SingleHop);
        self.hop(0, Caller::Source, role, session_name, duration_seconds, mfa)
            .await
    }

    async fn chained(
        &self,
        roles: &[String],
        session_name: &str,
        duration_seconds: u32,
        mfa: Option<MfaChallenge>,
    ) -> Result<CredentialSet> {
        let mut mfa = mfa;
        let mut previous: Option<CredentialSet> = None;

        for (index, role) in roles.iter().enumerate() {
            self.transition(EngineState::ChainHop(index));
            let caller = match previous.as_ref() {
                None => Caller::Source,
                Some(creds) => Caller::Session(creds),
            };
            // MFA is presented once, on the first hop.
            let issued = self
                .hop(index, caller, role, session_name, duration_seconds, mfa.take())
                .await?;
            previous = Some(issued);
        }

        previous.ok_or_else(|| LetmeError::EmptyRoleChain(String::new()))
    }

    async fn hop(
        &self,
        index: usize,
        caller: Caller<'_>,
        role: &str,
        session_name: &str,
        duration_seconds: u32,
        mfa: Option<MfaChallenge>,
    ) -> Result<CredentialSet> {
        info!("Assuming role {} (hop {})", role, index);
        let request = AssumeRoleRequest {
            role_arn: role.to_string(),
            session_name: session_name.to_string(),
            duration_seconds,
            mfa,
        };

        let issued = self
            .issuer
            .assume_role(caller, &request)
            .await
            .map_err(|e| LetmeError::hop(index, role, e))?;

        if !issued.is_fresh_at(Utc::now()) {
            return Err(LetmeError::hop(
                index,
                role,
                LetmeError::Upstream(format!(
                    "{} issued credentials that are already expired ({})",
                    self.issuer.name(),
                    issued.expiration_rfc3339()
                )),
            ));
        }

        Ok(issued)
    }

    fn transition(&self, state: EngineState) {
        debug!(context = %self.context.name, "engine state: {:?}", state);
    }
}
