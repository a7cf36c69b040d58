//! Authentication method selection and MFA token sources.

use crate::{LetmeError, Result};
use serde::{Deserialize, Serialize};

/// How an invocation authenticates and reports its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    /// Plain role assumption, profile files written
    AssumeRole,
    /// MFA-protected assumption, profile files written
    Mfa,
    /// Plain role assumption, credential-process v1 output
    #[serde(rename = "credential-process-v1")]
    CredentialProcessV1,
    /// MFA-protected assumption, credential-process v1 output
    #[serde(rename = "mfa-credential-process-v1")]
    MfaCredentialProcessV1,
}

impl AuthMethod {
    /// Selects the method from whether MFA is configured for the context and
    /// whether credential-process v1 output was requested.
    ///
    /// ```
    /// use letme::auth::AuthMethod;
    ///
    /// assert_eq!(AuthMethod::select(true, false), AuthMethod::Mfa);
    /// assert_eq!(AuthMethod::select(true, true), AuthMethod::MfaCredentialProcessV1);
    /// assert_eq!(AuthMethod::select(false, true), AuthMethod::CredentialProcessV1);
    /// assert_eq!(AuthMethod::select(false, false), AuthMethod::AssumeRole);
    /// ```
    pub fn select(mfa_configured: bool, credential_process_v1: bool) -> Self {
        match (mfa_configured, credential_process_v1) {
            (true, false) => Self::Mfa,
            (true, true) => Self::MfaCredentialProcessV1,
            (false, true) => Self::CredentialProcessV1,
            (false, false) => Self::AssumeRole,
        }
    }

    pub fn requires_mfa(self) -> bool {
        matches!(self, Self::Mfa | Self::MfaCredentialProcessV1)
    }

    pub fn is_credential_process(self) -> bool {
        matches!(self, Self::CredentialProcessV1 | Self::MfaCredentialProcessV1)
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssumeRole => write!(f, "assume-role"),
            Self::Mfa => write!(f, "mfa"),
            Self::CredentialProcessV1 => write!(f, "credential-process-v1"),
            Self::MfaCredentialProcessV1 => write!(f, "mfa-credential-process-v1"),
        }
    }
}

/// Supplies an MFA token when an assumption needs one.
///
/// The engine asks at most once per invocation, and only when it actually
/// has to call STS with MFA; cached credentials never trigger a prompt.
pub trait MfaTokenSource: Send + Sync {
    /// Returns the token code for `mfa_arn`.
    ///
    /// # Errors
    ///
    /// Returns [`LetmeError::MfaTokenRequired`] when no token can be obtained.
    fn token(&self, mfa_arn: &str) -> Result<String>;
}

/// A token passed on the command line.
#[derive(Debug, Clone)]
pub struct InlineToken(String);

impl InlineToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl MfaTokenSource for InlineToken {
    fn token(&self, _mfa_arn: &str) -> Result<String> {
        let token = self.0.trim();
        if token.is_empty() {
            return Err(LetmeError::MfaTokenRequired);
        }
        Ok(token.to_string())
    }
}

/// Prompts on the terminal (stderr), leaving stdout untouched for
/// credential-process output.
#[derive(Debug, Clone, Default)]
pub struct PromptToken;

impl MfaTokenSource for PromptToken {
    fn token(&self, mfa_arn: &str) -> Result<String> {
        let token: String = dialoguer::Input::new()
            .with_prompt(format!("Enter MFA one time pass code for {mfa_arn}"))
            .interact_text()
            .map_err(|_| LetmeError::MfaTokenRequired)?;

        let token = token.trim();
        if token.is_empty() {
            return Err(LetmeError::MfaTokenRequired);
        }
        Ok(token.to_string())
    }
}

/// Inline token when one was given, otherwise an interactive prompt.
pub fn token_source(inline: Option<&str>) -> Box<dyn MfaTokenSource> {
    match inline.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Box::new(InlineToken::new(token)),
        None => Box::new(PromptToken),
    }
}
