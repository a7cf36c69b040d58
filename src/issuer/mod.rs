//! Credential-issuing service abstraction.
//!
//! The assumption engine never talks to STS directly; it goes through
//! [`CredentialIssuer`] so that hops can be driven by the real service or by
//! the in-memory mock in tests.

use crate::credentials::CredentialSet;
use crate::Result;
use async_trait::async_trait;

#[cfg(feature = "aws")]
mod sts;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub use sts::StsIssuer;

/// Identity that authorizes a hop.
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    /// The context's source profile (first hop)
    Source,
    /// Credentials issued by the previous hop
    Session(&'a CredentialSet),
}

/// MFA device and the one-time code presented with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    pub serial_number: String,
    pub token_code: String,
}

/// Parameters of one `AssumeRole` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: u32,
    pub mfa: Option<MfaChallenge>,
}

/// A service that turns a caller identity into temporary credentials for a
/// role.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Returns the issuer name (e.g., "sts", "mock").
    fn name(&self) -> &str;

    /// Assumes `request.role_arn` as `caller`.
    ///
    /// # Errors
    ///
    /// - [`LetmeError::Authentication`](crate::LetmeError::Authentication):
    ///   caller credentials expired/invalid, or the MFA code was rejected
    /// - [`LetmeError::Upstream`](crate::LetmeError::Upstream): the service
    ///   denied the call (trust policy) or could not be reached
    async fn assume_role(
        &self,
        caller: Caller<'_>,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialSet>;
}
