//! Mock issuer for testing.

use super::{AssumeRoleRequest, Caller, CredentialIssuer};
use crate::credentials::CredentialSet;
use crate::{LetmeError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Mutex, PoisonError};

/// Who authorized a recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCaller {
    Source,
    /// Access key id of the session credentials used
    Session(String),
}

/// One `assume_role` call seen by [`MockIssuer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub caller: RecordedCaller,
    pub request: AssumeRoleRequest,
    /// Access key id handed back for this call
    pub issued_key: String,
}

/// Issues fake credentials and records every call.
///
/// The n-th issued set (1-based) has access key id `ASIAMOCK{n}` and expires
/// `duration_seconds` from now.
///
/// # Example
///
/// ```
/// use letme::issuer::mock::MockIssuer;
/// use letme::issuer::{AssumeRoleRequest, Caller, CredentialIssuer};
///
/// #[tokio::main]
/// async fn main() -> letme::Result<()> {
///     let issuer = MockIssuer::new();
///     let request = AssumeRoleRequest {
///         role_arn: "arn:aws:iam::111111111111:role/readonly".into(),
///         session_name: "test".into(),
///         duration_seconds: 3600,
///         mfa: None,
///     };
///
///     let creds = issuer.assume_role(Caller::Source, &request).await?;
///     assert_eq!(creds.access_key_id, "ASIAMOCK1");
///     assert_eq!(issuer.call_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockIssuer {
    calls: Mutex<Vec<RecordedCall>>,

    /// Role whose assumption is rejected as a trust-policy denial
    pub deny_role: Option<String>,
    /// When set, calls carrying an MFA code other than this one are rejected
    pub expected_mfa_code: Option<String>,
    /// Issue credentials that are already expired
    pub issue_expired: bool,
}

impl MockIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every assumption of `role` as a trust-policy denial.
    pub fn deny_role(mut self, role: impl Into<String>) -> Self {
        self.deny_role = Some(role.into());
        self
    }

    /// Rejects MFA calls whose code differs from `code`.
    pub fn expected_mfa_code(mut self, code: impl Into<String>) -> Self {
        self.expected_mfa_code = Some(code.into());
        self
    }

    /// Issues credentials that expired a second ago.
    pub fn issue_expired(mut self) -> Self {
        self.issue_expired = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl CredentialIssuer for MockIssuer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn assume_role(
        &self,
        caller: Caller<'_>,
        request: &AssumeRoleRequest,
    ) -> Result<CredentialSet> {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let issued_key = format!("ASIAMOCK{}", calls.len() + 1);

        calls.push(RecordedCall {
            caller: match caller {
                Caller::Source => RecordedCaller::Source,
                Caller::Session(creds) => RecordedCaller::Session(creds.access_key_id.clone()),
            },
            request: request.clone(),
            issued_key: issued_key.clone(),
        });

        if self.deny_role.as_deref() == Some(request.role_arn.as_str()) {
            return Err(LetmeError::Upstream(format!(
                "AccessDenied: not authorized to assume {}",
                request.role_arn
            )));
        }

        if let (Some(expected), Some(mfa)) = (&self.expected_mfa_code, &request.mfa) {
            if &mfa.token_code != expected {
                return Err(LetmeError::Authentication(
                    "MultiFactorAuthentication failed with invalid MFA one time pass code"
                        .to_string(),
                ));
            }
        }

        let expiration = if self.issue_expired {
            Utc::now() - Duration::seconds(1)
        } else {
            Utc::now() + Duration::seconds(i64::from(request.duration_seconds))
        };

        Ok(CredentialSet::new(
            issued_key.clone(),
            format!("secret-{issued_key}"),
            format!("token-{issued_key}"),
            expiration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::MfaChallenge;

    fn request(role: &str, mfa: Option<&str>) -> AssumeRoleRequest {
        AssumeRoleRequest {
            role_arn: role.to_string(),
            session_name: "s".to_string(),
            duration_seconds: 900,
            mfa: mfa.map(|code| MfaChallenge {
                serial_number: "arn:aws:iam::123456789012:mfa/alice".to_string(),
                token_code: code.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_records_callers() {
        let issuer = MockIssuer::new();
        let first = issuer.assume_role(Caller::Source, &request("a", None)).await.unwrap();
        issuer
            .assume_role(Caller::Session(&first), &request("b", None))
            .await
            .unwrap();

        let calls = issuer.calls();
        assert_eq!(calls[0].caller, RecordedCaller::Source);
        assert_eq!(calls[1].caller, RecordedCaller::Session("ASIAMOCK1".to_string()));
        assert_eq!(calls[1].issued_key, "ASIAMOCK2");
    }

    #[tokio::test]
    async fn test_denied_role() {
        let issuer = MockIssuer::new().deny_role("b");
        assert!(issuer.assume_role(Caller::Source, &request("a", None)).await.is_ok());
        assert!(matches!(
            issuer.assume_role(Caller::Source, &request("b", None)).await,
            Err(LetmeError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_mfa_code() {
        let issuer = MockIssuer::new().expected_mfa_code("123456");
        assert!(issuer
            .assume_role(Caller::Source, &request("a", Some("123456")))
            .await
            .is_ok());
        assert!(matches!(
            issuer.assume_role(Caller::Source, &request("a", Some("000000"))).await,
            Err(LetmeError::Authentication(_))
        ));
    }
}
