//! Temporary credential sets issued by STS.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A temporary secret bundle.
///
/// Once `expiration` has passed the set is stale: it may still be displayed
/// but must not be used to authorize further calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl CredentialSet {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
        }
    }

    /// True iff `now` is strictly before the expiration.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration
    }

    /// Expiration as RFC 3339 with a `Z` suffix, the format expected by the
    /// AWS SDKs in both the credentials file and credential-process output.
    pub fn expiration_rfc3339(&self) -> String {
        self.expiration.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

// Secrets never reach logs.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample(expiration: DateTime<Utc>) -> CredentialSet {
        CredentialSet::new("ASIAEXAMPLE", "secret", "token", expiration)
    }

    #[test]
    fn test_freshness_boundary() {
        let exp = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let creds = sample(exp);

        assert!(creds.is_fresh_at(exp - Duration::seconds(1)));
        assert!(!creds.is_fresh_at(exp));
        assert!(!creds.is_fresh_at(exp + Duration::seconds(1)));
    }

    #[test]
    fn test_expiration_format() {
        let exp = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(sample(exp).expiration_rfc3339(), "2026-03-04T05:06:07Z");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", sample(Utc::now()));
        assert!(rendered.contains("ASIAEXAMPLE"));
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("\"token\""));
        assert!(rendered.contains("<redacted>"));
    }
}
