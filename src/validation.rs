//! Input validation for account aliases and role ARNs.

use crate::{LetmeError, Result};

/// Characters that would break an INI section header or a shell command line
/// (`credential_process` embeds the alias).
const FORBIDDEN_CHARS: &str = "[];#=|&$`<>(){}!*?~%^\\\"'";

/// Maximum allowed length for account aliases.
const MAX_NAME_LENGTH: usize = 128;

/// Partitions accepted in role ARNs.
const PARTITIONS: &[&str] = &["aws", "aws-cn", "aws-us-gov"];

/// Validates an account alias before it is used as a profile name.
///
/// # Errors
///
/// Returns [`LetmeError::InvalidAccountName`] if validation fails.
///
/// # Example
///
/// ```
/// use letme::validation::validate_account_name;
///
/// assert!(validate_account_name("prod-readonly").is_ok());
/// assert!(validate_account_name("team.sandbox_01").is_ok());
///
/// assert!(validate_account_name("").is_err());
/// assert!(validate_account_name("prod]\n[default").is_err());
/// assert!(validate_account_name("two words").is_err());
/// ```
pub fn validate_account_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LetmeError::InvalidAccountName(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(LetmeError::InvalidAccountName(format!(
            "name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }

    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(LetmeError::InvalidAccountName(format!(
            "{name:?} contains whitespace or control characters"
        )));
    }

    if name.chars().any(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(LetmeError::InvalidAccountName(format!(
            "{name:?} contains forbidden characters (not allowed: {})",
            FORBIDDEN_CHARS
        )));
    }

    Ok(())
}

/// Checks that `role` looks like `arn:<partition>:iam::<12 digits>:role/<name>`.
///
/// ```
/// use letme::validation::is_role_arn;
///
/// assert!(is_role_arn("arn:aws:iam::111111111111:role/readonly"));
/// assert!(is_role_arn("arn:aws:iam::111111111111:role/path/to/ops"));
/// assert!(!is_role_arn("readonly"));
/// assert!(!is_role_arn("arn:aws:iam::111:role/readonly"));
/// ```
pub fn is_role_arn(role: &str) -> bool {
    let mut parts = role.splitn(6, ':');
    let (Some("arn"), Some(partition), Some("iam"), Some(""), Some(account), Some(resource)) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if !PARTITIONS.contains(&partition) {
        return false;
    }

    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    match resource.strip_prefix("role/") {
        Some(path) => {
            !path.is_empty()
                && !path.ends_with('/')
                && !path.chars().any(|c| c.is_whitespace() || c.is_control())
        }
        None => false,
    }
}

/// Validates every role of a chain before any network call is made.
///
/// # Errors
///
/// - [`LetmeError::EmptyRoleChain`] when there is nothing to assume
/// - [`LetmeError::InvalidRoleArn`] naming the first malformed role
pub fn validate_role_chain(account: &str, chain: &[String]) -> Result<()> {
    if chain.is_empty() {
        return Err(LetmeError::EmptyRoleChain(account.to_string()));
    }

    match chain.iter().position(|role| !is_role_arn(role)) {
        Some(position) => Err(LetmeError::InvalidRoleArn {
            account: account.to_string(),
            position,
            role: chain[position].clone(),
        }),
        None => Ok(()),
    }
}
