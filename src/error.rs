//! Error types for letme operations.

use thiserror::Error;

/// Result type alias using [`LetmeError`].
pub type Result<T> = std::result::Result<T, LetmeError>;

/// Broad classification of a failure, used for the diagnostic line and
/// remediation hint printed by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration file, context or settings.
    Configuration,
    /// Account absent from the directory, or present with nothing to assume.
    NotFound,
    /// MFA token missing/invalid, or source credentials expired/invalid.
    Authentication,
    /// The credential-issuing service rejected the call.
    Upstream,
    /// Local file could not be read or written.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::NotFound => write!(f, "not found"),
            Self::Authentication => write!(f, "authentication"),
            Self::Upstream => write!(f, "upstream"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Errors that can occur while obtaining credentials.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum LetmeError {
    /// Configuration file is missing or malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The requested (or current) context is not defined.
    #[error("context not found: {0}")]
    ContextNotFound(String),

    /// The account alias has no record in the directory.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The account exists but has no role configured.
    #[error("account {0} does not have any role configured, nothing to assume")]
    EmptyRoleChain(String),

    /// A role in the chain is not a well-formed IAM role ARN.
    #[error("account {account}: invalid role ARN at position {position}: {role}")]
    InvalidRoleArn {
        /// Account alias
        account: String,
        /// Zero-based position in the chain
        position: usize,
        /// Offending role identifier
        role: String,
    },

    /// Account alias cannot be used as a profile name.
    #[error("invalid account name: {0}")]
    InvalidAccountName(String),

    /// MFA is configured but no token could be obtained.
    #[error("MFA token required but none was provided")]
    MfaTokenRequired,

    /// Source credentials or MFA token were rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The credential-issuing service rejected the request.
    #[error("credential service rejected the request: {0}")]
    Upstream(String),

    /// A directory backend failed.
    #[error("directory {backend}: {message}")]
    Directory {
        /// Directory backend name
        backend: String,
        /// What went wrong
        message: String,
    },

    /// An assumption hop failed; the whole chain is aborted.
    #[error("hop {hop} ({role}): {source}")]
    Hop {
        /// Zero-based hop index
        hop: usize,
        /// Role assumed at this hop
        role: String,
        /// Underlying error
        #[source]
        source: Box<LetmeError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Profile store could not be parsed.
    #[error("profile store error: {0}")]
    Ini(#[from] ini::ParseError),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LetmeError {
    /// Wraps an error with the hop that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use letme::LetmeError;
    ///
    /// let err = LetmeError::Upstream("AccessDenied".to_string());
    /// let wrapped = LetmeError::hop(1, "arn:aws:iam::111111111111:role/ops", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "hop 1 (arn:aws:iam::111111111111:role/ops): credential service rejected the request: AccessDenied"
    /// );
    /// ```
    pub fn hop(hop: usize, role: impl Into<String>, err: LetmeError) -> Self {
        Self::Hop {
            hop,
            role: role.into(),
            source: Box::new(err),
        }
    }

    /// Creates a directory backend error.
    pub fn directory(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Classifies the error. Hop errors take the kind of their cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::ContextNotFound(_) | Self::Toml(_) => {
                ErrorKind::Configuration
            }
            Self::AccountNotFound(_)
            | Self::EmptyRoleChain(_)
            | Self::InvalidRoleArn { .. }
            | Self::InvalidAccountName(_) => ErrorKind::NotFound,
            Self::MfaTokenRequired | Self::Authentication(_) => ErrorKind::Authentication,
            Self::Upstream(_) | Self::Directory { .. } | Self::Other(_) => ErrorKind::Upstream,
            Self::Hop { source, .. } => source.kind(),
            Self::Io(_) | Self::Json(_) | Self::Ini(_) => ErrorKind::Io,
        }
    }

    /// Remediation line shown under the diagnostic, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(_) | Self::Toml(_) => {
                Some("run 'letme config-file' to create a valid configuration file")
            }
            Self::ContextNotFound(_) => Some("run 'letme context list' to list available contexts"),
            Self::AccountNotFound(_) | Self::EmptyRoleChain(_) => {
                Some("run 'letme list' to list available accounts")
            }
            Self::MfaTokenRequired => Some("pass the token with '--inline-mfa <TOKEN>'"),
            Self::Hop { source, .. } => source.hint(),
            _ => None,
        }
    }
}
