//! Context resolution.
//!
//! A context is a named bundle of source identity, source region and
//! directory settings. Exactly one context is active per invocation: either
//! the one named explicitly, or the one the persisted current-context pointer
//! designates. Resolution fails closed when that context is not defined.

use crate::config::{ConfigFile, UserSettings};
use crate::{LetmeError, Result};

/// Session duration applied when a context leaves it unset or zero.
pub const DEFAULT_SESSION_DURATION_SECONDS: u32 = 3600;

/// The environment an invocation operates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    pub source_profile: String,
    pub source_region: Option<String>,
    pub backing_table: String,
    pub mfa_arn: Option<String>,
    pub session_duration_seconds: Option<u32>,
    pub session_name: Option<String>,
}

impl Context {
    /// Applies the default session duration when it is unset or zero.
    ///
    /// Idempotent: normalizing an already-normalized context is a no-op.
    pub fn normalized(mut self) -> Self {
        if self.session_duration_seconds.unwrap_or(0) == 0 {
            self.session_duration_seconds = Some(DEFAULT_SESSION_DURATION_SECONDS);
        }
        self
    }

    /// Session duration, with the default applied.
    pub fn session_duration(&self) -> u32 {
        match self.session_duration_seconds {
            Some(d) if d > 0 => d,
            _ => DEFAULT_SESSION_DURATION_SECONDS,
        }
    }

    pub fn mfa_configured(&self) -> bool {
        self.mfa_arn.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Session name for `account`: the context's, or `<account>-letme-session`.
    pub fn session_name_for(&self, account: &str) -> String {
        match self.session_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{account}-letme-session"),
        }
    }
}

/// Resolves contexts from an explicitly passed configuration.
///
/// # Example
///
/// ```
/// use letme::config::{ConfigFile, UserSettings};
/// use letme::context::ContextResolver;
///
/// let config = ConfigFile::parse(r#"
/// [dev]
/// aws_source_profile = "default"
/// dynamodb_table = "accounts"
/// "#).unwrap();
/// let settings = UserSettings { current_context: Some("dev".into()) };
///
/// let resolver = ContextResolver::new(&config, &settings);
/// let ctx = resolver.resolve(None).unwrap();
/// assert_eq!(ctx.name, "dev");
/// assert_eq!(ctx.session_duration_seconds, Some(3600));
///
/// assert!(resolver.resolve(Some("prod")).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContextResolver<'a> {
    config: &'a ConfigFile,
    settings: &'a UserSettings,
}

impl<'a> ContextResolver<'a> {
    pub fn new(config: &'a ConfigFile, settings: &'a UserSettings) -> Self {
        Self { config, settings }
    }

    /// Name of the context the pointer currently designates.
    pub fn current_name(&self) -> &'a str {
        self.settings.current_context()
    }

    /// Resolves `name`, or the current context when `None`, and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`LetmeError::ContextNotFound`] if the context is not defined.
    pub fn resolve(&self, name: Option<&str>) -> Result<Context> {
        let name = name.unwrap_or_else(|| self.current_name());
        let table = self
            .config
            .contexts
            .get(name)
            .ok_or_else(|| LetmeError::ContextNotFound(name.to_string()))?;

        Ok(table.to_context(name).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigFile {
        ConfigFile::parse(
            r#"
[default]
aws_source_profile = "default"
dynamodb_table = "accounts"
session_duration = 0

[ops]
aws_source_profile = "ops"
dynamodb_table = "ops-accounts"
session_duration = 900
session_name = "oncall"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_current_defaults_to_default_context() {
        let config = config();
        let settings = UserSettings::default();
        let ctx = ContextResolver::new(&config, &settings).resolve(None).unwrap();
        assert_eq!(ctx.name, "default");
    }

    #[test]
    fn test_explicit_name_overrides_pointer() {
        let config = config();
        let settings = UserSettings {
            current_context: Some("default".into()),
        };
        let ctx = ContextResolver::new(&config, &settings)
            .resolve(Some("ops"))
            .unwrap();
        assert_eq!(ctx.name, "ops");
        assert_eq!(ctx.session_duration(), 900);
    }

    #[test]
    fn test_missing_context_fails_closed() {
        let config = config();
        let settings = UserSettings {
            current_context: Some("gone".into()),
        };
        let err = ContextResolver::new(&config, &settings)
            .resolve(None)
            .unwrap_err();
        assert!(matches!(err, LetmeError::ContextNotFound(ref n) if n == "gone"));
    }

    #[test]
    fn test_zero_duration_normalized() {
        let config = config();
        let settings = UserSettings::default();
        let ctx = ContextResolver::new(&config, &settings).resolve(None).unwrap();
        assert_eq!(ctx.session_duration_seconds, Some(DEFAULT_SESSION_DURATION_SECONDS));
    }

    #[test]
    fn test_normalization_idempotent() {
        for duration in [None, Some(0), Some(1), Some(3600), Some(43200)] {
            let ctx = Context {
                name: "x".into(),
                source_profile: "p".into(),
                source_region: None,
                backing_table: "t".into(),
                mfa_arn: None,
                session_duration_seconds: duration,
                session_name: None,
            };
            let once = ctx.normalized();
            let twice = once.clone().normalized();
            assert_eq!(once, twice);
            assert_eq!(once.session_duration(), once.session_duration_seconds.unwrap());
        }
    }

    #[test]
    fn test_session_name_defaulting() {
        let config = config();
        let settings = UserSettings::default();
        let resolver = ContextResolver::new(&config, &settings);

        let default = resolver.resolve(None).unwrap();
        assert_eq!(default.session_name_for("prod"), "prod-letme-session");

        let ops = resolver.resolve(Some("ops")).unwrap();
        assert_eq!(ops.session_name_for("prod"), "oncall");
    }
}
