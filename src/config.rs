//! On-disk configuration: context definitions and the current-context pointer.

use crate::context::Context;
use crate::{paths, LetmeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Context used when no pointer has been persisted yet.
pub const DEFAULT_CONTEXT: &str = "default";

/// Template written by `letme config-file`.
pub const CONFIG_TEMPLATE: &str = r#"# letme configuration. One table per context.
[default]
aws_source_profile = "default"
aws_source_profile_region = "us-east-1"
dynamodb_table = "letme-accounts"
# mfa_arn = "arn:aws:iam::123456789012:mfa/your-user"
# session_name = "your-name"
# session_duration = 3600
"#;

/// One context table of the configuration file.
///
/// Unknown keys are rejected so that typos fail loudly instead of silently
/// dropping a setting such as `mfa_arn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    pub aws_source_profile: String,

    #[serde(default)]
    pub aws_source_profile_region: Option<String>,

    pub dynamodb_table: String,

    #[serde(default)]
    pub mfa_arn: Option<String>,

    #[serde(default)]
    pub session_name: Option<String>,

    #[serde(default)]
    pub session_duration: Option<u32>,
}

impl ContextConfig {
    /// Builds the (not yet normalized) [`Context`] for this table.
    pub fn to_context(&self, name: &str) -> Context {
        Context {
            name: name.to_string(),
            source_profile: self.aws_source_profile.clone(),
            source_region: self
                .aws_source_profile_region
                .clone()
                .filter(|r| !r.is_empty()),
            backing_table: self.dynamodb_table.clone(),
            mfa_arn: self.mfa_arn.clone().filter(|a| !a.is_empty()),
            session_duration_seconds: self.session_duration,
            session_name: self.session_name.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// The parsed configuration file: context name → settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFile {
    pub contexts: BTreeMap<String, ContextConfig>,
}

impl ConfigFile {
    /// Parses configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let config: ConfigFile = toml::from_str(text)?;
        Ok(config)
    }

    /// Loads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LetmeError::Configuration`] when the file does not exist,
    /// and [`LetmeError::Toml`] when it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = paths::read_optional(path).await?.ok_or_else(|| {
            LetmeError::Configuration(format!(
                "could not locate any config file at {}",
                path.display()
            ))
        })?;
        Self::parse(&text)
    }

    /// Loads the configuration from its default location.
    pub async fn load_default() -> Result<Self> {
        let path = paths::require(paths::config_file(), "letme config file")?;
        Self::load(&path).await
    }

    pub fn context_names(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }
}

/// Persisted user settings; currently only the current-context pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}

impl UserSettings {
    /// Loads settings; a missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        match paths::read_optional(path).await? {
            Some(text) => Ok(toml::from_str(&text)?),
            None => Ok(Self::default()),
        }
    }

    /// Persists settings atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)
            .map_err(|e| LetmeError::Configuration(format!("cannot encode settings: {e}")))?;
        paths::write_atomic(path, text.as_bytes()).await
    }

    /// The current context name, defaulting to [`DEFAULT_CONTEXT`].
    pub fn current_context(&self) -> &str {
        self.current_context
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONTEXT)
    }
}
