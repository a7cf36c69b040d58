//! `letme config-file`: write a configuration template.

use std::path::Path;

use clap::Args;

use crate::config::{ConfigFile, CONFIG_TEMPLATE};
use crate::{paths, LetmeError, Result};

#[derive(Debug, Clone, Args)]
pub struct ConfigFileCommand {
    #[arg(long, help = "Overwrite an existing configuration file")]
    pub force: bool,
}

impl ConfigFileCommand {
    pub async fn execute(self) -> Result<()> {
        let path = paths::require(paths::config_file(), "letme config file")?;
        write_template(&path, self.force).await?;
        println!("letme: wrote configuration template to {}", path.display());
        Ok(())
    }
}

/// Writes [`CONFIG_TEMPLATE`] to `path`. An existing file is only replaced
/// with `force`.
pub async fn write_template(path: &Path, force: bool) -> Result<()> {
    if !force && tokio::fs::try_exists(path).await? {
        return Err(LetmeError::Configuration(format!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        )));
    }
    paths::write_atomic(path, CONFIG_TEMPLATE.as_bytes()).await
}
