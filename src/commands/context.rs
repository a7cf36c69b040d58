//! `letme context`: list and switch contexts.

use std::io::Write;
use std::path::Path;

use clap::{Args, Subcommand};

use crate::config::{ConfigFile, UserSettings};
use crate::{paths, LetmeError, Result};

#[derive(Debug, Clone, Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    pub action: ContextAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ContextAction {
    #[command(about = "List configured contexts, marking the current one")]
    List,
    #[command(about = "Make another context the current one")]
    Switch {
        #[arg(help = "Context name")]
        name: String,
    },
}

impl ContextCommand {
    pub async fn execute(self) -> Result<()> {
        let (config, settings) = super::load_settings().await?;

        match self.action {
            ContextAction::List => render(&config, &settings, &mut std::io::stdout()),
            ContextAction::Switch { name } => {
                let path = paths::require(paths::user_settings_file(), "letme settings file")?;
                switch(&config, settings, &name, &path).await?;
                println!("letme: switched to context '{name}'");
                Ok(())
            }
        }
    }
}

pub fn render(config: &ConfigFile, settings: &UserSettings, out: &mut dyn Write) -> Result<()> {
    let current = settings.current_context();
    for name in config.context_names() {
        let marker = if name == current { "*" } else { " " };
        writeln!(out, "{marker} {name}")?;
    }
    Ok(())
}

/// Persists `name` as the current context after checking it is defined.
pub async fn switch(
    config: &ConfigFile,
    mut settings: UserSettings,
    name: &str,
    settings_path: &Path,
) -> Result<()> {
    if !config.contexts.contains_key(name) {
        return Err(LetmeError::ContextNotFound(name.to_string()));
    }
    settings.current_context = Some(name.to_string());
    settings.save(settings_path).await
}
