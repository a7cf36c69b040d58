pub mod config_file;
pub mod context;
pub mod init;
pub mod list;
pub mod obtain;

pub use config_file::ConfigFileCommand;
pub use context::ContextCommand;
pub use init::InitCommand;
pub use list::ListCommand;
pub use obtain::ObtainCommand;

use crate::config::{ConfigFile, UserSettings};
use crate::context::{Context, ContextResolver};
use crate::directory::{Directory, DirectoryConfig};
use crate::{factory, paths, Result};
use tracing::info;

/// Loads configuration and settings from their default locations.
pub(crate) async fn load_settings() -> Result<(ConfigFile, UserSettings)> {
    let config = ConfigFile::load_default().await?;
    let settings_path = paths::require(paths::user_settings_file(), "letme settings file")?;
    let settings = UserSettings::load(&settings_path).await?;
    Ok((config, settings))
}

/// Resolves `name`, or the current context.
pub(crate) async fn resolve_context(name: Option<&str>) -> Result<Context> {
    let (config, settings) = load_settings().await?;
    let context = ContextResolver::new(&config, &settings).resolve(name)?;
    info!("Using context: {}", context.name);
    Ok(context)
}

/// Creates and initializes the directory serving `context`.
pub(crate) async fn open_directory(context: &Context) -> Result<Box<dyn Directory>> {
    let config = DirectoryConfig::for_context(context).await?;
    let mut directory = factory::new_directory(config)?;
    directory.init().await?;
    info!("Account directory: {}", directory.name());
    Ok(directory)
}
