//! Directory factory and registration system.

use crate::directory::{Directory, DirectoryConfig};
use crate::{LetmeError, Result};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Factory function type for creating directories.
pub type DirectoryFactory = fn(DirectoryConfig) -> Result<Box<dyn Directory>>;

static DIRECTORY_REGISTRY: OnceLock<RwLock<HashMap<String, DirectoryFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, DirectoryFactory>> {
    DIRECTORY_REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a directory factory function.
///
/// This is called from directory modules' `register()` functions during
/// library initialization.
pub fn register_directory(directory_type: &str, factory: DirectoryFactory) {
    let mut reg = registry().write().unwrap_or_else(PoisonError::into_inner);
    reg.insert(directory_type.to_string(), factory);
}

/// Creates a new directory from configuration.
///
/// The factory is looked up from `config.kind`. The returned directory still
/// needs [`Directory::init`] before use.
///
/// # Errors
///
/// Returns an error if the directory type is not registered (missing
/// feature flag) or its factory rejects the configuration.
///
/// # Example
///
/// ```
/// use letme::directory::{DirectoryConfig, DirectoryType};
/// use letme::factory;
///
/// let directory = factory::new_directory(DirectoryConfig::new(DirectoryType::Mock)).unwrap();
/// assert_eq!(directory.name(), "mock");
/// ```
pub fn new_directory(config: DirectoryConfig) -> Result<Box<dyn Directory>> {
    crate::init();

    let directory_name = config.kind.to_string();

    let factory = {
        let reg = registry().read().unwrap_or_else(PoisonError::into_inner);
        reg.get(&directory_name).copied().ok_or_else(|| {
            LetmeError::Configuration(format!(
                "unknown directory: {} (did you enable the required feature flag?)",
                directory_name
            ))
        })?
    };

    factory(config)
}
