//! Filesystem locations and atomic file replacement.

use crate::Result;
use std::path::{Path, PathBuf};
use std::{env, io};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// letme directory name under the user's home directory
pub const LETME_DIR_NAME: &str = ".letme";

/// Context configuration file name
pub const CONFIG_FILE_NAME: &str = "letme-config";

/// Current-context pointer file name
pub const USER_SETTINGS_FILE_NAME: &str = "letme-usersettings";

/// Credential cache file name
pub const CREDENTIAL_CACHE_FILE_NAME: &str = "letme-credentials-cache.json";

/// Directory holding one account cache file per context
pub const DIRECTORY_CACHE_DIR_NAME: &str = "directory-cache";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// Returns letme's home directory.
/// Respects LETME_HOME environment variable if set
pub fn letme_home() -> Option<PathBuf> {
    if let Ok(path) = env::var("LETME_HOME") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(LETME_DIR_NAME))
}

/// Get the letme configuration file path
/// Respects LETME_CONFIG_FILE environment variable if set
pub fn config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var("LETME_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    letme_home().map(|home| home.join(CONFIG_FILE_NAME))
}

pub fn user_settings_file() -> Option<PathBuf> {
    letme_home().map(|home| home.join(USER_SETTINGS_FILE_NAME))
}

pub fn credential_cache_file() -> Option<PathBuf> {
    letme_home().map(|home| home.join(CREDENTIAL_CACHE_FILE_NAME))
}

/// Local account cache for a context.
pub fn directory_cache_file(context: &str) -> Option<PathBuf> {
    letme_home().map(|home| home.join(DIRECTORY_CACHE_DIR_NAME).join(context))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn aws_credentials_file() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join("credentials"))
}

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn aws_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join("config"))
}

/// Unwraps an optional path, failing when the home directory is unknown.
pub fn require(path: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    path.ok_or_else(|| {
        crate::LetmeError::Configuration(format!(
            "could not determine the {what} path, set HOME"
        ))
    })
}

/// Replaces `path` with `contents` so that readers see either the old or the
/// new file, never a partial one.
///
/// Data is written to a sibling temp file which is then renamed over the
/// target. The temp file gets mode 0600 on Unix, and a missing parent
/// directory is created with mode 0700.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    create_private_dir(&parent).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let result = async {
        let mut file = fs::File::create(&tmp).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata().await?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp, perms).await?;
        }

        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result.map_err(Into::into)
}

/// Creates `dir` (and parents) if missing. Newly created directories get
/// mode 0700 on Unix; existing ones are left alone.
pub async fn create_private_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir).await {
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    fs::create_dir_all(dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dir).await?.permissions();
        perms.set_mode(0o700);
        fs::set_permissions(dir, perms).await?;
    }

    Ok(())
}

/// Reads a file to a string, mapping a missing file to `None`.
pub async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_atomic_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file");

        write_atomic(&path, b"first").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "first");

        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "second");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_atomic_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("secret");
        write_atomic(&path, b"x").await.unwrap();

        let mode = fs::metadata(&path).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_read_optional_missing() {
        let dir = tempdir().unwrap();
        let missing = read_optional(&dir.path().join("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[test]
    #[serial]
    fn test_aws_credentials_file_env_override() {
        let original = env::var("AWS_SHARED_CREDENTIALS_FILE").ok();

        env::set_var("AWS_SHARED_CREDENTIALS_FILE", "/custom/path/credentials");
        assert_eq!(
            aws_credentials_file(),
            Some(PathBuf::from("/custom/path/credentials"))
        );

        match original {
            Some(val) => env::set_var("AWS_SHARED_CREDENTIALS_FILE", val),
            None => env::remove_var("AWS_SHARED_CREDENTIALS_FILE"),
        }
    }

    #[test]
    #[serial]
    fn test_letme_home_env_override() {
        let original = env::var("LETME_HOME").ok();

        env::set_var("LETME_HOME", "/opt/letme");
        assert_eq!(
            directory_cache_file("dev"),
            Some(PathBuf::from("/opt/letme/directory-cache/dev"))
        );

        match original {
            Some(val) => env::set_var("LETME_HOME", val),
            None => env::remove_var("LETME_HOME"),
        }
    }
}
