//! `letme init`: build or remove the local account cache.

use std::io;
use std::path::Path;

use clap::Args;
use tracing::info;

use crate::directories::cache_file;
use crate::directory::{Directory, DirectoryConfig};
use crate::{factory, paths, Result};

#[derive(Debug, Clone, Args)]
pub struct InitCommand {
    #[arg(long, help = "Remove the local account cache instead of building it")]
    pub remove: bool,
}

impl InitCommand {
    pub async fn execute(self, context: Option<&str>) -> Result<()> {
        let ctx = super::resolve_context(context).await?;
        let path = paths::require(paths::directory_cache_file(&ctx.name), "account cache")?;

        if self.remove {
            if remove_cache(&path).await? {
                println!("letme: removed account cache for context '{}'", ctx.name);
            } else {
                println!("letme: no account cache for context '{}'", ctx.name);
            }
            return Ok(());
        }

        // Always rebuild from the table, never from the cache being replaced.
        let mut directory = factory::new_directory(DirectoryConfig::remote(&ctx))?;
        directory.init().await?;

        let count = rebuild_cache(&*directory, &path).await?;
        println!(
            "letme: cached {} account(s) for context '{}' in {}",
            count,
            ctx.name,
            path.display()
        );
        Ok(())
    }
}

/// Replaces the cache file at `path` with every record in `directory`.
/// Returns the number of records written.
pub async fn rebuild_cache(directory: &dyn Directory, path: &Path) -> Result<usize> {
    let records = directory.list().await?;
    info!("Fetched {} account(s) from {}", records.len(), directory.name());
    cache_file::write(path, &records).await?;
    Ok(records.len())
}

/// Removes the cache file. Returns `false` when there was none.
pub async fn remove_cache(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::account::AccountRecord;
    use crate::directories::cache_file::CacheFileDirectory;
    use crate::directories::mock::MockDirectory;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rebuild_then_serve_from_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("directory-cache").join("dev");

        let remote = MockDirectory::new();
        remote
            .set_account(AccountRecord::new(
                1,
                "prod",
                vec!["arn:aws:iam::111111111111:role/a".into()],
                vec!["eu-west-1".into()],
            ))
            .await;
        remote
            .set_account(AccountRecord::new(
                2,
                "deep",
                vec![
                    "arn:aws:iam::111111111111:role/a".into(),
                    "arn:aws:iam::222222222222:role/b".into(),
                ],
                vec![],
            ))
            .await;

        assert_eq!(rebuild_cache(&remote, &path).await.unwrap(), 2);

        let mut local = CacheFileDirectory::new(&path);
        local.init().await.unwrap();
        let deep = local.lookup("deep").await.unwrap().unwrap();
        assert_eq!(deep.role_chain.len(), 2);
        assert!(local.lookup("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dev");

        assert!(!remove_cache(&path).await.unwrap());
        std::fs::write(&path, "").unwrap();
        assert!(remove_cache(&path).await.unwrap());
        assert!(!path.exists());
    }
}
