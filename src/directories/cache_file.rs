//! Local flat-file account directory.
//!
//! One account per line, `id,name,[role1 role2],[region1 region2]`. The file
//! is rebuilt wholesale by `letme init` and never edited in place. A single
//! role or region may also be written without brackets.

use crate::account::AccountRecord;
use crate::directory::{Directory, DirectoryConfig};
use crate::{paths, LetmeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory served from the local cache file.
pub struct CacheFileDirectory {
    path: PathBuf,
    records: Vec<AccountRecord>,
}

impl CacheFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Directory for CacheFileDirectory {
    fn name(&self) -> &str {
        "cache-file"
    }

    async fn init(&mut self) -> Result<()> {
        let text = paths::read_optional(&self.path).await?.ok_or_else(|| {
            LetmeError::Configuration(format!(
                "account cache {} does not exist, run 'letme init'",
                self.path.display()
            ))
        })?;

        self.records = parse(&text)?;
        debug!(
            "loaded {} accounts from {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn lookup(&self, account: &str) -> Result<Option<AccountRecord>> {
        Ok(self.records.iter().find(|r| r.name == account).cloned())
    }

    async fn list(&self) -> Result<Vec<AccountRecord>> {
        Ok(self.records.clone())
    }
}

/// Parses the whole cache file. Blank lines and `#` comments are skipped.
pub fn parse(text: &str) -> Result<Vec<AccountRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| parse_line(line).map_err(|msg| {
            LetmeError::directory("cache-file", format!("line {}: {}", n + 1, msg))
        }))
        .collect()
}

fn parse_line(line: &str) -> std::result::Result<AccountRecord, String> {
    let mut fields = line.trim().splitn(4, ',');
    let (Some(id), Some(name), Some(roles), Some(regions)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err("expected 4 comma-separated fields".to_string());
    };

    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid id {:?}: {}", id, e))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("empty account name".to_string());
    }

    Ok(AccountRecord::new(id, name, parse_list(roles), parse_list(regions)))
}

fn parse_list(field: &str) -> Vec<String> {
    let field = field.trim();
    let inner = field
        .strip_prefix('[')
        .and_then(|f| f.strip_suffix(']'))
        .unwrap_or(field);
    inner.split_whitespace().map(str::to_string).collect()
}

/// Renders one record as a cache line (without the newline).
pub fn format_line(record: &AccountRecord) -> String {
    format!(
        "{},{},[{}],[{}]",
        record.id,
        record.name,
        record.role_chain.join(" "),
        record.regions.join(" ")
    )
}

/// Rewrites the cache file at `path` with `records`, atomically.
pub async fn write(path: &Path, records: &[AccountRecord]) -> Result<()> {
    let mut text = String::new();
    for record in records {
        text.push_str(&format_line(record));
        text.push('\n');
    }
    paths::write_atomic(path, text.as_bytes()).await
}

/// Registers the cache-file directory with the factory.
pub fn register() {
    crate::factory::register_directory("cache-file", |cfg: DirectoryConfig| {
        let path = cfg.cache_path.ok_or_else(|| {
            LetmeError::Configuration("cache-file directory requires a path".to_string())
        })?;
        Ok(Box::new(CacheFileDirectory::new(path)))
    });
}
