//! `letme list`: print the accounts of the active directory.

use std::io::Write;

use clap::Args;

use crate::account::AccountRecord;
use crate::Result;

#[derive(Debug, Clone, Args)]
pub struct ListCommand {}

impl ListCommand {
    pub async fn execute(self, context: Option<&str>) -> Result<()> {
        let ctx = super::resolve_context(context).await?;
        let directory = super::open_directory(&ctx).await?;
        let mut records = directory.list().await?;
        records.sort_by(|a, b| a.name.cmp(&b.name));

        render(&records, &mut std::io::stdout())
    }
}

/// Prints one row per account: name, id, chain length and default region.
pub fn render(records: &[AccountRecord], out: &mut dyn Write) -> Result<()> {
    let width = records
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    writeln!(out, "{:<width$}  {:>12}  {:>4}  REGION", "NAME", "ID", "HOPS")?;
    for record in records {
        writeln!(
            out,
            "{:<width$}  {:>12}  {:>4}  {}",
            record.name,
            record.id,
            record.role_chain.len(),
            record.default_region()
        )?;
    }
    Ok(())
}
