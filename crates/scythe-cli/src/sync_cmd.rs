//! Execute the `scythe sync` command: reconcile a vault list against the
//! tasks registered on-chain.

use std::path::Path;

use anyhow::{Context, Result};

use scythe_core::client::TaskClient;
use scythe_core::vaults;

pub async fn run_sync(client: &TaskClient, file: &Path, apply: bool, prune: bool) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read vault list at {}", file.display()))?;
    let vault_map = vaults::parse_vaults_toml(&contents)?;

    let plan = client.sync_plan(&vault_map).await?;

    println!(
        "{} active, {} missing, {} stale on {}",
        plan.active.len(),
        plan.missing.len(),
        plan.stale.len(),
        client.chain_label()
    );
    for (name, task_id) in &plan.active {
        println!("  active   {name}: {task_id:#x}");
    }
    for (name, vault) in &plan.missing {
        println!("  missing  {name}: {vault:#x}");
    }
    for task_id in &plan.stale {
        println!("  stale    {task_id:#x}");
    }

    if plan.is_settled() {
        println!("Nothing to do.");
        return Ok(());
    }

    if !apply {
        println!(
            "Dry run; pass --apply to create missing tasks (and --prune to cancel stale ones)."
        );
        return Ok(());
    }

    if !plan.missing.is_empty() {
        let created = client.create_tasks(&plan.missing).await.unwrap_or_default();
        println!(
            "Created {} of {} missing task(s).",
            created.len(),
            plan.missing.len()
        );
    }

    if prune && !plan.stale.is_empty() {
        let cancelled = client.delete_tasks(&plan.stale).await.unwrap_or_default();
        println!(
            "Cancelled {} of {} stale task(s).",
            cancelled.len(),
            plan.stale.len()
        );
    }

    Ok(())
}
