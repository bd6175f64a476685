//! Execute the `scythe create` command: batch-create tasks from a vault
//! list file.

use std::path::Path;

use anyhow::{Context, Result, bail};

use scythe_core::client::TaskClient;
use scythe_core::vaults;

pub async fn run_create(client: &TaskClient, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read vault list at {}", file.display()))?;
    let vault_map = vaults::parse_vaults_toml(&contents)?;

    println!(
        "Creating {} task(s) on {}...",
        vault_map.len(),
        client.chain_label()
    );

    let Some(created) = client.create_tasks(&vault_map).await else {
        bail!("no tasks were created on {}", client.chain_label());
    };

    for (name, task_id) in &created {
        println!("  {name}: {task_id:#x}");
    }

    let failed: Vec<&str> = vault_map
        .keys()
        .filter(|name| !created.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !failed.is_empty() {
        println!("Failed: {}", failed.join(", "));
    }

    println!("Created {} of {} task(s).", created.len(), vault_map.len());
    Ok(())
}
