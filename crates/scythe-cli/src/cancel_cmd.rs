//! Execute the `scythe cancel` command: batch-cancel tasks by id.

use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use ethers::types::H256;

use scythe_core::TaskId;
use scythe_core::client::TaskClient;

/// Parse a 32-byte task id from hex, tolerating an optional `0x` prefix.
pub fn parse_task_id(raw: &str) -> Result<TaskId> {
    let trimmed = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(trimmed).with_context(|| format!("invalid task id: {raw}"))?;
    if bytes.len() != 32 {
        bail!("invalid task id (expected 32 bytes, got {}): {raw}", bytes.len());
    }
    Ok(H256::from_slice(&bytes))
}

pub async fn run_cancel(client: &TaskClient, raw_ids: &[String]) -> Result<()> {
    let mut task_ids = BTreeSet::new();
    for raw in raw_ids {
        task_ids.insert(parse_task_id(raw)?);
    }

    println!(
        "Cancelling {} task(s) on {}...",
        task_ids.len(),
        client.chain_label()
    );

    let Some(cancelled) = client.delete_tasks(&task_ids).await else {
        bail!("no tasks were cancelled on {}", client.chain_label());
    };

    for (key, task_id) in &cancelled {
        println!("  {key}: {task_id:#x}");
    }
    println!(
        "Cancelled {} of {} task(s).",
        cancelled.len(),
        task_ids.len()
    );
    Ok(())
}
