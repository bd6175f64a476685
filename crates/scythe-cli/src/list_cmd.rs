//! Execute the `scythe list` command: show task ids the admin owns.

use anyhow::Result;

use scythe_core::client::TaskClient;

pub async fn run_list(client: &TaskClient) -> Result<()> {
    let ids = client.owned_task_ids().await?;

    if ids.is_empty() {
        println!(
            "No tasks registered for {:#x} on {}.",
            client.admin(),
            client.chain_label()
        );
        return Ok(());
    }

    println!(
        "{} task(s) owned by {:#x} on {}:",
        ids.len(),
        client.admin(),
        client.chain_label()
    );
    for id in &ids {
        println!("  {id:#x}");
    }
    Ok(())
}
