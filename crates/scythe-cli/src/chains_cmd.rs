//! Execute the `scythe chains` command: list configured deployments.

use anyhow::Result;

use crate::config;

pub fn run_chains() -> Result<()> {
    let config = config::load_config()?;

    if config.chains.is_empty() {
        println!(
            "No chains configured. Add a [chains.<name>] table to {}.",
            config::config_path().display()
        );
        return Ok(());
    }

    println!(
        "{:<12} {:>8}  {:<42}  {:<42}",
        "NAME", "CHAIN ID", "HARVESTER", "OPS"
    );
    for (name, chain) in &config.chains {
        println!(
            "{:<12} {:>8}  {:<42}  {:<42}",
            name,
            chain.chain_id,
            format!("{:#x}", chain.harvester),
            format!("{:#x}", chain.ops),
        );
    }
    Ok(())
}
