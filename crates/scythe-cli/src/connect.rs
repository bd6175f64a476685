//! Shared client construction for the chain-facing commands.

use anyhow::Result;

use scythe_core::client::TaskClient;

use crate::config;

/// Resolve the target chain plus admin wallet and connect a [`TaskClient`].
pub async fn connect_client(cli_chain: Option<&str>, verbose: bool) -> Result<TaskClient> {
    let target = config::resolve_target(cli_chain)?;
    TaskClient::for_chain(target.chain, target.wallet, verbose).await
}
