//! Execute the `scythe task-id` command: derive a vault's task id without
//! submitting anything.

use anyhow::{Context, Result};
use ethers::types::Address;

use scythe_core::client::TaskClient;

pub async fn run_task_id(client: &TaskClient, vault: &str) -> Result<()> {
    let vault: Address = vault
        .parse()
        .with_context(|| format!("invalid vault address: {vault}"))?;

    let task_id = client.compute_task_id(vault).await?;
    println!("{task_id:#x}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ethers::types::Address;

    use scythe_core::chain::ChainConfig;
    use scythe_test_utils::{MockOps, MockSdk};

    use super::*;

    fn test_client() -> TaskClient {
        let chain = ChainConfig {
            chain_id: 137,
            label: "polygon".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            harvester: Address::from([0x11; 20]),
            ops: Address::from([0x22; 20]),
            task_api_url: "http://localhost:9000".to_string(),
        };
        TaskClient::new(
            Arc::new(MockOps::new(Address::from([0xAD; 20]))),
            Arc::new(MockSdk::new()),
            chain,
            Address::from([0xAD; 20]),
            false,
        )
    }

    #[tokio::test]
    async fn rejects_a_malformed_address() {
        let client = test_client();
        let err = run_task_id(&client, "0xnope").await.unwrap_err();
        assert!(err.to_string().contains("invalid vault address"));
    }

    #[tokio::test]
    async fn accepts_a_checksummed_address() {
        let client = test_client();
        run_task_id(&client, "0xAaBbCcDdEeFf00112233445566778899aAbBcCdD")
            .await
            .unwrap();
    }
}
