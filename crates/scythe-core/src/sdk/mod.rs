//! Gateway to the automation network's vendor surface.
//!
//! Task labels live off-chain in the network's task API (a rename is an
//! HTTP PUT); cancellation is an on-chain call against the operations
//! contract. Both travel through [`AutomationSdk`] so the client sees one
//! collaborator and tests can substitute a recording mock.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{TxHash, U256};
use serde_json::json;

use crate::TaskId;
use crate::chain::ChainConfig;
use crate::error::CallError;
use crate::ops::{AdminMiddleware, Ops, contract_error};

/// Vendor-side operations on registered tasks.
#[async_trait]
pub trait AutomationSdk: Send + Sync {
    /// Attach a human-readable label to a task in the network's task API.
    async fn rename_task(&self, task_id: TaskId, label: &str) -> Result<(), CallError>;

    /// Submit the `cancelTask` transaction for a task the admin owns.
    async fn cancel_task(
        &self,
        task_id: TaskId,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError>;
}

// Compile-time assertion: AutomationSdk must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn AutomationSdk) {}
};

/// [`AutomationSdk`] backed by the network's HTTP task API and the
/// deployed operations contract.
pub struct OpsSdk {
    http: reqwest::Client,
    api_url: String,
    chain_id: u64,
    contract: Ops<AdminMiddleware>,
}

impl OpsSdk {
    pub fn new(chain: &ChainConfig, middleware: Arc<AdminMiddleware>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: chain.task_api_url.trim_end_matches('/').to_string(),
            chain_id: chain.chain_id,
            contract: Ops::new(chain.ops, middleware),
        }
    }

    fn rename_url(&self, task_id: TaskId) -> String {
        format!("{}/tasks/{}/{:#x}", self.api_url, self.chain_id, task_id)
    }
}

impl std::fmt::Debug for OpsSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsSdk")
            .field("api_url", &self.api_url)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[async_trait]
impl AutomationSdk for OpsSdk {
    async fn rename_task(&self, task_id: TaskId, label: &str) -> Result<(), CallError> {
        let url = self.rename_url(task_id);
        tracing::debug!(url = %url, label = %label, "renaming task");

        let response = self
            .http
            .put(&url)
            .json(&json!({ "name": label }))
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallError::Api(format!(
                "rename of {task_id:#x} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn cancel_task(
        &self,
        task_id: TaskId,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError> {
        let mut call = self.contract.cancel_task(task_id.to_fixed_bytes());
        if let Some(gas_price) = gas_price {
            call = call.gas_price(gas_price);
        }
        let pending = call.send().await.map_err(contract_error)?;
        Ok(*pending)
    }
}
