//! Per-chain configuration: identifiers, endpoints, and the two contract
//! addresses the client talks to.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for a [`ChainConfig`].
#[derive(Debug, Error)]
pub enum ChainConfigError {
    #[error("chain label must not be empty")]
    EmptyLabel,

    #[error("chain {label:?} has no RPC URL")]
    EmptyRpcUrl { label: String },

    #[error("chain {label:?} has no task API URL")]
    EmptyTaskApiUrl { label: String },

    #[error("chain {label:?}: {field} is the zero address")]
    ZeroAddress { label: String, field: &'static str },
}

/// Static description of one chain deployment.
///
/// `harvester` is the contract whose `performUpkeep` the network invokes
/// and whose `checker` it polls; `ops` is the network's operations
/// contract on the same chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain id, used for transaction signing and task API paths.
    pub chain_id: u64,
    /// Human-readable name used in logs and operator output.
    #[serde(default)]
    pub label: String,
    /// HTTP JSON-RPC endpoint.
    pub rpc_url: String,
    /// Target harvester contract (exec and resolver target of every task).
    pub harvester: Address,
    /// Automation operations contract.
    pub ops: Address,
    /// Base URL of the network's task API (task labels live there).
    pub task_api_url: String,
}

impl ChainConfig {
    /// Check the fields the client depends on.
    ///
    /// The zero address is rejected for both contracts: it doubles as the
    /// treasury fee-token sentinel and never denotes a deployment.
    pub fn validate(&self) -> Result<(), ChainConfigError> {
        if self.label.is_empty() {
            return Err(ChainConfigError::EmptyLabel);
        }
        if self.rpc_url.is_empty() {
            return Err(ChainConfigError::EmptyRpcUrl {
                label: self.label.clone(),
            });
        }
        if self.task_api_url.is_empty() {
            return Err(ChainConfigError::EmptyTaskApiUrl {
                label: self.label.clone(),
            });
        }
        if self.harvester.is_zero() {
            return Err(ChainConfigError::ZeroAddress {
                label: self.label.clone(),
                field: "harvester",
            });
        }
        if self.ops.is_zero() {
            return Err(ChainConfigError::ZeroAddress {
                label: self.label.clone(),
                field: "ops",
            });
        }
        Ok(())
    }
}
