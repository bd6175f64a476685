//! JSON-RPC implementation of [`OpsContract`] backed by ethers bindings.
//!
//! All calls go through one shared middleware stack per chain: a nonce
//! manager over a signing middleware over the HTTP provider. The nonce
//! manager serializes nonce assignment, which is what lets the client fan
//! out an entire batch of transactions concurrently.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::contract::{ContractCall, ContractError, abigen};
use ethers::middleware::{NonceManagerMiddleware, SignerMiddleware};
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, Selector, TxHash, U64, U256};

use super::trait_def::OpsContract;
use crate::TaskId;
use crate::chain::ChainConfig;
use crate::error::CallError;

abigen!(
    Ops,
    r#"[
        function getTaskIdsByUser(address) external view returns (bytes32[])
        function getResolverHash(address, bytes) external pure returns (bytes32)
        function getTaskId(address, address, bytes4, bool, address, bytes32) external pure returns (bytes32)
        function createTask(address, bytes4, address, bytes) external returns (bytes32)
        function cancelTask(bytes32) external
    ]"#,
);

/// Middleware stack used for every admin-signed call.
pub type AdminMiddleware =
    NonceManagerMiddleware<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// Build the shared admin middleware for a chain: HTTP provider, signer
/// bound to the chain id, nonce manager keyed to the admin address.
pub fn admin_middleware(
    chain: &ChainConfig,
    wallet: LocalWallet,
) -> Result<Arc<AdminMiddleware>> {
    let provider = Provider::<Http>::try_from(chain.rpc_url.as_str()).with_context(|| {
        format!("invalid RPC URL for chain {}: {}", chain.label, chain.rpc_url)
    })?;
    let wallet = wallet.with_chain_id(chain.chain_id);
    let admin = wallet.address();
    let signer = SignerMiddleware::new(provider, wallet);
    Ok(Arc::new(NonceManagerMiddleware::new(signer, admin)))
}

/// Map a contract-level failure onto [`CallError`], pulling out the revert
/// reason string when the node supplied one.
pub(crate) fn contract_error<M: Middleware>(err: ContractError<M>) -> CallError {
    if err.is_revert() {
        let reason = err
            .decode_revert::<String>()
            .unwrap_or_else(|| err.to_string());
        CallError::Reverted(reason)
    } else {
        CallError::Transport(err.to_string())
    }
}

/// [`OpsContract`] bound to the deployed operations contract of one chain.
pub struct EvmOps {
    contract: Ops<AdminMiddleware>,
    middleware: Arc<AdminMiddleware>,
}

impl EvmOps {
    pub fn new(chain: &ChainConfig, middleware: Arc<AdminMiddleware>) -> Self {
        let contract = Ops::new(chain.ops, Arc::clone(&middleware));
        Self {
            contract,
            middleware,
        }
    }

    fn provider(&self) -> &Provider<Http> {
        self.middleware.provider()
    }

    /// Build the `createTask` call; preview and send share it so the
    /// simulated and submitted parameters cannot drift apart.
    fn create_call(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> ContractCall<AdminMiddleware, [u8; 32]> {
        let mut call = self
            .contract
            .create_task(exec, selector, resolver, resolver_data);
        if let Some(gas_price) = gas_price {
            call = call.gas_price(gas_price);
        }
        call
    }
}

impl std::fmt::Debug for EvmOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmOps")
            .field("contract", &self.contract.address())
            .finish()
    }
}

#[async_trait]
impl OpsContract for EvmOps {
    async fn owned_task_ids(&self, owner: Address) -> Result<Vec<TaskId>, CallError> {
        let raw = self
            .contract
            .get_task_ids_by_user(owner)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(raw.into_iter().map(H256::from).collect())
    }

    async fn resolver_hash(
        &self,
        resolver: Address,
        resolver_data: Bytes,
    ) -> Result<H256, CallError> {
        let raw = self
            .contract
            .get_resolver_hash(resolver, resolver_data)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(H256::from(raw))
    }

    async fn task_id(
        &self,
        creator: Address,
        exec: Address,
        selector: Selector,
        use_treasury: bool,
        fee_token: Address,
        resolver_hash: H256,
    ) -> Result<TaskId, CallError> {
        let raw = self
            .contract
            .get_task_id(
                creator,
                exec,
                selector,
                use_treasury,
                fee_token,
                resolver_hash.to_fixed_bytes(),
            )
            .call()
            .await
            .map_err(contract_error)?;
        Ok(H256::from(raw))
    }

    async fn preview_create_task(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TaskId, CallError> {
        let raw = self
            .create_call(exec, selector, resolver, resolver_data, gas_price)
            .call()
            .await
            .map_err(contract_error)?;
        Ok(H256::from(raw))
    }

    async fn send_create_task(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError> {
        let call = self.create_call(exec, selector, resolver, resolver_data, gas_price);
        let pending = call.send().await.map_err(contract_error)?;
        Ok(*pending)
    }

    async fn confirm(&self, tx: TxHash) -> Result<(), CallError> {
        let receipt = PendingTransaction::new(tx, self.provider())
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        match receipt {
            Some(receipt) if receipt.status == Some(U64::from(1)) => Ok(()),
            Some(_) => Err(CallError::Reverted(format!(
                "transaction {tx:#x} reverted on-chain"
            ))),
            None => Err(CallError::Dropped(tx)),
        }
    }

    async fn gas_price(&self) -> Result<U256, CallError> {
        self.middleware
            .get_gas_price()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use ethers::abi::Token;
    use ethers::utils::id;

    use super::*;

    fn revert_payload(reason: &str) -> Bytes {
        // Standard Error(string) revert data: selector ++ abi.encode(reason).
        let mut data = id("Error(string)").to_vec();
        data.extend(ethers::abi::encode(&[Token::String(reason.to_string())]));
        data.into()
    }

    #[test]
    fn revert_errors_surface_the_reason_string() {
        let err = ContractError::<Provider<Http>>::Revert(revert_payload(
            "Ops: createTask: Sender already started task",
        ));
        match contract_error(err) {
            CallError::Reverted(reason) => assert!(
                reason.contains("already started task"),
                "got: {reason}"
            ),
            other => panic!("expected Reverted, got {other:?}"),
        }
    }

    #[test]
    fn non_revert_errors_map_to_transport() {
        let err = ContractError::<Provider<Http>>::ContractNotDeployed;
        assert!(matches!(contract_error(err), CallError::Transport(_)));
    }

    #[test]
    fn middleware_builds_from_a_valid_chain_config() {
        let chain = ChainConfig {
            chain_id: 137,
            label: "polygon".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            harvester: Address::from([0x11; 20]),
            ops: Address::from([0x22; 20]),
            task_api_url: "http://localhost:9000".to_string(),
        };
        let wallet: LocalWallet = "aa".repeat(32).parse().expect("static test key");
        let middleware = admin_middleware(&chain, wallet).unwrap();
        let ops = EvmOps::new(&chain, middleware);
        assert_eq!(ops.contract.address(), chain.ops);
    }

    #[test]
    fn middleware_rejects_an_unparseable_rpc_url() {
        let chain = ChainConfig {
            chain_id: 1,
            label: "bad".to_string(),
            rpc_url: "not a url".to_string(),
            harvester: Address::from([0x11; 20]),
            ops: Address::from([0x22; 20]),
            task_api_url: "http://localhost:9000".to_string(),
        };
        let wallet: LocalWallet = "aa".repeat(32).parse().unwrap();
        assert!(admin_middleware(&chain, wallet).is_err());
    }
}
