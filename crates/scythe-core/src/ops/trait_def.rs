//! The `OpsContract` trait -- the client's seam to the operations contract.
//!
//! The concrete implementation ([`super::EvmOps`]) speaks JSON-RPC through
//! ethers bindings; tests substitute recording mocks. The trait is
//! intentionally object-safe so the client can hold it as
//! `Arc<dyn OpsContract>`.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, Selector, TxHash, U256};

use crate::TaskId;
use crate::error::CallError;

/// Remote interface of the per-chain automation operations contract.
///
/// The first three methods are read-only view calls; `preview_create_task`
/// is a simulated (eth_call) run of the creation path and also read-only.
/// Only `send_create_task` submits a transaction.
#[async_trait]
pub trait OpsContract: Send + Sync {
    /// All task ids currently owned by `owner`, in contract order.
    async fn owned_task_ids(&self, owner: Address) -> Result<Vec<TaskId>, CallError>;

    /// The contract's hash of (resolver address, resolver call data).
    async fn resolver_hash(
        &self,
        resolver: Address,
        resolver_data: Bytes,
    ) -> Result<H256, CallError>;

    /// Deterministic task id for the full creation-parameter tuple.
    async fn task_id(
        &self,
        creator: Address,
        exec: Address,
        selector: Selector,
        use_treasury: bool,
        fee_token: Address,
        resolver_hash: H256,
    ) -> Result<TaskId, CallError>;

    /// Simulate `createTask` to learn the id it would assign, without
    /// changing any state.
    async fn preview_create_task(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TaskId, CallError>;

    /// Submit the real `createTask` transaction.
    async fn send_create_task(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError>;

    /// Wait until `tx` is mined, distinguishing a dropped transaction
    /// ([`CallError::Dropped`]) from an on-chain revert
    /// ([`CallError::Reverted`]).
    async fn confirm(&self, tx: TxHash) -> Result<(), CallError>;

    /// Current network gas price, sampled once by the client factory and
    /// passed as a hint to every mutating call.
    async fn gas_price(&self) -> Result<U256, CallError>;
}

// Compile-time assertion: OpsContract must be object-safe.
// If this line compiles, the trait can be used as `dyn OpsContract`.
const _: () = {
    fn _assert_object_safe(_: &dyn OpsContract) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    /// A trivial gateway that answers with fixed values, used only to
    /// prove the trait can be implemented and used as `dyn OpsContract`.
    struct NoopOps;

    #[async_trait]
    impl OpsContract for NoopOps {
        async fn owned_task_ids(&self, _owner: Address) -> Result<Vec<TaskId>, CallError> {
            Ok(Vec::new())
        }

        async fn resolver_hash(
            &self,
            _resolver: Address,
            _resolver_data: Bytes,
        ) -> Result<H256, CallError> {
            Ok(H256::zero())
        }

        async fn task_id(
            &self,
            _creator: Address,
            _exec: Address,
            _selector: Selector,
            _use_treasury: bool,
            _fee_token: Address,
            _resolver_hash: H256,
        ) -> Result<TaskId, CallError> {
            Ok(H256::zero())
        }

        async fn preview_create_task(
            &self,
            _exec: Address,
            _selector: Selector,
            _resolver: Address,
            _resolver_data: Bytes,
            _gas_price: Option<U256>,
        ) -> Result<TaskId, CallError> {
            Ok(H256::zero())
        }

        async fn send_create_task(
            &self,
            _exec: Address,
            _selector: Selector,
            _resolver: Address,
            _resolver_data: Bytes,
            _gas_price: Option<U256>,
        ) -> Result<TxHash, CallError> {
            Ok(TxHash::zero())
        }

        async fn confirm(&self, _tx: TxHash) -> Result<(), CallError> {
            Ok(())
        }

        async fn gas_price(&self) -> Result<U256, CallError> {
            Err(CallError::Transport("noop has no gas price".to_string()))
        }
    }

    #[test]
    fn ops_contract_is_object_safe() {
        // If this compiles, the trait is object-safe.
        let _ops: Box<dyn OpsContract> = Box::new(NoopOps);
    }

    #[tokio::test]
    async fn noop_ops_answers_through_the_trait_object() {
        let ops: Box<dyn OpsContract> = Box::new(NoopOps);

        let ids = ops.owned_task_ids(Address::zero()).await.unwrap();
        assert!(ids.is_empty());

        let hash = ops
            .resolver_hash(Address::zero(), Bytes::default())
            .await
            .unwrap();
        assert_eq!(hash, H256::zero());

        assert!(ops.gas_price().await.is_err());
        ops.confirm(TxHash::zero()).await.unwrap();
    }
}
