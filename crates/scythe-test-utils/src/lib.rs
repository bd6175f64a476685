//! Shared mock gateways for scythe tests.
//!
//! [`MockOps`] and [`MockSdk`] implement the core gateway traits with
//! contract-faithful derivations (keccak over the ABI-encoded tuples the
//! real operations contract hashes) plus a recorded call log, so tests can
//! assert both results and traffic. Failures are scripted per vault, task,
//! or transaction before the mock is handed to a client.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::abi::{Token, encode};
use ethers::types::{Address, Bytes, H256, Selector, TxHash, U256};
use ethers::utils::keccak256;

use scythe_core::TaskId;
use scythe_core::error::CallError;
use scythe_core::ops::OpsContract;
use scythe_core::sdk::AutomationSdk;

// ---------------------------------------------------------------------------
// Deterministic derivations
// ---------------------------------------------------------------------------

/// Contract-faithful resolver hash: keccak of `abi.encode(resolver, data)`.
pub fn resolver_hash_of(resolver: Address, resolver_data: &Bytes) -> H256 {
    H256::from(keccak256(encode(&[
        Token::Address(resolver),
        Token::Bytes(resolver_data.to_vec()),
    ])))
}

/// Contract-faithful task id: keccak of the ABI-encoded creation tuple.
pub fn task_id_of(
    creator: Address,
    exec: Address,
    selector: Selector,
    use_treasury: bool,
    fee_token: Address,
    resolver_hash: H256,
) -> TaskId {
    H256::from(keccak256(encode(&[
        Token::Address(creator),
        Token::Address(exec),
        Token::FixedBytes(selector.to_vec()),
        Token::Bool(use_treasury),
        Token::Address(fee_token),
        Token::FixedBytes(resolver_hash.as_bytes().to_vec()),
    ])))
}

/// Hash [`MockOps`] assigns to the creation transaction for `vault`.
pub fn create_tx_hash(vault: Address) -> TxHash {
    let mut seed = b"create:".to_vec();
    seed.extend_from_slice(vault.as_bytes());
    H256::from(keccak256(seed))
}

/// Hash [`MockSdk`] assigns to the cancellation transaction for `task`.
pub fn cancel_tx_hash(task: TaskId) -> TxHash {
    let mut seed = b"cancel:".to_vec();
    seed.extend_from_slice(task.as_bytes());
    H256::from(keccak256(seed))
}

/// Pull the vault address back out of checker call data
/// (`selector ++ pad32(vault)`).
fn vault_of(resolver_data: &Bytes) -> Address {
    assert_eq!(resolver_data.len(), 36, "checker call data must be 36 bytes");
    Address::from_slice(&resolver_data[16..36])
}

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

/// One observed gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    OwnedTaskIds { owner: Address },
    ResolverHash { resolver: Address, vault: Address },
    TaskIdQuery { creator: Address },
    PreviewCreate { vault: Address, gas_price: Option<U256> },
    SendCreate { vault: Address, gas_price: Option<U256> },
    Confirm { tx: TxHash },
    GasPrice,
    Rename { task: TaskId, label: String },
    Cancel { task: TaskId, gas_price: Option<U256> },
}

impl RecordedCall {
    /// Whether this call submits a state-changing transaction.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RecordedCall::SendCreate { .. } | RecordedCall::Cancel { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// MockOps
// ---------------------------------------------------------------------------

/// Recording mock of the operations contract.
///
/// Derivations attribute created tasks to the `admin` passed at
/// construction, matching what the real contract does with `msg.sender`.
pub struct MockOps {
    admin: Address,
    owned: Vec<TaskId>,
    gas_price: Option<U256>,
    fail_resolver_for: HashSet<Address>,
    fail_preview_for: HashSet<Address>,
    fail_send_for: HashSet<Address>,
    fail_confirm_of: HashSet<TxHash>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockOps {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            owned: Vec::new(),
            gas_price: Some(U256::from(30_000_000_000u64)),
            fail_resolver_for: HashSet::new(),
            fail_preview_for: HashSet::new(),
            fail_send_for: HashSet::new(),
            fail_confirm_of: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script the ids returned by `owned_task_ids`.
    pub fn with_owned(mut self, owned: Vec<TaskId>) -> Self {
        self.owned = owned;
        self
    }

    /// Script the gas price sample; `None` makes the sample fail.
    pub fn with_gas_price(mut self, gas_price: Option<U256>) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Make `resolver_hash` fail whenever the call data targets `vault`.
    pub fn fail_resolver_for(mut self, vault: Address) -> Self {
        self.fail_resolver_for.insert(vault);
        self
    }

    /// Make the creation simulation fail for `vault`.
    pub fn fail_preview_for(mut self, vault: Address) -> Self {
        self.fail_preview_for.insert(vault);
        self
    }

    /// Make the creation submission fail for `vault`.
    pub fn fail_send_for(mut self, vault: Address) -> Self {
        self.fail_send_for.insert(vault);
        self
    }

    /// Make confirmation of `tx` report it as dropped.
    pub fn fail_confirm_of(mut self, tx: TxHash) -> Self {
        self.fail_confirm_of.insert(tx);
        self
    }

    /// Snapshot of every call observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of state-changing calls observed.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.is_mutation())
            .count()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OpsContract for MockOps {
    async fn owned_task_ids(&self, owner: Address) -> Result<Vec<TaskId>, CallError> {
        self.record(RecordedCall::OwnedTaskIds { owner });
        Ok(self.owned.clone())
    }

    async fn resolver_hash(
        &self,
        resolver: Address,
        resolver_data: Bytes,
    ) -> Result<H256, CallError> {
        let vault = vault_of(&resolver_data);
        self.record(RecordedCall::ResolverHash { resolver, vault });
        if self.fail_resolver_for.contains(&vault) {
            return Err(CallError::Transport(format!(
                "resolver hash scripted to fail for {vault:#x}"
            )));
        }
        Ok(resolver_hash_of(resolver, &resolver_data))
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
        self.record(RecordedCall::TaskIdQuery { creator });
        Ok(task_id_of(
            creator,
            exec,
            selector,
            use_treasury,
            fee_token,
            resolver_hash,
        ))
    }

    async fn preview_create_task(
        &self,
        exec: Address,
        selector: Selector,
        resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TaskId, CallError> {
        let vault = vault_of(&resolver_data);
        self.record(RecordedCall::PreviewCreate { vault, gas_price });
        if self.fail_preview_for.contains(&vault) {
            return Err(CallError::Reverted(format!(
                "creation simulation scripted to fail for {vault:#x}"
            )));
        }
        let resolver_hash = resolver_hash_of(resolver, &resolver_data);
        Ok(task_id_of(
            self.admin,
            exec,
            selector,
            true,
            Address::zero(),
            resolver_hash,
        ))
    }

    async fn send_create_task(
        &self,
        _exec: Address,
        _selector: Selector,
        _resolver: Address,
        resolver_data: Bytes,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError> {
        let vault = vault_of(&resolver_data);
        self.record(RecordedCall::SendCreate { vault, gas_price });
        if self.fail_send_for.contains(&vault) {
            return Err(CallError::Reverted(format!(
                "creation scripted to fail for {vault:#x}"
            )));
        }
        Ok(create_tx_hash(vault))
    }

    async fn confirm(&self, tx: TxHash) -> Result<(), CallError> {
        self.record(RecordedCall::Confirm { tx });
        if self.fail_confirm_of.contains(&tx) {
            return Err(CallError::Dropped(tx));
        }
        Ok(())
    }

    async fn gas_price(&self) -> Result<U256, CallError> {
        self.record(RecordedCall::GasPrice);
        self.gas_price
            .ok_or_else(|| CallError::Transport("gas price unavailable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockSdk
// ---------------------------------------------------------------------------

/// Recording mock of the vendor SDK surface.
#[derive(Default)]
pub struct MockSdk {
    fail_rename_for: HashSet<String>,
    fail_cancel_of: HashSet<TaskId>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make renames fail for the given label.
    pub fn fail_rename_for(mut self, label: &str) -> Self {
        self.fail_rename_for.insert(label.to_string());
        self
    }

    /// Make the cancellation submission fail for `task`.
    pub fn fail_cancel_of(mut self, task: TaskId) -> Self {
        self.fail_cancel_of.insert(task);
        self
    }

    /// Snapshot of every call observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of state-changing calls observed.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.is_mutation())
            .count()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AutomationSdk for MockSdk {
    async fn rename_task(&self, task_id: TaskId, label: &str) -> Result<(), CallError> {
        self.record(RecordedCall::Rename {
            task: task_id,
            label: label.to_string(),
        });
        if self.fail_rename_for.contains(label) {
            return Err(CallError::Api(format!(
                "rename scripted to fail for {label:?}"
            )));
        }
        Ok(())
    }

    async fn cancel_task(
        &self,
        task_id: TaskId,
        gas_price: Option<U256>,
    ) -> Result<TxHash, CallError> {
        self.record(RecordedCall::Cancel {
            task: task_id,
            gas_price,
        });
        if self.fail_cancel_of.contains(&task_id) {
            return Err(CallError::Reverted(format!(
                "cancellation scripted to fail for {task_id:#x}"
            )));
        }
        Ok(cancel_tx_hash(task_id))
    }
}
