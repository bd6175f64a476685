//! The task client: list, derive, create, and cancel harvest tasks against
//! one chain's automation deployment.
//!
//! Batch operations settle every entry independently: a failing vault or
//! task id is logged and dropped from the result, never aborting its
//! siblings. Entry keys are `BTreeMap`/`BTreeSet` based so iteration,
//! logging, and results come out in a deterministic order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use anyhow::Result;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Selector, U256};
use futures::future;

use crate::TaskId;
use crate::chain::ChainConfig;
use crate::encode;
use crate::error::CallError;
use crate::ops::{EvmOps, OpsContract, admin_middleware};
use crate::sdk::{AutomationSdk, OpsSdk};

/// Client for one chain's harvest-task deployment.
///
/// Construction is two-phase: [`TaskClient::new`] derives and caches the
/// checker and performUpkeep selectors synchronously, and
/// [`TaskClient::connect`] additionally samples the network gas price once,
/// keeping it as a submission hint for every mutating call.
/// [`TaskClient::for_chain`] wires the JSON-RPC gateways from a
/// [`ChainConfig`] and an admin wallet.
pub struct TaskClient {
    ops: Arc<dyn OpsContract>,
    sdk: Arc<dyn AutomationSdk>,
    chain: ChainConfig,
    admin: Address,
    checker_selector: Selector,
    perform_selector: Selector,
    gas_price: Option<U256>,
    verbose: bool,
}

impl std::fmt::Debug for TaskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskClient")
            .field("chain", &self.chain.label)
            .field("admin", &self.admin)
            .field("gas_price", &self.gas_price)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl TaskClient {
    /// Assemble a client over explicit gateways without touching the
    /// network.
    pub fn new(
        ops: Arc<dyn OpsContract>,
        sdk: Arc<dyn AutomationSdk>,
        chain: ChainConfig,
        admin: Address,
        verbose: bool,
    ) -> Self {
        Self {
            ops,
            sdk,
            chain,
            admin,
            checker_selector: encode::checker_selector(),
            perform_selector: encode::perform_selector(),
            gas_price: None,
            verbose,
        }
    }

    /// Assemble a client and sample the network gas price once.
    ///
    /// A failed sample is logged and left as `None`; the transaction layer
    /// then chooses its own price.
    pub async fn connect(
        ops: Arc<dyn OpsContract>,
        sdk: Arc<dyn AutomationSdk>,
        chain: ChainConfig,
        admin: Address,
        verbose: bool,
    ) -> Self {
        let mut client = Self::new(ops, sdk, chain, admin, verbose);
        match client.ops.gas_price().await {
            Ok(gas_price) => {
                tracing::debug!(
                    chain = %client.chain.label,
                    gas_price = %gas_price,
                    "sampled network gas price"
                );
                client.gas_price = Some(gas_price);
            }
            Err(e) => {
                tracing::warn!(
                    chain = %client.chain.label,
                    error = %e,
                    "gas price sample failed; the transaction layer will pick one"
                );
            }
        }
        client
    }

    /// Connect the JSON-RPC gateways for `chain` with the admin `wallet`.
    pub async fn for_chain(
        chain: ChainConfig,
        wallet: LocalWallet,
        verbose: bool,
    ) -> Result<Self> {
        let admin = wallet.address();
        let middleware = admin_middleware(&chain, wallet)?;
        let ops = Arc::new(EvmOps::new(&chain, Arc::clone(&middleware)));
        let sdk = Arc::new(OpsSdk::new(&chain, middleware));
        tracing::info!(chain = %chain.label, admin = ?admin, "connecting task client");
        Ok(Self::connect(ops, sdk, chain, admin, verbose).await)
    }

    /// Human-readable label of the chain this client operates on.
    pub fn chain_label(&self) -> &str {
        &self.chain.label
    }

    /// Address whose key signs every transaction and owns every task.
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Gas-price hint sampled at connect time, if the sample succeeded.
    pub fn gas_price_hint(&self) -> Option<U256> {
        self.gas_price
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl TaskClient {
    /// All task ids the admin identity currently owns, in contract order.
    pub async fn owned_task_ids(&self) -> Result<Vec<TaskId>, CallError> {
        let ids = self.ops.owned_task_ids(self.admin).await?;
        tracing::info!(
            chain = %self.chain.label,
            count = ids.len(),
            "retrieved task ids"
        );
        Ok(ids)
    }

    /// Derive the task id the contract would assign for `vault`, without
    /// submitting anything.
    ///
    /// Mirrors the creation parameters exactly: the harvester as both exec
    /// and resolver target, treasury funding, and the zero-address fee
    /// token, so the result matches what [`Self::create_tasks`] registers.
    pub async fn compute_task_id(&self, vault: Address) -> Result<TaskId, CallError> {
        let resolver_data = encode::checker_calldata(self.checker_selector, vault);
        if self.verbose {
            tracing::debug!(
                chain = %self.chain.label,
                resolver = ?self.chain.harvester,
                resolver_data = %resolver_data,
                "querying resolver hash"
            );
        }
        let resolver_hash = self
            .ops
            .resolver_hash(self.chain.harvester, resolver_data)
            .await?;

        if self.verbose {
            tracing::debug!(
                chain = %self.chain.label,
                task_creator = ?self.admin,
                exec_address = ?self.chain.harvester,
                selector = %hex::encode(self.perform_selector),
                use_treasury = true,
                fee_token = ?encode::TREASURY_FEE_TOKEN,
                resolver_hash = ?resolver_hash,
                "querying task id"
            );
        }
        self.ops
            .task_id(
                self.admin,
                self.chain.harvester,
                self.perform_selector,
                true,
                encode::TREASURY_FEE_TOKEN,
                resolver_hash,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Batch mutations
// ---------------------------------------------------------------------------

impl TaskClient {
    /// Create one task per named vault, concurrently.
    ///
    /// Every entry runs the full sequence simulate, submit, confirm, label;
    /// a failure at any step fails only that entry. Returns the successful
    /// entries keyed by vault name, or `None` when the input was empty or
    /// nothing succeeded.
    pub async fn create_tasks(
        &self,
        vaults: &BTreeMap<String, Address>,
    ) -> Option<BTreeMap<String, TaskId>> {
        if vaults.is_empty() {
            return None;
        }

        // Batches are operator-sized, so the fan-out is uncapped; the nonce
        // manager under the ops gateway keeps concurrent submissions valid.
        let jobs = vaults.iter().map(|(name, vault)| {
            let name = name.clone();
            let vault = *vault;
            async move {
                let outcome = self.create_named_task(&name, vault).await;
                (name, outcome)
            }
        });
        let settled = future::join_all(jobs).await;

        let mut created = BTreeMap::new();
        for (name, outcome) in settled {
            match outcome {
                Ok(task_id) => {
                    tracing::info!(
                        chain = %self.chain.label,
                        vault = %name,
                        task_id = ?task_id,
                        "task created"
                    );
                    created.insert(name, task_id);
                }
                Err(e) => {
                    tracing::error!(
                        chain = %self.chain.label,
                        vault = %name,
                        error = %e,
                        "failed to set up task"
                    );
                }
            }
        }

        if created.is_empty() { None } else { Some(created) }
    }

    /// Cancel every task in `task_ids`, concurrently.
    ///
    /// Returns the successfully cancelled ids keyed by a synthetic
    /// `task-{n}` placeholder, or `None` when the input was empty or
    /// nothing succeeded. The index is zero-padded to the batch width
    /// so the keys sort in input order.
    pub async fn delete_tasks(
        &self,
        task_ids: &BTreeSet<TaskId>,
    ) -> Option<BTreeMap<String, TaskId>> {
        if task_ids.is_empty() {
            return None;
        }

        let width = task_ids.len().to_string().len();
        let jobs = task_ids.iter().enumerate().map(|(index, task_id)| {
            let task_id = *task_id;
            // TODO: take a name-to-id mapping so results can carry the
            // caller's labels; a bare id set leaves only a sequence key.
            let key = format!("task-{index:0width$}");
            async move {
                let outcome = self.cancel_one(task_id).await;
                (key, task_id, outcome)
            }
        });
        let settled = future::join_all(jobs).await;

        let mut cancelled = BTreeMap::new();
        for (key, task_id, outcome) in settled {
            match outcome {
                Ok(()) => {
                    tracing::info!(
                        chain = %self.chain.label,
                        task_id = ?task_id,
                        "task cancelled"
                    );
                    cancelled.insert(key, task_id);
                }
                Err(e) => {
                    tracing::error!(
                        chain = %self.chain.label,
                        task_id = ?task_id,
                        error = %e,
                        "failed to cancel task"
                    );
                }
            }
        }

        if cancelled.is_empty() {
            None
        } else {
            Some(cancelled)
        }
    }

    /// On-chain and vendor-side setup for one vault's task.
    async fn create_named_task(&self, name: &str, vault: Address) -> Result<TaskId, CallError> {
        let task_id = self.create_task(vault).await?;
        self.sdk.rename_task(task_id, name).await?;
        Ok(task_id)
    }

    /// The on-chain half of creation: simulate to learn the assigned id,
    /// submit, wait for the receipt.
    async fn create_task(&self, vault: Address) -> Result<TaskId, CallError> {
        let harvester = self.chain.harvester;
        let resolver_data = encode::checker_calldata(self.checker_selector, vault);

        if self.verbose {
            tracing::debug!(
                chain = %self.chain.label,
                vault = ?vault,
                exec_address = ?harvester,
                selector = %hex::encode(self.perform_selector),
                resolver = ?harvester,
                resolver_data = %resolver_data,
                "creating task"
            );
        }

        let task_id = self
            .ops
            .preview_create_task(
                harvester,
                self.perform_selector,
                harvester,
                resolver_data.clone(),
                self.gas_price,
            )
            .await?;

        let tx = self
            .ops
            .send_create_task(
                harvester,
                self.perform_selector,
                harvester,
                resolver_data,
                self.gas_price,
            )
            .await?;
        tracing::debug!(
            chain = %self.chain.label,
            vault = ?vault,
            tx = ?tx,
            "awaiting creation receipt"
        );
        self.ops.confirm(tx).await?;
        Ok(task_id)
    }

    async fn cancel_one(&self, task_id: TaskId) -> Result<(), CallError> {
        let tx = self.sdk.cancel_task(task_id, self.gas_price).await?;
        tracing::debug!(
            chain = %self.chain.label,
            task_id = ?task_id,
            tx = ?tx,
            "awaiting cancellation receipt"
        );
        self.ops.confirm(tx).await
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Partition of a desired vault list against the tasks that exist on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Vaults with no registered task yet.
    pub missing: BTreeMap<String, Address>,
    /// Vaults whose task already exists, with its id.
    pub active: BTreeMap<String, TaskId>,
    /// Owned task ids matching no vault in the list.
    pub stale: BTreeSet<TaskId>,
}

impl SyncPlan {
    /// True when the registered tasks already match the vault list.
    pub fn is_settled(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }
}

impl TaskClient {
    /// Compare a vault list against the admin's registered tasks.
    ///
    /// Read-only: derives every vault's expected task id and partitions the
    /// list into missing, active, and stale. Unlike the batch mutations,
    /// any failed call aborts the whole plan, as a partial plan would
    /// misreport vaults as missing.
    pub async fn sync_plan(
        &self,
        vaults: &BTreeMap<String, Address>,
    ) -> Result<SyncPlan, CallError> {
        let owned: HashSet<TaskId> = self
            .ops
            .owned_task_ids(self.admin)
            .await?
            .into_iter()
            .collect();

        let jobs = vaults.iter().map(|(name, vault)| {
            let name = name.clone();
            let vault = *vault;
            async move {
                let outcome = self.compute_task_id(vault).await;
                (name, vault, outcome)
            }
        });
        let settled = future::join_all(jobs).await;

        let mut plan = SyncPlan {
            missing: BTreeMap::new(),
            active: BTreeMap::new(),
            stale: BTreeSet::new(),
        };
        let mut expected = HashSet::new();
        for (name, vault, outcome) in settled {
            let task_id = outcome?;
            expected.insert(task_id);
            if owned.contains(&task_id) {
                plan.active.insert(name, task_id);
            } else {
                plan.missing.insert(name, vault);
            }
        }
        plan.stale = owned.into_iter().filter(|id| !expected.contains(id)).collect();

        tracing::info!(
            chain = %self.chain.label,
            active = plan.active.len(),
            missing = plan.missing.len(),
            stale = plan.stale.len(),
            "computed sync plan"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::H256;

    use super::*;

    #[test]
    fn sync_plan_is_settled_only_without_missing_and_stale() {
        let mut plan = SyncPlan {
            missing: BTreeMap::new(),
            active: BTreeMap::new(),
            stale: BTreeSet::new(),
        };
        assert!(plan.is_settled());

        plan.active.insert("usdc-weth".to_string(), H256::zero());
        assert!(plan.is_settled());

        plan.stale.insert(H256::from([1u8; 32]));
        assert!(!plan.is_settled());

        plan.stale.clear();
        plan.missing
            .insert("wmatic-usdt".to_string(), Address::zero());
        assert!(!plan.is_settled());
    }
}
