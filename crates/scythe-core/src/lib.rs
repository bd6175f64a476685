//! Core library for scythe: register, identify, and cancel recurring
//! on-chain harvest tasks on a transaction-automation network.
//!
//! The center of the crate is [`client::TaskClient`], which sequences calls
//! to two external collaborators, the per-chain automation operations
//! contract (behind [`ops::OpsContract`]) and the network's task API plus
//! cancellation surface (behind [`sdk::AutomationSdk`]), and reduces their
//! results into name-to-id mappings. Batch operations never fail as a whole:
//! each entry settles independently and failures are logged and dropped.

pub mod chain;
pub mod client;
pub mod encode;
pub mod error;
pub mod ops;
pub mod sdk;
pub mod vaults;

use ethers::types::H256;

/// Identifier of a registered automation task: the 32-byte hash the
/// operations contract derives from the task's creation parameters.
pub type TaskId = H256;

pub use error::CallError;
