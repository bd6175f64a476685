//! Gateway to the automation operations contract.

mod evm;
mod trait_def;

pub use evm::{AdminMiddleware, EvmOps, admin_middleware};
pub(crate) use evm::{Ops, contract_error};
pub use trait_def::OpsContract;
