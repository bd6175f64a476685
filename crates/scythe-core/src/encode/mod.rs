//! Deterministic encoding of the fixed checker / performUpkeep call shapes.
//!
//! Selectors are derived locally (keccak over the fixed signatures) and
//! cached by the client at construction. Checker call data is standard ABI
//! argument packing: the 4-byte selector followed by the vault address
//! left-padded to a 32-byte word.

use ethers::types::{Address, Bytes, H160, Selector};
use ethers::utils::id;

/// Signature of the read-only predicate the automation network polls.
pub const CHECKER_SIG: &str = "checker(address)";

/// Signature of the harvester action the network invokes when the
/// predicate returns true.
pub const PERFORM_UPKEEP_SIG: &str =
    "performUpkeep(address,uint256,uint256,uint256,uint256,bool)";

/// Fee-token sentinel for tasks that are not prepaid per-execution: the
/// zero address tells the network to draw fees from its shared treasury.
pub const TREASURY_FEE_TOKEN: Address = H160([0u8; 20]);

/// Four-byte selector of [`CHECKER_SIG`].
pub fn checker_selector() -> Selector {
    id(CHECKER_SIG)
}

/// Four-byte selector of [`PERFORM_UPKEEP_SIG`].
pub fn perform_selector() -> Selector {
    id(PERFORM_UPKEEP_SIG)
}

/// Build the resolver call data the network uses to poll the checker:
/// `selector ++ pad32(vault)`, 36 bytes total.
pub fn checker_calldata(selector: Selector, vault: Address) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(vault.as_bytes());
    data.into()
}
