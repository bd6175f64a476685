//! Shared error type for remote calls against the chain and the task API.

use ethers::types::TxHash;
use thiserror::Error;

/// Failure of a single remote call.
///
/// Single-item client operations propagate these unmodified. Batch
/// operations catch them at the entry boundary, log them, and drop the
/// entry from the result.
#[derive(Debug, Error)]
pub enum CallError {
    /// RPC or HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The contract rejected the call, either during simulation or
    /// on-chain (status-0 receipt).
    #[error("contract call reverted: {0}")]
    Reverted(String),

    /// The transaction left the mempool without ever being mined.
    #[error("transaction {0:#x} dropped before confirmation")]
    Dropped(TxHash),

    /// The task API answered with a non-success status.
    #[error("task api error: {0}")]
    Api(String),
}

#[cfg(test)]
mod tests {
    use ethers::types::H256;

    use super::*;

    #[test]
    fn dropped_message_names_the_full_transaction_hash() {
        let tx = H256::from([0xab; 32]);
        let msg = CallError::Dropped(tx).to_string();
        assert!(msg.contains(&format!("{tx:#x}")), "got: {msg}");
        assert!(msg.contains("dropped"));
    }

    #[test]
    fn variants_render_their_context() {
        assert!(
            CallError::Transport("connection refused".into())
                .to_string()
                .contains("connection refused")
        );
        assert!(
            CallError::Reverted("Ops: createTask: Sender already started task".into())
                .to_string()
                .contains("already started")
        );
        assert!(CallError::Api("status 404".into()).to_string().contains("404"));
    }
}
