//! Operator-authored vault lists: the TOML input for batch task creation.
//!
//! ```toml
//! [vaults]
//! usdc-weth = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
//! wmatic-usdt = "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"
//! ```
//!
//! Names become task labels in the network's task API, so they should be
//! stable and human-meaningful.

use std::collections::BTreeMap;

use ethers::types::Address;
use serde::Deserialize;
use thiserror::Error;

/// Errors from parsing a vault list.
#[derive(Debug, Error)]
pub enum VaultsError {
    #[error("invalid vault list: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("vault list contains no vaults")]
    Empty,

    #[error("vault {name:?} has an invalid address {value:?}")]
    InvalidAddress { name: String, value: String },
}

#[derive(Debug, Deserialize)]
struct VaultsFile {
    #[serde(default)]
    vaults: BTreeMap<String, String>,
}

/// Parse and validate a vault list.
///
/// Map iteration order (and therefore log and output order downstream) is
/// the names' sort order, not file order.
pub fn parse_vaults_toml(content: &str) -> Result<BTreeMap<String, Address>, VaultsError> {
    let file: VaultsFile = toml::from_str(content)?;
    if file.vaults.is_empty() {
        return Err(VaultsError::Empty);
    }

    let mut vaults = BTreeMap::new();
    for (name, value) in file.vaults {
        let address = value
            .parse::<Address>()
            .map_err(|_| VaultsError::InvalidAddress {
                name: name.clone(),
                value: value.clone(),
            })?;
        vaults.insert(name, address);
    }
    Ok(vaults)
}
