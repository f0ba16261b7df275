use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use shared::{
    error::ProviderError,
    protocol::{TransactionReceipt, TransactionRequest},
};
use thiserror::Error;

use crate::provider::WalletProvider;

sol! {
    function click();
    function getClicks(address player) view returns (uint256);
    function owner() view returns (address);
    event Clicked(address indexed player, uint256 totalClicks);
}

#[derive(Debug, Clone, Error)]
pub enum ContractError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("could not decode {method} return data: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("contract handle is read-only; a signer is required for {0}")]
    ReadOnly(&'static str),
}

/// A decoded `Clicked` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickedEvent {
    pub player: Address,
    pub total_clicks: U256,
}

/// The click-counter contract bound to one provider, optionally with a
/// signing account. Read-only and signing handles are separate values.
#[derive(Clone)]
pub struct ContractHandle {
    address: Address,
    provider: Arc<dyn WalletProvider>,
    signer: Option<Address>,
}

impl ContractHandle {
    pub fn read_only(address: Address, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            address,
            provider,
            signer: None,
        }
    }

    pub fn signing(address: Address, provider: Arc<dyn WalletProvider>, signer: Address) -> Self {
        Self {
            address,
            provider,
            signer: Some(signer),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn owner(&self) -> Result<Address, ContractError> {
        let data = self.read(ownerCall {}.abi_encode()).await?;
        ownerCall::abi_decode_returns(&data).map_err(|err| ContractError::Decode {
            method: "owner",
            reason: err.to_string(),
        })
    }

    pub async fn get_clicks(&self, player: Address) -> Result<U256, ContractError> {
        let data = self.read(getClicksCall { player }.abi_encode()).await?;
        getClicksCall::abi_decode_returns(&data).map_err(|err| ContractError::Decode {
            method: "getClicks",
            reason: err.to_string(),
        })
    }

    /// Sends `click()` from the signer and returns the transaction hash.
    pub async fn click(&self) -> Result<B256, ContractError> {
        let from = self.signer.ok_or(ContractError::ReadOnly("click"))?;
        let request = TransactionRequest {
            from: Some(from),
            to: self.address,
            data: clickCall {}.abi_encode().into(),
        };
        Ok(self.provider.send_transaction(&request).await?)
    }

    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        let request = TransactionRequest {
            from: self.signer,
            to: self.address,
            data: data.into(),
        };
        let output = self.provider.call(&request).await?;
        Ok(output.to_vec())
    }

    /// `Clicked` events emitted by this contract in the given receipt.
    pub fn clicked_events(&self, receipt: &TransactionReceipt) -> Vec<ClickedEvent> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter_map(|log| {
                let (signature, player) = match log.topics.as_slice() {
                    [signature, player, ..] => (signature, player),
                    _ => return None,
                };
                if *signature != Clicked::SIGNATURE_HASH || log.data.len() < 32 {
                    return None;
                }
                Some(ClickedEvent {
                    player: Address::from_word(*player),
                    total_clicks: U256::from_be_slice(&log.data[..32]),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;
