use std::fmt;

use alloy_primitives::B256;
use shared::error::ProviderError;
use thiserror::Error;

use crate::contract::ContractError;

#[derive(Debug, Clone, Error)]
pub enum NetworkSwitchError {
    /// The switch request failed for a reason other than an unknown chain.
    #[error(transparent)]
    Switch(ProviderError),
    #[error("failed to register network {network}: {source}")]
    Registration {
        network: String,
        source: ProviderError,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    #[error("no eligible wallet found; install the wallet or disable competing wallet extensions")]
    NoWalletFound,
    #[error(transparent)]
    NetworkSwitch(#[from] NetworkSwitchError),
    #[error("account request rejected: {0}")]
    UserRejected(ProviderError),
    #[error("account request failed: {0}")]
    AccountRequest(ProviderError),
    #[error("wallet returned no accounts")]
    NoAccounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRead {
    Owner,
    Clicks,
}

impl fmt::Display for ContractRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("contract owner"),
            Self::Clicks => f.write_str("click count"),
        }
    }
}

/// One contract read that failed; siblings are unaffected.
#[derive(Debug, Clone, Error)]
#[error("failed to read {read}: {source}")]
pub struct ReadFailure {
    pub read: ContractRead,
    pub source: ContractError,
}

#[derive(Debug, Clone, Error)]
pub enum ClickError {
    #[error("please connect a wallet first")]
    NotConnected,
    #[error("no eligible wallet found")]
    NoWalletFound,
    #[error("a click transaction is already being processed")]
    AlreadyPending,
    #[error(transparent)]
    Network(#[from] NetworkSwitchError),
    #[error("could not obtain signer: {0}")]
    Signer(ProviderError),
    #[error("wallet exposes no signing account")]
    NoSigner,
    #[error("transaction failed or rejected: {0}")]
    SubmissionRejected(ContractError),
    #[error("waiting for confirmation of {tx_hash} failed: {source}")]
    Confirmation {
        tx_hash: B256,
        source: ProviderError,
    },
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
    #[error(transparent)]
    Read(#[from] ReadFailure),
}
