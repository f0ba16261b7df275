use alloy_primitives::{Address, B256, U256};

use crate::error::ReadFailure;

pub const SUCCESS_MESSAGE: &str = "Transaction successful! 🎉";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSession {
    pub account: Address,
}

/// Counters as last confirmed by contract reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickCounterState {
    pub total_clicks: U256,
    pub contract_owner: Option<Address>,
    pub is_caller_owner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionState {
    pub pending: bool,
    pub last_error: Option<String>,
    pub last_success_message: Option<String>,
}

/// Result of loading the account context. Each read is reported on its own:
/// a failed read leaves its field `None` and adds an entry to `failures`.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub total_clicks: Option<U256>,
    pub contract_owner: Option<Address>,
    pub is_caller_owner: bool,
    pub failures: Vec<ReadFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickerSnapshot {
    pub account: Option<Address>,
    pub counters: ClickCounterState,
    pub transaction: TransactionState,
}

#[derive(Debug, Clone)]
pub enum ClickerEvent {
    Connected {
        account: Address,
    },
    ContextLoaded(ClickCounterState),
    ReadFailed(String),
    SubmissionStarted,
    TransactionSent {
        tx_hash: B256,
    },
    TransactionConfirmed {
        tx_hash: B256,
        block_number: Option<u64>,
        total_clicks: U256,
    },
    SubmissionFailed(String),
}
