use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{Address, B256, U256};
use shared::{
    domain::ContractConfig, error::ProviderError, protocol::TransactionReceipt,
};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::{
    contract::ContractHandle,
    error::{ClickError, ConnectionError, ContractRead, ReadFailure},
    provider::WalletProvider,
    session::ChainSessionManager,
    state::{
        AccountContext, ClickCounterState, ClickerEvent, TransactionState, SUCCESS_MESSAGE,
    },
};

/// Holds the in-flight flag for the lifetime of one submission.
struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Counters together with the account they were read for.
#[derive(Default)]
struct LoadedCounters {
    account: Option<Address>,
    state: ClickCounterState,
}

impl LoadedCounters {
    /// Counters for `account`, reset when they belong to another account.
    fn for_account(&mut self, account: Address) -> &mut ClickCounterState {
        if self.account != Some(account) {
            self.account = Some(account);
            self.state = ClickCounterState::default();
        }
        &mut self.state
    }
}

#[derive(Default)]
struct Outcome {
    last_error: Option<String>,
    last_success_message: Option<String>,
}

/// Sequences contract reads and the `click()` submission, keeping the
/// displayed counters in line with confirmed chain state.
pub struct TransactionOrchestrator {
    session: Arc<ChainSessionManager>,
    contract: ContractConfig,
    receipt_poll_interval: Duration,
    in_flight: AtomicBool,
    counters: RwLock<LoadedCounters>,
    outcome: Mutex<Outcome>,
    events: broadcast::Sender<ClickerEvent>,
}

impl TransactionOrchestrator {
    pub fn new(
        session: Arc<ChainSessionManager>,
        contract: ContractConfig,
        receipt_poll_interval: Duration,
        events: broadcast::Sender<ClickerEvent>,
    ) -> Self {
        Self {
            session,
            contract,
            receipt_poll_interval,
            in_flight: AtomicBool::new(false),
            counters: RwLock::new(LoadedCounters::default()),
            outcome: Mutex::new(Outcome::default()),
            events,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn counters(&self) -> ClickCounterState {
        self.counters.read().await.state.clone()
    }

    pub async fn transaction_state(&self) -> TransactionState {
        let outcome = self.outcome.lock().await;
        TransactionState {
            pending: self.is_pending(),
            last_error: outcome.last_error.clone(),
            last_success_message: outcome.last_success_message.clone(),
        }
    }

    /// Reads the contract owner and the account's click count concurrently.
    /// A failed read does not stop the other one; it is logged, emitted and
    /// returned in [`AccountContext::failures`].
    pub async fn load_account_context(
        &self,
        account: Address,
    ) -> Result<AccountContext, ConnectionError> {
        let injected = self
            .session
            .locate_provider()
            .await
            .ok_or(ConnectionError::NoWalletFound)?;
        let contract = ContractHandle::read_only(self.contract.address, injected.provider);

        let (owner, clicks) = tokio::join!(contract.owner(), contract.get_clicks(account));

        let mut failures = Vec::new();
        let contract_owner = match owner {
            Ok(owner) => {
                info!(%owner, "loaded contract owner");
                Some(owner)
            }
            Err(source) => {
                failures.push(ReadFailure {
                    read: ContractRead::Owner,
                    source,
                });
                None
            }
        };
        let total_clicks = match clicks {
            Ok(total) => {
                info!(%account, %total, "loaded click count");
                Some(total)
            }
            Err(source) => {
                failures.push(ReadFailure {
                    read: ContractRead::Clicks,
                    source,
                });
                None
            }
        };
        let is_caller_owner = contract_owner.is_some_and(|owner| owner == account);

        let snapshot = {
            let mut loaded = self.counters.write().await;
            let counters = loaded.for_account(account);
            counters.contract_owner = contract_owner;
            counters.is_caller_owner = is_caller_owner;
            if let Some(total) = total_clicks {
                counters.total_clicks = total;
            }
            counters.clone()
        };

        for failure in &failures {
            error!(error = %failure, "contract read failed");
            let _ = self.events.send(ClickerEvent::ReadFailed(failure.to_string()));
        }
        let _ = self.events.send(ClickerEvent::ContextLoaded(snapshot));

        Ok(AccountContext {
            total_clicks,
            contract_owner,
            is_caller_owner,
            failures,
        })
    }

    /// Submits one `click()` and returns the confirmed total for the session
    /// account. Only one submission runs at a time; a concurrent call fails
    /// with [`ClickError::AlreadyPending`] without touching the state of the
    /// running one.
    pub async fn submit_click(&self) -> Result<U256, ClickError> {
        let Some(_pending) = PendingGuard::acquire(&self.in_flight) else {
            warn!("click ignored while a submission is pending");
            return Err(ClickError::AlreadyPending);
        };

        {
            let mut outcome = self.outcome.lock().await;
            outcome.last_error = None;
            outcome.last_success_message = None;
        }
        let _ = self.events.send(ClickerEvent::SubmissionStarted);

        let result = self.run_submission().await;

        let mut outcome = self.outcome.lock().await;
        match &result {
            Ok(total) => {
                outcome.last_success_message = Some(SUCCESS_MESSAGE.to_string());
                info!(%total, "click confirmed");
            }
            Err(err) => {
                outcome.last_error = Some(err.to_string());
                error!(error = %err, "click submission failed");
                let _ = self.events.send(ClickerEvent::SubmissionFailed(err.to_string()));
            }
        }
        result
    }

    async fn run_submission(&self) -> Result<U256, ClickError> {
        let account = self
            .session
            .session()
            .await
            .ok_or(ClickError::NotConnected)?
            .account;
        let injected = self
            .session
            .locate_provider()
            .await
            .ok_or(ClickError::NoWalletFound)?;
        let provider = injected.provider;

        self.session.ensure_network(provider.as_ref()).await?;

        let signer = provider
            .accounts()
            .await
            .map_err(ClickError::Signer)?
            .first()
            .copied()
            .ok_or(ClickError::NoSigner)?;
        if signer != account {
            warn!(%signer, %account, "wallet signer differs from connected account");
        }
        let contract = ContractHandle::signing(self.contract.address, provider.clone(), signer);

        let tx_hash = contract
            .click()
            .await
            .map_err(ClickError::SubmissionRejected)?;
        info!(%tx_hash, contract = %contract.address(), "click transaction sent");
        let _ = self.events.send(ClickerEvent::TransactionSent { tx_hash });

        let receipt = self
            .wait_for_receipt(provider.as_ref(), tx_hash)
            .await
            .map_err(|source| ClickError::Confirmation { tx_hash, source })?;
        if !receipt.succeeded() {
            return Err(ClickError::Reverted { tx_hash });
        }
        for event in contract.clicked_events(&receipt) {
            info!(player = %event.player, total = %event.total_clicks, "Clicked event");
        }

        let total = contract
            .get_clicks(account)
            .await
            .map_err(|source| ReadFailure {
                read: ContractRead::Clicks,
                source,
            })?;
        self.counters.write().await.for_account(account).total_clicks = total;

        let _ = self.events.send(ClickerEvent::TransactionConfirmed {
            tx_hash,
            block_number: receipt.block_number(),
            total_clicks: total,
        });
        Ok(total)
    }

    /// Polls until the wallet reports a receipt. There is no deadline; the
    /// wait ends with the receipt, a provider error, or the caller dropping
    /// the future.
    async fn wait_for_receipt(
        &self,
        provider: &dyn WalletProvider,
        tx_hash: B256,
    ) -> Result<TransactionReceipt, ProviderError> {
        loop {
            if let Some(receipt) = provider.transaction_receipt(tx_hash).await? {
                info!(%tx_hash, block = ?receipt.block_number(), "transaction confirmed");
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
