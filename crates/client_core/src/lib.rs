use std::sync::Arc;

use alloy_primitives::U256;
use shared::domain::ClickerConfig;
use tokio::sync::broadcast;
use tracing::{error, warn};

pub mod contract;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod rpc_wallet;
pub mod session;
pub mod state;

pub use contract::ContractHandle;
pub use error::{ClickError, ConnectionError, NetworkSwitchError, ReadFailure};
pub use orchestrator::TransactionOrchestrator;
pub use provider::{
    locate_provider, InjectedProvider, ProviderDescriptor, WalletProvider, WalletSurface,
};
pub use rpc_wallet::JsonRpcWallet;
pub use session::ChainSessionManager;
pub use state::{
    AccountContext, ClickCounterState, ClickerEvent, ClickerSnapshot, TransactionState,
    WalletSession,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The two user affordances, "Connect Wallet" and "Gas!", over one session.
pub struct ClickerClient {
    session: Arc<ChainSessionManager>,
    orchestrator: TransactionOrchestrator,
    events: broadcast::Sender<ClickerEvent>,
}

impl ClickerClient {
    pub fn new(config: ClickerConfig, surface: Arc<WalletSurface>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let session = Arc::new(ChainSessionManager::new(config.network, surface));
        let orchestrator = TransactionOrchestrator::new(
            Arc::clone(&session),
            config.contract,
            config.receipt_poll_interval,
            events.clone(),
        );
        Self {
            session,
            orchestrator,
            events,
        }
    }

    /// Connects the wallet and loads the owner and click count for the
    /// connected account. Read failures are reported inside the returned
    /// context, not as an error.
    pub async fn connect_wallet(&self) -> Result<AccountContext, ConnectionError> {
        let session = self.session.connect().await.inspect_err(|err| {
            error!(error = %err, "wallet connection failed");
        })?;
        let _ = self.events.send(ClickerEvent::Connected {
            account: session.account,
        });
        let context = self
            .orchestrator
            .load_account_context(session.account)
            .await?;
        if !context.failures.is_empty() {
            warn!(
                failures = context.failures.len(),
                "account context loaded partially"
            );
        }
        Ok(context)
    }

    pub async fn gas(&self) -> Result<U256, ClickError> {
        self.orchestrator.submit_click().await
    }

    pub async fn snapshot(&self) -> ClickerSnapshot {
        ClickerSnapshot {
            account: self.session.session().await.map(|session| session.account),
            counters: self.orchestrator.counters().await,
            transaction: self.orchestrator.transaction_state().await,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClickerEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
