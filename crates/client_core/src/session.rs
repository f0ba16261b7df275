use std::sync::Arc;

use shared::domain::NetworkDescriptor;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    error::{ConnectionError, NetworkSwitchError},
    provider::{InjectedProvider, WalletProvider, WalletSurface},
    state::WalletSession,
};

/// Connects the injected wallet, keeps it on the target network and holds the
/// resulting account. Holds no retry state; every call may be re-issued after
/// a failure.
pub struct ChainSessionManager {
    network: NetworkDescriptor,
    surface: Arc<WalletSurface>,
    session: RwLock<Option<WalletSession>>,
}

impl ChainSessionManager {
    pub fn new(network: NetworkDescriptor, surface: Arc<WalletSurface>) -> Self {
        Self {
            network,
            surface,
            session: RwLock::new(None),
        }
    }

    pub async fn session(&self) -> Option<WalletSession> {
        *self.session.read().await
    }

    pub async fn locate_provider(&self) -> Option<InjectedProvider> {
        self.surface.locate().await
    }

    /// Switches the provider to the target chain, registering the chain first
    /// when the wallet does not know it.
    pub async fn ensure_network(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<(), NetworkSwitchError> {
        let chain_id = self.network.chain_id;
        match provider.switch_chain(chain_id).await {
            Ok(()) => {
                info!(chain_id = %chain_id, network = %self.network.display_name, "switched network");
                Ok(())
            }
            Err(err) if err.is_unrecognized_chain() => {
                provider.add_chain(&self.network).await.map_err(|source| {
                    error!(chain_id = %chain_id, error = %source, "network registration failed");
                    NetworkSwitchError::Registration {
                        network: self.network.display_name.clone(),
                        source,
                    }
                })?;
                info!(chain_id = %chain_id, network = %self.network.display_name, "registered network");
                Ok(())
            }
            Err(err) => {
                error!(chain_id = %chain_id, error = %err, "network switch failed");
                Err(NetworkSwitchError::Switch(err))
            }
        }
    }

    pub async fn connect(&self) -> Result<WalletSession, ConnectionError> {
        let Some(injected) = self.locate_provider().await else {
            warn!("connect requested but no eligible wallet is injected");
            return Err(ConnectionError::NoWalletFound);
        };
        let provider = injected.provider.as_ref();

        self.ensure_network(provider).await?;

        let accounts = provider.request_accounts().await.map_err(|err| {
            if err.is_user_rejection() {
                ConnectionError::UserRejected(err)
            } else {
                ConnectionError::AccountRequest(err)
            }
        })?;
        let account = *accounts.first().ok_or(ConnectionError::NoAccounts)?;

        let session = WalletSession { account };
        *self.session.write().await = Some(session);
        info!(%account, wallet = %injected.descriptor.name, "wallet connected");
        Ok(session)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
