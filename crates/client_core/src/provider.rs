use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{ChainId, NetworkDescriptor},
    error::ProviderError,
    protocol::{methods, SwitchChainParameter, TransactionReceipt, TransactionRequest},
};
use tokio::sync::RwLock;

/// Request-based wallet boundary (EIP-1193 style).
///
/// Implementors only provide [`WalletProvider::request`]; the typed helpers
/// encode parameters and decode results for the request kinds the client uses.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        let params = json!([SwitchChainParameter { chain_id }]);
        self.request(methods::SWITCH_CHAIN, params).await?;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), ProviderError> {
        self.request(methods::ADD_CHAIN, json!([network])).await?;
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
        decode_value(value)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let value = self.request(methods::ACCOUNTS, json!([])).await?;
        decode_value(value)
    }

    async fn call(&self, request: &TransactionRequest) -> Result<Bytes, ProviderError> {
        let value = self
            .request(methods::CALL, json!([request, "latest"]))
            .await?;
        decode_value(value)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, ProviderError> {
        let value = self
            .request(methods::SEND_TRANSACTION, json!([request]))
            .await?;
        decode_value(value)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        let value = self
            .request(methods::TRANSACTION_RECEIPT, json!([tx_hash]))
            .await?;
        decode_value(value)
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(ProviderError::decode)
}

/// How an injected provider identifies itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub name: String,
    pub is_metamask: bool,
}

#[derive(Clone)]
pub struct InjectedProvider {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn WalletProvider>,
}

impl InjectedProvider {
    pub fn new(descriptor: ProviderDescriptor, provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            descriptor,
            provider,
        }
    }
}

/// Picks the first candidate that identifies as the target wallet brand.
pub fn locate_provider(candidates: &[InjectedProvider]) -> Option<&InjectedProvider> {
    candidates
        .iter()
        .find(|candidate| candidate.descriptor.is_metamask)
}

/// The set of wallet providers currently injected into the session, in
/// injection order. Providers may come and go between user actions.
#[derive(Default)]
pub struct WalletSurface {
    providers: RwLock<Vec<InjectedProvider>>,
}

impl WalletSurface {
    pub fn new(providers: Vec<InjectedProvider>) -> Self {
        Self {
            providers: RwLock::new(providers),
        }
    }

    pub async fn inject(&self, provider: InjectedProvider) {
        self.providers.write().await.push(provider);
    }

    /// Removes every provider with the given name; returns how many were removed.
    pub async fn remove(&self, name: &str) -> usize {
        let mut providers = self.providers.write().await;
        let before = providers.len();
        providers.retain(|candidate| candidate.descriptor.name != name);
        before - providers.len()
    }

    pub async fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers
            .read()
            .await
            .iter()
            .map(|candidate| candidate.descriptor.clone())
            .collect()
    }

    pub async fn locate(&self) -> Option<InjectedProvider> {
        let providers = self.providers.read().await;
        locate_provider(&providers).cloned()
    }
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
