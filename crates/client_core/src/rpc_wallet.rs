use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::ProviderError,
    protocol::{RpcRequest, RpcResponse},
};
use tracing::debug;
use url::Url;

use crate::provider::WalletProvider;

/// A wallet reached over JSON-RPC 2.0 on HTTP, e.g. a wallet bridge or an
/// unlocked development node.
pub struct JsonRpcWallet {
    http: Client,
    url: Url,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(http: Client, url: Url) -> Self {
        Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, url = %self.url, "sending wallet request");

        let res = self
            .http
            .post(self.url.clone())
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        // A non-2xx status may still carry a JSON-RPC error object.
        let response = match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(response) if status.is_success() || response.error.is_some() => response,
            Err(err) if status.is_success() => return Err(ProviderError::decode(err)),
            _ => return Err(ProviderError::Transport(format!("HTTP status {status}"))),
        };

        match response.id {
            Some(response_id) if response_id != id => {
                return Err(ProviderError::Decode(format!(
                    "response id {response_id} does not match request id {id}"
                )));
            }
            None if response.error.is_none() => {
                return Err(ProviderError::Decode(format!(
                    "response to request {id} carries no id"
                )));
            }
            _ => {}
        }
        response.into_result()
    }
}

#[cfg(test)]
#[path = "tests/rpc_wallet_tests.rs"]
mod tests;
