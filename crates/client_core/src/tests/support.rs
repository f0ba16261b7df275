//! Scripted in-memory wallet used by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_primitives::{hex, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::{ClickerConfig, ContractConfig, NetworkDescriptor},
    error::ProviderError,
    protocol::methods,
};
use tokio::sync::Notify;

use crate::{
    contract::{getClicksCall, ownerCall, Clicked},
    provider::{InjectedProvider, ProviderDescriptor, WalletProvider, WalletSurface},
};

pub const ACCOUNT: &str = "0x1111111111111111111111111111111111111111";
pub const OWNER: &str = "0xAAA0000000000000000000000000000000000AAA";
pub const CONTRACT: &str = "0xd9aB239C897A1595df704124c0bD77560CA3655F";

pub fn addr(raw: &str) -> Address {
    raw.parse().expect("test address")
}

pub fn tx_hash() -> B256 {
    B256::repeat_byte(0x42)
}

pub fn test_config() -> ClickerConfig {
    ClickerConfig {
        network: NetworkDescriptor::rise_testnet(),
        contract: ContractConfig::parse(CONTRACT).expect("contract"),
        receipt_poll_interval: Duration::from_millis(5),
    }
}

type Reply = Result<Value, ProviderError>;

/// Answers requests from per-key reply queues. The last reply in a queue is
/// repeated once the queue is drained. `eth_call` is keyed by selector.
#[derive(Default)]
pub struct ScriptedWallet {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
    receipt_gate: Option<Arc<Notify>>,
}

impl ScriptedWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wallet that accepts every step of a click flow: switch succeeds,
    /// `ACCOUNT` is returned, owner is `OWNER`, clicks read `3` then `4`.
    pub fn happy() -> Self {
        Self::new()
            .reply(methods::SWITCH_CHAIN, Ok(Value::Null))
            .reply(methods::REQUEST_ACCOUNTS, Ok(json!([ACCOUNT])))
            .reply(methods::ACCOUNTS, Ok(json!([ACCOUNT])))
            .reply_call(ownerCall::SELECTOR, Ok(addr(OWNER).abi_encode()))
            .reply_call(getClicksCall::SELECTOR, Ok(U256::from(3).abi_encode()))
            .reply_call(getClicksCall::SELECTOR, Ok(U256::from(4).abi_encode()))
            .reply(methods::SEND_TRANSACTION, Ok(json!(tx_hash())))
            .reply(methods::TRANSACTION_RECEIPT, Ok(receipt_json("0x1", 4)))
    }

    pub fn reply(self, method: &str, reply: Reply) -> Self {
        self.push(method.to_string(), reply);
        self
    }

    pub fn reply_call(self, selector: [u8; 4], reply: Result<Vec<u8>, ProviderError>) -> Self {
        let reply = reply.map(|data| json!(Bytes::from(data)));
        self.push(call_key(&selector), reply);
        self
    }

    /// Replaces the queue for `method` with a single reply.
    pub fn set_reply(&self, method: &str, reply: Reply) {
        self.replies
            .lock()
            .expect("replies")
            .insert(method.to_string(), VecDeque::from([reply]));
    }

    pub fn set_call_reply(&self, selector: [u8; 4], reply: Result<Vec<u8>, ProviderError>) {
        let reply = reply.map(|data| json!(Bytes::from(data)));
        self.replies
            .lock()
            .expect("replies")
            .insert(call_key(&selector), VecDeque::from([reply]));
    }

    /// Receipt requests wait for one `notify_one` each before answering.
    pub fn with_receipt_gate(mut self, gate: Arc<Notify>) -> Self {
        self.receipt_gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.methods().iter().filter(|m| *m == method).count()
    }

    fn push(&self, key: String, reply: Reply) {
        self.replies
            .lock()
            .expect("replies")
            .entry(key)
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, key: &str) -> Reply {
        let mut replies = self.replies.lock().expect("replies");
        let Some(queue) = replies.get_mut(key) else {
            return Err(ProviderError::rpc(4200, format!("unscripted request {key}")));
        };
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ProviderError::rpc(4200, "empty script")))
        }
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .expect("calls")
            .push((method.to_string(), params.clone()));

        if method == methods::TRANSACTION_RECEIPT {
            if let Some(gate) = &self.receipt_gate {
                gate.notified().await;
            }
        }

        let key = if method == methods::CALL {
            let data: Bytes = serde_json::from_value(params[0]["data"].clone())
                .map_err(ProviderError::decode)?;
            call_key(&data[..4])
        } else {
            method.to_string()
        };
        self.next_reply(&key)
    }
}

fn call_key(selector: &[u8]) -> String {
    format!("{}:{}", methods::CALL, hex::encode(selector))
}

pub fn receipt_json(status: &str, total_clicks: u64) -> Value {
    let player_topic = B256::left_padding_from(addr(ACCOUNT).as_slice());
    json!({
        "transactionHash": tx_hash(),
        "blockNumber": "0x10",
        "status": status,
        "logs": [{
            "address": addr(CONTRACT),
            "topics": [Clicked::SIGNATURE_HASH, player_topic],
            "data": Bytes::from(U256::from(total_clicks).abi_encode()),
        }],
    })
}

pub fn metamask(wallet: Arc<ScriptedWallet>) -> InjectedProvider {
    InjectedProvider::new(
        ProviderDescriptor {
            name: "metamask".into(),
            is_metamask: true,
        },
        wallet,
    )
}

pub fn other_wallet(name: &str, wallet: Arc<ScriptedWallet>) -> InjectedProvider {
    InjectedProvider::new(
        ProviderDescriptor {
            name: name.into(),
            is_metamask: false,
        },
        wallet,
    )
}

pub fn surface_with(wallet: Arc<ScriptedWallet>) -> Arc<WalletSurface> {
    Arc::new(WalletSurface::new(vec![metamask(wallet)]))
}
