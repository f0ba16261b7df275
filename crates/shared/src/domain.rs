use std::{fmt, str::FromStr, time::Duration};

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::ConfigError;

/// Chain identifier, rendered the way wallets expect it (`0x`-prefixed lower hex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| ConfigError::InvalidChainId(raw.to_string()))
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Static description of the target network.
///
/// Serializes to the parameter object of `wallet_addEthereumChain` (EIP-3085),
/// so the same value is used both to verify and to register the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub chain_id: ChainId,
    #[serde(rename = "chainName")]
    pub display_name: String,
    pub native_currency: NativeCurrency,
    #[serde(rename = "rpcUrls")]
    pub rpc_endpoints: Vec<String>,
    #[serde(rename = "blockExplorerUrls")]
    pub explorer_endpoints: Vec<String>,
}

impl NetworkDescriptor {
    pub fn rise_testnet() -> Self {
        Self {
            chain_id: ChainId(0xaa39db),
            display_name: "RISE Testnet".into(),
            native_currency: NativeCurrency {
                name: "Ethereum".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_endpoints: vec!["https://testnet.riselabs.xyz".into()],
            explorer_endpoints: vec!["https://explorer.testnet.riselabs.xyz".into()],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_name.trim().is_empty() {
            return Err(ConfigError::MissingField("network.display_name"));
        }
        if self.rpc_endpoints.is_empty() {
            return Err(ConfigError::MissingRpcEndpoint(self.display_name.clone()));
        }
        for endpoint in &self.rpc_endpoints {
            validate_url("network.rpc_endpoints", endpoint)?;
        }
        for endpoint in &self.explorer_endpoints {
            validate_url("network.explorer_endpoints", endpoint)?;
        }
        Ok(())
    }
}

pub fn validate_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

/// The deployed click-counter contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractConfig {
    pub address: Address,
}

impl ContractConfig {
    /// Parses a contract address from configuration, refusing anything that is
    /// not exactly `0x` followed by 40 hex digits.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let value = raw.trim();
        let invalid = |reason: String| ConfigError::InvalidContractAddress {
            value: raw.to_string(),
            reason,
        };

        let Some(hex) = value.strip_prefix("0x") else {
            return Err(invalid("missing 0x prefix".into()));
        };
        if hex.len() != 40 {
            return Err(invalid(format!(
                "expected 40 hex characters, found {}",
                hex.len()
            )));
        }
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(invalid(format!("non-hex character '{bad}'")));
        }

        let address = value
            .parse::<Address>()
            .map_err(|err| invalid(err.to_string()))?;
        Ok(Self { address })
    }
}

/// Immutable client configuration, built once at startup and handed to the
/// session manager and orchestrator.
#[derive(Debug, Clone)]
pub struct ClickerConfig {
    pub network: NetworkDescriptor,
    pub contract: ContractConfig,
    pub receipt_poll_interval: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_round_trips_through_hex() {
        let chain_id: ChainId = "0xaa39db".parse().expect("hex chain id");
        assert_eq!(chain_id, ChainId(11_155_931));
        assert_eq!(chain_id.to_string(), "0xaa39db");
        assert_eq!("11155931".parse::<ChainId>().expect("decimal"), chain_id);
        assert!("0xzz".parse::<ChainId>().is_err());
    }

    #[test]
    fn rise_testnet_serializes_as_add_chain_parameters() {
        let value = serde_json::to_value(NetworkDescriptor::rise_testnet()).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "chainId": "0xaa39db",
                "chainName": "RISE Testnet",
                "nativeCurrency": { "name": "Ethereum", "symbol": "ETH", "decimals": 18 },
                "rpcUrls": ["https://testnet.riselabs.xyz"],
                "blockExplorerUrls": ["https://explorer.testnet.riselabs.xyz"],
            })
        );
    }

    #[test]
    fn network_without_rpc_endpoint_is_rejected() {
        let mut network = NetworkDescriptor::rise_testnet();
        network.rpc_endpoints.clear();
        assert!(matches!(
            network.validate(),
            Err(ConfigError::MissingRpcEndpoint(_))
        ));

        let mut network = NetworkDescriptor::rise_testnet();
        network.explorer_endpoints = vec!["not a url".into()];
        assert!(matches!(
            network.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn contract_address_accepts_well_formed_value() {
        let contract =
            ContractConfig::parse("0xd9aB239C897A1595df704124c0bD77560CA3655F").expect("valid");
        assert_eq!(
            contract.address,
            "0xd9ab239c897a1595df704124c0bd77560ca3655f"
                .parse::<Address>()
                .expect("lowercase")
        );
    }

    #[test]
    fn contract_address_with_extra_digit_fails_fast() {
        let err = ContractConfig::parse("0xd9aB239C897A1595df704124c0bD77560CA3655F0")
            .expect_err("43 characters");
        assert!(err.to_string().contains("expected 40 hex characters, found 41"));

        assert!(ContractConfig::parse("d9aB239C897A1595df704124c0bD77560CA3655F").is_err());
        assert!(ContractConfig::parse("0xg9aB239C897A1595df704124c0bD77560CA3655F").is_err());
    }
}
