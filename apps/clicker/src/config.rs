use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::ProviderDescriptor;
use serde::Deserialize;
use shared::{
    domain::{validate_url, ClickerConfig, ContractConfig, NativeCurrency, NetworkDescriptor},
    error::ConfigError,
};
use url::Url;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xd9aB239C897A1595df704124c0bD77560CA3655F";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WalletSettings {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_metamask: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub contract_address: String,
    pub chain_id: String,
    pub network_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_endpoints: Vec<String>,
    pub explorer_endpoints: Vec<String>,
    pub receipt_poll_interval_ms: u64,
    pub wallets: Vec<WalletSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let network = NetworkDescriptor::rise_testnet();
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.into(),
            chain_id: network.chain_id.to_string(),
            network_name: network.display_name,
            native_currency: network.native_currency,
            rpc_endpoints: network.rpc_endpoints,
            explorer_endpoints: network.explorer_endpoints,
            receipt_poll_interval_ms: 4_000,
            wallets: vec![WalletSettings {
                name: "metamask".into(),
                url: "http://127.0.0.1:8545".into(),
                is_metamask: true,
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    contract_address: Option<String>,
    receipt_poll_interval_ms: Option<u64>,
    network: FileNetwork,
    wallets: Option<Vec<WalletSettings>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileNetwork {
    chain_id: Option<String>,
    display_name: Option<String>,
    native_currency: Option<NativeCurrency>,
    rpc_endpoints: Option<Vec<String>>,
    explorer_endpoints: Option<Vec<String>>,
}

/// A wallet to inject, validated.
#[derive(Debug, Clone)]
pub struct WalletEndpoint {
    pub descriptor: ProviderDescriptor,
    pub url: Url,
}

#[derive(Debug, Clone)]
pub struct ClientSetup {
    pub config: ClickerConfig,
    pub wallets: Vec<WalletEndpoint>,
}

/// Defaults, then `path` if it exists, then `APP__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file.contract_address {
        settings.contract_address = v;
    }
    if let Some(v) = file.receipt_poll_interval_ms {
        settings.receipt_poll_interval_ms = v;
    }
    if let Some(v) = file.wallets {
        settings.wallets = v;
    }
    if let Some(v) = file.network.chain_id {
        settings.chain_id = v;
    }
    if let Some(v) = file.network.display_name {
        settings.network_name = v;
    }
    if let Some(v) = file.network.native_currency {
        settings.native_currency = v;
    }
    if let Some(v) = file.network.rpc_endpoints {
        settings.rpc_endpoints = v;
    }
    if let Some(v) = file.network.explorer_endpoints {
        settings.explorer_endpoints = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }
    if let Some(v) = lookup("APP__CHAIN_ID") {
        settings.chain_id = v;
    }
    if let Some(v) = lookup("APP__WALLET_URL") {
        settings.wallets = vec![WalletSettings {
            name: "metamask".into(),
            url: v,
            is_metamask: true,
        }];
    }
    if let Some(v) = lookup("APP__RECEIPT_POLL_INTERVAL_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.receipt_poll_interval_ms = parsed;
        }
    }
}

impl Settings {
    /// Validates every value and builds the immutable client configuration.
    pub fn into_setup(self) -> Result<ClientSetup, ConfigError> {
        let contract = ContractConfig::parse(&self.contract_address)?;
        let network = NetworkDescriptor {
            chain_id: self.chain_id.parse()?,
            display_name: self.network_name,
            native_currency: self.native_currency,
            rpc_endpoints: self.rpc_endpoints,
            explorer_endpoints: self.explorer_endpoints,
        };
        network.validate()?;

        let wallets = self
            .wallets
            .into_iter()
            .map(|wallet| {
                Ok(WalletEndpoint {
                    url: validate_url("wallets.url", &wallet.url)?,
                    descriptor: ProviderDescriptor {
                        name: wallet.name,
                        is_metamask: wallet.is_metamask,
                    },
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(ClientSetup {
            config: ClickerConfig {
                network,
                contract,
                receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms.max(1)),
            },
            wallets,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn defaults_target_rise_testnet() {
        let setup = Settings::default().into_setup().expect("defaults are valid");

        assert_eq!(setup.config.network, NetworkDescriptor::rise_testnet());
        assert_eq!(
            setup.config.contract.address.to_string().to_lowercase(),
            DEFAULT_CONTRACT_ADDRESS.to_lowercase()
        );
        assert_eq!(setup.config.receipt_poll_interval, Duration::from_secs(4));
        assert_eq!(setup.wallets.len(), 1);
        assert!(setup.wallets[0].descriptor.is_metamask);
    }

    #[test]
    fn malformed_contract_address_fails_fast() {
        let settings = Settings {
            contract_address: "0xd9aB239C897A1595df704124c0bD77560CA3655F123".into(),
            ..Settings::default()
        };

        let err = settings.into_setup().expect_err("43 hex characters");
        assert!(matches!(err, ConfigError::InvalidContractAddress { .. }));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
            receipt_poll_interval_ms = 250

            [network]
            chain_id = "31337"
            display_name = "Local"
            rpc_endpoints = ["http://127.0.0.1:8545"]

            [[wallets]]
            name = "rabby"
            url = "http://127.0.0.1:9000"

            [[wallets]]
            name = "metamask"
            url = "http://127.0.0.1:9001"
            is_metamask = true
            "#,
        )
        .expect("valid toml");

        let setup = settings.into_setup().expect("valid settings");
        assert_eq!(setup.config.network.chain_id.0, 31_337);
        assert_eq!(setup.config.network.display_name, "Local");
        assert_eq!(
            setup.config.network.explorer_endpoints,
            NetworkDescriptor::rise_testnet().explorer_endpoints
        );
        assert_eq!(setup.config.receipt_poll_interval, Duration::from_millis(250));
        assert_eq!(setup.wallets.len(), 2);
        assert!(!setup.wallets[0].descriptor.is_metamask);
    }

    #[test]
    fn env_values_override_file() {
        let overrides = HashMap::from([
            ("APP__WALLET_URL", "http://wallet.local:8545"),
            ("APP__RECEIPT_POLL_INTERVAL_MS", "not-a-number"),
            ("APP__CHAIN_ID", "0x7a69"),
        ]);
        let mut settings = Settings::default();
        apply_env(&mut settings, |key| {
            overrides.get(key).map(|value| value.to_string())
        });

        let setup = settings.into_setup().expect("valid settings");
        assert_eq!(setup.wallets.len(), 1);
        assert_eq!(setup.wallets[0].url.as_str(), "http://wallet.local:8545/");
        assert_eq!(setup.config.network.chain_id.0, 0x7a69);
        assert_eq!(setup.config.receipt_poll_interval, Duration::from_secs(4));
    }

    #[test]
    fn invalid_wallet_url_is_rejected() {
        let settings = Settings {
            wallets: vec![WalletSettings {
                name: "metamask".into(),
                url: "not a url".into(),
                is_metamask: true,
            }],
            ..Settings::default()
        };
        assert!(matches!(
            settings.into_setup(),
            Err(ConfigError::InvalidUrl { field: "wallets.url", .. })
        ));
    }

    #[test]
    fn unreadable_toml_names_the_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("clicker_config_test_{suffix}.toml"));
        fs::write(&path, "contract_address = [").expect("write config");

        let err = load_settings(&path).expect_err("broken toml");
        assert!(format!("{err:#}").contains("failed to parse config file"));

        fs::remove_file(path).expect("cleanup");
    }
}
