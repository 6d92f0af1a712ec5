use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::{utils::parse_ether, Address, U256};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub network: Network,
    pub game: Game,
    pub price: Price,
    pub session: Session,
    pub policy: Policy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct General {
    pub log_level: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Network {
    /// JSON-RPC endpoint. `PREDICT_RPC_URL` overrides it.
    pub rpc_url: String,
    pub contract_address: Address,
    /// Shown next to the entry fee
    pub chain_name: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.sepolia.org".to_string(),
            contract_address: DEFAULT_CONTRACT,
            chain_name: "Sepolia".to_string(),
        }
    }
}

const DEFAULT_CONTRACT: Address =
    alloy_primitives::address!("0x7DE49A7C45d783A22813D4904284320ad2B23Fd0");

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Game {
    /// Round length in seconds
    pub interval_secs: u64,
    /// Entry fee in ETH, e.g. "0.001"
    pub entry_fee_eth: String,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            interval_secs: 86_400,
            entry_fee_eth: "0.001".to_string(),
        }
    }
}

impl Game {
    /// Entry fee in wei.
    pub fn entry_fee_wei(&self) -> anyhow::Result<U256> {
        Ok(parse_ether(&self.entry_fee_eth)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Price {
    pub url: String,
    pub poll_secs: u64,
}

impl Default for Price {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/api/price".to_string(),
            poll_secs: 60,
        }
    }
}

impl Price {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub path: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".predict-session.json"),
        }
    }
}

/// What to do with failures the user did not directly ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Print the failure on the dashboard
    #[default]
    Surface,
    /// Only log at debug level
    Silent,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub submission_errors: ErrorPolicy,
    pub price_errors: ErrorPolicy,
    /// Attempts per contract read before giving up
    pub read_attempts: u32,
    /// First backoff delay, doubled per attempt
    pub read_backoff_ms: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            submission_errors: ErrorPolicy::Surface,
            price_errors: ErrorPolicy::Surface,
            read_attempts: 3,
            read_backoff_ms: 500,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        if let Ok(url) = std::env::var("PREDICT_RPC_URL") {
            config.network.rpc_url = url;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.game.interval_secs, 86_400);
        assert_eq!(cfg.price.poll_secs, 60);
        assert_eq!(cfg.network.contract_address, DEFAULT_CONTRACT);
        assert_eq!(cfg.policy.submission_errors, ErrorPolicy::Surface);
        assert_eq!(cfg.session.path, PathBuf::from(".predict-session.json"));
    }

    #[test]
    fn test_partial_sections() {
        let cfg = Config::parse(
            r#"
            [game]
            entry_fee_eth = "0.01"

            [policy]
            price_errors = "silent"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.game.interval_secs, 86_400);
        assert_eq!(cfg.game.entry_fee_eth, "0.01");
        assert_eq!(cfg.policy.price_errors, ErrorPolicy::Silent);
        assert_eq!(cfg.policy.submission_errors, ErrorPolicy::Surface);
    }

    #[test]
    fn test_entry_fee_wei() {
        let game = Game::default();
        // 0.001 ETH
        assert_eq!(
            game.entry_fee_wei().unwrap(),
            U256::from(1_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_bad_policy_rejected() {
        assert!(Config::parse("[policy]\nprice_errors = \"loud\"").is_err());
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let price = Price {
            poll_secs: 0,
            ..Default::default()
        };
        assert_eq!(price.poll_interval(), Duration::from_secs(1));
    }
}
