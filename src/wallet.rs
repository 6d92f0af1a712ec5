use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use tracing::{error, info, warn};

use crate::error::{GameError, Result};
use crate::state::{SessionStore, WalletSession};

/// Environment variable holding the player's private key
pub const PRIVATE_KEY_VAR: &str = "PREDICT_PRIVATE_KEY";

/// Something that holds keys and can hand out accounts on request.
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: the accounts the user allows us to use.
    fn request_accounts(&self) -> Result<Vec<String>>;
}

/// Wallet backed by a raw private key.
#[derive(Debug, Clone)]
pub struct LocalKeyWallet {
    signer: PrivateKeySigner,
}

impl LocalKeyWallet {
    pub fn from_key(key: &str) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(key.trim())
            .map_err(|e| GameError::WalletRejected(e.to_string()))?;
        Ok(Self { signer })
    }

    /// `Ok(None)` when no key is configured.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(PRIVATE_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Self::from_key(&key).map(Some),
            _ => Ok(None),
        }
    }

    pub fn signer(&self) -> PrivateKeySigner {
        self.signer.clone()
    }
}

impl WalletProvider for LocalKeyWallet {
    fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(vec![self.signer.address().to_string()])
    }
}

/// Result of a connect attempt. Failures leave the session unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(WalletSession),
    /// No wallet provider installed
    Unavailable,
    /// Provider refused or errored
    Rejected(String),
}

/// Owns the wallet session and its persisted copy.
pub struct WalletConnector {
    provider: Option<Box<dyn WalletProvider>>,
    store: SessionStore,
    session: Option<WalletSession>,
}

impl WalletConnector {
    pub fn new(provider: Option<Box<dyn WalletProvider>>, store: SessionStore) -> Self {
        Self {
            provider,
            store,
            session: None,
        }
    }

    /// Pick up a saved session without asking the wallet.
    pub fn restore(&mut self) -> Option<&WalletSession> {
        match self.store.load() {
            Ok(Some(session)) => {
                info!(address = %session.address, "restored wallet session");
                self.session = Some(session);
            }
            Ok(None) => self.session = None,
            Err(e) => {
                warn!("ignoring saved session at {}: {}", self.store.path().display(), e);
                self.session = None;
            }
        }
        self.session.as_ref()
    }

    pub fn connect(&mut self) -> ConnectOutcome {
        let Some(provider) = &self.provider else {
            warn!("{}", GameError::WalletUnavailable);
            return ConnectOutcome::Unavailable;
        };

        let address = match provider.request_accounts() {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(a) => a,
                None => {
                    error!("wallet returned no accounts");
                    return ConnectOutcome::Rejected("no accounts".to_string());
                }
            },
            Err(e) => {
                error!("error connecting wallet: {}", e);
                return ConnectOutcome::Rejected(e.to_string());
            }
        };

        let session = WalletSession::new(address);
        if let Err(e) = self.store.save(&session) {
            // Still connected for this run
            warn!("could not persist session: {}", e);
        }
        info!(address = %session.address, "wallet connected");
        self.session = Some(session.clone());
        ConnectOutcome::Connected(session)
    }

    pub fn disconnect(&mut self) -> Result<()> {
        self.session = None;
        self.store.clear()?;
        info!("wallet disconnected");
        Ok(())
    }

    pub fn session(&self) -> Option<&WalletSession> {
        self.session.as_ref()
    }
}
