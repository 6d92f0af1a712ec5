use std::future::Future;
use std::time::Duration;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, U256};
use futures_util::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info};

use crate::error::{GameError, Result};
use crate::events::Notification;
use crate::state::GameSnapshot;

sol! {
    #[sol(rpc)]
    contract PredictionGame {
        struct PlayerPrediction {
            address player;
            uint256 prediction;
        }

        event PlayerEntered(address indexed player, uint256 prediction);
        event WinnersDetermined(address[] winners);

        function getGameState() external view returns (uint8);
        function getLastTimeStamp() external view returns (uint256);
        function getPlayerPredictions() external view returns (PlayerPrediction[] memory);
        function playerEntry(uint256 prediction) external payable;
    }
}

/// How often the node is asked for new logs
const LOG_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// The parts of the deployed game contract the client uses.
pub trait GameContract: Send + Sync + 'static {
    /// Raw phase code from `getGameState()`
    fn game_state(&self) -> impl Future<Output = Result<u8>> + Send;

    /// `getLastTimeStamp()` in unix seconds
    fn last_timestamp(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Length of `getPlayerPredictions()`
    fn prediction_count(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Send `playerEntry(prediction)` carrying `wager` wei and wait for the receipt.
    fn enter(&self, prediction: U256, wager: U256) -> impl Future<Output = Result<B256>> + Send;

    /// Entry and winners notifications from now on, in chain order.
    fn notifications(
        &self,
    ) -> impl Future<Output = Result<BoxStream<'static, Notification>>> + Send;

    /// Phase and timestamp together.
    fn snapshot(&self) -> impl Future<Output = Result<GameSnapshot>> + Send {
        async move {
            let last_transition = self.last_timestamp().await?;
            let phase_code = self.game_state().await?;
            Ok(GameSnapshot {
                phase_code,
                last_transition,
            })
        }
    }
}

/// The game contract on a live chain.
pub struct ChainGame {
    instance: PredictionGame::PredictionGameInstance<DynProvider>,
}

impl ChainGame {
    /// Reads only; `enter` will fail at the node.
    pub fn read_only(rpc_url: &str, address: Address) -> anyhow::Result<Self> {
        let provider = ProviderBuilder::new().connect_http(rpc_url.parse()?).erased();
        Ok(Self::from_provider(provider, address))
    }

    /// Reads and signs with `signer`.
    pub fn with_signer(
        rpc_url: &str,
        address: Address,
        signer: PrivateKeySigner,
    ) -> anyhow::Result<Self> {
        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect_http(rpc_url.parse()?)
            .erased();
        Ok(Self::from_provider(provider, address))
    }

    fn from_provider(provider: DynProvider, address: Address) -> Self {
        info!(%address, "using game contract");
        Self {
            instance: PredictionGame::new(address, provider),
        }
    }
}

fn read_err(e: impl std::fmt::Display) -> GameError {
    GameError::ContractRead(e.to_string())
}

fn submit_err(e: impl std::fmt::Display) -> GameError {
    GameError::Submission(e.to_string())
}

/// Map a log's first topic to a notification.
pub fn classify(topic0: Option<&B256>) -> Option<Notification> {
    match topic0 {
        Some(t) if *t == PredictionGame::PlayerEntered::SIGNATURE_HASH => {
            Some(Notification::PlayerEntered)
        }
        Some(t) if *t == PredictionGame::WinnersDetermined::SIGNATURE_HASH => {
            Some(Notification::WinnersDetermined)
        }
        _ => None,
    }
}

impl GameContract for ChainGame {
    async fn game_state(&self) -> Result<u8> {
        self.instance.getGameState().call().await.map_err(read_err)
    }

    async fn last_timestamp(&self) -> Result<u64> {
        let ts: U256 = self.instance.getLastTimeStamp().call().await.map_err(read_err)?;
        Ok(ts.saturating_to::<u64>())
    }

    async fn prediction_count(&self) -> Result<u64> {
        let list = self
            .instance
            .getPlayerPredictions()
            .call()
            .await
            .map_err(read_err)?;
        Ok(list.len() as u64)
    }

    async fn enter(&self, prediction: U256, wager: U256) -> Result<B256> {
        let pending = self
            .instance
            .playerEntry(prediction)
            .value(wager)
            .send()
            .await
            .map_err(submit_err)?;

        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "entry sent, waiting for receipt");

        let receipt = pending.get_receipt().await.map_err(submit_err)?;
        if !receipt.status() {
            return Err(GameError::Submission(format!("transaction {} reverted", tx_hash)));
        }
        Ok(tx_hash)
    }

    async fn notifications(&self) -> Result<BoxStream<'static, Notification>> {
        // One filter for both events so log order is preserved.
        let filter = Filter::new()
            .address(*self.instance.address())
            .event_signature(vec![
                PredictionGame::PlayerEntered::SIGNATURE_HASH,
                PredictionGame::WinnersDetermined::SIGNATURE_HASH,
            ]);

        let poller = self
            .instance
            .provider()
            .watch_logs(&filter)
            .await
            .map_err(read_err)?
            .with_poll_interval(LOG_POLL_INTERVAL);

        let stream = poller
            .into_stream()
            .flat_map(|logs| {
                stream::iter(
                    logs.into_iter()
                        .filter_map(|log| classify(log.topics().first())),
                )
            })
            .boxed();
        Ok(stream)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// In-memory contract for tests.
    #[derive(Default)]
    pub struct FakeGame {
        pub phase: AtomicU8,
        pub last_timestamp: AtomicU64,
        pub predictions: AtomicU64,
        /// Remaining reads that fail before one succeeds
        pub failing_reads: AtomicU32,
        /// Every read attempt, failed or not
        pub read_calls: AtomicU32,
        pub revert_entries: AtomicBool,
        pub entries: Mutex<Vec<(U256, U256)>>,
        pub listeners: Mutex<Vec<mpsc::UnboundedSender<Notification>>>,
    }

    impl FakeGame {
        pub fn open_since(last_timestamp: u64) -> Self {
            let game = Self::default();
            game.last_timestamp.store(last_timestamp, Ordering::SeqCst);
            game
        }

        pub fn emit(&self, n: Notification) {
            let mut listeners = self.listeners.lock().unwrap();
            listeners.retain(|tx| tx.send(n).is_ok());
        }

        fn read(&self) -> Result<()> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failing_reads.load(Ordering::SeqCst);
            if left > 0 {
                self.failing_reads.store(left - 1, Ordering::SeqCst);
                return Err(GameError::ContractRead("node unavailable".into()));
            }
            Ok(())
        }
    }

    impl GameContract for FakeGame {
        async fn game_state(&self) -> Result<u8> {
            self.read()?;
            Ok(self.phase.load(Ordering::SeqCst))
        }

        async fn last_timestamp(&self) -> Result<u64> {
            self.read()?;
            Ok(self.last_timestamp.load(Ordering::SeqCst))
        }

        async fn prediction_count(&self) -> Result<u64> {
            self.read()?;
            Ok(self.predictions.load(Ordering::SeqCst))
        }

        async fn enter(&self, prediction: U256, wager: U256) -> Result<B256> {
            if self.revert_entries.load(Ordering::SeqCst) {
                return Err(GameError::Submission("execution reverted".into()));
            }
            self.entries.lock().unwrap().push((prediction, wager));
            self.predictions.fetch_add(1, Ordering::SeqCst);
            self.emit(Notification::PlayerEntered);
            Ok(B256::with_last_byte(1))
        }

        async fn notifications(&self) -> Result<BoxStream<'static, Notification>> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.listeners.lock().unwrap().push(tx);
            let stream = stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|n| (n, rx))
            });
            Ok(stream.boxed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_topics() {
        assert_eq!(
            classify(Some(&PredictionGame::PlayerEntered::SIGNATURE_HASH)),
            Some(Notification::PlayerEntered)
        );
        assert_eq!(
            classify(Some(&PredictionGame::WinnersDetermined::SIGNATURE_HASH)),
            Some(Notification::WinnersDetermined)
        );
        assert_eq!(classify(Some(&B256::ZERO)), None);
        assert_eq!(classify(None), None);
    }

    #[test]
    fn test_event_signatures() {
        assert_eq!(
            PredictionGame::PlayerEntered::SIGNATURE,
            "PlayerEntered(address,uint256)"
        );
        assert_eq!(
            PredictionGame::WinnersDetermined::SIGNATURE,
            "WinnersDetermined(address[])"
        );
    }

    #[tokio::test]
    async fn test_snapshot_reads_both() {
        use std::sync::atomic::Ordering;
        let game = fake::FakeGame::open_since(1_700_000_000);
        game.phase.store(1, Ordering::SeqCst);

        let snap = game.snapshot().await.unwrap();
        assert_eq!(snap.phase_code, 1);
        assert_eq!(snap.last_transition, 1_700_000_000);
    }
}
