use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::api::GameContract;
use crate::events::Event;
use crate::feeds::retry::{with_retry, Backoff};
use crate::feeds::FeedHandle;

/// Reads phase and last transition from the contract on start and again on
/// every resync request.
pub struct GamePoller<C> {
    contract: Arc<C>,
    backoff: Backoff,
}

/// Ask a running poller for a fresh read.
#[derive(Debug, Clone)]
pub struct ResyncHandle(mpsc::Sender<()>);

impl ResyncHandle {
    /// Coalesces: a request already queued covers this one.
    pub fn request(&self) {
        let _ = self.0.try_send(());
    }
}

impl<C: GameContract> GamePoller<C> {
    pub fn new(contract: Arc<C>, backoff: Backoff) -> Self {
        Self { contract, backoff }
    }

    /// Spawns the poller. Sends GameSnapshot or GameReadFailed per read.
    pub fn spawn(self, tx: mpsc::Sender<Event>) -> (FeedHandle, ResyncHandle) {
        let (resync_tx, mut resync_rx) = mpsc::channel::<()>(1);

        let handle = tokio::spawn(async move {
            loop {
                debug!("reading game state");
                let result = with_retry(self.backoff, "game state read", || {
                    self.contract.snapshot()
                })
                .await;

                let event = match result {
                    Ok(snapshot) => Event::GameSnapshot(snapshot),
                    Err(e) => {
                        error!("game state read gave up: {}", e);
                        Event::GameReadFailed {
                            reason: e.to_string(),
                        }
                    }
                };

                if tx.send(event).await.is_err() {
                    break;
                }

                if resync_rx.recv().await.is_none() {
                    break;
                }
            }
        });

        (FeedHandle::new(handle), ResyncHandle(resync_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::contract::fake::FakeGame;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fast() -> Backoff {
        Backoff::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_reads_on_start() {
        let game = Arc::new(FakeGame::open_since(1_700_000_000));
        let (tx, mut rx) = mpsc::channel(4);
        let (_feed, _resync) = GamePoller::new(game, fast()).spawn(tx);

        match rx.recv().await {
            Some(Event::GameSnapshot(s)) => {
                assert_eq!(s.phase_code, 0);
                assert_eq!(s.last_transition, 1_700_000_000);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resync_picks_up_new_phase() {
        let game = Arc::new(FakeGame::open_since(1_700_000_000));
        let (tx, mut rx) = mpsc::channel(4);
        let (_feed, resync) = GamePoller::new(game.clone(), fast()).spawn(tx);

        assert!(matches!(rx.recv().await, Some(Event::GameSnapshot(_))));

        game.phase.store(1, Ordering::SeqCst);
        game.last_timestamp.store(1_700_086_400, Ordering::SeqCst);
        resync.request();

        match rx.recv().await {
            Some(Event::GameSnapshot(s)) => {
                assert_eq!(s.phase_code, 1);
                assert_eq!(s.last_transition, 1_700_086_400);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let game = Arc::new(FakeGame::open_since(1_700_000_000));
        game.failing_reads.store(2, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::channel(4);
        let (_feed, _resync) = GamePoller::new(game.clone(), fast()).spawn(tx);

        assert!(matches!(rx.recv().await, Some(Event::GameSnapshot(_))));
        // two failed attempts, then both reads of the good attempt
        assert_eq!(game.read_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_persistent_failure_surfaces() {
        let game = Arc::new(FakeGame::open_since(1_700_000_000));
        game.failing_reads.store(100, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::channel(4);
        let (_feed, _resync) = GamePoller::new(game, fast()).spawn(tx);

        match rx.recv().await {
            Some(Event::GameReadFailed { reason }) => assert!(reason.contains("node unavailable")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
