use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::GameContract;
use crate::events::Event;
use crate::feeds::retry::{with_retry, Backoff};
use crate::feeds::FeedHandle;

/// Spawns the player counter feed: a PlayerCount from the contract read, then
/// a Contract event per notification. If the subscription fails or the log
/// stream ends, a PlayerCountFailed notice is sent and the feed re-reads and
/// resubscribes. Dropping the handle unsubscribes.
pub fn spawn<C: GameContract>(
    contract: Arc<C>,
    backoff: Backoff,
    tx: mpsc::Sender<Event>,
) -> FeedHandle {
    FeedHandle::new(tokio::spawn(async move {
        loop {
            let count =
                with_retry(backoff, "prediction list read", || contract.prediction_count()).await;
            let event = match count {
                Ok(count) => Event::PlayerCount { count },
                Err(e) => {
                    error!("prediction list read gave up: {}", e);
                    Event::PlayerCountFailed {
                        reason: e.to_string(),
                    }
                }
            };
            if tx.send(event).await.is_err() {
                return;
            }

            let reason =
                match with_retry(backoff, "event subscription", || contract.notifications()).await {
                    Ok(mut notifications) => {
                        info!("subscribed to PlayerEntered / WinnersDetermined");
                        while let Some(notification) = notifications.next().await {
                            debug!(?notification, "contract notification");
                            if tx.send(Event::Contract(notification)).await.is_err() {
                                return;
                            }
                        }
                        warn!("game event stream ended");
                        "event stream ended, resubscribing".to_string()
                    }
                    Err(e) => {
                        error!("could not subscribe to game events: {}", e);
                        format!("event subscription failed: {}", e)
                    }
                };

            if tx.send(Event::PlayerCountFailed { reason }).await.is_err() {
                return;
            }
            tokio::time::sleep(backoff.delay(0)).await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::contract::fake::FakeGame;
    use crate::events::Notification;
    use crate::state::PlayerCounter;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn fast() -> Backoff {
        Backoff::new(3, Duration::from_millis(1))
    }

    async fn wait_for_listener(game: &FakeGame) {
        while game.listeners.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_counts_in_chain_order() {
        let game = Arc::new(FakeGame::default());
        game.predictions.store(3, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::channel(16);
        let _feed = spawn(game.clone(), fast(), tx);

        let mut counter = PlayerCounter::new();
        match rx.recv().await {
            Some(Event::PlayerCount { count }) => counter.load(count),
            other => panic!("expected count, got {:?}", other),
        }
        assert_eq!(counter.count(), 3);

        wait_for_listener(&game).await;
        game.emit(Notification::PlayerEntered);
        game.emit(Notification::PlayerEntered);
        game.emit(Notification::WinnersDetermined);
        game.emit(Notification::PlayerEntered);

        for _ in 0..4 {
            match rx.recv().await {
                Some(Event::Contract(n)) => counter.apply(n),
                other => panic!("expected notification, got {:?}", other),
            }
        }
        assert_eq!(counter.count(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_notices_and_resubscribes() {
        let game = Arc::new(FakeGame::default());
        game.predictions.store(3, Ordering::SeqCst);

        let (tx, mut rx) = mpsc::channel(16);
        let _feed = spawn(game.clone(), fast(), tx);

        assert!(matches!(rx.recv().await, Some(Event::PlayerCount { count: 3 })));
        wait_for_listener(&game).await;

        // Node forgets the filter
        game.predictions.store(5, Ordering::SeqCst);
        game.listeners.lock().unwrap().clear();

        match rx.recv().await {
            Some(Event::PlayerCountFailed { reason }) => assert!(reason.contains("ended")),
            other => panic!("expected notice, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(Event::PlayerCount { count: 5 })));

        // Subscribed again and still counting
        wait_for_listener(&game).await;
        game.emit(Notification::PlayerEntered);
        assert!(matches!(
            rx.recv().await,
            Some(Event::Contract(Notification::PlayerEntered))
        ));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let game = Arc::new(FakeGame::default());
        let (tx, mut rx) = mpsc::channel(16);
        let feed = spawn(game.clone(), fast(), tx);

        assert!(matches!(rx.recv().await, Some(Event::PlayerCount { count: 0 })));
        wait_for_listener(&game).await;

        drop(feed);
        // The aborted task drops its stream and sender
        assert!(rx.recv().await.is_none());

        game.emit(Notification::PlayerEntered);
        assert!(game.listeners.lock().unwrap().is_empty());
    }
}
