pub mod game;
pub mod players;
pub mod price;
pub mod retry;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::Event;

/// A running feed task. Dropping it stops the task.
#[derive(Debug)]
pub struct FeedHandle(JoinHandle<()>);

impl FeedHandle {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawns a task that sends a Tick event every `period`
pub fn spawn_ticker(tx: mpsc::Sender<Event>, period: Duration) -> FeedHandle {
    FeedHandle::new(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if tx.send(Event::Tick).await.is_err() {
                break;
            }
        }
    }))
}
