use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::price::fetch_quote;
use crate::events::Event;
use crate::feeds::FeedHandle;

/// Spawns a task that polls the price endpoint. Each fetch sends
/// PriceRefreshing, then PriceQuote or PriceFailed. The first fetch happens
/// immediately.
pub fn spawn(url: String, period: Duration, tx: mpsc::Sender<Event>) -> FeedHandle {
    let client = reqwest::Client::new();

    FeedHandle::new(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            debug!(%url, "fetching price");
            if tx.send(Event::PriceRefreshing).await.is_err() {
                break;
            }

            let event = match fetch_quote(&client, &url).await {
                Ok(usd) => Event::PriceQuote { usd },
                Err(e) => Event::PriceFailed {
                    reason: e.to_string(),
                },
            };

            if tx.send(event).await.is_err() {
                break;
            }
        }
    }))
}
