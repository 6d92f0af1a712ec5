use crate::config::ErrorPolicy;
use crate::events::Event;
use crate::state::{GameClock, PlayerCounter, PriceBoard, TickOutcome, WalletSession};
use crate::view;

/// What the event loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Ask the game poller for a fresh read
    Resync,
    Quit,
}

/// Everything the dashboard shows. Owned by the event loop, so no locking.
pub struct Dashboard {
    pub clock: GameClock,
    pub players: PlayerCounter,
    pub price: PriceBoard,
    session: Option<WalletSession>,
    entry_fee_eth: String,
    chain_name: String,
    price_errors: ErrorPolicy,
    /// Errors waiting to be shown
    notices: Vec<String>,
}

impl Dashboard {
    pub fn new(
        interval_secs: u64,
        session: Option<WalletSession>,
        entry_fee_eth: String,
        chain_name: String,
        price_errors: ErrorPolicy,
    ) -> Self {
        Self {
            clock: GameClock::new(interval_secs),
            players: PlayerCounter::new(),
            price: PriceBoard::default(),
            session,
            entry_fee_eth,
            chain_name,
            price_errors,
            notices: Vec::new(),
        }
    }

    /// Apply one event. `now` is unix seconds.
    pub fn handle(&mut self, event: Event, now: u64) -> Step {
        match event {
            Event::PriceRefreshing => {
                self.price.mark_stale();
            }
            Event::PriceQuote { usd } => {
                self.price.update(usd, (now as i64) * 1000);
            }
            Event::PriceFailed { reason } => {
                self.price.mark_stale();
                if self.price_errors == ErrorPolicy::Surface {
                    self.notices.push(format!("Price unavailable: {}", reason));
                } else {
                    tracing::debug!("price fetch failed: {}", reason);
                }
            }
            Event::GameSnapshot(snapshot) => {
                self.clock.apply(snapshot, now);
            }
            Event::GameReadFailed { reason } => {
                self.clock.read_failed();
                self.notices.push(format!("Contract read failed: {}", reason));
            }
            Event::PlayerCount { count } => {
                self.players.load(count);
            }
            Event::PlayerCountFailed { reason } => {
                self.notices.push(format!("Could not count predictions: {}", reason));
            }
            Event::Contract(notification) => {
                self.players.apply(notification);
            }
            Event::Tick => {
                if self.clock.tick() == TickOutcome::Resync {
                    return Step::Resync;
                }
            }
            Event::Shutdown => return Step::Quit,
        }
        Step::Continue
    }

    /// Pending error lines, oldest first.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn render(&self) -> Vec<String> {
        let phase = self.clock.phase();
        let remaining = self.clock.remaining();
        vec![
            view::wallet(self.session.as_ref()),
            view::phase_line(phase, remaining),
            view::entry_fee(&self.entry_fee_eth, &self.chain_name),
            format!("Current BTC Price: {}", view::price(&self.price)),
            view::prediction_count(Some(self.players.count())),
            format!("[{}]", view::submit_label(phase)),
        ]
    }

    /// Compact form for a single status line.
    pub fn status_line(&self) -> String {
        self.render()[1..].join(" | ")
    }
}
