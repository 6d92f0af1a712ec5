use crate::state::GameSnapshot;

// Everything the feeds push into the dashboard loop.
// Each variant carries only what the loop needs to update its state.
#[derive(Debug)]
pub enum Event {
    // Price fetch started; last quote is stale until it lands
    PriceRefreshing,

    // Price endpoint answered
    PriceQuote { usd: f64 },

    // Price endpoint failed; last quote is now stale
    PriceFailed { reason: String },

    // Fresh read of phase + last transition from the contract
    GameSnapshot(GameSnapshot),

    // Contract read failed after all retries
    GameReadFailed { reason: String },

    // Initial length of getPlayerPredictions()
    PlayerCount { count: u64 },

    // Initial prediction list read failed after all retries
    PlayerCountFailed { reason: String },

    // Contract notification, in chain order
    Contract(Notification),

    // Timer tick (every second)
    Tick,

    // Ctrl+C or kill signal
    Shutdown,
}

/// Contract-emitted notifications the player counter listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    PlayerEntered,
    WinnersDetermined,
}
