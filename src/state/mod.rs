mod clock;
mod players;
mod price;
mod session;

pub use clock::{time_remaining, GameClock, GameSnapshot, Phase, TickOutcome};
pub use players::PlayerCounter;
pub use price::PriceBoard;
pub use session::{SessionStore, WalletSession};

#[cfg(test)]
pub(crate) use session::scratch_path;
