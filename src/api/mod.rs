pub mod contract;
pub mod price;

pub use contract::{ChainGame, GameContract};
