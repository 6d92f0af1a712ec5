use thiserror::Error;

/// Everything that can go wrong talking to the wallet, the contract or the price API.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no wallet available (set PREDICT_PRIVATE_KEY)")]
    WalletUnavailable,

    #[error("wallet rejected the request: {0}")]
    WalletRejected(String),

    #[error("contract read failed: {0}")]
    ContractRead(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("price fetch failed: {0}")]
    PriceFetch(String),

    #[error("invalid prediction {input:?}: {reason}")]
    InvalidPrediction { input: String, reason: &'static str },

    #[error("game is not open for predictions")]
    GameNotOpen,

    #[error("session file: {0}")]
    SessionIo(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    SessionDecode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
