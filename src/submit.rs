use std::str::FromStr;

use alloy_primitives::{B256, U256};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::api::GameContract;
use crate::config::ErrorPolicy;
use crate::error::{GameError, Result};
use crate::state::Phase;

/// Parse a user's price prediction. The contract takes a whole number.
pub fn parse_prediction(input: &str) -> Result<U256> {
    let invalid = |reason| GameError::InvalidPrediction {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let value = Decimal::from_str(trimmed).map_err(|_| invalid("not a number"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid("negative"));
    }
    if !value.fract().is_zero() {
        return Err(invalid("must be a whole number"));
    }

    let whole = value.trunc().to_u128().ok_or_else(|| invalid("out of range"))?;
    Ok(U256::from(whole))
}

/// Send one prediction with the entry fee and wait for confirmation.
pub async fn submit_prediction<C: GameContract>(
    contract: &C,
    phase: Phase,
    input: &str,
    wager: U256,
) -> Result<B256> {
    let prediction = parse_prediction(input)?;
    if phase != Phase::Open {
        return Err(GameError::GameNotOpen);
    }

    debug!(%prediction, %wager, "submitting prediction");
    let tx_hash = contract.enter(prediction, wager).await?;
    info!(%tx_hash, %prediction, "prediction confirmed");
    Ok(tx_hash)
}

/// Apply the error policy. Returns the line to show the user, if any.
/// Only failed transactions can be silenced; bad input, a closed game and
/// contract read failures are always shown.
pub fn report<T>(result: &Result<T>, policy: ErrorPolicy) -> Option<String> {
    match (result, policy) {
        (Ok(_), _) => None,
        (Err(e @ GameError::Submission(_)), ErrorPolicy::Silent) => {
            debug!("suppressed: {}", e);
            None
        }
        (Err(e), _) => Some(format!("Error: {}", e)),
    }
}
