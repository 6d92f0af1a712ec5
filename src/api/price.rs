use serde::Deserialize;

use crate::error::{GameError, Result};

/// Price endpoint response: `{ "USD": 65000.7 }`
#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(rename = "USD")]
    usd: f64,
}

/// Decode a response body. simd-json parses in place, so it needs the bytes mutably.
pub fn parse_quote(body: &mut [u8]) -> Result<f64> {
    let response: PriceResponse =
        simd_json::from_slice(body).map_err(|e| GameError::PriceFetch(e.to_string()))?;
    Ok(response.usd)
}

/// GET the price endpoint once.
pub async fn fetch_quote(client: &reqwest::Client, url: &str) -> Result<f64> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GameError::PriceFetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(GameError::PriceFetch(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| GameError::PriceFetch(e.to_string()))?;
    let mut body = body.to_vec();
    parse_quote(&mut body)
}
