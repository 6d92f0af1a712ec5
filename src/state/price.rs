/// Last known BTC quote from the price endpoint.
#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    usd: Option<f64>,
    /// Refresh outstanding or last refresh failed
    stale: bool,
    /// Timestamp of last good quote (milliseconds)
    pub last_update_ms: i64,
}

impl PriceBoard {
    pub fn usd(&self) -> Option<f64> {
        self.usd
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn update(&mut self, usd: f64, timestamp_ms: i64) {
        self.usd = Some(usd);
        self.stale = false;
        self.last_update_ms = timestamp_ms;
    }

    /// Keep the old quote but flag it.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Whole dollars, floored.
    pub fn whole_usd(&self) -> Option<i64> {
        self.usd.filter(|p| p.is_finite()).map(|p| p.floor() as i64)
    }
}
