use crate::state::{Phase, PriceBoard, WalletSession};

/// Shown instead of a countdown while loading
pub const COUNTDOWN_PLACEHOLDER: &str = "...";

/// `HHh MMm SSs`
pub fn format_countdown(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}h {:02}m {:02}s", hours, minutes, secs)
}

pub fn countdown(phase: Phase, remaining: Option<u64>) -> String {
    match (phase, remaining) {
        (Phase::Loading, _) | (_, None) => COUNTDOWN_PLACEHOLDER.to_string(),
        (_, Some(secs)) => format_countdown(secs),
    }
}

pub fn phase_line(phase: Phase, remaining: Option<u64>) -> String {
    match phase {
        Phase::Loading => "FETCHING DATA...".to_string(),
        Phase::Open => format!("Predictions end in {}", countdown(phase, remaining)),
        Phase::Closed => format!(
            "Game is currently closed. Winners will be picked in {}",
            countdown(phase, remaining)
        ),
    }
}

/// What the submit action says for each phase.
pub fn submit_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Loading => "FETCHING DATA...",
        Phase::Open => "SUBMIT",
        Phase::Closed => "GAME CLOSED",
    }
}

pub fn price(board: &PriceBoard) -> String {
    match board.whole_usd() {
        Some(usd) if board.is_stale() => format!("{} USD (stale)", usd),
        Some(usd) => format!("{} USD", usd),
        None => "Loading...".to_string(),
    }
}

pub fn wallet(session: Option<&WalletSession>) -> String {
    match session {
        Some(s) => format!("Connected: {}", s.short_address()),
        None => "Not connected".to_string(),
    }
}

/// `None` when the count could not be read.
pub fn prediction_count(count: Option<u64>) -> String {
    match count {
        Some(n) => format!("Number of Predictions Made This Game: {}", n),
        None => "Number of Predictions Made This Game: unavailable".to_string(),
    }
}

pub fn entry_fee(fee_eth: &str, chain_name: &str) -> String {
    format!("Entry Fee: {} {} ETH", fee_eth, chain_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00h 00m 00s");
        assert_eq!(format_countdown(1), "00h 00m 01s");
        assert_eq!(format_countdown(86_399), "23h 59m 59s");
        assert_eq!(format_countdown(3_661), "01h 01m 01s");
    }

    #[test]
    fn test_loading_shows_placeholder() {
        assert_eq!(countdown(Phase::Loading, None), "...");
        // Even if a stale number is lying around
        assert_eq!(countdown(Phase::Loading, Some(42)), "...");
        assert_eq!(phase_line(Phase::Loading, Some(42)), "FETCHING DATA...");
    }

    #[test]
    fn test_phase_lines() {
        assert_eq!(
            phase_line(Phase::Open, Some(61)),
            "Predictions end in 00h 01m 01s"
        );
        assert_eq!(
            phase_line(Phase::Closed, Some(0)),
            "Game is currently closed. Winners will be picked in 00h 00m 00s"
        );
    }

    #[test]
    fn test_submit_labels() {
        assert_eq!(submit_label(Phase::Loading), "FETCHING DATA...");
        assert_eq!(submit_label(Phase::Open), "SUBMIT");
        assert_eq!(submit_label(Phase::Closed), "GAME CLOSED");
    }

    #[test]
    fn test_price_floored() {
        let mut board = PriceBoard::default();
        assert_eq!(price(&board), "Loading...");

        board.update(65000.7, 0);
        assert_eq!(price(&board), "65000 USD");

        board.mark_stale();
        assert_eq!(price(&board), "65000 USD (stale)");
    }

    #[test]
    fn test_wallet_line() {
        assert_eq!(wallet(None), "Not connected");
        let s = WalletSession::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(wallet(Some(&s)), "Connected: 0xf39F...2266");
    }

    #[test]
    fn test_prediction_count_line() {
        assert_eq!(
            prediction_count(Some(4)),
            "Number of Predictions Made This Game: 4"
        );
        assert_eq!(
            prediction_count(None),
            "Number of Predictions Made This Game: unavailable"
        );
    }

    #[test]
    fn test_entry_fee() {
        assert_eq!(entry_fee("0.001", "Sepolia"), "Entry Fee: 0.001 Sepolia ETH");
    }
}
