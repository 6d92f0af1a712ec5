/// Contract phase as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing read from the contract yet
    #[default]
    Loading,
    Open,
    Closed,
}

impl Phase {
    /// Contract phase code: 0 is open, anything else is closed.
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Phase::Open
        } else {
            Phase::Closed
        }
    }
}

/// One authoritative read of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub phase_code: u8,
    /// Unix seconds of the last phase transition
    pub last_transition: u64,
}

/// Seconds left in the round, clamped at zero.
/// A clock behind the chain counts as no time elapsed.
pub fn time_remaining(interval_secs: u64, last_transition: u64, now: u64) -> u64 {
    let elapsed = now.saturating_sub(last_transition);
    interval_secs.saturating_sub(elapsed)
}

/// What the dashboard should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown moved (or nothing to count yet)
    Counting,
    /// Countdown expired or last read failed; read the contract again
    Resync,
}

/// Reconciling countdown: decrements locally every second and asks for an
/// authoritative read when it runs out.
#[derive(Debug, Clone)]
pub struct GameClock {
    interval_secs: u64,
    phase: Phase,
    last_transition: Option<u64>,
    remaining: Option<u64>,
    /// A read has been requested and not answered yet
    syncing: bool,
    /// Last read failed, retry on next tick
    stale: bool,
}

impl GameClock {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            phase: Phase::Loading,
            last_transition: None,
            remaining: None,
            // the mount read is issued by the poller itself
            syncing: true,
            stale: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `None` while loading.
    pub fn remaining(&self) -> Option<u64> {
        match self.phase {
            Phase::Loading => None,
            _ => self.remaining,
        }
    }

    pub fn last_transition(&self) -> Option<u64> {
        self.last_transition
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replace local state with a contract read taken at `now`.
    pub fn apply(&mut self, snapshot: GameSnapshot, now: u64) {
        self.phase = Phase::from_code(snapshot.phase_code);
        self.last_transition = Some(snapshot.last_transition);
        self.remaining = Some(time_remaining(
            self.interval_secs,
            snapshot.last_transition,
            now,
        ));
        self.syncing = false;
        self.stale = false;
    }

    /// The requested read failed. Keep showing what we have.
    pub fn read_failed(&mut self) {
        self.syncing = false;
        self.stale = true;
    }

    /// One second passed.
    pub fn tick(&mut self) -> TickOutcome {
        if self.syncing {
            return TickOutcome::Counting;
        }

        if self.stale {
            self.syncing = true;
            return TickOutcome::Resync;
        }

        match self.remaining {
            Some(left) if left > 1 => {
                self.remaining = Some(left - 1);
                TickOutcome::Counting
            }
            Some(_) => {
                self.remaining = Some(0);
                self.syncing = true;
                TickOutcome::Resync
            }
            None => TickOutcome::Counting,
        }
    }
}
