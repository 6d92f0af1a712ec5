use crate::events::Notification;

/// Number of predictions made this round.
#[derive(Debug, Clone, Default)]
pub struct PlayerCounter {
    count: u64,
    /// Initial contract read has landed
    loaded: bool,
}

impl PlayerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Seed from the length of the on-chain prediction list.
    pub fn load(&mut self, initial: u64) {
        self.count = initial;
        self.loaded = true;
    }

    pub fn apply(&mut self, notification: Notification) {
        match notification {
            Notification::PlayerEntered => self.count = self.count.saturating_add(1),
            Notification::WinnersDetermined => self.count = 0,
        }
    }
}
