use std::cell::Cell;
use std::time::Duration;

use tokio::time::Instant;

/// Raised while the reconciler rewrites controls so that its own changes
/// are not persisted as if the user made them.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    engaged: Cell<bool>,
    hold_until: Cell<Option<Instant>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&self) {
        self.engaged.set(true);
    }

    /// Lets go of the guard once `grace` has passed.
    pub fn release_after(&self, grace: Duration) {
        self.engaged.set(false);
        self.hold_until.set(Some(Instant::now() + grace));
    }

    pub fn is_active(&self) -> bool {
        self.engaged.get()
            || self
                .hold_until
                .get()
                .is_some_and(|until| Instant::now() < until)
    }
}
