use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed delays used by the reconciler and the batch run. Serialized as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Quiet period that coalesces a burst of container mutations into one pass.
    #[serde(with = "millis")]
    pub debounce: Duration,
    /// Delay before the second sub-pass re-applies persisted selections.
    #[serde(with = "millis")]
    pub restore_delay: Duration,
    /// Time after a pass during which container mutations are treated as our own.
    #[serde(with = "millis")]
    pub settle: Duration,
    /// How long the reentrancy guard stays up after a pass touched controls.
    #[serde(with = "millis")]
    pub guard_grace: Duration,
    /// How long the reentrancy guard stays up after the restore sub-pass.
    #[serde(with = "millis")]
    pub restore_grace: Duration,
    /// Delay between the end of a batch run and the page reload.
    #[serde(with = "millis")]
    pub reload_delay: Duration,
    /// Interval of the periodic selection save. Zero disables it.
    #[serde(with = "millis")]
    pub save_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            restore_delay: Duration::from_millis(300),
            settle: Duration::from_millis(500),
            guard_grace: Duration::from_millis(100),
            restore_grace: Duration::from_millis(50),
            reload_delay: Duration::from_millis(500),
            save_interval: Duration::from_secs(2),
        }
    }
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
