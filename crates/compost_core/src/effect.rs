use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the debounce timer. Earlier generations are stale.
    ArmDebounce { generation: u64, delay: Duration },
    RunPass,
    ScheduleRestore { delay: Duration },
    RunRestore,
    ScheduleSettle { delay: Duration },
    SchedulePoll { delay: Duration },
}
