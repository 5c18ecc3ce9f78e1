#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The startup delay elapsed; run the first pass right away.
    Started,
    /// The observed container's subtree changed.
    ContainerMutated,
    /// Startup poll while no item has been found yet.
    PollTick,
    /// A debounce timer armed for `generation` fired.
    DebounceElapsed { generation: u64 },
    /// The ensure-controls pass finished.
    PassCompleted { items_found: usize },
    /// Time for the delayed restore sub-pass.
    RestoreDue,
    /// Our own mutations have settled.
    SettleElapsed,
    NoOp,
}
