//! ChatCompost core: pure selection model, identity resolution and the
//! reconciliation state machine. Nothing here touches a page or a clock.
mod adapter;
mod effect;
mod identity;
mod ids;
mod msg;
mod outcome;
mod selection;
mod state;
mod timings;
mod update;

pub use adapter::{
    DeletionConfig, DirectConfig, ExclusionRules, IdRule, PlatformAdapter, ScriptedConfig,
    StartupPolicy,
};
pub use effect::Effect;
pub use identity::{remote_key, resolve, ItemSignals, TEXT_FALLBACK_LEN};
pub use ids::ConversationId;
pub use msg::Msg;
pub use outcome::{DeletionOutcome, ItemOutcome, RunReport, RunSummary};
pub use selection::{decide_write, SelectionSet, WriteContext, WriteDecision};
pub use state::{Phase, ReconcileState};
pub use timings::{millis, Timings};
pub use update::update;
