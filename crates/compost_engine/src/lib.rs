//! ChatCompost engine: the page abstraction, selection persistence, the
//! reconciler, deletion strategies and the session that drives them.
mod error;
mod guard;
mod memory_page;
mod orchestrator;
mod page;
mod reconciler;
mod session;
mod sidebar;
mod storage;
mod store;
mod strategy;

pub use error::DeleteError;
pub use guard::ReentrancyGuard;
pub use memory_page::{MemoryPage, RecordingSurface};
pub use orchestrator::{BatchOrchestrator, RunRejected};
pub use page::{HostPage, HostSurface, PageEvent, UiEvent, CONTROL_CLASS, CONTROL_SELECTOR};
pub use reconciler::{PassReport, Reconciler};
pub use session::Session;
pub use sidebar::Sidebar;
pub use storage::{ensure_session_dir, FileSessionStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::SelectionStore;
pub use strategy::{
    build_strategy, DeletionStrategy, DirectCallStrategy, ScriptedInteractionStrategy,
};
