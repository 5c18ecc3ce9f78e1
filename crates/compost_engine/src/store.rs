use std::rc::Rc;

use compost_core::{decide_write, ConversationId, SelectionSet, WriteContext, WriteDecision};
use compost_logging::{compost_debug, compost_error, compost_trace, compost_warn};

use crate::guard::ReentrancyGuard;
use crate::storage::{SessionStorage, StorageError};

/// Sole owner of the persisted selection. Everything else reads and asks
/// for writes through it.
pub struct SelectionStore {
    storage: Rc<dyn SessionStorage>,
    key: String,
    guard: Rc<ReentrancyGuard>,
}

impl SelectionStore {
    pub fn new(
        storage: Rc<dyn SessionStorage>,
        key: impl Into<String>,
        guard: Rc<ReentrancyGuard>,
    ) -> Self {
        Self {
            storage,
            key: key.into(),
            guard,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persisted selection; absent or unreadable data reads as empty.
    pub fn load(&self) -> SelectionSet {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SelectionSet::new(),
            Err(err) => {
                compost_warn!("Failed to read selection {}: {}", self.key, err);
                return SelectionSet::new();
            }
        };
        match SelectionSet::from_json(&raw) {
            Ok(selection) => selection,
            Err(err) => {
                let err = StorageError::Corrupt(err.to_string());
                compost_warn!("{} under {}; treating it as empty", err, self.key);
                SelectionSet::new()
            }
        }
    }

    /// Adds `ids` to the persisted selection.
    pub fn merge(&self, ids: &SelectionSet) -> bool {
        let previous = self.load();
        let next = previous.union(ids);
        self.write(&previous, &next, WriteContext::explicit(self.guard.is_active()))
    }

    /// Replaces the persisted selection with what the mounted controls show.
    pub fn replace(&self, ids: SelectionSet, controls_mounted: bool) -> bool {
        let previous = self.load();
        let context = WriteContext {
            guard_active: self.guard.is_active(),
            controls_mounted,
        };
        self.write(&previous, &ids, context)
    }

    /// Drops one identifier, e.g. after its conversation was deleted.
    pub fn remove(&self, id: &ConversationId) -> bool {
        let previous = self.load();
        let mut next = previous.clone();
        if !next.remove(id) {
            return false;
        }
        self.write(&previous, &next, WriteContext::explicit(self.guard.is_active()))
    }

    /// Unconditional; only used once a batch run is over.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(&self.key) {
            compost_error!("Failed to clear selection {}: {}", self.key, err);
        }
    }

    fn write(&self, previous: &SelectionSet, next: &SelectionSet, context: WriteContext) -> bool {
        match decide_write(previous, next, context) {
            WriteDecision::Write => {}
            skipped => {
                compost_trace!("selection write skipped: {skipped:?}");
                return false;
            }
        }
        let json = match next.to_json() {
            Ok(json) => json,
            Err(err) => {
                compost_error!("Failed to serialize selection: {}", err);
                return false;
            }
        };
        match self.storage.set(&self.key, &json) {
            Ok(()) => {
                compost_debug!("saved {} selected conversation(s)", next.len());
                true
            }
            Err(err) => {
                compost_error!("Failed to save selection {}: {}", self.key, err);
                false
            }
        }
    }
}
