use std::collections::BTreeSet;

use crate::ConversationId;

/// Persisted set of checked conversations; the authority over every control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(BTreeSet<ConversationId>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the persisted JSON array. Blank entries are dropped.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let ids: Vec<String> = serde_json::from_str(raw)?;
        Ok(ids.into_iter().filter_map(ConversationId::new).collect())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let ids: Vec<&str> = self.0.iter().map(ConversationId::as_str).collect();
        serde_json::to_string(&ids)
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.0.contains(id)
    }

    pub fn insert(&mut self, id: ConversationId) -> bool {
        self.0.insert(id)
    }

    pub fn remove(&mut self, id: &ConversationId) -> bool {
        self.0.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationId> {
        self.0.iter()
    }

    pub fn union(&self, other: &SelectionSet) -> SelectionSet {
        SelectionSet(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<ConversationId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = ConversationId>>(iter: I) -> Self {
        SelectionSet(iter.into_iter().collect())
    }
}

/// Conditions under which a write is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteContext {
    /// The reconciler is restoring controls; whatever changed was not the user.
    pub guard_active: bool,
    /// At least one selection control is mounted. Without controls, an empty
    /// observation means "unknown", not "nothing selected".
    pub controls_mounted: bool,
}

impl WriteContext {
    /// A write that does not depend on what is currently mounted.
    pub fn explicit(guard_active: bool) -> Self {
        Self {
            guard_active,
            controls_mounted: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    Write,
    SuppressedByGuard,
    UnknownState,
    NothingToWrite,
}

/// Decides whether `next` may replace `previous` in storage.
///
/// A non-empty set is always written. An empty set is only written when it
/// clears a non-empty one, so transient states with no checked controls can
/// never erase a persisted selection.
pub fn decide_write(
    previous: &SelectionSet,
    next: &SelectionSet,
    context: WriteContext,
) -> WriteDecision {
    if context.guard_active {
        WriteDecision::SuppressedByGuard
    } else if !context.controls_mounted {
        WriteDecision::UnknownState
    } else if !next.is_empty() || !previous.is_empty() {
        WriteDecision::Write
    } else {
        WriteDecision::NothingToWrite
    }
}
