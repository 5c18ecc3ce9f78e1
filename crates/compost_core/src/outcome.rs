use crate::ConversationId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Succeeded,
    Failed { reason: String },
    SkippedNoIdentifier,
}

/// Result for one selected item, in run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: Option<ConversationId>,
    pub outcome: DeletionOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub items: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn push(&mut self, id: Option<ConversationId>, outcome: DeletionOutcome) {
        self.items.push(ItemOutcome { id, outcome });
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for item in &self.items {
            match item.outcome {
                DeletionOutcome::Succeeded => summary.succeeded += 1,
                DeletionOutcome::Failed { .. } => summary.failed += 1,
                DeletionOutcome::SkippedNoIdentifier => summary.skipped += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Items that were selected but not deleted, whatever the reason.
    pub fn unsuccessful(&self) -> usize {
        self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.unsuccessful() > 0
    }

    /// Text of the one alert shown after a run with failures.
    pub fn alert_message(&self) -> String {
        format!(
            "Deleted {} conversations. {} failed. Refreshing...",
            self.succeeded,
            self.unsuccessful()
        )
    }
}
