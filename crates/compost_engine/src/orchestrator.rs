use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, DeletionOutcome, RunReport};
use compost_logging::{compost_debug, compost_error, compost_info, compost_warn};
use thiserror::Error;

use crate::page::{HostPage, HostSurface};
use crate::sidebar::Sidebar;
use crate::store::SelectionStore;
use crate::strategy::DeletionStrategy;

/// Why a batch run did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunRejected {
    #[error("a batch run is already in flight")]
    InFlight,
    #[error("no conversation is selected")]
    EmptySelection,
    #[error("the user declined the confirmation")]
    Declined,
}

/// Clears the in-flight latch however the run ends.
struct Latch<'a>(&'a Cell<bool>);

impl Drop for Latch<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Runs one confirmed batch at a time, item after item.
pub struct BatchOrchestrator<P: HostPage> {
    sidebar: Rc<Sidebar<P>>,
    store: Rc<SelectionStore>,
    surface: Rc<dyn HostSurface>,
    strategy: Box<dyn DeletionStrategy<P>>,
    reload_delay: Duration,
    in_flight: Cell<bool>,
}

impl<P: HostPage> BatchOrchestrator<P> {
    pub fn new(
        sidebar: Rc<Sidebar<P>>,
        store: Rc<SelectionStore>,
        surface: Rc<dyn HostSurface>,
        strategy: Box<dyn DeletionStrategy<P>>,
        reload_delay: Duration,
    ) -> Self {
        Self {
            sidebar,
            store,
            surface,
            strategy,
            reload_delay,
            in_flight: Cell::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.get()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Deletes `selected` after one confirmation. Afterwards the persisted
    /// selection is cleared and a reload is scheduled, whatever the outcome.
    pub async fn run(&self, selected: Vec<P::Element>) -> Result<RunReport, RunRejected> {
        if self.in_flight.get() {
            compost_debug!("batch requested while another one is running");
            return Err(RunRejected::InFlight);
        }
        if selected.is_empty() {
            return Err(RunRejected::EmptySelection);
        }

        let total = selected.len();
        let question = format!(
            "Delete {} {} conversation(s)? This cannot be undone.",
            total,
            self.sidebar.adapter().display_name
        );
        if !self.surface.confirm(&question) {
            compost_info!("Batch of {total} declined");
            return Err(RunRejected::Declined);
        }

        self.in_flight.set(true);
        let _latch = Latch(&self.in_flight);
        compost_info!("Deleting {} conversation(s) with the {} strategy", total, self.strategy.name());

        let mut report = RunReport::default();
        let mut halted: Option<String> = None;
        for (index, item) in selected.into_iter().enumerate() {
            let position = index + 1;
            let selection_id = self.sidebar.identify(item);

            if let Some(reason) = &halted {
                report.push(
                    selection_id,
                    DeletionOutcome::Failed {
                        reason: reason.clone(),
                    },
                );
                continue;
            }

            let remote_key = self.sidebar.remote_key(item);
            if remote_key.is_none() && self.strategy.requires_identifier() {
                compost_warn!("Could not get conversation id for item {position}");
                report.push(selection_id, DeletionOutcome::SkippedNoIdentifier);
                continue;
            }

            self.surface.show_progress(position, total);
            match self.strategy.delete_one(remote_key.as_ref(), item).await {
                Ok(()) => {
                    compost_info!("Deleted conversation {position}/{total}");
                    self.settle_deleted(item, selection_id.as_ref());
                    report.push(selection_id, DeletionOutcome::Succeeded);
                }
                Err(err) => {
                    compost_error!("Failed to delete conversation {position}/{total}: {err}");
                    if err.halts_batch() {
                        halted = Some(err.to_string());
                    }
                    report.push(
                        selection_id,
                        DeletionOutcome::Failed {
                            reason: err.to_string(),
                        },
                    );
                }
            }
            tokio::time::sleep(self.strategy.item_delay()).await;
        }

        let summary = report.summary();
        compost_info!(
            "Done. Success: {}, Failed: {}",
            summary.succeeded,
            summary.unsuccessful()
        );
        if summary.has_failures() {
            self.surface.alert(&summary.alert_message());
        }
        self.store.clear();
        self.surface.schedule_reload(self.reload_delay);
        Ok(report)
    }

    fn settle_deleted(&self, item: P::Element, id: Option<&ConversationId>) {
        let page = self.sidebar.page();
        page.mark_removed(item);
        if let Some(control) = page.control_of(item) {
            page.set_checked(control, false);
        }
        if let Some(id) = id {
            self.store.remove(id);
        }
        self.surface
            .show_selected_count(self.sidebar.selected_items().len());
    }
}
