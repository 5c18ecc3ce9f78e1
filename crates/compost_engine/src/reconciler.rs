use std::cell::Cell;
use std::rc::Rc;

use compost_core::Timings;
use compost_logging::{compost_debug, compost_info};

use crate::guard::ReentrancyGuard;
use crate::page::{HostPage, HostSurface};
use crate::sidebar::Sidebar;
use crate::store::SelectionStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Qualifying conversation items seen by the pass.
    pub items_found: usize,
    pub controls_inserted: usize,
    /// Controls taken off items that turned out not to be conversations.
    pub controls_removed: usize,
    /// Controls checked to match the persisted selection.
    pub restored: usize,
}

/// Projects the persisted selection onto whatever the host currently renders.
pub struct Reconciler<P: HostPage> {
    sidebar: Rc<Sidebar<P>>,
    store: Rc<SelectionStore>,
    guard: Rc<ReentrancyGuard>,
    surface: Rc<dyn HostSurface>,
    timings: Timings,
    passes: Cell<u64>,
}

impl<P: HostPage> Reconciler<P> {
    pub fn new(
        sidebar: Rc<Sidebar<P>>,
        store: Rc<SelectionStore>,
        guard: Rc<ReentrancyGuard>,
        surface: Rc<dyn HostSurface>,
        timings: Timings,
    ) -> Self {
        Self {
            sidebar,
            store,
            guard,
            surface,
            timings,
            passes: Cell::new(0),
        }
    }

    /// Number of ensure-controls passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes.get()
    }

    /// Ensures every qualifying item carries exactly one control that
    /// reflects the persisted selection.
    pub fn run_pass(&self) -> PassReport {
        self.passes.set(self.passes.get() + 1);
        let page = self.sidebar.page();

        // Checks the user made since the last save must survive the pass.
        let in_flight = self.sidebar.checked_ids();
        if !in_flight.is_empty() {
            self.store.merge(&in_flight);
        }

        self.guard.engage();
        let selection = self.store.load();
        let mut report = PassReport::default();

        for item in self.sidebar.items() {
            if page.is_marked_removed(item) {
                continue;
            }
            if !self.sidebar.admits(item) {
                if page.control_of(item).is_some() {
                    page.remove_control(item);
                    report.controls_removed += 1;
                }
                continue;
            }
            report.items_found += 1;

            let wanted = self
                .sidebar
                .identify(item)
                .is_some_and(|id| selection.contains(&id));
            let control = match page.control_of(item) {
                Some(control) => control,
                None => match page.insert_control(item) {
                    Some(control) => {
                        report.controls_inserted += 1;
                        control
                    }
                    None => continue,
                },
            };
            // Never uncheck here: an unchecked-but-persisted item is restored,
            // a checked one is the user's.
            if wanted && !page.is_checked(control) {
                page.set_checked(control, true);
                report.restored += 1;
            }
        }

        self.guard.release_after(self.timings.guard_grace);
        self.refresh_count();

        if report.items_found == 0 {
            compost_debug!("Reconciliation pass found no conversations");
        } else {
            compost_info!(
                "Injected {} checkboxes ({} items, {} restored)",
                report.controls_inserted,
                report.items_found,
                report.restored
            );
        }
        report
    }

    /// Second look for controls that mounted after their item. Only acts when
    /// nothing is checked, so an in-flight manual change is never overridden.
    pub fn restore_pass(&self) -> usize {
        let selection = self.store.load();
        if selection.is_empty() {
            return 0;
        }
        let page = self.sidebar.page();
        let items = self.sidebar.items();
        let any_checked = items.iter().any(|item| {
            page.control_of(*item)
                .is_some_and(|control| page.is_checked(control))
        });
        if any_checked {
            return 0;
        }

        self.guard.engage();
        let mut restored = 0;
        for item in items {
            let Some(id) = self.sidebar.identify(item) else {
                continue;
            };
            if !selection.contains(&id) {
                continue;
            }
            if let Some(control) = page.control_of(item) {
                if !page.is_checked(control) {
                    page.set_checked(control, true);
                    restored += 1;
                }
            }
        }
        self.guard.release_after(self.timings.restore_grace);
        self.refresh_count();

        if restored > 0 {
            compost_debug!("Restore pass re-checked {} item(s)", restored);
        }
        restored
    }

    pub fn refresh_count(&self) {
        let count = self.sidebar.page().checked_controls().len();
        self.surface.show_selected_count(count);
    }
}
