//! Per-page driver: owns the event loop that feeds page events and timer
//! expiries into the reconciler state machine and executes its effects.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use compost_core::{update, Effect, Msg, PlatformAdapter, ReconcileState, RunReport, Timings};
use compost_logging::{compost_debug, compost_info, compost_trace, compost_warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::DeleteError;
use crate::guard::ReentrancyGuard;
use crate::orchestrator::BatchOrchestrator;
use crate::page::{HostPage, HostSurface, PageEvent};
use crate::reconciler::Reconciler;
use crate::sidebar::Sidebar;
use crate::storage::SessionStorage;
use crate::store::SelectionStore;
use crate::strategy::{build_strategy, DeletionStrategy};

#[derive(Debug, Clone, Copy, Default)]
struct Timers {
    debounce: Option<(Instant, u64)>,
    restore: Option<Instant>,
    settle: Option<Instant>,
    poll: Option<Instant>,
    save: Option<Instant>,
}

enum Wake<E> {
    Page(Option<PageEvent<E>>),
    Debounce(u64),
    Restore,
    Settle,
    Poll,
    Save,
}

struct Driver<E> {
    state: ReconcileState,
    timers: Timers,
    container: Option<E>,
}

async fn fire_at(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn fire_debounce(deadline: Option<(Instant, u64)>) -> u64 {
    match deadline {
        Some((at, generation)) => {
            tokio::time::sleep_until(at).await;
            generation
        }
        None => std::future::pending().await,
    }
}

/// Everything ChatCompost runs on one page, wired together.
pub struct Session<P: HostPage> {
    page: Rc<P>,
    adapter: Rc<PlatformAdapter>,
    timings: Timings,
    sidebar: Rc<Sidebar<P>>,
    store: Rc<SelectionStore>,
    guard: Rc<ReentrancyGuard>,
    reconciler: Reconciler<P>,
    orchestrator: BatchOrchestrator<P>,
    events: RefCell<Option<mpsc::UnboundedReceiver<PageEvent<P::Element>>>>,
    last_report: RefCell<Option<RunReport>>,
}

impl<P: HostPage + 'static> Session<P> {
    /// Session using the deletion strategy the adapter names.
    pub fn new(
        page: Rc<P>,
        surface: Rc<dyn HostSurface>,
        storage: Rc<dyn SessionStorage>,
        adapter: PlatformAdapter,
        timings: Timings,
    ) -> Result<Self, DeleteError> {
        let strategy = build_strategy(&adapter.deletion, page.clone())?;
        Ok(Self::with_strategy(
            page, surface, storage, adapter, timings, strategy,
        ))
    }

    pub fn with_strategy(
        page: Rc<P>,
        surface: Rc<dyn HostSurface>,
        storage: Rc<dyn SessionStorage>,
        adapter: PlatformAdapter,
        timings: Timings,
        strategy: Box<dyn DeletionStrategy<P>>,
    ) -> Self {
        // Subscribe first: events raised before `run` are queued, not lost.
        let events = page.subscribe();
        let adapter = Rc::new(adapter);
        let guard = Rc::new(ReentrancyGuard::new());
        let sidebar = Rc::new(Sidebar::new(page.clone(), adapter.clone()));
        let store = Rc::new(SelectionStore::new(
            storage,
            adapter.storage_key.clone(),
            guard.clone(),
        ));
        let reconciler = Reconciler::new(
            sidebar.clone(),
            store.clone(),
            guard.clone(),
            surface.clone(),
            timings,
        );
        let orchestrator = BatchOrchestrator::new(
            sidebar.clone(),
            store.clone(),
            surface,
            strategy,
            timings.reload_delay,
        );

        Self {
            page,
            adapter,
            timings,
            sidebar,
            store,
            guard,
            reconciler,
            orchestrator,
            events: RefCell::new(Some(events)),
            last_report: RefCell::new(None),
        }
    }

    pub fn sidebar(&self) -> &Sidebar<P> {
        &self.sidebar
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }

    pub fn reconciler(&self) -> &Reconciler<P> {
        &self.reconciler
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator<P> {
        &self.orchestrator
    }

    /// Report of the most recent batch run, if one ran.
    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report.borrow().clone()
    }

    /// Persists what the mounted controls show, subject to the write policy.
    pub fn save_selection(&self) -> bool {
        let controls_mounted = !self.page.mounted_controls().is_empty();
        self.store
            .replace(self.sidebar.checked_ids(), controls_mounted)
    }

    /// Runs until the page unloads or its event source goes away.
    pub async fn run(&self) {
        let taken = self.events.borrow_mut().take();
        let Some(mut events) = taken else {
            compost_warn!("session for {} is already running", self.adapter.name);
            return;
        };

        tokio::time::sleep(self.adapter.startup.delay).await;
        compost_info!("Initializing on {}", self.adapter.display_name);

        let mut driver = Driver {
            state: ReconcileState::new(self.timings, &self.adapter.startup),
            timers: Timers {
                save: self.next_save(),
                ..Timers::default()
            },
            container: self.sidebar.container(),
        };
        self.dispatch(&mut driver, Msg::Started);

        loop {
            let timers = driver.timers;
            let wake = tokio::select! {
                event = events.recv() => Wake::Page(event),
                generation = fire_debounce(timers.debounce) => Wake::Debounce(generation),
                _ = fire_at(timers.restore) => Wake::Restore,
                _ = fire_at(timers.settle) => Wake::Settle,
                _ = fire_at(timers.poll) => Wake::Poll,
                _ = fire_at(timers.save) => Wake::Save,
            };

            match wake {
                Wake::Debounce(generation) => {
                    driver.timers.debounce = None;
                    self.dispatch(&mut driver, Msg::DebounceElapsed { generation });
                }
                Wake::Restore => {
                    driver.timers.restore = None;
                    self.dispatch(&mut driver, Msg::RestoreDue);
                }
                Wake::Settle => {
                    driver.timers.settle = None;
                    self.dispatch(&mut driver, Msg::SettleElapsed);
                }
                Wake::Poll => {
                    driver.timers.poll = None;
                    self.dispatch(&mut driver, Msg::PollTick);
                }
                Wake::Save => {
                    self.save_selection();
                    driver.timers.save = self.next_save();
                }
                Wake::Page(None) => {
                    compost_debug!("page event source closed");
                    break;
                }
                Wake::Page(Some(event)) => {
                    if !self.on_page_event(&mut driver, event).await {
                        break;
                    }
                }
            }
        }
        compost_info!("Session on {} ended", self.adapter.display_name);
    }

    /// Returns false once the page is going away.
    async fn on_page_event(&self, driver: &mut Driver<P::Element>, event: PageEvent<P::Element>) -> bool {
        match event {
            PageEvent::Mutated { target } => {
                if self.observes(&mut driver.container, target) {
                    self.dispatch(driver, Msg::ContainerMutated);
                }
            }
            PageEvent::ControlToggled { .. } => {
                if self.guard.is_active() {
                    compost_trace!("toggle while guard is up; not persisted");
                } else {
                    self.save_selection();
                }
                self.reconciler.refresh_count();
            }
            PageEvent::VisibilityHidden => {
                self.save_selection();
            }
            PageEvent::DeleteRequested => {
                let selected = self.sidebar.selected_items();
                match self.orchestrator.run(selected).await {
                    Ok(report) => {
                        let summary = report.summary();
                        compost_debug!(
                            "batch finished: {} deleted, {} not",
                            summary.succeeded,
                            summary.unsuccessful()
                        );
                        *self.last_report.borrow_mut() = Some(report);
                    }
                    Err(rejected) => compost_debug!("batch not started: {rejected}"),
                }
            }
            PageEvent::Unload => {
                self.save_selection();
                return false;
            }
        }
        true
    }

    /// Whether `target` lies in the observed container. The container is
    /// looked up again once the host has replaced it.
    fn observes(&self, container: &mut Option<P::Element>, target: P::Element) -> bool {
        let stale = container.map_or(true, |current| !self.page.is_connected(current));
        if stale {
            *container = self.sidebar.container();
        }
        match container {
            Some(current) => self.page.contains(*current, target),
            None => true,
        }
    }

    fn dispatch(&self, driver: &mut Driver<P::Element>, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let (state, effects) = update(std::mem::take(&mut driver.state), msg);
            driver.state = state;
            for effect in effects {
                if let Some(follow_up) = self.execute(effect, &mut driver.timers) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&self, effect: Effect, timers: &mut Timers) -> Option<Msg> {
        let now = Instant::now();
        match effect {
            Effect::ArmDebounce { generation, delay } => {
                timers.debounce = Some((now + delay, generation));
                None
            }
            Effect::RunPass => {
                let report = self.reconciler.run_pass();
                Some(Msg::PassCompleted {
                    items_found: report.items_found,
                })
            }
            Effect::ScheduleRestore { delay } => {
                timers.restore = Some(now + delay);
                None
            }
            Effect::RunRestore => {
                self.reconciler.restore_pass();
                None
            }
            Effect::ScheduleSettle { delay } => {
                timers.settle = Some(now + delay);
                None
            }
            Effect::SchedulePoll { delay } => {
                timers.poll = Some(now + delay);
                None
            }
        }
    }

    fn next_save(&self) -> Option<Instant> {
        let interval = self.timings.save_interval;
        (!interval.is_zero()).then(|| Instant::now() + interval)
    }
}
