use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use compost_engine::HostSurface;
use compost_logging::{compost_debug, compost_info, compost_warn};

/// Surface backed by the terminal: confirmations are read from stdin
/// unless `assume_yes` is set, alerts are printed.
pub struct ConsoleSurface {
    assume_yes: bool,
    selected: Cell<usize>,
    alerts: RefCell<Vec<String>>,
    reload: Cell<Option<Duration>>,
}

impl ConsoleSurface {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            selected: Cell::new(0),
            alerts: RefCell::new(Vec::new()),
            reload: Cell::new(None),
        }
    }

    /// Count shown on the floating delete button.
    pub fn selected(&self) -> usize {
        self.selected.get()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn reload_requested(&self) -> Option<Duration> {
        self.reload.get()
    }
}

impl HostSurface for ConsoleSurface {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            compost_info!("{message} [assumed yes]");
            return true;
        }
        print!("{message} [y/N] ");
        if let Err(err) = io::stdout().flush() {
            compost_warn!("Failed to flush prompt: {err}");
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                compost_warn!("Failed to read answer: {err}");
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        println!("{message}");
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn show_selected_count(&self, count: usize) {
        if self.selected.replace(count) != count {
            compost_debug!("Delete selected ({count})");
        }
    }

    fn show_progress(&self, current: usize, total: usize) {
        compost_info!("Deleting {current}/{total}...");
    }

    fn schedule_reload(&self, delay: Duration) {
        compost_info!("Page reload scheduled in {} ms", delay.as_millis());
        self.reload.set(Some(delay));
    }
}
