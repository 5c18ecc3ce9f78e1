//! Scripted session over a snapshot: let the reconciler annotate the page,
//! check the requested conversations as a user would, press delete, leave.

use std::fs;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use compost_core::{ConversationId, PlatformAdapter, RunReport, Timings};
use compost_engine::{
    ensure_session_dir, FileSessionStorage, HostPage, MemoryPage, MemoryStorage, Session,
    SessionStorage, Sidebar,
};
use compost_logging::{compost_info, compost_warn};

use crate::platform::cli::Cli;
use crate::platform::config::AppConfig;
use crate::platform::console::ConsoleSurface;

const RUN_POLL: Duration = Duration::from_millis(50);

/// What a replay did, for the caller to print or inspect.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Requested identifiers that matched a conversation in the snapshot.
    pub checked: Vec<ConversationId>,
    /// Requested identifiers that matched nothing.
    pub missing: Vec<String>,
    pub report: Option<RunReport>,
    /// Page markup after the run.
    pub html: String,
}

pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let adapter = config.resolve_adapter(cli)?;
    let markup = fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("failed to read snapshot {:?}", cli.snapshot))?;

    if cli.list {
        list_conversations(&markup, adapter);
        return Ok(());
    }

    let storage: Rc<dyn SessionStorage> = match &cli.storage_dir {
        Some(dir) => {
            ensure_session_dir(dir)?;
            Rc::new(FileSessionStorage::new(dir.clone()))
        }
        None => Rc::new(MemoryStorage::new()),
    };
    let surface = Rc::new(ConsoleSurface::new(cli.yes));

    let outcome = replay(
        &markup,
        adapter,
        config.timings,
        storage,
        surface.clone(),
        &cli.select,
    )
    .await?;

    for id in &outcome.missing {
        println!("not found: {id}");
    }
    match &outcome.report {
        Some(report) => {
            for item in &report.items {
                let id = item.id.as_ref().map_or("<unidentified>", ConversationId::as_str);
                println!("{id}: {:?}", item.outcome);
            }
            let summary = report.summary();
            println!(
                "Deleted {} conversation(s), {} not deleted",
                summary.succeeded,
                summary.unsuccessful()
            );
        }
        None => println!("Nothing deleted ({} selected)", surface.selected()),
    }

    if let Some(out) = &cli.out {
        fs::write(out, &outcome.html).with_context(|| format!("failed to write {:?}", out))?;
        compost_info!("Wrote page to {:?}", out);
    }
    Ok(())
}

/// Runs a full session over `markup`, checking `select` and requesting one
/// batch when anything got checked.
pub async fn replay(
    markup: &str,
    adapter: PlatformAdapter,
    timings: Timings,
    storage: Rc<dyn SessionStorage>,
    surface: Rc<ConsoleSurface>,
    select: &[String],
) -> anyhow::Result<ReplayOutcome> {
    let page = Rc::new(MemoryPage::from_html(markup));
    let annotated_after = adapter.startup.delay + timings.settle;
    let session = Session::new(page.clone(), surface, storage, adapter, timings)?;
    let mut outcome = ReplayOutcome::default();

    let script = async {
        tokio::time::sleep(annotated_after).await;

        for raw in select {
            let Some(id) = ConversationId::new(raw) else {
                continue;
            };
            let control = session
                .sidebar()
                .find(&id)
                .and_then(|item| page.control_of(item));
            match control {
                Some(control) => {
                    if !page.is_checked(control) {
                        page.toggle_by_user(control);
                    }
                    outcome.checked.push(id);
                }
                None => {
                    compost_warn!("Conversation {id} not found in snapshot");
                    outcome.missing.push(raw.clone());
                }
            }
        }

        if !page.checked_controls().is_empty() {
            page.request_delete();
            tokio::time::sleep(Duration::from_millis(1)).await;
            while session.orchestrator().is_running() {
                tokio::time::sleep(RUN_POLL).await;
            }
        }
        page.unload();
    };
    tokio::join!(session.run(), script);

    outcome.report = session.last_report();
    outcome.html = page.html();
    Ok(outcome)
}

fn list_conversations(markup: &str, adapter: PlatformAdapter) {
    let page = Rc::new(MemoryPage::from_html(markup));
    let sidebar = Sidebar::new(page.clone(), Rc::new(adapter));
    for item in sidebar.items() {
        if !sidebar.admits(item) {
            continue;
        }
        let id = sidebar
            .identify(item)
            .map_or_else(|| "<unidentified>".to_string(), |id| id.to_string());
        let title = page.text_content(item);
        println!("{id}\t{}", title.split_whitespace().collect::<Vec<_>>().join(" "));
    }
}
