use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, PlatformAdapter, SelectionSet, Timings};
use compost_engine::{
    HostPage, MemoryPage, MemoryStorage, Reconciler, RecordingSurface, ReentrancyGuard,
    SelectionStore, Sidebar,
};
use pretty_assertions::assert_eq;

const CHATGPT: &str = r#"<html><body><nav>
    <a href="/c/abc">Planning a garden</a>
    <a href="/c/def">Borrow checker questions</a>
    <a href="/c/ghi">Sourdough timing</a>
</nav></body></html>"#;

const GEMINI: &str = r#"<html><body><side-navigation-v2>
    <div class="conversation-item">New chat</div>
    <div class="conversation-item">Gems</div>
    <div class="conversation-item">ab</div>
    <div data-test-id="conversation"><a href="/app/111aaa">Trip planning ideas</a></div>
    <div data-test-id="conversation"><a href="/app/222bbb">Rust lifetimes</a></div>
</side-navigation-v2></body></html>"#;

struct Fixture {
    page: Rc<MemoryPage>,
    sidebar: Rc<Sidebar<MemoryPage>>,
    store: Rc<SelectionStore>,
    surface: Rc<RecordingSurface>,
    reconciler: Reconciler<MemoryPage>,
}

fn fixture(markup: &str, adapter: PlatformAdapter) -> Fixture {
    let page = Rc::new(MemoryPage::from_html(markup));
    let adapter = Rc::new(adapter);
    let guard = Rc::new(ReentrancyGuard::new());
    let sidebar = Rc::new(Sidebar::new(page.clone(), adapter.clone()));
    let store = Rc::new(SelectionStore::new(
        Rc::new(MemoryStorage::new()),
        adapter.storage_key.clone(),
        guard.clone(),
    ));
    let surface = Rc::new(RecordingSurface::answering(true));
    let reconciler = Reconciler::new(
        sidebar.clone(),
        store.clone(),
        guard,
        surface.clone(),
        Timings::default(),
    );
    Fixture {
        page,
        sidebar,
        store,
        surface,
        reconciler,
    }
}

fn ids(values: &[&str]) -> SelectionSet {
    values.iter().filter_map(ConversationId::new).collect()
}

/// Lets the reentrancy guard of the previous pass expire.
async fn settle() {
    tokio::time::advance(Duration::from_millis(200)).await;
}

fn id(value: &str) -> ConversationId {
    ConversationId::new(value).unwrap()
}

#[tokio::test(start_paused = true)]
async fn pass_injects_one_control_per_item_and_is_idempotent() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());

    let first = f.reconciler.run_pass();
    assert_eq!(first.items_found, 3);
    assert_eq!(first.controls_inserted, 3);
    assert_eq!(f.page.mounted_controls().len(), 3);

    let second = f.reconciler.run_pass();
    assert_eq!(second.items_found, 3);
    assert_eq!(second.controls_inserted, 0);
    assert_eq!(f.page.mounted_controls().len(), 3);
    assert_eq!(f.reconciler.passes(), 2);
    assert_eq!(f.surface.last_count(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn persisted_selection_survives_a_rerender() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    f.store.merge(&ids(&["def"]));

    let report = f.reconciler.run_pass();
    assert_eq!(report.restored, 1);
    assert_eq!(f.sidebar.checked_ids(), ids(&["def"]));

    let nav = f.page.first("nav").unwrap();
    f.page.rerender(nav);
    assert!(f.page.mounted_controls().is_empty());

    let report = f.reconciler.run_pass();
    assert_eq!(report.controls_inserted, 3);
    assert_eq!(report.restored, 1);
    assert_eq!(f.sidebar.checked_ids(), ids(&["def"]));
    assert_eq!(f.surface.last_count(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn pass_keeps_checks_the_user_made_since_last_save() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    f.reconciler.run_pass();

    let item = f.sidebar.find(&id("ghi")).unwrap();
    f.page.toggle_by_user(f.page.control_of(item).unwrap());
    assert!(f.store.load().is_empty());
    settle().await;

    f.reconciler.run_pass();
    assert_eq!(f.store.load(), ids(&["ghi"]));
    let control = f.page.control_of(item).unwrap();
    assert!(f.page.is_checked(control));
}

#[tokio::test(start_paused = true)]
async fn pass_never_unchecks_a_control() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    f.store.merge(&ids(&["abc"]));
    f.reconciler.run_pass();

    // Manually checked but not yet persisted.
    let item = f.sidebar.find(&id("def")).unwrap();
    f.page.set_checked(f.page.control_of(item).unwrap(), true);
    f.reconciler.run_pass();

    assert_eq!(f.sidebar.checked_ids(), ids(&["abc", "def"]));
}

#[tokio::test(start_paused = true)]
async fn restore_pass_only_acts_when_nothing_is_checked() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    f.reconciler.run_pass();
    settle().await;
    // Selection written after the controls were mounted, as a late load does.
    f.store.merge(&ids(&["abc"]));

    let other = f.sidebar.find(&id("ghi")).unwrap();
    let other_control = f.page.control_of(other).unwrap();
    f.page.set_checked(other_control, true);
    assert_eq!(f.reconciler.restore_pass(), 0);
    assert_eq!(f.sidebar.checked_ids(), ids(&["ghi"]));

    f.page.set_checked(other_control, false);
    assert_eq!(f.reconciler.restore_pass(), 1);
    assert_eq!(f.sidebar.checked_ids(), ids(&["abc"]));
}

#[tokio::test(start_paused = true)]
async fn restore_pass_with_empty_selection_touches_nothing() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    f.reconciler.run_pass();
    assert_eq!(f.reconciler.restore_pass(), 0);
    assert!(f.page.checked_controls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_entries_get_no_control() {
    let f = fixture(GEMINI, PlatformAdapter::gemini());

    let report = f.reconciler.run_pass();
    assert_eq!(report.items_found, 2);
    assert_eq!(f.page.mounted_controls().len(), 2);

    for label in ["New chat", "Gems", "ab"] {
        let entry = f
            .page
            .query_all(".conversation-item")
            .into_iter()
            .find(|el| f.page.text_content(*el).trim() == label)
            .unwrap();
        assert_eq!(f.page.control_of(entry), None, "{label}");
    }
}

#[tokio::test(start_paused = true)]
async fn nested_links_do_not_get_a_second_control() {
    let f = fixture(GEMINI, PlatformAdapter::gemini());
    f.reconciler.run_pass();

    let item = f.sidebar.find(&id("111aaa")).unwrap();
    assert_eq!(
        f.page.attribute(item, "data-test-id").as_deref(),
        Some("conversation")
    );
    let link = f.page.query_within(item, "a").into_iter().next().unwrap();
    assert_eq!(f.page.control_of(link), None);
}

#[tokio::test(start_paused = true)]
async fn removed_items_are_left_alone() {
    let f = fixture(CHATGPT, PlatformAdapter::chatgpt());
    let item = f.sidebar.find(&id("abc")).unwrap();
    f.page.mark_removed(item);

    let report = f.reconciler.run_pass();
    assert_eq!(report.items_found, 2);
    assert_eq!(f.page.control_of(item), None);
}
