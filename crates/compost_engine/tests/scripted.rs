use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, ScriptedConfig};
use compost_engine::{
    DeleteError, DeletionStrategy, HostPage, MemoryPage, ScriptedInteractionStrategy, UiEvent,
};
use pretty_assertions::assert_eq;

const GEMINI: &str = r#"<html><body><side-navigation-v2><div class="list">
    <div class="row">
        <div data-test-id="conversation"><a href="/app/111aaa">Trip planning ideas</a></div>
        <div class="actions"><button class="menu">more</button></div>
    </div>
    <div class="row">
        <div data-test-id="conversation"><a href="/app/222bbb">Rust lifetimes</a></div>
        <span class="spacer"></span>
        <div class="actions"><button class="menu">more</button></div>
    </div>
    <div class="row">
        <div data-test-id="conversation"><a href="/app/333ccc">No menu here</a></div>
    </div>
</div></side-navigation-v2>
<div class="cdk-overlay-container"></div>
</body></html>"#;

const DELETE_BUTTON: &str = r#"button[data-test-id="delete-button"]"#;
const CONFIRM_BUTTON: &str = r#"button[data-test-id="confirm-button"]"#;

/// Wires the host's menu: the action button opens a menu with a delete
/// entry, which opens a confirmation dialog, which removes the row.
fn host_with_menu() -> Rc<MemoryPage> {
    let page = Rc::new(MemoryPage::from_html(GEMINI));
    page.on_click("button.menu", |page, _| {
        let overlay = page.first("div.cdk-overlay-container").unwrap();
        page.replace_children(
            overlay,
            r#"<div class="menu"><button data-test-id="delete-button">Delete</button></div>"#,
        );
    });
    page.on_click(DELETE_BUTTON, |page, _| {
        let overlay = page.first("div.cdk-overlay-container").unwrap();
        page.replace_children(
            overlay,
            r#"<div class="dialog"><button data-test-id="confirm-button">Delete</button></div>"#,
        );
    });
    page.on_click(CONFIRM_BUTTON, |page, _| {
        let overlay = page.first("div.cdk-overlay-container").unwrap();
        page.replace_children(overlay, "");
    });
    page
}

fn item(page: &MemoryPage, href: &str) -> ego_tree::NodeId {
    let link = page.first(&format!(r#"a[href="{href}"]"#)).unwrap();
    page.parent(link).unwrap()
}

async fn delete(
    strategy: &ScriptedInteractionStrategy<MemoryPage>,
    item: ego_tree::NodeId,
) -> Result<(), DeleteError> {
    let id = ConversationId::new("ignored").unwrap();
    strategy.delete_one(Some(&id), item).await
}

#[tokio::test(start_paused = true)]
async fn clicks_through_menu_and_confirmation() {
    let page = host_with_menu();
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());
    let target = item(&page, "/app/111aaa");

    delete(&strategy, target).await.unwrap();

    let events: Vec<UiEvent> = page.dispatched().into_iter().map(|(_, event)| event).collect();
    assert_eq!(
        events,
        vec![UiEvent::Hover, UiEvent::Click, UiEvent::Click, UiEvent::Click]
    );
    let (hovered, _) = page.dispatched()[0];
    assert_eq!(hovered, target);
    assert!(page.matches(page.dispatched()[1].0, "button.menu"));
    assert!(page.query_all(CONFIRM_BUTTON).is_empty());
}

#[tokio::test(start_paused = true)]
async fn finds_the_action_button_elsewhere_under_the_parent() {
    let page = host_with_menu();
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());
    let target = item(&page, "/app/222bbb");

    delete(&strategy, target).await.unwrap();

    let menu = page.dispatched()[1].0;
    let row = page.parent(target).unwrap();
    assert!(page.contains(row, menu));
}

#[tokio::test(start_paused = true)]
async fn missing_action_button_fails_fast() {
    let page = host_with_menu();
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());

    let err = delete(&strategy, item(&page, "/app/333ccc")).await.unwrap_err();
    assert_eq!(err, DeleteError::UiControlNotFound("button".to_string()));
}

#[tokio::test(start_paused = true)]
async fn confirmation_that_never_appears_times_out() {
    let page = Rc::new(MemoryPage::from_html(GEMINI));
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());
    let started = tokio::time::Instant::now();

    let err = delete(&strategy, item(&page, "/app/111aaa")).await.unwrap_err();
    assert_eq!(err, DeleteError::UiWaitTimeout(DELETE_BUTTON.to_string()));
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn missing_overlay_layer_is_reported() {
    let page = Rc::new(MemoryPage::from_html(GEMINI));
    let overlay = page.first("div.cdk-overlay-container").unwrap();
    page.remove(overlay);
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());

    let err = delete(&strategy, item(&page, "/app/111aaa")).await.unwrap_err();
    assert_eq!(
        err,
        DeleteError::UiControlNotFound("div.cdk-overlay-container".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn does_not_need_an_identifier() {
    let page = host_with_menu();
    let strategy = ScriptedInteractionStrategy::new(page.clone(), ScriptedConfig::default());
    assert!(!DeletionStrategy::<MemoryPage>::requires_identifier(&strategy));

    let result = strategy.delete_one(None, item(&page, "/app/111aaa")).await;
    assert_eq!(result, Ok(()));
}
