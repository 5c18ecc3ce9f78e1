use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, ScriptedConfig};
use compost_logging::{compost_debug, compost_warn};

use super::DeletionStrategy;
use crate::error::DeleteError;
use crate::page::{HostPage, UiEvent};

/// Deletes by driving the host's own menu: hover the item, open its action
/// menu, then click through the confirmation chain in the overlay layer.
pub struct ScriptedInteractionStrategy<P: HostPage> {
    page: Rc<P>,
    config: ScriptedConfig,
}

impl<P: HostPage> ScriptedInteractionStrategy<P> {
    pub fn new(page: Rc<P>, config: ScriptedConfig) -> Self {
        Self { page, config }
    }

    /// The item's action button. Hosts put it next to the item, inside it,
    /// or elsewhere under the item's parent, so all three are searched.
    fn find_action_control(&self, item: P::Element) -> Option<P::Element> {
        let page = self.page.as_ref();
        let query = self.config.action_control.as_str();
        let ours = page.control_of(item);
        let not_ours =
            |candidate: &P::Element| ours.map_or(true, |control| !page.contains(control, *candidate));

        if let Some(sibling) = page.next_sibling(item) {
            if let Some(found) = page.query_within(sibling, query).into_iter().find(not_ours) {
                return Some(found);
            }
        }
        if let Some(found) = page.query_within(item, query).into_iter().find(not_ours) {
            return Some(found);
        }
        let parent = page.parent(item)?;
        page.children(parent)
            .into_iter()
            .filter(|child| *child != item)
            .find_map(|child| page.query_within(child, query).into_iter().find(not_ours))
    }

    /// Waits for `selector` to show up inside the overlay layer.
    async fn wait_for_overlay(&self, selector: &str) -> Result<P::Element, DeleteError> {
        let overlay = self
            .page
            .query_all(&self.config.overlay_container)
            .into_iter()
            .next()
            .ok_or_else(|| DeleteError::UiControlNotFound(self.config.overlay_container.clone()))?;

        // Subscribe before the first look so no mutation slips between.
        let mut events = self.page.subscribe();
        let deadline = tokio::time::sleep(self.config.overlay_timeout);
        tokio::pin!(deadline);

        loop {
            if let Some(found) = self.page.query_within(overlay, selector).into_iter().next() {
                return Ok(found);
            }
            tokio::select! {
                _ = &mut deadline => {
                    return Err(DeleteError::UiWaitTimeout(selector.to_string()));
                }
                event = events.recv() => {
                    if event.is_none() {
                        (&mut deadline).await;
                        return Err(DeleteError::UiWaitTimeout(selector.to_string()));
                    }
                }
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<P: HostPage + 'static> DeletionStrategy<P> for ScriptedInteractionStrategy<P> {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn requires_identifier(&self) -> bool {
        false
    }

    fn item_delay(&self) -> Duration {
        self.config.item_delay
    }

    async fn delete_one(
        &self,
        id: Option<&ConversationId>,
        item: P::Element,
    ) -> Result<(), DeleteError> {
        let label = id.map_or("<unidentified>", ConversationId::as_str);
        self.page.dispatch(item, UiEvent::Hover);
        tokio::time::sleep(self.config.hover_settle).await;

        let Some(action) = self.find_action_control(item) else {
            compost_warn!("Could not find menu button for {label}");
            return Err(DeleteError::UiControlNotFound(
                self.config.action_control.clone(),
            ));
        };
        self.page.dispatch(action, UiEvent::Click);

        for selector in &self.config.confirm_chain {
            let control = self.wait_for_overlay(selector).await?;
            tokio::time::sleep(self.config.click_settle).await;
            compost_debug!("clicking {selector} for {label}");
            self.page.dispatch(control, UiEvent::Click);
        }

        tokio::time::sleep(self.config.completion_settle).await;
        Ok(())
    }
}
