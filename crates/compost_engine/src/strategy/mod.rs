//! Ways of deleting one conversation.

mod direct;
mod scripted;

use std::rc::Rc;
use std::time::Duration;

use compost_core::{ConversationId, DeletionConfig};

use crate::error::DeleteError;
use crate::page::HostPage;

pub use direct::DirectCallStrategy;
pub use scripted::ScriptedInteractionStrategy;

#[async_trait::async_trait(?Send)]
pub trait DeletionStrategy<P: HostPage> {
    fn name(&self) -> &'static str;

    /// Items without a remote identifier are skipped before `delete_one`
    /// when this is true.
    fn requires_identifier(&self) -> bool;

    /// Pause after each attempted item.
    fn item_delay(&self) -> Duration;

    async fn delete_one(
        &self,
        id: Option<&ConversationId>,
        item: P::Element,
    ) -> Result<(), DeleteError>;
}

/// Strategy named by the adapter's deletion config.
pub fn build_strategy<P: HostPage + 'static>(
    config: &DeletionConfig,
    page: Rc<P>,
) -> Result<Box<dyn DeletionStrategy<P>>, DeleteError> {
    match config {
        DeletionConfig::Direct(config) => Ok(Box::new(DirectCallStrategy::new(config.clone())?)),
        DeletionConfig::Scripted(config) => Ok(Box::new(ScriptedInteractionStrategy::new(
            page,
            config.clone(),
        ))),
    }
}
