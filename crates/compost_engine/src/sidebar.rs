use std::rc::Rc;

use compost_core::{remote_key, resolve, ConversationId, ItemSignals, PlatformAdapter, SelectionSet};
use compost_logging::compost_debug;

use crate::page::HostPage;

/// The host's conversation list seen through one platform adapter.
///
/// Nothing is cached: every call re-queries the page, because the host may
/// have replaced any node since the last look.
pub struct Sidebar<P: HostPage> {
    page: Rc<P>,
    adapter: Rc<PlatformAdapter>,
}

impl<P: HostPage> Sidebar<P> {
    pub fn new(page: Rc<P>, adapter: Rc<PlatformAdapter>) -> Self {
        Self { page, adapter }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn adapter(&self) -> &PlatformAdapter {
        &self.adapter
    }

    /// Items matched by the first item query that yields anything.
    /// A match nested inside another match belongs to the outer item.
    pub fn items(&self) -> Vec<P::Element> {
        for query in &self.adapter.item_queries {
            let matched = self.page.query_all(query);
            if matched.is_empty() {
                continue;
            }
            let items: Vec<P::Element> = matched
                .iter()
                .copied()
                .filter(|item| {
                    !matched
                        .iter()
                        .any(|outer| outer != item && self.page.contains(*outer, *item))
                })
                .collect();
            compost_debug!("Found {} chat items with selector: {}", items.len(), query);
            return items;
        }
        compost_debug!("No chat items found on {}", self.adapter.display_name);
        Vec::new()
    }

    /// Subtree observed for mutations.
    pub fn container(&self) -> Option<P::Element> {
        self.adapter
            .container_queries
            .iter()
            .map(String::as_str)
            .chain(std::iter::once("body"))
            .find_map(|query| self.page.query_all(query).into_iter().next())
    }

    /// Whether the item is a conversation rather than a navigation entry.
    pub fn admits(&self, item: P::Element) -> bool {
        self.adapter.exclusion.admits(&self.page.text_content(item))
    }

    pub fn signals(&self, item: P::Element) -> ItemSignals {
        let nested_href = self
            .page
            .query_within(item, "a[href]")
            .into_iter()
            .find_map(|link| self.page.attribute(link, "href"));
        let attributes = self
            .adapter
            .signal_attributes()
            .into_iter()
            .filter_map(|name| {
                self.page
                    .attribute(item, name)
                    .map(|value| (name.to_string(), value))
            })
            .collect();

        ItemSignals {
            href: self.page.attribute(item, "href"),
            nested_href,
            attributes,
            text: self.page.text_content(item),
        }
    }

    /// Selection identity of an item.
    pub fn identify(&self, item: P::Element) -> Option<ConversationId> {
        resolve(&self.adapter.id_rules, &self.signals(item))
    }

    /// Identifier the host's backend knows the conversation by.
    pub fn remote_key(&self, item: P::Element) -> Option<ConversationId> {
        remote_key(&self.adapter.id_rules, &self.signals(item))
    }

    pub fn find(&self, id: &ConversationId) -> Option<P::Element> {
        self.items()
            .into_iter()
            .find(|item| self.identify(*item).as_ref() == Some(id))
    }

    /// Live items whose control is checked, in document order.
    pub fn selected_items(&self) -> Vec<P::Element> {
        self.page
            .checked_controls()
            .into_iter()
            .filter_map(|control| self.page.item_of(control))
            .filter(|item| self.page.is_connected(*item) && !self.page.is_marked_removed(*item))
            .collect()
    }

    /// Identities of every checked, mounted item.
    pub fn checked_ids(&self) -> SelectionSet {
        self.selected_items()
            .into_iter()
            .filter_map(|item| self.identify(item))
            .collect()
    }
}
