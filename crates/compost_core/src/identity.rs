use std::collections::BTreeMap;

use crate::{ConversationId, IdRule};

/// Longest text fallback identifier, in characters.
pub const TEXT_FALLBACK_LEN: usize = 50;

/// What a live item exposes for identification, captured once per pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSignals {
    /// The item's own `href`.
    pub href: Option<String>,
    /// `href` of the first link nested inside the item.
    pub nested_href: Option<String>,
    /// Attributes requested by the adapter's rules.
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

/// Fallbacks tried after the adapter's structured rules, in order.
const FALLBACKS: [fn(&ItemSignals) -> Option<ConversationId>; 2] = [raw_href, text_fallback];

/// Selection identity of an item: structured rules first, then the raw
/// href, then the truncated text. `None` only when the item is blank.
pub fn resolve(rules: &[IdRule], signals: &ItemSignals) -> Option<ConversationId> {
    remote_key(rules, signals).or_else(|| FALLBACKS.iter().find_map(|step| step(signals)))
}

/// Identifier as the host's backend knows it; structured rules only.
pub fn remote_key(rules: &[IdRule], signals: &ItemSignals) -> Option<ConversationId> {
    rules.iter().find_map(|rule| rule.extract(signals))
}

fn raw_href(signals: &ItemSignals) -> Option<ConversationId> {
    signals.href.as_deref().and_then(ConversationId::new)
}

fn text_fallback(signals: &ItemSignals) -> Option<ConversationId> {
    let normalized = signals.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = normalized.chars().take(TEXT_FALLBACK_LEN).collect();
    ConversationId::new(truncated)
}
