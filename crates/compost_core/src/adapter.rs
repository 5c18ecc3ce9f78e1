use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::ItemSignals;
use crate::timings::millis;
use crate::ConversationId;

/// Everything the core needs to know about one host site.
///
/// Adapters are plain data: selectors, extraction rules and the deletion
/// strategy with its parameters. They can be loaded from a config file or
/// taken from the built-in presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAdapter {
    pub name: String,
    pub display_name: String,
    /// Host name fragments this adapter applies to.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Container whose subtree is observed for mutations, first match wins.
    /// The document body is observed when none matches.
    #[serde(default)]
    pub container_queries: Vec<String>,
    /// Primary item query followed by fallbacks, tried until one yields an item.
    pub item_queries: Vec<String>,
    /// Structured identifier extraction, tried in order.
    #[serde(default)]
    pub id_rules: Vec<IdRule>,
    #[serde(default)]
    pub exclusion: ExclusionRules,
    pub deletion: DeletionConfig,
    pub storage_key: String,
    #[serde(default)]
    pub startup: StartupPolicy,
}

impl PlatformAdapter {
    /// Adapter for ChatGPT: links under `nav`, deletion through the backend API.
    pub fn chatgpt() -> Self {
        Self {
            name: "chatgpt".to_string(),
            display_name: "ChatGPT".to_string(),
            hosts: vec!["chatgpt.com".to_string(), "chat.openai.com".to_string()],
            container_queries: vec!["nav".to_string()],
            item_queries: vec![r#"nav a[href^="/c/"]"#.to_string()],
            id_rules: vec![IdRule::HrefPrefix {
                prefix: "/c/".to_string(),
            }],
            exclusion: ExclusionRules::default(),
            deletion: DeletionConfig::Direct(DirectConfig::default()),
            storage_key: "chatcompost_chatgpt_checked".to_string(),
            startup: StartupPolicy {
                delay: Duration::from_millis(1500),
                poll_interval: Duration::from_secs(2),
                poll_retries: 0,
            },
        }
    }

    /// Adapter for Gemini: markup varies across cohorts, so several item
    /// queries are declared and deletion drives the conversation menu.
    pub fn gemini() -> Self {
        Self {
            name: "gemini".to_string(),
            display_name: "Gemini".to_string(),
            hosts: vec!["gemini.google.com".to_string()],
            container_queries: vec!["body".to_string()],
            item_queries: vec![
                r#"div[data-test-id="conversation"], .conversation-item, a[href*="/app/"]"#
                    .to_string(),
                r#"div[data-test-id="conversation"]"#.to_string(),
                ".conversation-item".to_string(),
                r#"a[href*="/app/"][href*="c/"]"#.to_string(),
                "side-navigation-v2 a".to_string(),
                "side-navigation a".to_string(),
            ],
            id_rules: vec![
                IdRule::HrefSegmentAfter {
                    marker: "/app/".to_string(),
                },
                IdRule::Attribute {
                    name: "data-test-id".to_string(),
                    ignore: vec!["conversation".to_string()],
                },
            ],
            exclusion: ExclusionRules {
                texts: ["new chat", "my stuff", "gems", "settings", "help", "updates", "activity"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                min_text_len: 3,
            },
            deletion: DeletionConfig::Scripted(ScriptedConfig::default()),
            storage_key: "chatcompost_gemini_checked".to_string(),
            startup: StartupPolicy {
                delay: Duration::from_millis(2500),
                poll_interval: Duration::from_secs(2),
                poll_retries: 5,
            },
        }
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::chatgpt(), Self::gemini()]
    }

    pub fn preset(name: &str) -> Option<Self> {
        Self::presets()
            .into_iter()
            .find(|adapter| adapter.name.eq_ignore_ascii_case(name))
    }

    /// Picks the preset whose host list matches `host`.
    pub fn for_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        Self::presets()
            .into_iter()
            .find(|adapter| adapter.hosts.iter().any(|h| host.contains(h.as_str())))
    }

    /// Attribute names the structured rules read; the page collects only these.
    pub fn signal_attributes(&self) -> Vec<&str> {
        self.id_rules
            .iter()
            .filter_map(|rule| match rule {
                IdRule::Attribute { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// One structured identifier extraction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdRule {
    /// The href minus a fixed prefix, e.g. `/c/abc` with prefix `/c/` gives `abc`.
    HrefPrefix { prefix: String },
    /// The path segment following `marker` in the item's href, or in the
    /// first nested link when the item has none.
    HrefSegmentAfter { marker: String },
    /// A data attribute, unless it holds one of the placeholder values.
    Attribute {
        name: String,
        #[serde(default)]
        ignore: Vec<String>,
    },
}

impl IdRule {
    pub fn extract(&self, signals: &ItemSignals) -> Option<ConversationId> {
        match self {
            IdRule::HrefPrefix { prefix } => signals
                .href
                .as_deref()
                .and_then(|href| href.strip_prefix(prefix.as_str()))
                .and_then(ConversationId::new),
            IdRule::HrefSegmentAfter { marker } => signals
                .href
                .as_deref()
                .or(signals.nested_href.as_deref())
                .and_then(|href| segment_after(href, marker))
                .and_then(ConversationId::new),
            IdRule::Attribute { name, ignore } => signals
                .attributes
                .get(name)
                .filter(|value| !ignore.iter().any(|skip| skip == *value))
                .and_then(ConversationId::new),
        }
    }
}

fn segment_after<'a>(href: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    href.match_indices(marker).find_map(|(start, _)| {
        let rest = &href[start + marker.len()..];
        let end = rest.find(['/', '?']).unwrap_or(rest.len());
        let segment = &rest[..end];
        (!segment.is_empty()).then_some(segment)
    })
}

/// Rules that tell navigation entries apart from conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionRules {
    /// Lowercase labels of non-conversation entries; matched exactly or as a
    /// leading word.
    pub texts: Vec<String>,
    /// Items whose trimmed text is shorter than this are section toggles.
    pub min_text_len: usize,
}

impl ExclusionRules {
    pub fn admits(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        let excluded = self.texts.iter().any(|label| {
            text == *label
                || text
                    .strip_prefix(label.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        });
        !excluded && text.chars().count() >= self.min_text_len
    }
}

/// Deletion strategy tag together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeletionConfig {
    Direct(DirectConfig),
    Scripted(ScriptedConfig),
}

impl DeletionConfig {
    pub fn requires_identifier(&self) -> bool {
        matches!(self, DeletionConfig::Direct(_))
    }

    pub fn item_delay(&self) -> Duration {
        match self {
            DeletionConfig::Direct(config) => config.item_delay,
            DeletionConfig::Scripted(config) => config.item_delay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectConfig {
    pub base_url: String,
    pub session_path: String,
    /// Prefix of the per-conversation endpoint; the identifier is appended.
    pub conversation_path: String,
    /// Cookie header forwarded with every request.
    pub session_cookie: Option<String>,
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    #[serde(with = "millis")]
    pub item_delay: Duration,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            base_url: "https://chatgpt.com".to_string(),
            session_path: "/api/auth/session".to_string(),
            conversation_path: "/backend-api/conversation/".to_string(),
            session_cookie: None,
            request_timeout: Duration::from_secs(30),
            item_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedConfig {
    /// Detached layer where the host mounts menus and dialogs.
    pub overlay_container: String,
    /// Query for the per-item action control.
    pub action_control: String,
    /// Controls clicked in order once the action menu is open.
    pub confirm_chain: Vec<String>,
    #[serde(with = "millis")]
    pub hover_settle: Duration,
    #[serde(with = "millis")]
    pub click_settle: Duration,
    #[serde(with = "millis")]
    pub completion_settle: Duration,
    #[serde(with = "millis")]
    pub overlay_timeout: Duration,
    #[serde(with = "millis")]
    pub item_delay: Duration,
}

impl Default for ScriptedConfig {
    fn default() -> Self {
        Self {
            overlay_container: "div.cdk-overlay-container".to_string(),
            action_control: "button".to_string(),
            confirm_chain: vec![
                r#"button[data-test-id="delete-button"]"#.to_string(),
                r#"button[data-test-id="confirm-button"]"#.to_string(),
            ],
            hover_settle: Duration::from_millis(300),
            click_settle: Duration::from_millis(200),
            completion_settle: Duration::from_millis(500),
            overlay_timeout: Duration::from_secs(5),
            item_delay: Duration::from_millis(800),
        }
    }
}

/// How the session starts on a freshly loaded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupPolicy {
    /// Wait before the first pass; the host renders its sidebar late.
    #[serde(with = "millis")]
    pub delay: Duration,
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Extra polls while no item has been found yet. Zero disables polling.
    pub poll_retries: u32,
}

impl Default for StartupPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
            poll_interval: Duration::from_secs(2),
            poll_retries: 0,
        }
    }
}
