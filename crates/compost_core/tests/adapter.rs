use compost_core::{DeletionConfig, ExclusionRules, PlatformAdapter, RunReport, DeletionOutcome, ConversationId, RunSummary};
use pretty_assertions::assert_eq;

#[test]
fn hosts_select_presets() {
    assert_eq!(
        PlatformAdapter::for_host("chatgpt.com").map(|a| a.name),
        Some("chatgpt".to_string())
    );
    assert_eq!(
        PlatformAdapter::for_host("CHAT.OPENAI.COM").map(|a| a.name),
        Some("chatgpt".to_string())
    );
    assert_eq!(
        PlatformAdapter::for_host("gemini.google.com").map(|a| a.name),
        Some("gemini".to_string())
    );
    assert!(PlatformAdapter::for_host("example.org").is_none());
}

#[test]
fn presets_pick_their_strategy() {
    let chatgpt = PlatformAdapter::chatgpt();
    assert!(matches!(chatgpt.deletion, DeletionConfig::Direct(_)));
    assert!(chatgpt.deletion.requires_identifier());

    let gemini = PlatformAdapter::gemini();
    assert!(matches!(gemini.deletion, DeletionConfig::Scripted(_)));
    assert!(!gemini.deletion.requires_identifier());
    assert!(gemini.deletion.item_delay() > chatgpt.deletion.item_delay());
    assert_eq!(gemini.signal_attributes(), vec!["data-test-id"]);
}

#[test]
fn navigation_entries_are_excluded() {
    let rules = PlatformAdapter::gemini().exclusion;

    assert!(!rules.admits("New chat"));
    assert!(!rules.admits("  Gems  "));
    assert!(!rules.admits("Settings & help"));
    assert!(!rules.admits("ok"));
    assert!(rules.admits("Gemstone identification"));
    assert!(rules.admits("Weekly meal plan"));
}

#[test]
fn empty_rules_admit_everything() {
    let rules = ExclusionRules::default();
    assert!(rules.admits(""));
    assert!(rules.admits("new chat"));
}

#[test]
fn adapter_survives_a_ron_config_file() {
    let text = ron::to_string(&PlatformAdapter::gemini()).unwrap();
    let parsed: PlatformAdapter = ron::from_str(&text).unwrap();
    assert_eq!(parsed, PlatformAdapter::gemini());
}

#[test]
fn summary_counts_skips_as_unsuccessful() {
    let mut report = RunReport::default();
    report.push(ConversationId::new("abc"), DeletionOutcome::Succeeded);
    report.push(
        ConversationId::new("def"),
        DeletionOutcome::Failed {
            reason: "delete request failed with status 500".to_string(),
        },
    );
    report.push(None, DeletionOutcome::SkippedNoIdentifier);

    let summary = report.summary();
    assert_eq!(
        summary,
        RunSummary {
            succeeded: 1,
            failed: 1,
            skipped: 1
        }
    );
    assert!(summary.has_failures());
    assert_eq!(summary.alert_message(), "Deleted 1 conversations. 2 failed. Refreshing...");
}
