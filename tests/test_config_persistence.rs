// Integration test: credential document persistence and the command-layer
// boundary around it (save → load → overwrite → load, audit summaries).

use std::sync::Arc;

use flowferry::commands::accounts;
use flowferry::commands::state::EngineState;
use flowferry::engine::audit::{AuditLog, MemorySink};
use flowferry::engine::cloud::HttpPlatform;
use flowferry::engine::config::{Config, CredentialStore};
use flowferry::engine::migrate::Orchestrator;
use flowferry::AccountCredential;

fn test_state(dir: &std::path::Path, sink: Arc<MemorySink>) -> EngineState {
    EngineState {
        orchestrator: Orchestrator::new(HttpPlatform::new().expect("client")),
        store: CredentialStore::at(dir.join("config.json")),
        audit: AuditLog::spawn(sink),
    }
}

#[tokio::test]
async fn save_then_load_round_trips_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let state = test_state(dir.path(), sink);

    let mut config = Config::default();
    config.accounts.push(AccountCredential::new("工作账号", "a@b.c", "pw1"));
    config.accounts.push(AccountCredential::new("备用账号", "x@y.z", "pw2"));
    let ids: Vec<_> = config.accounts.iter().map(|a| a.id).collect();

    accounts::save_config(&state, config).unwrap();

    let loaded = accounts::load_config(&state);
    assert_eq!(loaded.accounts.len(), 2);
    // Durable identity: ids survive the reload.
    assert_eq!(loaded.accounts[0].id, ids[0]);
    assert_eq!(loaded.accounts[1].id, ids[1]);
    // Order is preserved — the document is an ordered list.
    assert_eq!(loaded.accounts[0].name, "工作账号");
}

#[tokio::test]
async fn editing_one_account_is_load_mutate_save_all() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let state = test_state(dir.path(), sink);

    let mut config = Config::default();
    config.accounts.push(AccountCredential::new("旧名", "u", "p"));
    accounts::save_config(&state, config).unwrap();

    // The only update primitive is whole-document replace.
    let mut edited = accounts::load_config(&state);
    let id = edited.accounts[0].id;
    edited.accounts[0].name = "新名".to_string();
    accounts::save_config(&state, edited).unwrap();

    let reloaded = accounts::load_config(&state);
    assert_eq!(reloaded.accounts[0].name, "新名");
    assert_eq!(reloaded.accounts[0].id, id);
}

#[tokio::test]
async fn save_records_an_audit_summary() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let state = test_state(dir.path(), sink.clone());

    let mut config = Config::default();
    config.accounts.push(AccountCredential::new("账号甲", "u", "p"));
    accounts::save_config(&state, config).unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("1 个账号"));
    assert!(entries[0].message.contains("账号甲"));
}

#[tokio::test]
async fn settings_default_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let state = test_state(dir.path(), sink);

    let mut config = accounts::load_config(&state);
    assert_eq!(config.settings.theme, "system");
    assert!(config.settings.auto_update);

    config.settings.theme = "dark".to_string();
    accounts::save_config(&state, config).unwrap();

    let reloaded = accounts::load_config(&state);
    assert_eq!(reloaded.settings.theme, "dark");
    assert_eq!(reloaded.settings.language, "zh-CN");
}
