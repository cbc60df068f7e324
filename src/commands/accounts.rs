// commands/accounts.rs — Thin wrappers for credential storage and login.
//
// Business logic lives in engine/config.rs and engine/auth.rs. This file
// only delegates, maps errors to String for the IPC boundary, and records
// audit summaries after mutations.

use log::info;

use crate::atoms::types::{SessionToken, TokenPurpose};
use crate::commands::state::EngineState;
use crate::engine::config::Config;

/// Load the whole credential document. Never fails: first launch simply
/// yields the defaults.
pub fn load_config(state: &EngineState) -> Config {
    state.store.load()
}

/// Replace the whole credential document. There is no partial update — the
/// caller loads, mutates in memory, and saves back.
pub fn save_config(state: &EngineState, config: Config) -> Result<(), String> {
    state.store.save(&config).map_err(|e| e.to_string())?;

    let names: Vec<&str> = config.accounts.iter().map(|a| a.name.as_str()).collect();
    state.audit.record(
        "local",
        format!("账号配置已保存: {} 个账号 [{}]", names.len(), names.join(", ")),
    );
    Ok(())
}

/// Authenticate one credential pair. With `purpose = Verify` the caller
/// discards the token after the probe (used before persisting a new
/// account); `Source`/`Target` tokens are retained for the migration flow.
pub async fn login_account(
    state: &EngineState,
    username: String,
    password: String,
    purpose: TokenPurpose,
) -> Result<SessionToken, String> {
    info!("[commands] Login requested for {} ({:?})", username, purpose);
    let token = state
        .orchestrator
        .login(&username, &password, purpose)
        .await
        .map_err(|e| e.to_string())?;

    state
        .audit
        .record(&username, format!("登录成功 ({:?})", purpose));
    Ok(token)
}
