// commands/flows.rs — Thin wrappers for flow inventory, migration and
// deletion. Business logic lives in engine/migrate.rs; this file only:
//   1. Deserializes the request payloads from the shell
//   2. Delegates to the orchestrator
//   3. Maps errors to String for the IPC boundary
//   4. Records the audit summary after each batch

use log::info;
use serde::Deserialize;

use crate::atoms::types::{
    CloudFlow, DeleteResult, FlowDescriptor, FlowKind, LocalFlow, MigrationResult, SessionToken,
};
use crate::commands::state::EngineState;

// ── Inventory ──────────────────────────────────────────────────────────────

pub fn get_local_flows(state: &EngineState) -> Vec<LocalFlow> {
    state.orchestrator.local_flows()
}

pub async fn get_cloud_flows(
    state: &EngineState,
    token: SessionToken,
) -> Result<Vec<CloudFlow>, String> {
    state
        .orchestrator
        .cloud_flows(&token)
        .await
        .map_err(|e| e.to_string())
}

// ── Migration ──────────────────────────────────────────────────────────────

/// Migration request from the shell. `user_id` is the platform username of
/// the initiating account, used only to key the audit entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRequest {
    pub flow_type: FlowKind,
    pub flows: Vec<FlowDescriptor>,
    pub target_token: SessionToken,
    pub source_token: Option<SessionToken>,
    #[serde(default)]
    pub user_id: String,
}

pub async fn migrate_flows(
    state: &EngineState,
    request: MigrateRequest,
) -> Result<Vec<MigrationResult>, String> {
    info!(
        "[commands] Migrate {:?} batch: {} flows",
        request.flow_type,
        request.flows.len()
    );

    let names: Vec<String> = request.flows.iter().map(|f| f.name().to_string()).collect();

    let results = state
        .orchestrator
        .migrate(
            request.flow_type,
            request.flows,
            request.target_token,
            request.source_token,
        )
        .await
        .map_err(|e| e.to_string())?;

    let ok = results.iter().filter(|r| r.success).count();
    state.audit.record(
        &request.user_id,
        format!(
            "迁移完成: 成功 {}/{} 个流程 [{}]",
            ok,
            results.len(),
            names.join(", ")
        ),
    );

    Ok(results)
}

// ── Deletion ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLocalRequest {
    pub flows: Vec<LocalFlow>,
    #[serde(default)]
    pub user_id: String,
}

pub fn delete_local_flows(
    state: &EngineState,
    request: DeleteLocalRequest,
) -> Result<Vec<DeleteResult>, String> {
    let results = state
        .orchestrator
        .delete_local(&request.flows)
        .map_err(|e| e.to_string())?;

    record_delete_summary(state, &request.user_id, "删除本地流程", &results);
    Ok(results)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCloudRequest {
    pub token: SessionToken,
    pub app_ids: Vec<String>,
    #[serde(default)]
    pub user_id: String,
}

/// Move cloud flows into the recycle bin. Even on an overall-`Ok` return the
/// caller must scan each result's `session_expired` flag — the platform can
/// expire the token mid-batch and report it per item.
pub async fn delete_cloud_flows(
    state: &EngineState,
    request: DeleteCloudRequest,
) -> Result<Vec<DeleteResult>, String> {
    // The shell selects by app id; the platform has no bulk lookup, so the
    // id doubles as the display name in results, as the desktop client does.
    let flows: Vec<CloudFlow> = request
        .app_ids
        .iter()
        .map(|id| CloudFlow {
            app_id: id.clone(),
            app_name: id.clone(),
            update_time: None,
        })
        .collect();

    let results = state
        .orchestrator
        .delete_cloud(&request.token, &flows)
        .await
        .map_err(|e| e.to_string())?;

    record_delete_summary(state, &request.user_id, "删除云端流程", &results);
    Ok(results)
}

fn record_delete_summary(
    state: &EngineState,
    user_id: &str,
    action: &str,
    results: &[DeleteResult],
) {
    let ok = results.iter().filter(|r| r.success).count();
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    state.audit.record(
        user_id,
        format!("{}: 成功 {}/{} [{}]", action, ok, results.len(), names.join(", ")),
    );
}
