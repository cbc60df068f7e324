// ── Flowferry Atoms: Core Types ────────────────────────────────────────────
// Shared data types crossing the engine / command boundary. Wire-facing
// structs use camelCase renames to match both the platform API and the
// frontend IPC payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Session tokens ─────────────────────────────────────────────────────────

/// What a session token was obtained for. A `Verify` token is discarded by
/// the caller after a successful probe login; `Source`/`Target` tokens are
/// retained for inventory and transfer calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Source,
    Target,
    Verify,
}

/// Opaque bearer token for one platform session. Expiry is not tracked
/// locally — it is discovered only when a call fails with `SessionExpired`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub purpose: TokenPurpose,
}

impl SessionToken {
    pub fn new(token: impl Into<String>, purpose: TokenPurpose) -> Self {
        Self {
            token: token.into(),
            purpose,
        }
    }
}

// ── Account credentials ────────────────────────────────────────────────────

/// One stored platform account. The `id` is generated at creation time and
/// persisted with the record, so selection state stays valid across reloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCredential {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password: String,
}

impl AccountCredential {
    pub fn new(name: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

// ── Flow descriptors ───────────────────────────────────────────────────────

/// A flow cached on the local disk (ShadowBot client cache). `package_data`
/// is the flow's manifest carried as an opaque JSON blob — the engine only
/// inspects `uuid`/`name` and rewrites a handful of top-level keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFlow {
    pub user_id: String,
    pub app_id: String,
    pub uuid: String,
    pub name: String,
    pub update_time: String,
    pub robot_path: String,
    pub package_data: serde_json::Value,
}

/// A flow hosted by the platform under some account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFlow {
    pub app_id: String,
    pub app_name: String,
    pub update_time: Option<String>,
}

/// Where a batch of flows lives. A batch is always homogeneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Local,
    Cloud,
}

/// Tagged union over the two flow variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlowDescriptor {
    Local(LocalFlow),
    Cloud(CloudFlow),
}

impl FlowDescriptor {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowDescriptor::Local(_) => FlowKind::Local,
            FlowDescriptor::Cloud(_) => FlowKind::Cloud,
        }
    }

    /// Display name used in result reporting and audit summaries.
    pub fn name(&self) -> &str {
        match self {
            FlowDescriptor::Local(f) => &f.name,
            FlowDescriptor::Cloud(f) => &f.app_name,
        }
    }

    /// Stable identity: local flows by uuid, cloud flows by app id.
    pub fn identity(&self) -> &str {
        match self {
            FlowDescriptor::Local(f) => &f.uuid,
            FlowDescriptor::Cloud(f) => &f.app_id,
        }
    }
}

// ── Migration batches and results ──────────────────────────────────────────

/// Ephemeral per-invocation bundle passed to the platform's batched transfer
/// primitive. Constructed fresh by the orchestrator after precondition
/// checks; holds no state across calls.
#[derive(Debug, Clone)]
pub struct MigrationBatch {
    pub kind: FlowKind,
    pub flows: Vec<FlowDescriptor>,
    pub target_token: SessionToken,
    pub source_token: Option<SessionToken>,
}

/// Outcome for one flow in a migration batch. Exactly one per input flow, in
/// input order — a failed item never aborts its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    pub success: bool,
    pub name: String,
    pub message: String,
}

/// Outcome for one flow in a deletion batch. `session_expired` is reported
/// per item because the platform can expire a token mid-batch; callers must
/// scan all results for it even when the call as a whole returned `Ok`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub success: bool,
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub session_expired: bool,
}
