// Flowferry Engine — Platform Seam
// The remote RPA platform is reached exclusively through this trait.
// The production implementation is `HttpPlatform`; tests substitute mocks.

use async_trait::async_trait;

use crate::atoms::types::{
    CloudFlow, DeleteResult, MigrationBatch, MigrationResult, SessionToken, TokenPurpose,
};

// ── Error type ─────────────────────────────────────────────────────────────

/// Canonical error type for all platform operations.
///
/// `SessionExpired` is a first-class variant: the platform signals expiry via
/// HTTP 401, and this is the only place where that status is interpreted —
/// no message-string matching anywhere downstream.
#[derive(Debug)]
pub enum PlatformError {
    /// HTTP / network failure.
    Transport(String),
    /// Credentials rejected at login — not retryable.
    Auth(String),
    /// A previously valid session token was rejected. The user must
    /// re-authenticate and retry the original action.
    SessionExpired,
    /// The platform refused the request for business reasons.
    Rejected(String),
    /// Generic API error with HTTP status code.
    Api { status: u16, message: String },
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::Transport(s) => write!(f, "transport error: {}", s),
            PlatformError::Auth(s) => write!(f, "auth error: {}", s),
            PlatformError::SessionExpired => write!(f, "session expired"),
            PlatformError::Rejected(s) => write!(f, "rejected: {}", s),
            PlatformError::Api { status, message } => {
                write!(f, "API error {}: {}", status, message)
            }
        }
    }
}

impl From<PlatformError> for String {
    fn from(e: PlatformError) -> Self {
        e.to_string()
    }
}

// ── The platform trait ─────────────────────────────────────────────────────

/// Everything the orchestrator needs from the remote platform.
///
/// Contract for the batch operations (`transfer_flows`, `delete_flows`):
///   • `Ok(results)` — the call was dispatched and ran to completion;
///     exactly one result per input item, in input order. Individual
///     failures (name collision, quota, mid-batch expiry) are embedded in
///     their item's result and never abort the siblings.
///   • `Err(_)` — the call could not be attempted or completed as a whole;
///     no per-item results are synthesized in that case.
/// The two outcomes are never mixed.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Single authentication attempt. No retry: a failure here is fatal for
    /// the step that needed the token.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        purpose: TokenPurpose,
    ) -> Result<SessionToken, PlatformError>;

    /// List all flows owned by the session's account (paged internally).
    async fn list_flows(&self, token: &SessionToken) -> Result<Vec<CloudFlow>, PlatformError>;

    /// Copy every flow in the batch into the target account. The source
    /// flows are left intact — this is a copy, not a move, and repeating it
    /// creates duplicates at the target.
    async fn transfer_flows(
        &self,
        batch: &MigrationBatch,
    ) -> Result<Vec<MigrationResult>, PlatformError>;

    /// Move the given flows into the account's recycle bin.
    async fn delete_flows(
        &self,
        token: &SessionToken,
        flows: &[CloudFlow],
    ) -> Result<Vec<DeleteResult>, PlatformError>;
}
