// Flowferry Engine — Migration Orchestrator.
//
// The orchestrator owns no state and performs no retries: each invocation is
// a pure function of its inputs plus the platform's current state. Its job
// is (1) fail-fast validation before any remote traffic, (2) one batched
// dispatch to the platform's transfer primitive, (3) pass-through of the
// per-item results in input order.
//
// Two caller-visible outcomes, never mixed:
//   • `Ok(results)` — one result per input flow; failed items sit next to
//     successful ones (partial success is the common case, not an anomaly).
//   • `Err(_)` — the batch could not be attempted or completed as a whole;
//     zero results.

use log::info;

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{
    CloudFlow, DeleteResult, FlowDescriptor, FlowKind, LocalFlow, MigrationBatch, MigrationResult,
    SessionToken, TokenPurpose,
};
use crate::engine::local;
use crate::engine::platform::PlatformApi;

/// Migration orchestration engine, generic over the platform seam.
pub struct Orchestrator<P: PlatformApi> {
    platform: P,
}

impl<P: PlatformApi> Orchestrator<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Authenticate against the platform. One attempt; the caller decides
    /// whether to keep the token (source/target) or discard it (verify).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        purpose: TokenPurpose,
    ) -> EngineResult<SessionToken> {
        Ok(self.platform.authenticate(username, password, purpose).await?)
    }

    /// Local-disk flow inventory. No session needed.
    pub fn local_flows(&self) -> Vec<LocalFlow> {
        local::scan_all_flows()
    }

    /// Cloud flow inventory under the given session.
    pub async fn cloud_flows(&self, token: &SessionToken) -> EngineResult<Vec<CloudFlow>> {
        Ok(self.platform.list_flows(token).await?)
    }

    /// Copy the selected flows into the target account.
    ///
    /// Preconditions (checked before any remote call):
    ///   • non-empty batch, homogeneous and matching `kind`
    ///   • `target` tagged `Target`
    ///   • cloud batches carry a `source` token tagged `Source`
    ///
    /// Postcondition: exactly one `MigrationResult` per input flow, in input
    /// order. Re-running a successful batch creates duplicates at the
    /// target — transfer is a copy, never a move.
    pub async fn migrate(
        &self,
        kind: FlowKind,
        flows: Vec<FlowDescriptor>,
        target: SessionToken,
        source: Option<SessionToken>,
    ) -> EngineResult<Vec<MigrationResult>> {
        let batch = Self::validate(kind, flows, target, source)?;

        info!(
            "[migrate] Dispatching {:?} batch of {} flows",
            batch.kind,
            batch.flows.len()
        );

        let results = self.platform.transfer_flows(&batch).await?;
        Ok(results)
    }

    /// Move the selected cloud flows into the recycle bin. Per-item
    /// semantics mirror `migrate`; additionally each result carries a
    /// `session_expired` flag the caller must scan for, since the platform
    /// can expire the token mid-batch and report it item by item.
    pub async fn delete_cloud(
        &self,
        token: &SessionToken,
        flows: &[CloudFlow],
    ) -> EngineResult<Vec<DeleteResult>> {
        if flows.is_empty() {
            return Err(EngineError::MalformedInput("empty selection".to_string()));
        }
        Ok(self.platform.delete_flows(token, flows).await?)
    }

    /// Delete locally cached flows. Purely filesystem-side; partial failure
    /// is reported per item and never aborts the batch.
    pub fn delete_local(&self, flows: &[LocalFlow]) -> EngineResult<Vec<DeleteResult>> {
        if flows.is_empty() {
            return Err(EngineError::MalformedInput("empty selection".to_string()));
        }

        let results = flows
            .iter()
            .map(|flow| match local::delete_flow(flow) {
                Ok(()) => DeleteResult {
                    success: true,
                    name: flow.name.clone(),
                    message: "删除成功".to_string(),
                    session_expired: false,
                },
                Err(e) => DeleteResult {
                    success: false,
                    name: flow.name.clone(),
                    message: e.to_string(),
                    session_expired: false,
                },
            })
            .collect();

        Ok(results)
    }

    // ── Validation ─────────────────────────────────────────────────────────

    fn validate(
        kind: FlowKind,
        flows: Vec<FlowDescriptor>,
        target: SessionToken,
        source: Option<SessionToken>,
    ) -> EngineResult<MigrationBatch> {
        if flows.is_empty() {
            return Err(EngineError::MalformedInput("empty selection".to_string()));
        }

        if let Some(mixed) = flows.iter().find(|f| f.kind() != kind) {
            return Err(EngineError::MalformedInput(format!(
                "mixed batch: '{}' is {:?}, expected {:?}",
                mixed.name(),
                mixed.kind(),
                kind
            )));
        }

        if target.purpose != TokenPurpose::Target {
            return Err(EngineError::MalformedInput(format!(
                "target token tagged {:?}, expected Target",
                target.purpose
            )));
        }

        let source = match (kind, source) {
            (FlowKind::Cloud, None) => {
                return Err(EngineError::MalformedInput(
                    "cloud batch requires a source session".to_string(),
                ));
            }
            (FlowKind::Cloud, Some(s)) if s.purpose != TokenPurpose::Source => {
                return Err(EngineError::MalformedInput(format!(
                    "source token tagged {:?}, expected Source",
                    s.purpose
                )));
            }
            (FlowKind::Cloud, Some(s)) => Some(s),
            // A source session is meaningless for local batches; drop it.
            (FlowKind::Local, _) => None,
        };

        Ok(MigrationBatch {
            kind,
            flows,
            target_token: target,
            source_token: source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_flow(id: &str) -> FlowDescriptor {
        FlowDescriptor::Cloud(CloudFlow {
            app_id: id.to_string(),
            app_name: format!("flow-{}", id),
            update_time: None,
        })
    }

    fn token(purpose: TokenPurpose) -> SessionToken {
        SessionToken::new("tok", purpose)
    }

    #[test]
    fn validate_rejects_empty_batch() {
        let err = Orchestrator::<crate::engine::cloud::HttpPlatform>::validate(
            FlowKind::Cloud,
            vec![],
            token(TokenPurpose::Target),
            Some(token(TokenPurpose::Source)),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn validate_rejects_cloud_batch_without_source() {
        let err = Orchestrator::<crate::engine::cloud::HttpPlatform>::validate(
            FlowKind::Cloud,
            vec![cloud_flow("a")],
            token(TokenPurpose::Target),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn validate_rejects_mispurposed_target_token() {
        let err = Orchestrator::<crate::engine::cloud::HttpPlatform>::validate(
            FlowKind::Cloud,
            vec![cloud_flow("a")],
            token(TokenPurpose::Verify),
            Some(token(TokenPurpose::Source)),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn validate_drops_source_for_local_batches() {
        let flow = FlowDescriptor::Local(LocalFlow {
            user_id: "u".into(),
            app_id: "a".into(),
            uuid: "x".into(),
            name: "n".into(),
            update_time: String::new(),
            robot_path: "/tmp/x".into(),
            package_data: serde_json::json!({}),
        });
        let batch = Orchestrator::<crate::engine::cloud::HttpPlatform>::validate(
            FlowKind::Local,
            vec![flow],
            token(TokenPurpose::Target),
            Some(token(TokenPurpose::Source)),
        )
        .unwrap();
        assert!(batch.source_token.is_none());
    }
}
