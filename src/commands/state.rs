// commands/state.rs — shared state handed to every command.

use crate::engine::audit::{AuditLog, AuditSink, NoopSink};
use crate::engine::cloud::HttpPlatform;
use crate::engine::config::CredentialStore;
use crate::engine::migrate::Orchestrator;

/// Everything the command layer needs: the orchestrator (owning the platform
/// client), the credential store, and the audit handle. The desktop shell
/// constructs one of these at startup and shares it across commands.
pub struct EngineState {
    pub orchestrator: Orchestrator<HttpPlatform>,
    pub store: CredentialStore,
    pub audit: AuditLog,
}

impl EngineState {
    /// Production wiring: real platform endpoints, default store location,
    /// no audit backend until the shell provides one.
    pub fn init() -> Result<Self, String> {
        Self::init_with_sink(NoopSink)
    }

    /// Wiring with an explicit audit backend. Must run inside a tokio
    /// runtime — the audit dispatcher task is spawned here.
    pub fn init_with_sink(sink: impl AuditSink) -> Result<Self, String> {
        let platform = HttpPlatform::new().map_err(|e| e.to_string())?;
        Ok(Self {
            orchestrator: Orchestrator::new(platform),
            store: CredentialStore::open_default(),
            audit: AuditLog::spawn(sink),
        })
    }
}
