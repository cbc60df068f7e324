// ── Flowferry Atoms: Error Types ───────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by failure class (credentials, network,
//     session expiry, remote rejection, malformed input).
//   • `EngineError` → `String` conversion is provided via `Display` so that
//     the command boundary (`Result<T, String>`) can call `.map_err(|e|
//     e.to_string())` without boilerplate.
//   • No variant carries secret material (passwords, tokens) in its message.
//   • Session expiry is a dedicated variant, never a substring match on a
//     message — callers branch on the variant.

use thiserror::Error;

use crate::engine::platform::PlatformError;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The platform rejected the username/password pair.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Transport-level failure reaching the platform.
    #[error("Network error: {0}")]
    Network(String),

    /// The session token was rejected as expired. The caller is expected to
    /// re-authenticate and let the user retry from scratch.
    #[error("Session expired — re-authentication required")]
    SessionExpired,

    /// Call-level rejection by the remote platform (not a per-item result).
    #[error("Platform error: {0}")]
    Remote(String),

    /// Precondition violation — rejected before any remote call is made.
    #[error("Invalid request: {0}")]
    MalformedInput(String),

    /// Flow package (.bot archive) could not be read or written.
    #[error("Package error: {0}")]
    Archive(String),

    /// RSA password envelope construction failed.
    #[error("Crypto error: {0}")]
    Crypto(String),
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations should return this type.
/// At the command boundary, convert with `.map_err(|e| e.to_string())`.
pub type EngineResult<T> = Result<T, EngineError>;

// ── Conversions ────────────────────────────────────────────────────────────

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

/// Classify a platform-client failure into the engine taxonomy.
impl From<PlatformError> for EngineError {
    fn from(e: PlatformError) -> Self {
        match e {
            PlatformError::Transport(msg) => EngineError::Network(msg),
            PlatformError::Auth(msg) => EngineError::InvalidCredentials(msg),
            PlatformError::SessionExpired => EngineError::SessionExpired,
            PlatformError::Rejected(msg) => EngineError::Remote(msg),
            PlatformError::Api { status, message } => {
                EngineError::Remote(format!("API error {}: {}", status, message))
            }
        }
    }
}
