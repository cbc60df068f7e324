// Flowferry Engine — shared HTTP plumbing for the platform client.
//
// The platform's API gateway fronts an OSS store with pre-signed URLs and is
// picky about headers: requests must carry the legacy desktop-client
// User-Agent, and upload PUTs must NOT set Content-Type.

use reqwest::Client;

use crate::engine::platform::PlatformError;

/// User-Agent the desktop client sends; the gateway rejects unknown agents.
pub const CLIENT_USER_AGENT: &str = "Mozilla/4.0 (compatible; MSIE 9.0; Windows NT 6.1)";

/// Build the shared HTTP client used for every platform call.
pub fn build_client() -> Result<Client, PlatformError> {
    Client::builder()
        .user_agent(CLIENT_USER_AGENT)
        .build()
        .map_err(|e| PlatformError::Transport(format!("HTTP client error: {}", e)))
}

/// `Authorization` header value for an established session.
pub fn bearer(token: &str) -> String {
    format!("bearer {}", token)
}
