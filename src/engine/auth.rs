// Flowferry Engine — Platform Session Client (login leg).
//
// The platform uses an OAuth password grant with an RSA-encrypted password
// field (`crypt=metal`). One authentication attempt per purpose per
// invocation — there is no retry here; a failure aborts the step that
// needed the token.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Encrypt, RsaPublicKey};
use serde::Deserialize;

use crate::atoms::types::{SessionToken, TokenPurpose};
use crate::engine::platform::PlatformError;

/// OAuth token endpoint of the platform's identity service.
pub const AUTH_URL: &str = "https://api.yingdao.com/oauth/token";

/// Client credentials the desktop software presents at the token endpoint.
const BASIC_AUTH: &str = "basic c25zOlQ3c3ZGY0lMNGZvUGoxajk=";

/// RSA public key published by the desktop client for `crypt=metal` logins.
const RSA_PUBLIC_KEY_PEM: &str = r#"-----BEGIN PUBLIC KEY-----
MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQCte0XfPY9GUpQ3ZasH1kVbDhRw
yRAqWSeyxj290OqFHtyiZ+5SQjrEr79mk0hcZqV03fb5oYf385E3gopSERIKxVQy
GoloNeDgyLu7rHHWMPo8KPDpUBlpRpHlGMgBNzJZ2BI6p7LvGAhCoA7XRuetyTlA
W6EbSXBpSu1sNGBhkQIDAQAB
-----END PUBLIC KEY-----"#;

/// Encrypt the password under the platform's public key (PKCS#1 v1.5).
pub fn encrypt_password(password: &str) -> Result<String, PlatformError> {
    let public_key = RsaPublicKey::from_public_key_pem(RSA_PUBLIC_KEY_PEM)
        .map_err(|e| PlatformError::Auth(format!("password envelope: bad public key: {}", e)))?;

    let mut rng = rand::thread_rng();
    let encrypted = public_key
        .encrypt(&mut rng, Pkcs1v15Encrypt, password.as_bytes())
        .map_err(|e| PlatformError::Auth(format!("password envelope: encrypt failed: {}", e)))?;

    Ok(BASE64.encode(&encrypted))
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: Option<bool>,
    access_token: Option<String>,
    msg: Option<String>,
}

/// The token endpoint occasionally concatenates two JSON objects into one
/// body; only the first one is meaningful.
fn first_json_object(body: &str) -> String {
    match body.find("}{") {
        Some(idx) => format!("{}}}", &body[..idx]),
        None => body.to_string(),
    }
}

/// Perform the password-grant login and tag the resulting token with its
/// purpose. A `Verify` token is identical on the wire; the caller just
/// discards it after the probe.
pub async fn login(
    client: &reqwest::Client,
    auth_url: &str,
    username: &str,
    password: &str,
    purpose: TokenPurpose,
) -> Result<SessionToken, PlatformError> {
    let encrypted_password = encrypt_password(password)?;

    let params = [
        ("username", username),
        ("password", encrypted_password.as_str()),
        ("crypt", "metal"),
        ("grant_type", "password"),
        ("scope", "all"),
    ];

    let response = client
        .post(auth_url)
        .header("Accept", "*/*")
        .header("Accept-Language", "zh-cn")
        .header("Authorization", BASIC_AUTH)
        .form(&params)
        .send()
        .await
        .map_err(|e| PlatformError::Transport(format!("login request failed: {}", e)))?;

    let text = response
        .text()
        .await
        .map_err(|e| PlatformError::Transport(format!("login response unreadable: {}", e)))?;

    let body = first_json_object(text.trim());
    let result: LoginResponse = serde_json::from_str(&body)
        .map_err(|e| PlatformError::Transport(format!("login response malformed: {}", e)))?;

    if result.success.unwrap_or(false) {
        if let Some(token) = result.access_token {
            log::info!("[auth] Login ok for {} ({:?})", username, purpose);
            return Ok(SessionToken::new(token, purpose));
        }
    }

    Err(PlatformError::Auth(
        result.msg.unwrap_or_else(|| "login rejected".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_envelope_is_base64_of_key_size() {
        let out = encrypt_password("hunter2").unwrap();
        let raw = BASE64.decode(out.as_bytes()).unwrap();
        // 1024-bit key → 128-byte ciphertext.
        assert_eq!(raw.len(), 128);
    }

    #[test]
    fn doubled_json_body_is_trimmed_to_first_object() {
        let body = r#"{"success":true,"access_token":"t1"}{"success":false}"#;
        let first = first_json_object(body);
        let parsed: LoginResponse = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed.access_token.as_deref(), Some("t1"));
    }

    #[test]
    fn single_json_body_passes_through() {
        let body = r#"{"success":false,"msg":"账号或密码错误"}"#;
        assert_eq!(first_json_object(body), body);
    }
}
