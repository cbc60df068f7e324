// Flowferry Engine — centralized path resolution.
//
// Two roots matter:
//   • the flowferry data root (`~/.flowferry/`) holding the credential
//     document, and
//   • the ShadowBot client cache (`%LOCALAPPDATA%/ShadowBot/users/`) that
//     the local-flow scanner walks.

use std::path::PathBuf;

/// The flowferry data root: `~/.flowferry/`.
pub fn data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".flowferry")
}

/// The single credential/settings document (whole-document replace only).
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Root of the ShadowBot per-user flow cache, if the client is installed.
/// On non-Windows hosts `LOCALAPPDATA` is simply absent and the scanner
/// reports an empty inventory.
pub fn shadowbot_users_dir() -> Option<PathBuf> {
    std::env::var_os("LOCALAPPDATA")
        .map(|local| PathBuf::from(local).join("ShadowBot").join("users"))
}
