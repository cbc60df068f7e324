// Flowferry Engine — local flow inventory (ShadowBot client cache).
//
// Layout on disk: `<users root>/<user_id>/apps/<app_id>/xbot_robot/` with a
// `package.json` manifest inside the robot directory. Unreadable entries are
// skipped with a warning; a missing root is an empty inventory, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::warn;

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::LocalFlow;
use crate::engine::paths;

/// Scan the default ShadowBot cache location.
pub fn scan_all_flows() -> Vec<LocalFlow> {
    match paths::shadowbot_users_dir() {
        Some(base) if base.exists() => scan_flows(&base),
        _ => Vec::new(),
    }
}

/// Scan an explicit users root. Flows are returned newest first.
pub fn scan_flows(base: &Path) -> Vec<LocalFlow> {
    let mut flows = Vec::new();

    let users = match fs::read_dir(base) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("[local] Cannot read flow cache {}: {}", base.display(), e);
            return flows;
        }
    };

    for user_entry in users.flatten() {
        let user_path = user_entry.path();
        if !user_path.is_dir() {
            continue;
        }
        let user_id = user_entry.file_name().to_string_lossy().to_string();

        let apps_path = user_path.join("apps");
        let apps = match fs::read_dir(&apps_path) {
            Ok(rd) => rd,
            Err(_) => continue,
        };

        for app_entry in apps.flatten() {
            let robot_path = app_entry.path().join("xbot_robot");
            let manifest_path = robot_path.join("package.json");
            if !manifest_path.exists() {
                continue;
            }

            match read_flow(&user_id, &app_entry.file_name().to_string_lossy(), &robot_path, &manifest_path) {
                Ok(flow) => flows.push(flow),
                Err(e) => warn!("[local] Skipping {}: {}", manifest_path.display(), e),
            }
        }
    }

    // Newest first.
    flows.sort_by(|a, b| b.update_time.cmp(&a.update_time));
    flows
}

fn read_flow(
    user_id: &str,
    app_id: &str,
    robot_path: &Path,
    manifest_path: &Path,
) -> EngineResult<LocalFlow> {
    let content = fs::read_to_string(manifest_path)?;
    let package_data: serde_json::Value = serde_json::from_str(&content)?;

    let update_time = fs::metadata(manifest_path)
        .and_then(|m| m.modified())
        .map(|t| {
            let dt: DateTime<Local> = t.into();
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        })
        .unwrap_or_default();

    Ok(LocalFlow {
        user_id: user_id.to_string(),
        app_id: app_id.to_string(),
        uuid: package_data
            .get("uuid")
            .and_then(|v| v.as_str())
            .unwrap_or(app_id)
            .to_string(),
        name: package_data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("未知")
            .to_string(),
        update_time,
        robot_path: robot_path.to_string_lossy().to_string(),
        package_data,
    })
}

/// Delete a local flow by removing its whole app directory (the parent of
/// `xbot_robot`). Irreversible — no recycle bin exists for the local cache.
pub fn delete_flow(flow: &LocalFlow) -> EngineResult<()> {
    let robot_path = PathBuf::from(&flow.robot_path);
    let app_path = robot_path
        .parent()
        .ok_or_else(|| EngineError::MalformedInput("flow has no app directory".to_string()))?;

    if !app_path.exists() {
        return Err(EngineError::MalformedInput(format!(
            "flow directory missing: {}",
            app_path.display()
        )));
    }

    fs::remove_dir_all(app_path)?;
    Ok(())
}
