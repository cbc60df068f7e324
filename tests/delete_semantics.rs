// Integration test: deletion batch semantics.
//
// Cloud deletion reports session expiry per item, not as a call-level
// failure — a token can expire mid-batch and the remaining items still get
// their attempt. Local deletion is filesystem-only with the same per-item
// isolation.

use async_trait::async_trait;
use parking_lot::Mutex;

use flowferry::engine::local;
use flowferry::engine::platform::{PlatformApi, PlatformError};
use flowferry::{
    CloudFlow, DeleteResult, EngineError, MigrationBatch, MigrationResult, Orchestrator,
    SessionToken, TokenPurpose,
};

/// Platform whose session expires after N successful deletions.
struct ExpiringPlatform {
    expire_after: usize,
    deleted: Mutex<usize>,
}

#[async_trait]
impl PlatformApi for ExpiringPlatform {
    async fn authenticate(
        &self,
        _username: &str,
        _password: &str,
        purpose: TokenPurpose,
    ) -> Result<SessionToken, PlatformError> {
        Ok(SessionToken::new("t", purpose))
    }

    async fn list_flows(&self, _token: &SessionToken) -> Result<Vec<CloudFlow>, PlatformError> {
        Ok(Vec::new())
    }

    async fn transfer_flows(
        &self,
        _batch: &MigrationBatch,
    ) -> Result<Vec<MigrationResult>, PlatformError> {
        Err(PlatformError::Rejected("not under test".to_string()))
    }

    async fn delete_flows(
        &self,
        _token: &SessionToken,
        flows: &[CloudFlow],
    ) -> Result<Vec<DeleteResult>, PlatformError> {
        // Mirrors the production client: per-item attempts, expiry embedded
        // in the item that hit it, batch continues.
        let mut results = Vec::new();
        for flow in flows {
            let mut deleted = self.deleted.lock();
            if *deleted >= self.expire_after {
                results.push(DeleteResult {
                    success: false,
                    name: flow.app_name.clone(),
                    message: "会话已过期，请重新登录".to_string(),
                    session_expired: true,
                });
            } else {
                *deleted += 1;
                results.push(DeleteResult {
                    success: true,
                    name: flow.app_name.clone(),
                    message: "已移入回收站".to_string(),
                    session_expired: false,
                });
            }
        }
        Ok(results)
    }
}

fn flows(names: &[&str]) -> Vec<CloudFlow> {
    names
        .iter()
        .map(|n| CloudFlow {
            app_id: format!("id-{}", n),
            app_name: n.to_string(),
            update_time: None,
        })
        .collect()
}

#[tokio::test]
async fn mid_batch_expiry_is_reported_per_item() {
    let orch = Orchestrator::new(ExpiringPlatform {
        expire_after: 1,
        deleted: Mutex::new(0),
    });
    let token = SessionToken::new("t", TokenPurpose::Target);

    let results = orch
        .delete_cloud(&token, &flows(&["一", "二", "三"]))
        .await
        .unwrap();

    // The call as a whole succeeded; every item is reported.
    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(results[1].session_expired);
    assert!(results[2].session_expired);

    // The caller's contract: scan all results for the flag, never assume a
    // successful call means no expiry.
    assert!(results.iter().any(|r| r.session_expired));
}

#[tokio::test]
async fn empty_cloud_selection_fails_fast() {
    let orch = Orchestrator::new(ExpiringPlatform {
        expire_after: 0,
        deleted: Mutex::new(0),
    });
    let token = SessionToken::new("t", TokenPurpose::Target);

    let err = orch.delete_cloud(&token, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::MalformedInput(_)));
}

#[tokio::test]
async fn local_delete_isolates_per_item_failures() {
    let dir = tempfile::tempdir().unwrap();
    for app in ["app-a", "app-b"] {
        let robot = dir.path().join("user").join("apps").join(app).join("xbot_robot");
        std::fs::create_dir_all(&robot).unwrap();
        std::fs::write(
            robot.join("package.json"),
            format!(r#"{{"uuid":"{}","name":"{}"}}"#, app, app),
        )
        .unwrap();
    }

    let mut cached = local::scan_flows(dir.path());
    cached.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(cached.len(), 2);

    // Remove one app dir out from under the engine to force a failure.
    std::fs::remove_dir_all(dir.path().join("user").join("apps").join("app-a")).unwrap();

    let orch = Orchestrator::new(ExpiringPlatform {
        expire_after: 0,
        deleted: Mutex::new(0),
    });
    let results = orch.delete_local(&cached).unwrap();

    assert_eq!(results.len(), 2);
    assert!(!results[0].success); // app-a vanished
    assert!(results[1].success); // app-b deleted for real
    assert!(!dir.path().join("user").join("apps").join("app-b").exists());
}
