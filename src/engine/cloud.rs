// Flowferry Engine — HTTP implementation of the platform seam.
//
// Wire protocol notes (observed from the desktop client):
//   • Inventory listing is paged (30 per page, sort key "4" = update time).
//   • A transfer is not a single endpoint: per flow, the client assigns an
//     OSS upload slot for the `.bot` archive and one for the manifest,
//     PUTs both, then registers the app under the target account.
//   • Deletion moves a flow into the recycle bin; HTTP 401 anywhere means
//     the session expired.

use async_trait::async_trait;
use chrono::Local;
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::atoms::types::{
    CloudFlow, DeleteResult, FlowDescriptor, LocalFlow, MigrationBatch, MigrationResult,
    SessionToken, TokenPurpose,
};
use crate::engine::auth;
use crate::engine::http::{bearer, build_client};
use crate::engine::package;
use crate::engine::platform::{PlatformApi, PlatformError};

/// API gateway for flow inventory, transfer and deletion.
pub const API_BASE: &str = "https://api.winrobot360.com";

// ── Response envelopes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: Option<bool>,
    code: Option<u32>,
    data: Option<T>,
    page: Option<PageInfo>,
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppDetail {
    bot_read_url: Option<String>,
    package_bot_url: Option<String>,
    package_schema_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSlot {
    upload_url: String,
    file_key_md5: String,
}

// ── Client ─────────────────────────────────────────────────────────────────

/// Production platform client. All remote traffic flows through here.
pub struct HttpPlatform {
    client: reqwest::Client,
    auth_url: String,
    api_base: String,
}

impl HttpPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_client()?,
            auth_url: auth::AUTH_URL.to_string(),
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at alternate endpoints (staging, test harness).
    pub fn with_endpoints(auth_url: impl Into<String>, api_base: impl Into<String>) -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_client()?,
            auth_url: auth_url.into(),
            api_base: api_base.into(),
        })
    }

    fn transport(e: reqwest::Error) -> PlatformError {
        PlatformError::Transport(e.to_string())
    }

    /// Map a response that may signal expiry before decoding its body.
    fn check_session(status: reqwest::StatusCode) -> Result<(), PlatformError> {
        if status.as_u16() == 401 {
            Err(PlatformError::SessionExpired)
        } else {
            Ok(())
        }
    }

    // ── Wire operations ────────────────────────────────────────────────────

    async fn list_page(
        &self,
        token: &SessionToken,
        page: u32,
    ) -> Result<(Vec<CloudFlow>, u32), PlatformError> {
        let payload = serde_json::json!({
            "groupId": null,
            "name": "",
            "pageType": 1,
            "pageDTO": { "page": page, "size": 30 },
            "sortBy": "4",
        });

        let response = self
            .client
            .post(format!("{}/api/client/app/develop/list", self.api_base))
            .header("Authorization", bearer(&token.token))
            .header("Accept-Language", "zh-cn")
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check_session(response.status())?;

        let result: ApiResponse<Vec<CloudFlow>> = response.json().await.map_err(Self::transport)?;
        if !result.success.unwrap_or(false) {
            return Err(PlatformError::Rejected(
                result.msg.unwrap_or_else(|| "获取流程列表失败".to_string()),
            ));
        }

        let pages = result.page.map(|p| p.pages).unwrap_or(1);
        Ok((result.data.unwrap_or_default(), pages))
    }

    async fn app_detail(
        &self,
        token: &SessionToken,
        app_id: &str,
    ) -> Result<AppDetail, PlatformError> {
        let response = self
            .client
            .get(format!("{}/api/client/app/develop/app/detail", self.api_base))
            .header("Authorization", bearer(&token.token))
            .query(&[("appId", app_id), ("checkAppRecycle", "True")])
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check_session(response.status())?;

        let result: ApiResponse<AppDetail> = response.json().await.map_err(Self::transport)?;
        result
            .data
            .ok_or_else(|| PlatformError::Rejected("获取应用详情失败".to_string()))
    }

    async fn assign_upload_slot(
        &self,
        token: &SessionToken,
        app_id: &str,
        is_bot: bool,
    ) -> Result<UploadSlot, PlatformError> {
        let payload = serde_json::json!({
            "appId": app_id,
            "appType": "app",
            "version": "",
            "isBot": if is_bot { "true" } else { "false" },
        });

        let response = self
            .client
            .post(format!("{}/api/client/app/file/assignUploadUrl", self.api_base))
            .header("Authorization", bearer(&token.token))
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check_session(response.status())?;

        let result: ApiResponse<UploadSlot> = response.json().await.map_err(Self::transport)?;
        result
            .data
            .ok_or_else(|| PlatformError::Rejected("获取上传地址失败".to_string()))
    }

    async fn download_package(&self, url: &str) -> Result<Vec<u8>, PlatformError> {
        let response = self.client.get(url).send().await.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(PlatformError::Api {
                status: response.status().as_u16(),
                message: "下载 package.bot 失败".to_string(),
            });
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(Self::transport)
    }

    /// PUT to a pre-signed OSS URL. No Content-Type — the OSS signature
    /// does not cover one and the store rejects unexpected headers.
    async fn upload_to_oss(&self, url: &str, data: Vec<u8>) -> Result<(), PlatformError> {
        let response = self
            .client
            .put(url)
            .header("Accept", "*/*")
            .header("Accept-Language", "zh-cn")
            .body(data)
            .send()
            .await
            .map_err(Self::transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PlatformError::Api {
                status: response.status().as_u16(),
                message: "上传失败".to_string(),
            })
        }
    }

    /// Register the uploaded package as a new app under the session account.
    async fn create_app(
        &self,
        token: &SessionToken,
        app_id: &str,
        manifest: &serde_json::Value,
        package_md5: &str,
    ) -> Result<(), PlatformError> {
        let flow_count = manifest
            .get("flows")
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0);

        let payload = serde_json::json!({
            "appId": app_id,
            "appPackage": {
                "activities": [],
                "appFlowParamList": [],
                "appIcon": manifest.get("icon").and_then(|v| v.as_str()).unwrap_or(""),
                "appType": manifest.get("robot_type").and_then(|v| v.as_str()).unwrap_or("app"),
                "customItems": manifest.get("customItems").cloned().unwrap_or_else(|| serde_json::json!({
                    "gifUrl": "",
                    "imageName": "",
                    "imageUrl": "",
                    "uiaType": "PC",
                    "videoUrl": ""
                })),
                "description": manifest.get("description").and_then(|v| v.as_str()).unwrap_or(""),
                "elementLibraryCodes": [],
                "enableViewSource": "false",
                "externalDependencies": manifest.get("external_dependencies").cloned().unwrap_or_else(|| serde_json::json!([])),
                "instruction": manifest.get("instruction").and_then(|v| v.as_str()).unwrap_or(""),
                "internalDependencies": manifest.get("internaldependencies").cloned().unwrap_or_else(|| serde_json::json!([])),
                "internalautodependencies": manifest.get("internalautodependencies").cloned().unwrap_or_else(|| serde_json::json!([])),
                "ipaasDependencies": manifest.get("ipaasDependencies").cloned().unwrap_or_else(|| serde_json::json!([])),
                "name": manifest.get("name").and_then(|v| v.as_str()).unwrap_or("未命名"),
                "packageCode": "",
                "statistics": {
                    "blockCount": flow_count,
                    "flowCount": flow_count,
                    "magicBlockCount": 0,
                    "sourceLineCount": 0
                },
                "uiTags": "",
                "uiaType": manifest.get("uia_type").and_then(|v| v.as_str()).unwrap_or("PC"),
                "videoUrl": manifest.get("videoName").and_then(|v| v.as_str()).unwrap_or("")
            },
            "elementLibraryStatus": 0,
            "groupId": "",
            "packageMd5": package_md5,
        });

        let response = self
            .client
            .post(format!("{}/api/client/app/develop/create", self.api_base))
            .header("Authorization", bearer(&token.token))
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check_session(response.status())?;

        let result: ApiResponse<serde_json::Value> =
            response.json().await.map_err(Self::transport)?;
        if result.success.unwrap_or(false) || result.code == Some(200) {
            Ok(())
        } else {
            Err(PlatformError::Rejected(
                result.msg.unwrap_or_else(|| "创建应用失败".to_string()),
            ))
        }
    }

    async fn recycle_flow(&self, token: &SessionToken, app_id: &str) -> Result<(), PlatformError> {
        let payload = serde_json::json!({ "appId": app_id });

        let response = self
            .client
            .post(format!("{}/api/client/recycle/recycle", self.api_base))
            .header("Authorization", bearer(&token.token))
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check_session(response.status())?;

        let result: ApiResponse<serde_json::Value> =
            response.json().await.map_err(Self::transport)?;
        if result.success.unwrap_or(false) || result.code == Some(200) {
            Ok(())
        } else {
            Err(PlatformError::Rejected(
                result.msg.unwrap_or_else(|| "删除流程失败".to_string()),
            ))
        }
    }

    // ── Per-flow transfer pipeline ─────────────────────────────────────────

    /// Upload a rewritten package under a fresh app id and register it.
    /// Shared tail of both transfer paths.
    async fn publish_package(
        &self,
        target: &SessionToken,
        app_id: &str,
        bot_data: Vec<u8>,
        manifest: &serde_json::Value,
    ) -> Result<(), PlatformError> {
        let bot_slot = self.assign_upload_slot(target, app_id, true).await?;
        self.upload_to_oss(&bot_slot.upload_url, bot_data).await?;

        let json_slot = self.assign_upload_slot(target, app_id, false).await?;
        let json_content = serde_json::to_string_pretty(manifest)
            .map_err(|e| PlatformError::Rejected(format!("manifest serialize failed: {}", e)))?;
        self.upload_to_oss(&json_slot.upload_url, json_content.into_bytes())
            .await?;

        self.create_app(target, app_id, manifest, &json_slot.file_key_md5)
            .await
    }

    /// Copy a locally cached flow into the target account.
    /// Returns the display name the copy was created under.
    async fn transfer_local(
        &self,
        flow: &LocalFlow,
        target: &SessionToken,
    ) -> Result<String, PlatformError> {
        let new_app_id = Uuid::new_v4().to_string();
        let new_name = stamped_name(&flow.name);

        let mut manifest = flow.package_data.clone();
        package::rewrite_manifest(&mut manifest, &new_app_id, &new_name);

        let bot_data = package::build_from_dir(std::path::Path::new(&flow.robot_path), &manifest)?;
        self.publish_package(target, &new_app_id, bot_data, &manifest)
            .await?;

        Ok(new_name)
    }

    /// Copy a cloud-hosted flow from the source account into the target
    /// account. Ownership is proven under the source session (detail +
    /// download); the write happens under the target session.
    async fn transfer_cloud(
        &self,
        flow: &CloudFlow,
        source: &SessionToken,
        target: &SessionToken,
    ) -> Result<String, PlatformError> {
        let detail = self.app_detail(source, &flow.app_id).await?;
        let bot_url = detail
            .bot_read_url
            .or(detail.package_bot_url)
            .or(detail.package_schema_url)
            .ok_or_else(|| PlatformError::Rejected("找不到下载地址".to_string()))?;

        let bot_data = self.download_package(&bot_url).await?;
        let mut manifest = package::extract_manifest(&bot_data)?;

        let new_app_id = Uuid::new_v4().to_string();
        let new_name = stamped_name(&flow.app_name);
        package::rewrite_manifest(&mut manifest, &new_app_id, &new_name);

        let new_bot_data = package::repack(&bot_data, &manifest)?;
        self.publish_package(target, &new_app_id, new_bot_data, &manifest)
            .await?;

        Ok(new_name)
    }
}

/// Display name stamped onto a transferred copy.
fn stamped_name(original: &str) -> String {
    let timestamp = Local::now().format("%Y年%m月%d日 %H时%M分%S秒");
    format!("{}_云迁_接收于{}", original, timestamp)
}

// ── PlatformApi implementation ─────────────────────────────────────────────

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        purpose: TokenPurpose,
    ) -> Result<SessionToken, PlatformError> {
        auth::login(&self.client, &self.auth_url, username, password, purpose).await
    }

    async fn list_flows(&self, token: &SessionToken) -> Result<Vec<CloudFlow>, PlatformError> {
        let mut all_flows = Vec::new();
        let mut page = 1u32;
        let mut total_pages = 1u32;

        while page <= total_pages {
            let (flows, pages) = self.list_page(token, page).await?;
            all_flows.extend(flows);
            total_pages = pages;
            page += 1;
        }

        info!("[cloud] Inventory: {} flows", all_flows.len());
        Ok(all_flows)
    }

    async fn transfer_flows(
        &self,
        batch: &MigrationBatch,
    ) -> Result<Vec<MigrationResult>, PlatformError> {
        let mut results = Vec::with_capacity(batch.flows.len());

        for descriptor in &batch.flows {
            let name = descriptor.name().to_string();
            let outcome = match descriptor {
                FlowDescriptor::Local(flow) => {
                    self.transfer_local(flow, &batch.target_token).await
                }
                FlowDescriptor::Cloud(flow) => {
                    // Precondition enforced by the orchestrator; a cloud
                    // batch always carries a source token here.
                    let source = batch.source_token.as_ref().ok_or_else(|| {
                        PlatformError::Rejected("cloud batch without source session".to_string())
                    })?;
                    self.transfer_cloud(flow, source, &batch.target_token).await
                }
            };

            results.push(match outcome {
                Ok(new_name) => MigrationResult {
                    success: true,
                    name,
                    message: format!("已迁移为: {}", new_name),
                },
                Err(e) => {
                    warn!("[cloud] Transfer failed for {}: {}", name, e);
                    MigrationResult {
                        success: false,
                        name,
                        message: e.to_string(),
                    }
                }
            });
        }

        debug_assert_eq!(results.len(), batch.flows.len());
        Ok(results)
    }

    async fn delete_flows(
        &self,
        token: &SessionToken,
        flows: &[CloudFlow],
    ) -> Result<Vec<DeleteResult>, PlatformError> {
        let mut results = Vec::with_capacity(flows.len());

        for flow in flows {
            let result = match self.recycle_flow(token, &flow.app_id).await {
                Ok(()) => DeleteResult {
                    success: true,
                    name: flow.app_name.clone(),
                    message: "已移入回收站".to_string(),
                    session_expired: false,
                },
                // Expiry mid-batch is reported on the item, not the call;
                // remaining items still get their attempt.
                Err(PlatformError::SessionExpired) => DeleteResult {
                    success: false,
                    name: flow.app_name.clone(),
                    message: "会话已过期，请重新登录".to_string(),
                    session_expired: true,
                },
                Err(e) => DeleteResult {
                    success: false,
                    name: flow.app_name.clone(),
                    message: e.to_string(),
                    session_expired: false,
                },
            };
            results.push(result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_name_keeps_original_prefix() {
        let name = stamped_name("发票下载");
        assert!(name.starts_with("发票下载_云迁_接收于"));
    }
}
