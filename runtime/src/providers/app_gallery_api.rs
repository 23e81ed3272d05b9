//! Huawei AppGallery Connect publishing API, used as the scrape fallback.
//!
//! Two requests per lookup: a client-credentials token exchange, then one
//! bearer-authenticated app-info call. Neither is retried.

use super::{app_gallery, Acquire};
use crate::acquisition::http_client::HttpClient;
use crate::app::App;
use crate::config::{ClientCredentials, Config};
use crate::date::SourceFormat;
use crate::error::{KatsiniError, KatsiniResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Token exchange request body.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    ret: Option<ApiStatus>,
}

/// The `ret` envelope carried by every Connect response.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    code: i64,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppInfoResponse {
    #[serde(default)]
    ret: Option<ApiStatus>,
    #[serde(default)]
    app_info: AppInfo,
    #[serde(default)]
    languages: Vec<LanguageInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppInfo {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    package_name: Option<String>,
    #[serde(default)]
    version_number: String,
    #[serde(default)]
    update_time: String,
    #[serde(default)]
    developer_name_en: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageInfo {
    #[serde(default)]
    app_name: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// AppGallery Connect API client.
pub struct AppGalleryApi {
    config: Arc<Config>,
    http: HttpClient,
}

impl AppGalleryApi {
    pub fn new(config: Arc<Config>, http: HttpClient) -> Self {
        Self { config, http }
    }

    pub async fn lookup(&self, app_id: &str) -> KatsiniResult<App> {
        let credentials = self
            .config
            .appgallery_credentials
            .as_ref()
            .ok_or_else(|| KatsiniError::AuthFailed("no client credentials configured".into()))?;

        info!(app_id, "fetching Huawei AppGallery app data via Connect API");
        let token = self.fetch_token(credentials).await?;
        let info = self.fetch_app_info(&token, credentials, app_id).await?;

        let title = present(info.app_info.app_name)
            .or_else(|| {
                info.languages
                    .into_iter()
                    .find_map(|lang| present(lang.app_name))
            })
            .ok_or(KatsiniError::MissingField("title"))?;

        let app = App {
            app_id: app_id.to_string(),
            bundle_id: present(info.app_info.package_name).unwrap_or_else(|| app_id.to_string()),
            url: app_gallery::page_url(&self.config.endpoints.app_gallery, app_id)?,
            title,
            version: info.app_info.version_number,
            updated: SourceFormat::AppGalleryApi.normalize(&info.app_info.update_time)?,
            developer: present(info.app_info.developer_name_en).unwrap_or_default(),
        };

        if let Some(field) = app.first_missing(&["bundleId", "url", "title", "version", "updated"]) {
            return Err(KatsiniError::MissingField(field));
        }
        Ok(app)
    }

    /// Exchange client credentials for a bearer token.
    async fn fetch_token(&self, credentials: &ClientCredentials) -> KatsiniResult<String> {
        let body = TokenRequest {
            grant_type: "client_credentials",
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
        };
        let resp = self
            .http
            .post_json(&self.config.endpoints.appgallery_token, &body)
            .await?;

        if !resp.is_success() {
            return Err(KatsiniError::AuthFailed(format!(
                "token endpoint returned status {}",
                resp.status
            )));
        }

        let token: TokenResponse = resp.json()?;
        if let Some(ret) = token.ret.filter(|r| r.code != 0) {
            return Err(KatsiniError::AuthFailed(format!("{} ({})", ret.msg, ret.code)));
        }
        if token.access_token.is_empty() {
            return Err(KatsiniError::AuthFailed("empty access token".into()));
        }
        debug!("obtained AppGallery Connect token");
        Ok(token.access_token)
    }

    async fn fetch_app_info(
        &self,
        token: &str,
        credentials: &ClientCredentials,
        app_id: &str,
    ) -> KatsiniResult<AppInfoResponse> {
        let url = format!(
            "{}/api/publish/v2/app-info",
            self.config.endpoints.appgallery_api.trim_end_matches('/')
        );
        let bearer = format!("Bearer {token}");
        let resp = self
            .http
            .get(
                &url,
                &[("appId", app_id)],
                &[
                    ("Authorization", bearer.as_str()),
                    ("client_id", credentials.client_id.as_str()),
                ],
            )
            .await?;

        if !resp.is_success() {
            return Err(KatsiniError::Upstream {
                code: i64::from(resp.status),
                message: format!("app-info returned status {}", resp.status),
            });
        }

        let info: AppInfoResponse = resp.json()?;
        if let Some(ret) = info.ret.as_ref().filter(|r| r.code != 0) {
            return Err(KatsiniError::Upstream {
                code: ret.code,
                message: ret.msg.clone(),
            });
        }
        Ok(info)
    }
}

#[async_trait]
impl Acquire for AppGalleryApi {
    fn strategy(&self) -> &'static str {
        "api"
    }

    async fn acquire(&self, app_id: &str) -> KatsiniResult<App> {
        self.lookup(app_id).await
    }
}
