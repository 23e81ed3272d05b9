//! Apple App Store via the public iTunes lookup API.

use crate::acquisition::http_client::HttpClient;
use crate::app::App;
use crate::config::Config;
use crate::date::SourceFormat;
use crate::error::{KatsiniError, KatsiniResult};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_COUNTRY: &str = "us";

/// Lookup parameters for the App Store. At least one identifier is set.
#[derive(Debug, Clone, Default)]
pub struct AppStoreQuery {
    /// Numeric track id.
    pub app_id: Option<String>,
    pub bundle_id: Option<String>,
    pub country: Option<String>,
}

impl AppStoreQuery {
    pub fn country(&self) -> &str {
        present(&self.country).unwrap_or(DEFAULT_COUNTRY)
    }

    /// The identifier to query by; the bundle id wins when both are set.
    pub fn key(&self) -> Option<(&'static str, &str)> {
        present(&self.bundle_id)
            .map(|b| ("bundleId", b))
            .or_else(|| present(&self.app_id).map(|id| ("id", id)))
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    result_count: u32,
    #[serde(default)]
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResult {
    #[serde(default)]
    track_id: u64,
    #[serde(default)]
    bundle_id: String,
    #[serde(default)]
    track_view_url: String,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    current_version_release_date: String,
    #[serde(default)]
    artist_name: String,
}

/// iTunes lookup client.
pub struct AppStore {
    config: Arc<Config>,
    http: HttpClient,
}

impl AppStore {
    pub fn new(config: Arc<Config>, http: HttpClient) -> Self {
        Self { config, http }
    }

    pub async fn lookup(&self, query: &AppStoreQuery) -> KatsiniResult<App> {
        let (key, value) = query.key().ok_or_else(|| {
            KatsiniError::InvalidInput("Please provide an app appId or bundleId".into())
        })?;
        info!(key, value, country = query.country(), "fetching App Store app data");

        let url = format!("{}/lookup", self.config.endpoints.itunes.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url, &[(key, value), ("country", query.country())], &[])
            .await?;
        if !resp.is_success() {
            return Err(KatsiniError::AppNotFound);
        }

        let lookup: LookupResponse = resp.json()?;
        let result = match lookup.results.into_iter().next() {
            Some(r) if lookup.result_count > 0 => r,
            _ => return Err(KatsiniError::AppNotFound),
        };

        let app = App {
            app_id: if result.track_id == 0 {
                String::new()
            } else {
                result.track_id.to_string()
            },
            bundle_id: result.bundle_id,
            url: result.track_view_url,
            title: result.track_name,
            version: result.version,
            updated: SourceFormat::ITunes.normalize(&result.current_version_release_date)?,
            developer: result.artist_name,
        };
        if let Some(field) =
            app.first_missing(&["appId", "bundleId", "url", "title", "version", "updated", "developer"])
        {
            return Err(KatsiniError::MissingField(field));
        }
        Ok(app)
    }
}
