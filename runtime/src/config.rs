//! Process-wide configuration.
//!
//! Built once at start-up (environment first, CLI flags on top) and then
//! shared read-only as `Arc<Config>`. Nothing else in the crate reads the
//! environment.

use std::path::PathBuf;
use std::time::Duration;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default DevTools port of a remote browser.
pub const DEFAULT_CHROME_PORT: u16 = 9222;

/// A browser reachable over the DevTools protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEndpoint {
    pub host: String,
    pub port: u16,
}

impl BrowserEndpoint {
    /// HTTP base used to discover the websocket debugger URL.
    pub fn http_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// OAuth client credentials for the AppGallery Connect API.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl ClientCredentials {
    /// Both values must be present and non-empty, otherwise there are no
    /// credentials at all.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Option<Self> {
        let client_id = client_id.filter(|v| !v.trim().is_empty())?;
        let client_secret = client_secret.filter(|v| !v.trim().is_empty())?;
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

/// Base URLs of the upstream stores and APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub play_store: String,
    pub app_gallery: String,
    pub itunes: String,
    pub appgallery_token: String,
    pub appgallery_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            play_store: "https://play.google.com".to_string(),
            app_gallery: "https://appgallery.huawei.com".to_string(),
            itunes: "https://itunes.apple.com".to_string(),
            appgallery_token: "https://connect-api-dre.cloud.huawei.com/api/oauth2/v1/token"
                .to_string(),
            appgallery_api: "https://connect-api.cloud.huawei.com".to_string(),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote browser to connect to. `None` launches a local Chromium.
    pub browser_endpoint: Option<BrowserEndpoint>,
    /// Explicit Chromium binary for local launches.
    pub chromium_path: Option<PathBuf>,
    /// Enables the AppGallery API fallback when present.
    pub appgallery_credentials: Option<ClientCredentials>,
    /// Deadline applied to every lookup.
    pub deadline: Duration,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_endpoint: None,
            chromium_path: None,
            appgallery_credentials: None,
            deadline: DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// - `CHROME_HOST` / `CHROME_PORT`: remote browser (port defaults to 9222)
    /// - `KATSINI_CHROMIUM_PATH`: local Chromium binary
    /// - `HUAWEI_CLIENT_ID` / `HUAWEI_CLIENT_SECRET`: AppGallery fallback
    /// - `KATSINI_TIMEOUT_SECS`: per-call deadline
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by `from_env` and tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let browser_endpoint = get("CHROME_HOST").map(|host| BrowserEndpoint {
            host,
            port: get("CHROME_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_CHROME_PORT),
        });

        let deadline = get("KATSINI_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            browser_endpoint,
            chromium_path: get("KATSINI_CHROMIUM_PATH").map(PathBuf::from),
            appgallery_credentials: ClientCredentials::from_parts(
                get("HUAWEI_CLIENT_ID"),
                get("HUAWEI_CLIENT_SECRET"),
            ),
            deadline,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_browser_endpoint(mut self, endpoint: Option<BrowserEndpoint>) -> Self {
        self.browser_endpoint = endpoint;
        self
    }

    pub fn with_appgallery_credentials(mut self, credentials: Option<ClientCredentials>) -> Self {
        self.appgallery_credentials = credentials;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Whether the AppGallery scrape may fall back to the API.
    pub fn appgallery_fallback_enabled(&self) -> bool {
        self.appgallery_credentials.is_some()
    }
}
