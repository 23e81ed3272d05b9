//! Chromium-backed pages using chromiumoxide.
//!
//! Each `open` gets its own browser connection: a freshly launched local
//! Chromium, or a new tab on a remote one when an endpoint is configured.
//! Request interception runs on a separate task for the life of the page.
//! Tasks and the profile directory are released on drop, so an `open` or a
//! page abandoned at the deadline leaves nothing behind.

use super::block::{BlockPolicy, Decision, ResourceKind};
use super::{stealth, BrowserError, BrowserLauncher, PageSession};
use crate::config::{BrowserEndpoint, Config};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::page::Page;
use chromiumoxide::Handler;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Paused requests answered in parallel per page.
const INTERCEPT_CONCURRENCY: usize = 32;

/// Timeout for the remote `/json/version` lookup.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. ~/.katsini/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".katsini/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".katsini/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".katsini/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".katsini/chromium/chrome-linux64/chrome"),
                home.join(".katsini/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

impl From<&ResourceType> for ResourceKind {
    fn from(kind: &ResourceType) -> Self {
        match kind {
            ResourceType::Document => ResourceKind::Document,
            ResourceType::Script => ResourceKind::Script,
            ResourceType::Stylesheet => ResourceKind::Stylesheet,
            ResourceType::Image => ResourceKind::Image,
            ResourceType::Font => ResourceKind::Font,
            ResourceType::Media => ResourceKind::Media,
            ResourceType::Manifest => ResourceKind::Manifest,
            ResourceType::Xhr => ResourceKind::Xhr,
            ResourceType::Fetch => ResourceKind::Fetch,
            ResourceType::Other => ResourceKind::Other,
            _ => ResourceKind::Unlisted,
        }
    }
}

/// Opens Chromium pages, locally or over a remote DevTools endpoint.
pub struct ChromiumLauncher {
    endpoint: Option<BrowserEndpoint>,
    chromium_path: Option<PathBuf>,
    http: reqwest::Client,
    active_count: Arc<AtomicUsize>,
    launches: AtomicU64,
}

impl ChromiumLauncher {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DISCOVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: config.browser_endpoint.clone(),
            chromium_path: config.chromium_path.clone(),
            http,
            active_count: Arc::new(AtomicUsize::new(0)),
            launches: AtomicU64::new(0),
        }
    }

    /// Human-readable description of where pages will be opened.
    pub fn describe(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("remote browser at {}", endpoint.http_url()),
            None => match find_chromium(self.chromium_path.as_deref()) {
                Some(path) => format!("local Chromium at {}", path.display()),
                None => "local Chromium (not found)".to_string(),
            },
        }
    }

    /// Resolve the websocket debugger URL and connect.
    async fn connect_remote(
        &self,
        endpoint: &BrowserEndpoint,
    ) -> Result<(Browser, Handler), BrowserError> {
        let version_url = format!("{}/json/version", endpoint.http_url());
        debug!("discovering DevTools endpoint via {version_url}");

        let resp: Value = self
            .http
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to reach {version_url}: {e}")))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("bad /json/version response: {e}")))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("no webSocketDebuggerUrl in response".into()))?;

        info!("connecting to remote browser at {ws_url}");
        Browser::connect(ws_url)
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to connect to remote browser: {e}")))
    }

    /// Launch a headless Chromium with its own throwaway profile.
    async fn launch_local(&self) -> Result<(Browser, Handler, ProfileDir), BrowserError> {
        let chrome_path = find_chromium(self.chromium_path.as_deref()).ok_or_else(|| {
            BrowserError::Launch(
                "Chromium not found; set KATSINI_CHROMIUM_PATH or CHROME_HOST".into(),
            )
        })?;

        let profile = ProfileDir(std::env::temp_dir().join(format!(
            "katsini-{}-{}",
            std::process::id(),
            self.launches.fetch_add(1, Ordering::Relaxed)
        )));

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&profile.0);
        for arg in stealth::LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        let config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to launch Chromium: {e}")))?;

        Ok((browser, handler, profile))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn open(&self, policy: BlockPolicy) -> Result<Box<dyn PageSession>, BrowserError> {
        let (browser, handler, profile) = match &self.endpoint {
            Some(endpoint) => {
                let (browser, handler) = self.connect_remote(endpoint).await?;
                (browser, handler, None)
            }
            None => {
                let (browser, handler, profile) = self.launch_local().await?;
                (browser, handler, Some(profile))
            }
        };

        // Must own the handler and profile before the next await: the
        // deadline may drop this future at any await point.
        let connection = Connection {
            handler_task: AbortOnDrop(tokio::spawn(drive_handler(handler))),
            browser,
            profile,
        };

        let page = connection
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to create new page: {e}")))?;

        self.active_count.fetch_add(1, Ordering::Relaxed);
        let mut session = ChromiumPage {
            page,
            interceptor: None,
            connection,
            active_count: Arc::clone(&self.active_count),
        };

        if let Err(e) = session.install(policy).await {
            let _ = Box::new(session).close().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }

    fn active_sessions(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// Pump the CDP connection until it closes.
async fn drive_handler(mut handler: Handler) {
    while let Some(event) = handler.next().await {
        if event.is_err() {
            break;
        }
    }
}

/// Answer paused requests until the page goes away.
fn spawn_interceptor<S>(page: Page, events: S, policy: BlockPolicy) -> AbortOnDrop
where
    S: Stream<Item = Arc<EventRequestPaused>> + Send + 'static,
{
    AbortOnDrop(tokio::spawn(async move {
        let page = &page;
        let policy = &policy;
        events
            .for_each_concurrent(INTERCEPT_CONCURRENCY, |event| async move {
                answer_paused_request(page, policy, &event).await;
            })
            .await;
    }))
}

async fn answer_paused_request(page: &Page, policy: &BlockPolicy, event: &EventRequestPaused) {
    let kind = ResourceKind::from(&event.resource_type);
    let decision = policy.classify(kind);
    trace!(?kind, ?decision, url = %event.request.url, "paused request");

    let outcome = match decision {
        Decision::Deny => page
            .execute(FailRequestParams::new(
                event.request_id.clone(),
                ErrorReason::BlockedByClient,
            ))
            .await
            .map(|_| ()),
        Decision::Allow => page
            .execute(ContinueRequestParams::new(event.request_id.clone()))
            .await
            .map(|_| ()),
    };

    if let Err(e) = outcome {
        debug!("failed to answer paused request ({decision:?}): {e}");
    }
}

/// A spawned task that is aborted when this handle is dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Profile directory of a local launch, removed when dropped.
struct ProfileDir(PathBuf);

impl Drop for ProfileDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.0) {
            Ok(()) => debug!("removed profile {}", self.0.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove profile {}: {e}", self.0.display()),
        }
    }
}

/// The browser side of one page. Fields drop in order: the CDP handler
/// stops, the browser is released, then the profile is removed.
struct Connection {
    handler_task: AbortOnDrop,
    browser: Browser,
    /// Set for locally launched browsers.
    profile: Option<ProfileDir>,
}

/// A single Chromium page and the connection it lives on.
pub struct ChromiumPage {
    page: Page,
    interceptor: Option<AbortOnDrop>,
    connection: Connection,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumPage {
    fn is_local(&self) -> bool {
        self.connection.profile.is_some()
    }

    /// Stealth (local only), the interceptor, then `Fetch.enable`.
    async fn install(&mut self, policy: BlockPolicy) -> Result<(), BrowserError> {
        if self.is_local() {
            stealth::apply(&self.page).await?;
        }

        let events = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to subscribe to requests: {e}")))?;
        self.interceptor = Some(spawn_interceptor(self.page.clone(), events, policy));

        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| BrowserError::Launch(format!("failed to enable interception: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Eval(e.to_string()))?;

        // `undefined` has no value; treat it like `null`.
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn close(mut self: Box<Self>) -> Result<(), BrowserError> {
        self.interceptor = None;

        if let Err(e) = self.page.clone().close().await {
            debug!("page close failed: {e}");
        }

        if self.is_local() {
            if let Err(e) = self.connection.browser.close().await {
                debug!("browser close failed: {e}");
            }
            let _ = self.connection.browser.wait().await;
        }

        if let Some(profile) = self.connection.profile.take() {
            let _ = tokio::task::spawn_blocking(move || drop(profile)).await;
        }
        Ok(())
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::session::{BoundedSession, Deadline};
    use crate::renderer::Locator;

    #[test]
    fn test_resource_kind_mapping() {
        assert_eq!(ResourceKind::from(&ResourceType::Script), ResourceKind::Script);
        assert_eq!(
            ResourceKind::from(&ResourceType::Stylesheet),
            ResourceKind::Stylesheet
        );
        assert_eq!(ResourceKind::from(&ResourceType::Other), ResourceKind::Other);
        assert_eq!(
            ResourceKind::from(&ResourceType::Ping),
            ResourceKind::Unlisted
        );
    }

    #[test]
    fn test_describe_remote() {
        let config = Config::default().with_browser_endpoint(Some(BrowserEndpoint {
            host: "chrome".into(),
            port: 9222,
        }));
        let launcher = ChromiumLauncher::new(&config);
        assert_eq!(launcher.describe(), "remote browser at http://chrome:9222");
        assert_eq!(launcher.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_open_releases_task_and_profile() {
        let dir = std::env::temp_dir().join(format!("katsini-test-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("Default")).unwrap();
        let (alive, stopped) = tokio::sync::oneshot::channel::<()>();

        let profile_dir = dir.clone();
        let result = Deadline::after(Duration::from_millis(50))
            .bound(async move {
                let _profile = ProfileDir(profile_dir);
                let _handler = AbortOnDrop(tokio::spawn(async move {
                    let _alive = alive;
                    std::future::pending::<()>().await;
                }));
                std::future::pending::<Result<(), BrowserError>>().await
            })
            .await;

        assert_eq!(result, Err(BrowserError::Timeout));
        assert!(!dir.exists());
        assert!(stopped.await.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_read() {
        let launcher = ChromiumLauncher::new(&Config::default());
        let mut session = BoundedSession::open(
            &launcher,
            BlockPolicy::common_and_stylesheets(),
            Deadline::after(Duration::from_secs(20)),
        )
        .await
        .expect("failed to open session");
        assert_eq!(launcher.active_sessions(), 1);

        session
            .navigate("data:text/html,<h1>Hello</h1><p class='x'>World</p><img src='https://example.com/a.png'>")
            .await
            .expect("navigation failed");

        let heading = Locator::Css("h1");
        session.wait_visible(&heading).await.expect("wait failed");
        assert_eq!(session.read_text(&heading).await.unwrap(), "Hello");
        assert_eq!(
            session.read_text(&Locator::XPath("//p[@class='x']")).await.unwrap(),
            "World"
        );
        assert_eq!(
            session.read_attribute(&Locator::Css("p"), "class").await.unwrap(),
            "x"
        );
        assert_eq!(
            session
                .evaluate(
                    "(() => { const img = document.querySelector('img'); \
                     return !!img && img.complete && img.naturalWidth === 0; })()"
                )
                .await
                .unwrap(),
            Value::Bool(true),
            "image request should have been failed by the interceptor"
        );

        session.close().await;
        assert_eq!(launcher.active_sessions(), 0);
    }
}
