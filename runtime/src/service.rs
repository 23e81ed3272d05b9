//! The lookup facade used by the HTTP server and the CLI.

use crate::acquisition::http_client::HttpClient;
use crate::app::App;
use crate::config::Config;
use crate::error::{KatsiniError, KatsiniResult};
use crate::orchestrator::ScrapeThenApi;
use crate::providers::app_gallery::AppGalleryScraper;
use crate::providers::app_gallery_api::AppGalleryApi;
use crate::providers::app_store::{AppStore, AppStoreQuery};
use crate::providers::play_store::{PlayStore, PlayStoreQuery};
use crate::renderer::chromium::ChromiumLauncher;
use crate::renderer::BrowserLauncher;
use std::sync::Arc;
use tracing::info;

/// Validates identifiers and dispatches to the store providers.
pub struct Katsini {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    play_store: PlayStore,
    app_store: AppStore,
    app_gallery: AppGalleryScraper,
    app_gallery_api: AppGalleryApi,
}

impl Katsini {
    /// Build with a Chromium launcher derived from `config`.
    pub fn new(config: Config) -> Self {
        let launcher = ChromiumLauncher::new(&config);
        info!("pages will open in {}", launcher.describe());
        Self::with_launcher(config, Arc::new(launcher))
    }

    pub fn with_launcher(config: Config, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let config = Arc::new(config);
        let http = HttpClient::new(config.deadline);
        Self {
            play_store: PlayStore::new(Arc::clone(&config), Arc::clone(&launcher)),
            app_store: AppStore::new(Arc::clone(&config), http.clone()),
            app_gallery: AppGalleryScraper::new(Arc::clone(&config), Arc::clone(&launcher)),
            app_gallery_api: AppGalleryApi::new(Arc::clone(&config), http),
            config,
            launcher,
        }
    }

    /// Browser sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.launcher.active_sessions()
    }

    pub async fn play_store(&self, query: &PlayStoreQuery) -> KatsiniResult<App> {
        let bundle_id = query.bundle_id.trim();
        if bundle_id.is_empty() {
            return Err(KatsiniError::InvalidInput(
                "Please provide an app bundleId".into(),
            ));
        }
        let query = PlayStoreQuery {
            bundle_id: bundle_id.to_string(),
            ..query.clone()
        };
        self.play_store.lookup(&query).await
    }

    pub async fn app_store(&self, query: &AppStoreQuery) -> KatsiniResult<App> {
        if query.key().is_none() {
            return Err(KatsiniError::InvalidInput(
                "Please provide an app appId or bundleId".into(),
            ));
        }
        self.app_store.lookup(query).await
    }

    /// Scrape the AppGallery page, falling back to the Connect API when
    /// credentials are configured.
    pub async fn app_gallery(&self, app_id: &str) -> KatsiniResult<App> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return Err(KatsiniError::InvalidInput(
                "Please provide an app appId".into(),
            ));
        }
        ScrapeThenApi {
            scrape: &self.app_gallery,
            api: &self.app_gallery_api,
            fallback_enabled: self.config.appgallery_fallback_enabled(),
        }
        .run(app_id)
        .await
    }
}
