//! Huawei AppGallery: scraped from the app page.

use super::extract::{ElementHeightCheck, NotFoundCheck, PageExtractor, PageRecipe};
use super::{build_url, Acquire};
use crate::app::App;
use crate::config::Config;
use crate::date::SourceFormat;
use crate::error::KatsiniResult;
use crate::renderer::block::BlockPolicy;
use crate::renderer::session::{BoundedSession, Deadline};
use crate::renderer::{BrowserError, BrowserLauncher, Locator};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const HOME_CARD: Locator = Locator::Css(r#"div[class="horizonhomecard"]"#);
const CONTAINER: Locator = Locator::Css(r#"div[class="componentContainer"]"#);
const TITLE: Locator = Locator::Css("div.center_info > div.title");
const VERSION: Locator =
    Locator::XPath(r#"//div[contains(text(), "Version")]/following-sibling::div[1]"#);
const UPDATED: Locator =
    Locator::XPath(r#"//div[contains(text(), "Updated")]/following-sibling::div[1]"#);
const DEVELOPER: Locator =
    Locator::XPath(r#"//div[contains(text(), "Developer")]/following-sibling::div[1]"#);
const PACKAGE: Locator = Locator::Css("div[package]");

/// An unknown id renders an empty shell whose component container stays
/// short.
const MIN_CONTAINER_HEIGHT: u32 = 500;

/// Canonical app page URL.
pub fn page_url(base: &str, app_id: &str) -> KatsiniResult<String> {
    build_url(base, &format!("/app/C{app_id}"), &[])
}

/// The app page recipe.
pub struct AppGalleryPage {
    check: ElementHeightCheck,
}

impl Default for AppGalleryPage {
    fn default() -> Self {
        Self {
            check: ElementHeightCheck {
                ready: &[HOME_CARD, CONTAINER],
                selector: ".componentContainer",
                min_height: MIN_CONTAINER_HEIGHT,
            },
        }
    }
}

#[async_trait]
impl PageRecipe for AppGalleryPage {
    fn store(&self) -> &'static str {
        "appgallery"
    }

    fn block_policy(&self) -> BlockPolicy {
        BlockPolicy::common()
    }

    fn not_found_check(&self) -> &dyn NotFoundCheck {
        &self.check
    }

    fn date_format(&self) -> SourceFormat {
        SourceFormat::AppGalleryPage
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["appId", "bundleId", "url", "title", "version", "updated", "developer"]
    }

    async fn read_fields(&self, session: &BoundedSession, app: &mut App) -> Result<(), BrowserError> {
        session.wait_visible(&TITLE).await?;
        app.title = session.read_text(&TITLE).await?;
        app.version = session.read_text(&VERSION).await?;
        app.updated = session.read_text(&UPDATED).await?;
        app.developer = session.read_text(&DEVELOPER).await?;
        app.bundle_id = session.read_attribute(&PACKAGE, "package").await?;
        Ok(())
    }
}

/// AppGallery scrape path.
pub struct AppGalleryScraper {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    page: AppGalleryPage,
}

impl AppGalleryScraper {
    pub fn new(config: Arc<Config>, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            launcher,
            page: AppGalleryPage::default(),
        }
    }

    pub async fn lookup(&self, app_id: &str) -> KatsiniResult<App> {
        let deadline = Deadline::after(self.config.deadline);
        info!(app_id, "fetching Huawei AppGallery app data");

        let url = page_url(&self.config.endpoints.app_gallery, app_id)?;
        let seed = App {
            app_id: app_id.to_string(),
            url: url.clone(),
            ..Default::default()
        };
        PageExtractor::new(self.launcher.as_ref())
            .extract(&self.page, &url, seed, deadline)
            .await
    }
}

#[async_trait]
impl Acquire for AppGalleryScraper {
    fn strategy(&self) -> &'static str {
        "scrape"
    }

    async fn acquire(&self, app_id: &str) -> KatsiniResult<App> {
        self.lookup(app_id).await
    }
}
