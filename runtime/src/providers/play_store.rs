//! Google Play: scraped from the app details page.
//!
//! Version, update date and developer sit behind the "About this app"
//! (or "About this game") disclosure, which must be clicked open first.

use super::build_url;
use super::extract::{BodyTextCheck, NotFoundCheck, PageExtractor, PageRecipe};
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

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_COUNTRY: &str = "us";

const NOT_FOUND_TEXT: &str = "We're sorry, the requested URL was not found on this server.";

const ABOUT_BUTTON: Locator = Locator::Css(
    r#"button[aria-label="See more information on About this app"], button[aria-label="See more information on About this game"]"#,
);
const ABOUT_HEADING: Locator = Locator::XPath(
    r#"//div[contains(text(), "About this app") or contains(text(), "About this game")]"#,
);
const TITLE: Locator = Locator::XPath(
    r#"//div[contains(text(), "About this app") or contains(text(), "About this game")]/preceding-sibling::h5[1]"#,
);
const VERSION: Locator =
    Locator::XPath(r#"//div[contains(text(), "Version")]/following-sibling::div[1]"#);
const UPDATED: Locator =
    Locator::XPath(r#"//div[contains(text(), "Updated")]/following-sibling::div[1]"#);
const DEVELOPER: Locator =
    Locator::XPath(r#"//div[contains(text(), "Offered by")]/following-sibling::div[1]"#);

/// Lookup parameters for Google Play.
#[derive(Debug, Clone, Default)]
pub struct PlayStoreQuery {
    pub bundle_id: String,
    pub lang: Option<String>,
    pub country: Option<String>,
}

impl PlayStoreQuery {
    pub fn new(bundle_id: impl Into<String>) -> Self {
        Self {
            bundle_id: bundle_id.into(),
            ..Default::default()
        }
    }

    pub fn lang(&self) -> &str {
        non_empty(self.lang.as_deref()).unwrap_or(DEFAULT_LANG)
    }

    pub fn country(&self) -> &str {
        non_empty(self.country.as_deref()).unwrap_or(DEFAULT_COUNTRY)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Canonical details page URL.
pub fn page_url(base: &str, query: &PlayStoreQuery) -> KatsiniResult<String> {
    build_url(
        base,
        "/store/apps/details",
        &[
            ("id", query.bundle_id.as_str()),
            ("hl", query.lang()),
            ("gl", query.country()),
        ],
    )
}

/// The details page recipe.
pub struct PlayStorePage {
    check: BodyTextCheck,
}

impl Default for PlayStorePage {
    fn default() -> Self {
        Self {
            check: BodyTextCheck {
                needle: NOT_FOUND_TEXT,
            },
        }
    }
}

#[async_trait]
impl PageRecipe for PlayStorePage {
    fn store(&self) -> &'static str {
        "playstore"
    }

    fn block_policy(&self) -> BlockPolicy {
        BlockPolicy::common_and_stylesheets()
    }

    fn not_found_check(&self) -> &dyn NotFoundCheck {
        &self.check
    }

    fn date_format(&self) -> SourceFormat {
        SourceFormat::PlayStore
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["bundleId", "url", "title", "version", "updated", "developer"]
    }

    async fn read_fields(&self, session: &BoundedSession, app: &mut App) -> Result<(), BrowserError> {
        session.wait_visible(&ABOUT_BUTTON).await?;
        session.click(&ABOUT_BUTTON).await?;
        session.wait_visible(&ABOUT_HEADING).await?;

        app.title = session.read_text(&TITLE).await?;
        app.version = session.read_text(&VERSION).await?;
        app.updated = session.read_text(&UPDATED).await?;
        app.developer = session.read_text(&DEVELOPER).await?;
        Ok(())
    }
}

/// Google Play provider.
pub struct PlayStore {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    page: PlayStorePage,
}

impl PlayStore {
    pub fn new(config: Arc<Config>, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            launcher,
            page: PlayStorePage::default(),
        }
    }

    pub async fn lookup(&self, query: &PlayStoreQuery) -> KatsiniResult<App> {
        let deadline = Deadline::after(self.config.deadline);
        info!(
            bundle_id = %query.bundle_id,
            lang = query.lang(),
            country = query.country(),
            "fetching Google Play app data"
        );

        let url = page_url(&self.config.endpoints.play_store, query)?;
        let seed = App {
            bundle_id: query.bundle_id.clone(),
            url: url.clone(),
            ..Default::default()
        };
        PageExtractor::new(self.launcher.as_ref())
            .extract(&self.page, &url, seed, deadline)
            .await
    }
}
