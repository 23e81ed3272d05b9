//! The navigate / check / read sequence shared by browser-backed stores.
//!
//! A store describes its page with a [`PageRecipe`]: which resources to
//! block, how to tell a missing app apart, which controls to click and
//! which fields to read. [`PageExtractor`] runs the recipe against a fresh
//! page and maps browser failures onto [`KatsiniError`].

use crate::app::App;
use crate::date::SourceFormat;
use crate::error::{KatsiniError, KatsiniResult};
use crate::renderer::block::BlockPolicy;
use crate::renderer::session::{BoundedSession, Deadline};
use crate::renderer::{BrowserError, BrowserLauncher, Locator};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Decides from the rendered page whether the app does not exist.
#[async_trait]
pub trait NotFoundCheck: Send + Sync {
    async fn page_indicates_missing(&self, session: &BoundedSession) -> Result<bool, BrowserError>;
}

/// Missing when the page body contains a fixed message.
pub struct BodyTextCheck {
    pub needle: &'static str,
}

impl BodyTextCheck {
    pub fn script(&self) -> String {
        format!(
            "(() => !!document.body && document.body.innerText.includes({}))()",
            serde_json::to_string(self.needle).unwrap_or_default()
        )
    }
}

#[async_trait]
impl NotFoundCheck for BodyTextCheck {
    async fn page_indicates_missing(&self, session: &BoundedSession) -> Result<bool, BrowserError> {
        Ok(matches!(session.evaluate(&self.script()).await?, Value::Bool(true)))
    }
}

/// Missing when an element renders shorter than a threshold.
///
/// The threshold tracks the store's current layout and breaks silently when
/// the layout changes.
pub struct ElementHeightCheck {
    /// Waited for before measuring.
    pub ready: &'static [Locator],
    /// CSS selector of the measured element.
    pub selector: &'static str,
    pub min_height: u32,
}

impl ElementHeightCheck {
    pub fn script(&self) -> String {
        format!(
            "(() => {{ const el = document.querySelector({}); return !el || el.offsetHeight < {}; }})()",
            serde_json::to_string(self.selector).unwrap_or_default(),
            self.min_height
        )
    }
}

#[async_trait]
impl NotFoundCheck for ElementHeightCheck {
    async fn page_indicates_missing(&self, session: &BoundedSession) -> Result<bool, BrowserError> {
        for locator in self.ready {
            session.wait_visible(locator).await?;
        }
        Ok(matches!(session.evaluate(&self.script()).await?, Value::Bool(true)))
    }
}

/// How to scrape one store's app page.
#[async_trait]
pub trait PageRecipe: Send + Sync {
    /// Store name for logs.
    fn store(&self) -> &'static str;

    fn block_policy(&self) -> BlockPolicy;

    fn not_found_check(&self) -> &dyn NotFoundCheck;

    /// Format of the raw `updated` text.
    fn date_format(&self) -> SourceFormat;

    /// Fields that must be non-empty in the returned record.
    fn required_fields(&self) -> &'static [&'static str];

    /// Reveal the details and read every field into `app`. `updated` is
    /// stored raw; the extractor normalizes it.
    async fn read_fields(&self, session: &BoundedSession, app: &mut App) -> Result<(), BrowserError>;
}

/// Runs a [`PageRecipe`] against a fresh browser page.
pub struct PageExtractor<'a> {
    launcher: &'a dyn BrowserLauncher,
}

impl<'a> PageExtractor<'a> {
    pub fn new(launcher: &'a dyn BrowserLauncher) -> Self {
        Self { launcher }
    }

    /// Scrape `url` with `recipe`, starting from `seed` (fields the caller
    /// already knows, such as the identifier and URL).
    ///
    /// The page is closed before this returns, whatever the outcome.
    pub async fn extract(
        &self,
        recipe: &dyn PageRecipe,
        url: &str,
        seed: App,
        deadline: Deadline,
    ) -> KatsiniResult<App> {
        let mut session = BoundedSession::open(self.launcher, recipe.block_policy(), deadline)
            .await
            .map_err(session_error)?;

        let outcome = drive(recipe, &mut session, url, seed).await;
        session.close().await;

        let mut app = outcome?;
        app.updated = recipe.date_format().normalize(&app.updated)?;
        if let Some(field) = app.first_missing(recipe.required_fields()) {
            return Err(KatsiniError::MissingField(field));
        }

        info!(store = recipe.store(), bundle_id = %app.bundle_id, "extracted app");
        Ok(app)
    }
}

async fn drive(
    recipe: &dyn PageRecipe,
    session: &mut BoundedSession,
    url: &str,
    seed: App,
) -> KatsiniResult<App> {
    session.navigate(url).await.map_err(extraction_error)?;

    let missing = recipe
        .not_found_check()
        .page_indicates_missing(session)
        .await
        .map_err(extraction_error)?;
    if missing {
        debug!(store = recipe.store(), url, "page reports app missing");
        return Err(KatsiniError::AppNotFound);
    }

    let mut app = seed;
    recipe
        .read_fields(session, &mut app)
        .await
        .map_err(extraction_error)?;
    Ok(app)
}

fn session_error(e: BrowserError) -> KatsiniError {
    match e {
        BrowserError::Timeout => KatsiniError::PageLoadTimeout,
        other => KatsiniError::SessionCreationFailed(other),
    }
}

fn extraction_error(e: BrowserError) -> KatsiniError {
    match e {
        BrowserError::Timeout => KatsiniError::PageLoadTimeout,
        other => KatsiniError::ExtractionFailed(other),
    }
}
