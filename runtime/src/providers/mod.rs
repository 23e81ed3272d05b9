//! Store providers: one module per store, plus the shared page-scraping
//! machinery.

pub mod app_gallery;
pub mod app_gallery_api;
pub mod app_store;
pub mod extract;
pub mod play_store;

use crate::app::App;
use crate::error::{KatsiniError, KatsiniResult};
use async_trait::async_trait;
use url::Url;

/// One way of obtaining an app record from an identifier.
#[async_trait]
pub trait Acquire: Send + Sync {
    /// Short strategy name for logs.
    fn strategy(&self) -> &'static str;

    async fn acquire(&self, app_id: &str) -> KatsiniResult<App>;
}

/// Join `path` onto `base` and append `query` with proper encoding.
pub(crate) fn build_url(base: &str, path: &str, query: &[(&str, &str)]) -> KatsiniResult<String> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    let mut url = Url::parse(&joined)
        .map_err(|e| KatsiniError::InvalidInput(format!("invalid URL {joined}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter().copied());
    }
    Ok(url.into())
}
