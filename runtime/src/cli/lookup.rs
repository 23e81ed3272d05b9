//! One-shot lookups printed as JSON.

use crate::config::Config;
use crate::providers::app_store::AppStoreQuery;
use crate::providers::play_store::PlayStoreQuery;
use crate::service::Katsini;
use anyhow::Result;

/// What to look up.
#[derive(Debug, Clone)]
pub enum Target {
    PlayStore(PlayStoreQuery),
    AppStore(AppStoreQuery),
    AppGallery(String),
}

/// Run one lookup and print the record to stdout.
pub async fn run(target: Target, config: Config) -> Result<()> {
    let service = Katsini::new(config);
    let app = match &target {
        Target::PlayStore(query) => service.play_store(query).await?,
        Target::AppStore(query) => service.app_store(query).await?,
        Target::AppGallery(app_id) => service.app_gallery(app_id).await?,
    };
    println!("{}", serde_json::to_string_pretty(&app)?);
    Ok(())
}
