//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use katsini_runtime::config::{ClientCredentials, Config, Endpoints};
use katsini_runtime::renderer::block::BlockPolicy;
use katsini_runtime::renderer::{BrowserError, BrowserLauncher, PageSession};
use katsini_runtime::Katsini;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A launcher with no browser behind it: every `open` fails.
#[derive(Default)]
pub struct NoBrowser {
    attempts: AtomicUsize,
}

impl NoBrowser {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for NoBrowser {
    async fn open(&self, _policy: BlockPolicy) -> Result<Box<dyn PageSession>, BrowserError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(BrowserError::Launch("no browser in tests".into()))
    }

    fn active_sessions(&self) -> usize {
        0
    }
}

/// Endpoints all pointing at `base`, with the token endpoint under `/token`.
pub fn endpoints(base: &str) -> Endpoints {
    Endpoints {
        play_store: base.to_string(),
        app_gallery: base.to_string(),
        itunes: base.to_string(),
        appgallery_token: format!("{base}/token"),
        appgallery_api: base.to_string(),
    }
}

pub fn credentials() -> Option<ClientCredentials> {
    ClientCredentials::from_parts(Some("client-1".into()), Some("secret-1".into()))
}

pub fn config(base: &str) -> Config {
    Config::default()
        .with_deadline(Duration::from_secs(5))
        .with_endpoints(endpoints(base))
}

pub fn service(config: Config) -> (Arc<Katsini>, Arc<NoBrowser>) {
    let launcher = Arc::new(NoBrowser::default());
    let service = Katsini::with_launcher(config, Arc::clone(&launcher) as Arc<dyn BrowserLauncher>);
    (Arc::new(service), launcher)
}
