//! Scrape first, fall back to the API when allowed.

use crate::app::App;
use crate::error::KatsiniResult;
use crate::providers::Acquire;
use tracing::{info, warn};

/// Two acquisition strategies for one provider.
///
/// The scrape runs first. The API is tried only when the scrape failed and
/// fallback is enabled; if the API fails too, the scrape error is returned.
pub struct ScrapeThenApi<'a> {
    pub scrape: &'a dyn Acquire,
    pub api: &'a dyn Acquire,
    pub fallback_enabled: bool,
}

impl ScrapeThenApi<'_> {
    pub async fn run(&self, app_id: &str) -> KatsiniResult<App> {
        let scrape_err = match self.scrape.acquire(app_id).await {
            Ok(app) => return Ok(app),
            Err(e) => e,
        };

        if !self.fallback_enabled {
            return Err(scrape_err);
        }

        warn!(
            app_id,
            strategy = self.scrape.strategy(),
            error = %scrape_err,
            "primary acquisition failed, trying {}",
            self.api.strategy()
        );

        match self.api.acquire(app_id).await {
            Ok(app) => {
                info!(app_id, strategy = self.api.strategy(), "fallback succeeded");
                Ok(app)
            }
            Err(api_err) => {
                warn!(
                    app_id,
                    strategy = self.api.strategy(),
                    error = %api_err,
                    "fallback failed, returning primary error"
                );
                Err(scrape_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KatsiniError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fake {
        name: &'static str,
        outcome: fn() -> KatsiniResult<App>,
        calls: AtomicUsize,
    }

    impl Fake {
        fn new(name: &'static str, outcome: fn() -> KatsiniResult<App>) -> Self {
            Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Acquire for Fake {
        fn strategy(&self) -> &'static str {
            self.name
        }

        async fn acquire(&self, _app_id: &str) -> KatsiniResult<App> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn scraped() -> KatsiniResult<App> {
        Ok(App {
            title: "from scrape".into(),
            ..Default::default()
        })
    }

    fn from_api() -> KatsiniResult<App> {
        Ok(App {
            title: "from api".into(),
            ..Default::default()
        })
    }

    fn timed_out() -> KatsiniResult<App> {
        Err(KatsiniError::PageLoadTimeout)
    }

    fn rejected() -> KatsiniResult<App> {
        Err(KatsiniError::AuthFailed("bad secret".into()))
    }

    #[tokio::test]
    async fn test_scrape_success_skips_api() {
        let scrape = Fake::new("scrape", scraped);
        let api = Fake::new("api", from_api);
        let run = ScrapeThenApi {
            scrape: &scrape,
            api: &api,
            fallback_enabled: true,
        };
        assert_eq!(run.run("1").await.unwrap().title, "from scrape");
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_credentials_returns_scrape_error() {
        let scrape = Fake::new("scrape", timed_out);
        let api = Fake::new("api", from_api);
        let run = ScrapeThenApi {
            scrape: &scrape,
            api: &api,
            fallback_enabled: false,
        };
        assert!(matches!(
            run.run("1").await,
            Err(KatsiniError::PageLoadTimeout)
        ));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_rescues_failed_scrape() {
        let scrape = Fake::new("scrape", timed_out);
        let api = Fake::new("api", from_api);
        let run = ScrapeThenApi {
            scrape: &scrape,
            api: &api,
            fallback_enabled: true,
        };
        assert_eq!(run.run("1").await.unwrap().title, "from api");
        assert_eq!(scrape.calls(), 1);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_both_fail_returns_scrape_error() {
        let scrape = Fake::new("scrape", timed_out);
        let api = Fake::new("api", rejected);
        let run = ScrapeThenApi {
            scrape: &scrape,
            api: &api,
            fallback_enabled: true,
        };
        assert!(matches!(
            run.run("1").await,
            Err(KatsiniError::PageLoadTimeout)
        ));
        assert_eq!(api.calls(), 1);
    }
}
