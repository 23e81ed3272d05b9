//! Deadline-bound page sessions.
//!
//! A lookup sets one [`Deadline`] when it starts. Opening the page and
//! every primitive after that run under it, so a stalled navigation or a
//! selector that never shows up unblocks with [`BrowserError::Timeout`].
//! The page is released by [`BoundedSession::close`], and by the page's own
//! `Drop` if the lookup future is abandoned.

use super::block::BlockPolicy;
use super::{BrowserError, BrowserLauncher, Locator, PageSession};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Upper bound on page teardown.
pub const TEARDOWN_GRACE: Duration = Duration::from_secs(5);

/// A point in time after which browser work is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Run `fut`, failing with `Timeout` once the deadline passes.
    pub async fn bound<T, F>(&self, fut: F) -> Result<T, BrowserError>
    where
        F: Future<Output = Result<T, BrowserError>>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout),
        }
    }
}

/// A page whose every operation is bounded by one deadline.
pub struct BoundedSession {
    page: Box<dyn PageSession>,
    deadline: Deadline,
}

impl BoundedSession {
    /// Bind an already open page to `deadline`.
    pub fn with_deadline(page: Box<dyn PageSession>, deadline: Deadline) -> Self {
        Self { page, deadline }
    }

    /// Open a page through `launcher`. Launching counts against the deadline.
    pub async fn open(
        launcher: &dyn BrowserLauncher,
        policy: BlockPolicy,
        deadline: Deadline,
    ) -> Result<Self, BrowserError> {
        let page = deadline.bound(launcher.open(policy)).await?;
        Ok(Self::with_deadline(page, deadline))
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!(url, remaining_ms = self.deadline.remaining().as_millis() as u64, "navigating");
        let deadline = self.deadline;
        deadline.bound(self.page.navigate(url)).await
    }

    pub async fn wait_visible(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.deadline.bound(self.page.wait_visible(locator)).await
    }

    pub async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.deadline.bound(self.page.click(locator)).await
    }

    pub async fn read_text(&self, locator: &Locator) -> Result<String, BrowserError> {
        self.deadline.bound(self.page.read_text(locator)).await
    }

    pub async fn read_attribute(&self, locator: &Locator, name: &str) -> Result<String, BrowserError> {
        self.deadline
            .bound(self.page.read_attribute(locator, name))
            .await
    }

    pub async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        self.deadline.bound(self.page.evaluate(script)).await
    }

    /// Release the page. Failures are logged, never returned: the lookup
    /// result is already decided by the time this runs.
    ///
    /// Teardown is not charged to the call deadline. It gets its own
    /// [`TEARDOWN_GRACE`], so a lookup may return up to that long after its
    /// deadline. Past the grace the page is dropped and its `Drop` releases
    /// the rest.
    pub async fn close(self) {
        match tokio::time::timeout(TEARDOWN_GRACE, self.page.close()).await {
            Ok(Ok(())) => debug!("session closed"),
            Ok(Err(e)) => warn!("session close failed: {e}"),
            Err(_) => warn!("session close timed out; page dropped"),
        }
    }
}
