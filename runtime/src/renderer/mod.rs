//! Renderer abstraction for browser-backed lookups.
//!
//! Defines the `BrowserLauncher` and `PageSession` traits that abstract over
//! the browser engine (Chromium via chromiumoxide). Extractors only talk to
//! these traits, so the page recipes can be exercised without a browser.

pub mod block;
pub mod chromium;
pub mod session;
pub mod stealth;

#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use block::BlockPolicy;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// How often visibility and read waits re-check the page.
pub const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Errors raised by browser primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// The browser process or remote connection could not be established.
    #[error("browser unavailable: {0}")]
    Launch(String),

    /// The call deadline elapsed.
    #[error("deadline exceeded")]
    Timeout,

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no element matches {0}")]
    NotFound(String),

    #[error("script evaluation failed: {0}")]
    Eval(String),
}

/// A DOM query, either CSS or XPath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl Locator {
    /// JS expression evaluating to the first matching element or `null`.
    pub fn js_element(&self) -> String {
        match self {
            Locator::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
            Locator::XPath(path) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(path)
            ),
        }
    }

    /// Script returning whether the element exists and is rendered.
    pub fn visibility_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             const style = window.getComputedStyle(el); \
             if (style.visibility === 'hidden' || style.display === 'none') return false; \
             return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); }})()",
            self.js_element()
        )
    }

    /// Script returning the element's rendered text or `null`.
    pub fn text_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; return el ? el.innerText : null; }})()",
            self.js_element()
        )
    }

    /// Script clicking the element; returns `false` when it is missing.
    pub fn click_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
            self.js_element()
        )
    }

    /// Script returning an attribute value or `null`.
    pub fn attribute_script(&self, name: &str) -> String {
        format!(
            "(() => {{ const el = {}; return el ? el.getAttribute({}) : null; }})()",
            self.js_element(),
            js_string(name)
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) | Locator::XPath(s) => f.write_str(s.trim()),
        }
    }
}

/// Quote a value as a JS string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// A browser engine that opens one page per lookup.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open a fresh page with `policy` installed on its network traffic.
    async fn open(&self, policy: BlockPolicy) -> Result<Box<dyn PageSession>, BrowserError>;
    /// Number of pages currently open.
    fn active_sessions(&self) -> usize;
}

/// One open page.
///
/// Implementations provide `navigate`, `evaluate` and `close`; the DOM
/// helpers default to small scripts run through `evaluate`.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate and wait for the load event.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Evaluate a JS expression and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError>;

    /// Release the page and everything it owns.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;

    async fn is_visible(&self, locator: &Locator) -> Result<bool, BrowserError> {
        match self.evaluate(&locator.visibility_script()).await? {
            Value::Bool(visible) => Ok(visible),
            other => Err(BrowserError::Eval(format!(
                "visibility check for {locator} returned {other}"
            ))),
        }
    }

    /// Block until `locator` is rendered. Unbounded on its own; callers
    /// put a deadline around it.
    async fn wait_visible(&self, locator: &Locator) -> Result<(), BrowserError> {
        loop {
            match self.is_visible(locator).await {
                Ok(true) => return Ok(()),
                // The execution context is torn down while the page navigates.
                Ok(false) | Err(BrowserError::Eval(_)) => {}
                Err(e) => return Err(e),
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        match self.evaluate(&locator.click_script()).await? {
            Value::Bool(true) => Ok(()),
            _ => Err(BrowserError::NotFound(locator.to_string())),
        }
    }

    /// Rendered text of the first match, trimmed. Waits for the element to
    /// exist; unbounded on its own like `wait_visible`.
    async fn read_text(&self, locator: &Locator) -> Result<String, BrowserError> {
        loop {
            match self.evaluate(&locator.text_script()).await {
                Ok(Value::String(text)) => return Ok(text.trim().to_string()),
                Ok(Value::Null) | Err(BrowserError::Eval(_)) => {}
                Ok(other) => {
                    return Err(BrowserError::Eval(format!(
                        "text of {locator} returned {other}"
                    )))
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }

    /// Attribute value of the first match, trimmed. Waits like `read_text`.
    async fn read_attribute(&self, locator: &Locator, name: &str) -> Result<String, BrowserError> {
        loop {
            match self.evaluate(&locator.attribute_script(name)).await {
                Ok(Value::String(value)) => return Ok(value.trim().to_string()),
                Ok(Value::Null) | Err(BrowserError::Eval(_)) => {}
                Ok(other) => {
                    return Err(BrowserError::Eval(format!(
                        "attribute {name} of {locator} returned {other}"
                    )))
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(VISIBILITY_POLL).await;
        }
    }
}
