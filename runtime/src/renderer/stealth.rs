//! Automation-detection countermeasures for locally launched Chromium.

use super::BrowserError;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;

/// User agent presented instead of `HeadlessChrome`.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Launch flags that hide the usual automation markers.
pub const LAUNCH_ARGS: &[&str] = &[
    "--headless=new",
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-sync",
    "--no-first-run",
    "--no-default-browser-check",
    "--lang=en-US",
];

/// Runs before any page script on every document.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
  window.navigator.permissions.query = (parameters) =>
    parameters.name === 'notifications'
      ? Promise.resolve({ state: Notification.permission })
      : originalQuery(parameters);
}
"#;

/// Install the user agent override and the stealth script on `page`.
///
/// Must run before the first navigation.
pub async fn apply(page: &Page) -> Result<(), BrowserError> {
    page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
        .await
        .map_err(|e| BrowserError::Launch(format!("failed to override user agent: {e}")))?;
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        STEALTH_SCRIPT.to_string(),
    ))
    .await
    .map_err(|e| BrowserError::Launch(format!("failed to inject stealth script: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args_hide_automation() {
        assert!(LAUNCH_ARGS.contains(&"--disable-blink-features=AutomationControlled"));
        assert!(!USER_AGENT.contains("Headless"));
    }
}
