//! In-memory `PageSession` for exercising page recipes without Chromium.

use super::block::BlockPolicy;
use super::{BrowserError, BrowserLauncher, Locator, PageSession};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// What the fake page contains.
#[derive(Clone, Default)]
pub struct ScriptedPageSpec {
    /// Locators visible as soon as the page loads.
    pub visible: HashSet<Locator>,
    /// Text per locator. A locator without text never enters the DOM.
    pub texts: HashMap<Locator, String>,
    /// Attribute values per (locator, attribute).
    pub attributes: HashMap<(Locator, &'static str), String>,
    /// Clicking the key reveals the listed locators.
    pub reveals: HashMap<Locator, Vec<Locator>>,
    /// `evaluate` answers: first entry whose needle occurs in the script.
    pub evaluations: Vec<(&'static str, Value)>,
    /// Locators that only enter the DOM this long after the page opens.
    pub late: HashMap<Locator, Duration>,
    pub navigation_delay: Duration,
    pub navigation_error: Option<String>,
}

impl ScriptedPageSpec {
    pub fn visible(mut self, locator: Locator) -> Self {
        self.visible.insert(locator);
        self
    }

    pub fn text(mut self, locator: Locator, text: &str) -> Self {
        self.texts.insert(locator, text.to_string());
        self
    }

    pub fn attribute(mut self, locator: Locator, name: &'static str, value: &str) -> Self {
        self.attributes.insert((locator, name), value.to_string());
        self
    }

    pub fn reveal_on_click(mut self, button: Locator, revealed: Vec<Locator>) -> Self {
        self.reveals.insert(button, revealed);
        self
    }

    pub fn appears_after(mut self, locator: Locator, delay: Duration) -> Self {
        self.late.insert(locator, delay);
        self
    }

    pub fn evaluation(mut self, needle: &'static str, value: Value) -> Self {
        self.evaluations.push((needle, value));
        self
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
}

/// Launcher handing out [`ScriptedPage`]s built from one spec.
pub struct ScriptedLauncher {
    spec: ScriptedPageSpec,
    open_delay: Duration,
    open_error: Option<String>,
    counters: Arc<Counters>,
    calls: Arc<Mutex<Vec<String>>>,
    last_policy: Mutex<Option<BlockPolicy>>,
}

impl ScriptedLauncher {
    pub fn new(spec: ScriptedPageSpec) -> Self {
        Self {
            spec,
            open_delay: Duration::ZERO,
            open_error: None,
            counters: Arc::new(Counters::default()),
            calls: Arc::new(Mutex::new(Vec::new())),
            last_policy: Mutex::new(None),
        }
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn failing(reason: &str) -> Self {
        let mut launcher = Self::new(ScriptedPageSpec::default());
        launcher.open_error = Some(reason.to_string());
        launcher
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Primitive calls made on pages, in order (`navigate:<url>`,
    /// `wait:<locator>`, `click:<locator>`, `text:<locator>`).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn last_policy(&self) -> Option<BlockPolicy> {
        self.last_policy.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn open(&self, policy: BlockPolicy) -> Result<Box<dyn PageSession>, BrowserError> {
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if let Some(reason) = &self.open_error {
            return Err(BrowserError::Launch(reason.clone()));
        }
        if let Ok(mut last) = self.last_policy.lock() {
            *last = Some(policy);
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.active.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            visible: Mutex::new(self.spec.visible.clone()),
            spec: self.spec.clone(),
            opened_at: Instant::now(),
            counters: Arc::clone(&self.counters),
            calls: Arc::clone(&self.calls),
        }))
    }

    fn active_sessions(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }
}

/// A page answering from a [`ScriptedPageSpec`].
pub struct ScriptedPage {
    spec: ScriptedPageSpec,
    visible: Mutex<HashSet<Locator>>,
    opened_at: Instant,
    counters: Arc<Counters>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPage {
    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn is_shown(&self, locator: &Locator) -> bool {
        self.visible
            .lock()
            .map(|v| v.contains(locator))
            .unwrap_or(false)
    }

    fn in_dom(&self, locator: &Locator) -> bool {
        self.spec
            .late
            .get(locator)
            .map_or(true, |delay| self.opened_at.elapsed() >= *delay)
    }
}

impl Drop for ScriptedPage {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("navigate:{url}"));
        if !self.spec.navigation_delay.is_zero() {
            tokio::time::sleep(self.spec.navigation_delay).await;
        }
        match &self.spec.navigation_error {
            Some(reason) => Err(BrowserError::Navigation(reason.clone())),
            None => Ok(()),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        self.spec
            .evaluations
            .iter()
            .find(|(needle, _)| script.contains(needle))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| BrowserError::Eval(format!("unscripted evaluation: {script}")))
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, BrowserError> {
        Ok(self.is_shown(locator))
    }

    async fn wait_visible(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.record(format!("wait:{locator}"));
        loop {
            if self.is_shown(locator) {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn click(&self, locator: &Locator) -> Result<(), BrowserError> {
        self.record(format!("click:{locator}"));
        if !self.is_shown(locator) {
            return Err(BrowserError::NotFound(locator.to_string()));
        }
        if let Some(revealed) = self.spec.reveals.get(locator) {
            if let Ok(mut visible) = self.visible.lock() {
                visible.extend(revealed.iter().copied());
            }
        }
        Ok(())
    }

    async fn read_text(&self, locator: &Locator) -> Result<String, BrowserError> {
        self.record(format!("text:{locator}"));
        loop {
            if let Some(text) = self.spec.texts.get(locator).filter(|_| self.in_dom(locator)) {
                return Ok(text.trim().to_string());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn read_attribute(&self, locator: &Locator, name: &str) -> Result<String, BrowserError> {
        self.record(format!("attr:{locator}[{name}]"));
        loop {
            let value = self
                .spec
                .attributes
                .iter()
                .find(|((loc, attr), _)| loc == locator && *attr == name)
                .filter(|_| self.in_dom(locator));
            if let Some((_, value)) = value {
                return Ok(value.clone());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
