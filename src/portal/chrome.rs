//! Headless Chrome binding for the [`Browser`] capability.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use headless_chrome::{Browser as ChromeProcess, LaunchOptions, Tab};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::browser::{Browser, LoadState};
use super::error::{BrowserError, Result};
use crate::config::BrowserConfig;

/// Longest wait for a load milestone.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Quiet period assumed to mean "network idle".
const NETWORK_SETTLE: Duration = Duration::from_millis(500);
const WINDOW_SIZE: (u32, u32) = (1280, 800);

/// A Chrome process with one tab.
///
/// Provides blocking operations; wrap in `spawn_blocking` for async usage.
/// Interactions are paced by `slow_mo` so the portal's scripts keep up.
pub struct ChromeBrowser {
    // Kept alive for the lifetime of the tab.
    _process: ChromeProcess,
    tab: Arc<Tab>,
    slow_mo: Duration,
}

impl ChromeBrowser {
    /// Launch Chrome with the configured display mode and pacing.
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Launching Chrome (headless={})", config.headless);
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(WINDOW_SIZE))
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let process = ChromeProcess::new(options).map_err(|e| BrowserError::Launch(e.to_string()))?;
        let tab = process.new_tab().map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            _process: process,
            tab,
            slow_mo: Duration::from_millis(config.slow_mo_ms),
        })
    }

    fn paced(&self) {
        if !self.slow_mo.is_zero() {
            thread::sleep(self.slow_mo);
        }
    }

    /// Evaluate a plain expression and return its value.
    fn expression(&self, expression: &str) -> Result<Value> {
        let object = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(object.value.unwrap_or(Value::Null))
    }

    fn ready_state(&self) -> Result<String> {
        Ok(self
            .expression("document.readyState")?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn poll_ready_state(&self, accept: fn(&str) -> bool, what: &str) -> Result<()> {
        let deadline = Instant::now() + LOAD_TIMEOUT;
        loop {
            if accept(&self.ready_state()?) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(what.to_string()));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Selector as a JavaScript string literal.
fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

impl Browser for ChromeBrowser {
    fn goto(&self, url: &str) -> Result<()> {
        debug!("goto {url}");
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn wait_for(&self, state: LoadState) -> Result<()> {
        match state {
            LoadState::DomReady => self.poll_ready_state(|s| s != "loading", "DOM ready"),
            LoadState::Loaded => self.poll_ready_state(|s| s == "complete", "page load"),
            LoadState::NetworkIdle => {
                self.tab
                    .wait_until_navigated()
                    .map_err(|e| BrowserError::Timeout(format!("network idle: {e}")))?;
                thread::sleep(NETWORK_SETTLE);
                Ok(())
            }
        }
    }

    fn count(&self, selector: &str) -> Result<usize> {
        let value = self.expression(&format!("document.querySelectorAll({}).length", js_string(selector)))?;
        Ok(value.as_u64().unwrap_or_default() as usize)
    }

    fn is_visible(&self, selector: &str) -> Result<bool> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el) return false; \
             const s = window.getComputedStyle(el); const r = el.getBoundingClientRect(); \
             return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0; }})()",
            js_string(selector)
        );
        Ok(self.expression(&script)?.as_bool().unwrap_or(false))
    }

    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        match self.tab.find_element(selector) {
            Ok(element) => element.get_attribute_value(name).map_err(BrowserError::engine),
            Err(_) => Ok(None),
        }
    }

    fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        match self.tab.find_element(selector) {
            Ok(element) => element.get_inner_text().map(Some).map_err(BrowserError::engine),
            Err(_) => Ok(None),
        }
    }

    fn click(&self, selector: &str) -> Result<()> {
        debug!("click {selector}");
        self.tab
            .find_element(selector)
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?
            .click()
            .map_err(BrowserError::engine)?;
        self.paced();
        Ok(())
    }

    fn fill(&self, selector: &str, value: &str) -> Result<()> {
        debug!("fill {selector}");
        let element = self
            .tab
            .find_element(selector)
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        self.expression(&format!(
            "(() => {{ const el = document.querySelector({}); if (el) el.value = ''; }})()",
            js_string(selector)
        ))?;
        element
            .focus()
            .and_then(|el| el.type_into(value))
            .map_err(BrowserError::engine)?;
        self.paced();
        Ok(())
    }

    fn evaluate(&self, script: &str, arg: Value) -> Result<Value> {
        // The engine hands back objects by reference, so results cross as JSON text.
        let expression = format!("JSON.stringify(({script})({arg}))");
        match self.expression(&expression)? {
            Value::String(json) => serde_json::from_str(&json).map_err(|e| BrowserError::Script(e.to_string())),
            _ => Ok(Value::Null),
        }
    }

    fn pause(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        debug!("Closing browser tab");
        if let Err(e) = self.tab.close(true) {
            warn!("Failed to close browser tab: {e}");
        }
    }
}
