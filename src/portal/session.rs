//! Scoped portal session.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::browser::{Browser, LoadState};
use super::error::Result;
use super::scripts;

/// One logical browser session against a portal.
///
/// Owns the browser exclusively; dropping the session releases it. Every
/// page object borrows the session instead of reaching for shared state.
pub struct PortalSession<B: Browser> {
    browser: B,
    base_url: String,
    period_start_day: u32,
}

impl<B: Browser> PortalSession<B> {
    /// Create a session over an already launched browser.
    ///
    /// # Arguments
    /// * `base_url` - Company portal URL (e.g., "https://acme.hilan.co.il")
    /// * `period_start_day` - Day of month pay periods start on
    pub fn new(browser: B, base_url: &str, period_start_day: u32) -> Self {
        Self {
            browser,
            base_url: base_url.trim_end_matches('/').to_string(),
            period_start_day,
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn period_start_day(&self) -> u32 {
        self.period_start_day
    }

    /// Absolute URL for a portal path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{base}{path}", base = self.base_url)
    }

    /// Fixed wait for client-side re-rendering.
    pub fn wait(&self, duration: Duration) {
        self.browser.pause(duration);
    }

    /// Wait through every load milestone in order.
    pub fn wait_for_load(&self) -> Result<()> {
        for state in [LoadState::DomReady, LoadState::Loaded, LoadState::NetworkIdle] {
            self.browser.wait_for(state)?;
        }
        Ok(())
    }

    /// Run an in-page script and decode its result.
    ///
    /// Engine failures propagate; a payload of the wrong shape decodes to
    /// `T::default()` with a warning.
    pub fn eval<T: DeserializeOwned + Default>(&self, script: &str, arg: Value, what: &str) -> Result<T> {
        let value = self.browser.evaluate(script, arg)?;
        Ok(scripts::decode(value, what))
    }

    /// Click `selector` if it is present. Absence is not an error.
    pub fn try_click(&self, selector: &str) -> Result<bool> {
        if self.browser.count(selector)? == 0 {
            debug!("Nothing to click for {selector}");
            return Ok(false);
        }
        self.browser.click(selector)?;
        Ok(true)
    }

    /// Click `selector` only when it is present and visible.
    pub fn try_click_visible(&self, selector: &str) -> Result<bool> {
        if self.browser.count(selector)? == 0 || !self.browser.is_visible(selector)? {
            debug!("{selector} is absent or hidden");
            return Ok(false);
        }
        self.browser.click(selector)?;
        Ok(true)
    }

    /// Fill `selector` if it is present.
    pub fn try_fill(&self, selector: &str, value: &str) -> Result<bool> {
        if self.browser.count(selector)? == 0 {
            debug!("No input for {selector}");
            return Ok(false);
        }
        self.browser.fill(selector, value)?;
        Ok(true)
    }
}
