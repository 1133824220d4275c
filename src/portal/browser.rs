//! The browser capability the portal automation is written against.

use std::time::Duration;

use serde_json::Value;

use super::error::Result;

/// Page load milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// DOM parsed.
    DomReady,
    /// All resources loaded.
    Loaded,
    /// No network activity for a short settle window.
    NetworkIdle,
}

/// Minimal browser surface: navigation, element queries, clicks, text entry
/// and in-page script evaluation.
///
/// Every call blocks until the engine has completed it. Selector-based
/// methods act on the first matching element.
pub trait Browser {
    /// Load a URL in the current tab.
    fn goto(&self, url: &str) -> Result<()>;

    /// URL currently shown.
    fn current_url(&self) -> Result<String>;

    /// Block until the page reaches `state`.
    fn wait_for(&self, state: LoadState) -> Result<()>;

    /// Number of elements matching `selector`.
    fn count(&self, selector: &str) -> Result<usize>;

    /// Whether the first match is rendered and visible.
    fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Attribute of the first match; `None` when absent or nothing matches.
    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Rendered text of the first match.
    fn inner_text(&self, selector: &str) -> Result<Option<String>>;

    /// Click the first match.
    fn click(&self, selector: &str) -> Result<()>;

    /// Replace the value of the first matching input.
    fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Evaluate `script` in the page.
    ///
    /// The script is a JavaScript function expression taking one argument;
    /// `arg` is passed to it and its return value comes back as JSON.
    fn evaluate(&self, script: &str, arg: Value) -> Result<Value>;

    /// Fixed wait for client-side re-rendering that signals no completion.
    fn pause(&self, duration: Duration);
}
