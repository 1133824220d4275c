//! Page objects: a small capability trait plus one struct per portal page.

use tracing::{debug, info};

use super::browser::Browser;
use super::error::Result;
use super::markup::{self, timing};
use super::session::PortalSession;

/// Capabilities shared by every portal page.
pub trait Page<B: Browser> {
    /// Path relative to the portal base URL.
    const PATH: &'static str;

    fn session(&self) -> &PortalSession<B>;

    fn url(&self) -> String {
        self.session().url_for(Self::PATH)
    }

    /// Whether the browser currently shows this page (case-insensitive
    /// URL prefix match).
    fn is_current(&self) -> Result<bool> {
        let current = self.session().browser().current_url()?;
        Ok(current.to_lowercase().starts_with(&self.url().to_lowercase()))
    }

    /// Load this page and wait for it to settle.
    fn navigate_to(&self) -> Result<()> {
        let url = self.url();
        debug!("Navigating to {url}");
        self.session().browser().goto(&url)?;
        self.session().wait_for_load()
    }
}

/// The portal's sign-in form.
pub struct LoginPage<'s, B: Browser> {
    session: &'s PortalSession<B>,
}

impl<'s, B: Browser> LoginPage<'s, B> {
    pub fn new(session: &'s PortalSession<B>) -> Self {
        Self { session }
    }

    /// Submit credentials. Returns `false` when the form is incomplete.
    ///
    /// Whether the portal accepted them is decided by the landing page.
    pub fn login(&self, username: &str, password: &str) -> Result<bool> {
        info!("Logging in as {username}");
        if !self.session.try_fill(markup::USERNAME_INPUT, username)? {
            return Ok(false);
        }
        if !self.session.try_fill(markup::PASSWORD_INPUT, password)? {
            return Ok(false);
        }
        if !self.session.try_click(markup::SUBMIT_BUTTON)? {
            return Ok(false);
        }
        self.session.wait_for_load()?;
        self.session.wait(timing::AFTER_LOGIN);
        Ok(true)
    }
}

impl<B: Browser> Page<B> for LoginPage<'_, B> {
    const PATH: &'static str = markup::LOGIN_PATH;

    fn session(&self) -> &PortalSession<B> {
        self.session
    }
}

/// Personal landing page shown after a successful login.
pub struct HomePage<'s, B: Browser> {
    session: &'s PortalSession<B>,
}

impl<'s, B: Browser> HomePage<'s, B> {
    pub fn new(session: &'s PortalSession<B>) -> Self {
        Self { session }
    }
}

impl<B: Browser> Page<B> for HomePage<'_, B> {
    const PATH: &'static str = markup::HOME_PATH;

    fn session(&self) -> &PortalSession<B> {
        self.session
    }
}
