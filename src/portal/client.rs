//! High-level Hilan portal client.

use tracing::{error, info, warn};

use super::browser::Browser;
use super::calendar::CalendarPage;
use super::fill::FillOutcome;
use super::page::{HomePage, LoginPage, Page};
use super::session::PortalSession;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::{FillInstruction, MonthAttendance};

/// Hilan portal client.
///
/// Logs in once, then reads and writes attendance through the calendar page.
/// Owns the session; dropping the client releases the browser.
pub struct PortalClient<B: Browser> {
    session: PortalSession<B>,
    username: String,
    password: String,
    logged_in: bool,
}

impl<B: Browser> PortalClient<B> {
    /// Create a client for the portal described by `config`.
    pub fn new(browser: B, config: &AppConfig) -> Self {
        Self {
            session: PortalSession::new(browser, config.portal.base_url(), config.pay_period.start_day),
            username: config.portal.username.clone(),
            password: config.portal.password.clone(),
            logged_in: false,
        }
    }

    pub fn session(&self) -> &PortalSession<B> {
        &self.session
    }

    /// Check if currently logged in.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Sign in and confirm the portal landed on the home page.
    pub fn login(&mut self) -> Result<()> {
        let login_page = LoginPage::new(&self.session);
        login_page.navigate_to()?;
        if !login_page.login(&self.username, &self.password)? {
            error!("Login form is incomplete");
            return Err(AppError::LoginFailed);
        }

        let home = HomePage::new(&self.session);
        if !home.is_current()? {
            let current = self.session.browser().current_url()?;
            error!("Login failed, portal stayed on {current}");
            return Err(AppError::LoginFailed);
        }

        info!("Logged in");
        self.logged_in = true;
        Ok(())
    }

    /// Open the attendance calendar. A URL mismatch is only a warning.
    pub fn navigate_to_attendance(&self) -> Result<CalendarPage<'_, B>> {
        if !self.logged_in {
            return Err(AppError::LoginFailed);
        }
        let calendar = CalendarPage::new(&self.session);
        calendar.navigate_to()?;
        if !calendar.is_current()? {
            warn!("Expected the attendance calendar at {}", calendar.url());
        }
        Ok(calendar)
    }

    /// Read the pay period (`year`, `month`).
    ///
    /// Returns `None` when the calendar cannot be switched to it.
    pub fn get_attendance(&self, year: i32, month: u32) -> Result<Option<MonthAttendance>> {
        let calendar = self.navigate_to_attendance()?;
        if !calendar.navigate_to_month(year, month)? {
            return Ok(None);
        }

        info!("Reading attendance...");
        let mut records = calendar.scan(year, month)?;
        if records.is_empty() {
            warn!("No days found in calendar");
            return Ok(Some(MonthAttendance::new(year, month, Vec::new())));
        }
        calendar.reconcile(&mut records)?;
        Ok(Some(MonthAttendance::new(year, month, records)))
    }

    /// Write `instructions` on the calendar page currently shown.
    pub fn fill_batch(&self, instructions: &[FillInstruction], dry_run: bool) -> FillOutcome {
        CalendarPage::new(&self.session).fill_batch(instructions, dry_run)
    }
}
