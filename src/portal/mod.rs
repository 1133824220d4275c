//! Hilan portal automation.
//!
//! Everything that touches the browser lives here. The [`Browser`] trait is
//! the only engine surface the automation relies on; [`ChromeBrowser`] is the
//! production binding.

pub mod browser;
pub mod calendar;
pub mod chrome;
pub mod client;
pub mod detail;
pub mod error;
pub mod fill;
pub mod markup;
pub mod page;
pub(crate) mod scripts;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::{Browser, LoadState};
pub use calendar::CalendarPage;
pub use chrome::ChromeBrowser;
pub use client::PortalClient;
pub use error::BrowserError;
pub use fill::{FillOutcome, FillState};
pub use page::{HomePage, LoginPage, Page};
pub use session::PortalSession;
