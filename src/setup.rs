//! Interactive first-run setup.

use std::io::{BufRead, Write};

use chrono::{NaiveTime, Weekday};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::WorkType;
use crate::parse::{format_time, parse_time};

const WEEK: [(Weekday, &str); 7] = [
    (Weekday::Sun, "Sunday"),
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
];

/// Line-based setup wizard.
///
/// Every prompt shows its default in brackets; an empty answer keeps it.
pub struct SetupWizard<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> SetupWizard<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn section(&mut self, title: &str) -> Result<()> {
        writeln!(self.output, "\n{title}")?;
        Ok(())
    }

    fn prompt(&mut self, label: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(default) => write!(self.output, "{label} [{default}]: ")?,
            None => write!(self.output, "{label}: ")?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AppError::validation("setup aborted: input closed"));
        }
        let answer = line.trim();
        Ok(match (answer.is_empty(), default) {
            (true, Some(default)) => default.to_string(),
            _ => answer.to_string(),
        })
    }

    fn prompt_required(&mut self, label: &str) -> Result<String> {
        loop {
            let answer = self.prompt(label, None)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            writeln!(self.output, "{label} cannot be empty")?;
        }
    }

    fn prompt_time(&mut self, label: &str, default: NaiveTime) -> Result<NaiveTime> {
        let default = format_time(default);
        loop {
            let answer = self.prompt(&format!("{label} (HH:MM)"), Some(&default))?;
            match parse_time(&answer) {
                Some(time) => return Ok(time),
                None => writeln!(self.output, "Invalid time format. Please use HH:MM (e.g., 09:00)")?,
            }
        }
    }

    /// Ask for every setting and return a validated config.
    pub fn run(&mut self) -> Result<AppConfig> {
        let mut config = AppConfig::default();
        writeln!(self.output, "Hilan Attendance Setup")?;

        self.section("Hilan URL:")?;
        let url = self.prompt("Hilan base URL", Some(&config.portal.url))?;
        config.portal.url = url.trim_end_matches('/').to_string();

        self.section("Credentials:")?;
        config.portal.username = self.prompt_required("Username")?;
        config.portal.password = self.prompt_required("Password")?;

        self.section("Default Times:")?;
        loop {
            config.pattern.entry_time = self.prompt_time("Entry time", config.pattern.entry_time)?;
            config.pattern.exit_time = self.prompt_time("Exit time", config.pattern.exit_time)?;
            match config.pattern.validate() {
                Ok(()) => break,
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }

        self.section("Work Days:")?;
        writeln!(self.output, "For each day, enter: office, home, abroad, or skip")?;
        for (weekday, name) in WEEK {
            let default = config.pattern.days.get(weekday).label().to_lowercase();
            let answer = self.prompt(name, Some(&default))?;
            let work_type = WorkType::from_name(&answer).unwrap_or_else(|| {
                warn!("Unknown work type '{answer}', using office");
                WorkType::Office
            });
            config.pattern.days.set(weekday, work_type);
        }

        self.section("Pay Period:")?;
        let default_day = config.pay_period.start_day;
        let answer = self.prompt("Pay period start day (1-28)", Some(&default_day.to_string()))?;
        config.pay_period.start_day = match answer.parse::<u32>() {
            Ok(day) if (1..=28).contains(&day) => day,
            _ => {
                warn!("Invalid day, using default ({default_day})");
                default_day
            }
        };

        let answer = self.prompt("\nRun browser in headless mode? (y/n)", Some("n"))?;
        config.browser.headless = matches!(answer.to_lowercase().as_str(), "y" | "yes");

        config.validate()?;
        Ok(config)
    }
}
