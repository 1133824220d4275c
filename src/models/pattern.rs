//! Default weekly attendance pattern.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::attendance::WorkType;

/// Work type per weekday. Defaults to an Israeli Sunday-Thursday office week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekSchedule {
    pub sunday: WorkType,
    pub monday: WorkType,
    pub tuesday: WorkType,
    pub wednesday: WorkType,
    pub thursday: WorkType,
    pub friday: WorkType,
    pub saturday: WorkType,
}

impl Default for WeekSchedule {
    fn default() -> Self {
        Self {
            sunday: WorkType::Office,
            monday: WorkType::Office,
            tuesday: WorkType::Office,
            wednesday: WorkType::Office,
            thursday: WorkType::Office,
            friday: WorkType::Skip,
            saturday: WorkType::Skip,
        }
    }
}

impl WeekSchedule {
    /// Work type configured for a weekday (may be `Skip`).
    pub fn get(&self, weekday: Weekday) -> WorkType {
        match weekday {
            Weekday::Sun => self.sunday,
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
        }
    }

    pub fn set(&mut self, weekday: Weekday, work_type: WorkType) {
        let slot = match weekday {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        };
        *slot = work_type;
    }
}

/// Default entry/exit times and per-weekday work types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePattern {
    #[serde(with = "hhmm", default = "default_entry_time")]
    pub entry_time: NaiveTime,
    #[serde(with = "hhmm", default = "default_exit_time")]
    pub exit_time: NaiveTime,
    #[serde(default)]
    pub days: WeekSchedule,
}

fn default_entry_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

fn default_exit_time() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default()
}

impl Default for AttendancePattern {
    fn default() -> Self {
        Self {
            entry_time: default_entry_time(),
            exit_time: default_exit_time(),
            days: WeekSchedule::default(),
        }
    }
}

impl AttendancePattern {
    /// Exit must be strictly after entry.
    pub fn validate(&self) -> Result<(), String> {
        if self.exit_time <= self.entry_time {
            return Err("exit_time must be after entry_time".to_string());
        }
        Ok(())
    }

    /// Active weekday numbers, Monday = 0.
    pub fn work_days(&self) -> BTreeSet<u32> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|&day| self.days.get(day) != WorkType::Skip)
        .map(|day| day.num_days_from_monday())
        .collect()
    }

    /// Work type for a weekday, or `None` when it is a day off.
    pub fn work_type(&self, weekday: Weekday) -> Option<WorkType> {
        match self.days.get(weekday) {
            WorkType::Skip => None,
            wt => Some(wt),
        }
    }

    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.work_type(date.weekday()).is_some()
    }
}

/// `HH:MM` serde representation for times in the config file.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::parse::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::parse::parse_time(&text).ok_or_else(|| D::Error::custom(format!("invalid time '{text}', expected HH:MM")))
    }
}
