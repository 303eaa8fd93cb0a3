use crate::error::{PlannerError, PlannerResult};
use crate::exam::Holiday;
use crate::validation::ValidationError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Working-day calendar for exam dates: a set of non-working weekdays plus a
/// set of holidays. Defaults to Monday through Friday with no holidays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCalendarConfig {
    working_days: Vec<Weekday>,
    holidays: Vec<NaiveDate>,
}

impl Default for ExamCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

/// Usable exam dates in `start..=end`: weekends and exact holiday matches are
/// removed. Ascending and free of duplicates. Fails when nothing is left.
pub fn generate_available_dates(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &[Holiday],
) -> PlannerResult<Vec<NaiveDate>> {
    let mut calendar = ExamCalendar::default();
    calendar.add_holidays(holidays.iter().map(|h| h.date));
    calendar.available_dates(start, end)
}

impl ExamCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = ExamCalendarConfig::new(working_days, holidays)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &ExamCalendarConfig) -> Result<Self, ValidationError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(ValidationError::new(
                "exam calendar requires at least one working day",
            ));
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> ExamCalendarConfig {
        ExamCalendarConfig::from(self)
    }

    pub fn add_holidays<I>(&mut self, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.holidays.extend(dates);
    }

    /// Replaces the working week, e.g. Monday through Saturday.
    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), ValidationError> {
        if days.is_empty() {
            return Err(ValidationError::new(
                "exam calendar requires at least one working day",
            ));
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Inclusive on both ends; a window ending at `NaiveDate::MAX` stops there.
    pub fn available_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = Some(start);
        while let Some(day) = current.filter(|day| *day <= end) {
            if self.is_available(day) {
                days.push(day);
            }
            current = day.succ_opt();
        }
        days
    }

    /// Like `available_days_in_range` but an empty window is an error.
    pub fn available_dates(&self, start: NaiveDate, end: NaiveDate) -> PlannerResult<Vec<NaiveDate>> {
        let days = self.available_days_in_range(start, end);
        if days.is_empty() {
            log::warn!("no usable exam dates between {start} and {end}");
            return Err(PlannerError::InsufficientDates { start, end });
        }
        log::debug!(
            "{} usable exam dates between {start} and {end}",
            days.len()
        );
        Ok(days)
    }
}

impl ExamCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(ValidationError::new(
                "exam calendar requires at least one working day",
            ));
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for ExamCalendarConfig {
    fn default() -> Self {
        ExamCalendarConfig::from(&ExamCalendar::default())
    }
}

impl From<&ExamCalendar> for ExamCalendarConfig {
    fn from(calendar: &ExamCalendar) -> Self {
        let working = ExamCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days: working,
            holidays,
        }
    }
}
