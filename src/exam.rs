use crate::hall::HallId;
use crate::validation::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type CycleId = i64;

/// Exam format. Decides the session slots per day and how many occupants a
/// hall capacity unit holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExamType {
    Sem,
    Internal,
}

impl ExamType {
    const SEM_SESSIONS: [Session; 2] = [Session::Fn, Session::An];
    const INTERNAL_SESSIONS: [Session; 1] = [Session::Single];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Sem => "SEM",
            ExamType::Internal => "INTERNAL",
        }
    }

    /// Session slots of one exam day, in scheduling order.
    pub fn sessions(&self) -> &'static [Session] {
        match self {
            ExamType::Sem => &Self::SEM_SESSIONS,
            ExamType::Internal => &Self::INTERNAL_SESSIONS,
        }
    }

    /// Occupants per hall capacity unit: one seat for SEM, a two-seat bench
    /// for INTERNAL.
    pub fn seats_per_unit(&self) -> u32 {
        match self {
            ExamType::Sem => 1,
            ExamType::Internal => 2,
        }
    }

    pub fn allows_session(&self, session: Session) -> bool {
        self.sessions().contains(&session)
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_uppercase().as_str() {
            "SEM" | "SEMESTER" => Ok(ExamType::Sem),
            "INTERNAL" => Ok(ExamType::Internal),
            _ => Err(ValidationError::new(format!(
                "unrecognized exam type '{raw}' (expected SEM or INTERNAL)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Session {
    /// Forenoon.
    Fn,
    /// Afternoon.
    An,
    /// The only slot of an internal exam day.
    Single,
}

impl Session {
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Fn => "FN",
            Session::An => "AN",
            Session::Single => "SINGLE",
        }
    }

    pub fn time_start(&self) -> &'static str {
        match self {
            Session::Fn | Session::Single => "09:30 AM",
            Session::An => "02:00 PM",
        }
    }

    pub fn time_end(&self) -> &'static str {
        match self {
            Session::Fn | Session::Single => "12:30 PM",
            Session::An => "05:00 PM",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Session {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_uppercase().as_str() {
            "FN" => Ok(Session::Fn),
            "AN" => Ok(Session::An),
            "SINGLE" => Ok(Session::Single),
            _ => Err(ValidationError::new(format!(
                "unrecognized session '{raw}' (expected FN, AN or SINGLE)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycleStatus {
    Pending,
    Complete,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Pending => "PENDING",
            CycleStatus::Complete => "COMPLETE",
        }
    }
}

impl FromStr for CycleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(CycleStatus::Pending),
            "COMPLETE" => Ok(CycleStatus::Complete),
            _ => Err(ValidationError::new(format!(
                "unrecognized cycle status '{raw}'"
            ))),
        }
    }
}

/// One scheduling run scoped to an exam type and a year group. Owns its
/// timetable, violations and seat allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamCycle {
    pub id: CycleId,
    pub exam_type: ExamType,
    pub year: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
}

impl ExamCycle {
    pub fn from_parameters(params: &RunParameters) -> Self {
        Self {
            id: params.cycle_id,
            exam_type: params.exam_type,
            year: params.year,
            semester: params.semester,
            start_date: params.start_date,
            end_date: params.end_date,
            status: CycleStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl Holiday {
    pub fn new(date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            date,
            reason: reason.into(),
        }
    }
}

/// How students are ordered before they are poured into halls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    /// Grouped by department, then register number.
    #[default]
    Linear,
    /// Round-robin across departments.
    Alternating,
}

impl OrderingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingMode::Linear => "linear",
            OrderingMode::Alternating => "alternating",
        }
    }
}

impl FromStr for OrderingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_lowercase().as_str() {
            "linear" | "same" | "same_department" => Ok(OrderingMode::Linear),
            "alternating" | "alternate" | "mixed" => Ok(OrderingMode::Alternating),
            _ => Err(ValidationError::new(format!(
                "unrecognized ordering mode '{raw}' (expected linear or alternating)"
            ))),
        }
    }
}

/// Caller-supplied parameters of one timetable or seating run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub cycle_id: CycleId,
    pub exam_type: ExamType,
    pub year: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    /// Restricts seating to these halls when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halls: Option<Vec<HallId>>,
    #[serde(default)]
    pub ordering: OrderingMode,
}

impl RunParameters {
    pub fn new(
        cycle_id: CycleId,
        exam_type: ExamType,
        year: u8,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            cycle_id,
            exam_type,
            year,
            semester: None,
            session: None,
            start_date,
            end_date,
            holidays: Vec::new(),
            halls: None,
            ordering: OrderingMode::default(),
        }
    }

    pub fn with_semester(mut self, semester: u8) -> Self {
        self.semester = Some(semester);
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_holidays(mut self, holidays: Vec<Holiday>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn with_halls(mut self, halls: Vec<HallId>) -> Self {
        self.halls = Some(halls);
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn holiday_dates(&self) -> Vec<NaiveDate> {
        self.holidays.iter().map(|h| h.date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_follow_exam_type() {
        assert_eq!(ExamType::Sem.sessions(), &[Session::Fn, Session::An]);
        assert_eq!(ExamType::Internal.sessions(), &[Session::Single]);
        assert!(!ExamType::Sem.allows_session(Session::Single));
        assert!(ExamType::Internal.allows_session(Session::Single));
    }

    #[test]
    fn exam_type_parses_case_insensitively() {
        assert_eq!("sem".parse::<ExamType>().unwrap(), ExamType::Sem);
        assert_eq!("Internal".parse::<ExamType>().unwrap(), ExamType::Internal);
        let err = "quiz".parse::<ExamType>().unwrap_err();
        assert!(err.to_string().contains("quiz"));
    }

    #[test]
    fn parse_errors_quote_the_input_as_typed() {
        let session = " Evening ".parse::<Session>().unwrap_err();
        assert!(session.to_string().contains("'Evening'"));
        let status = "Done".parse::<CycleStatus>().unwrap_err();
        assert!(status.to_string().contains("'Done'"));
        let ordering = "RANDOM".parse::<OrderingMode>().unwrap_err();
        assert!(ordering.to_string().contains("'RANDOM'"));
    }

    #[test]
    fn exam_type_serializes_uppercase() {
        let json = serde_json::to_string(&ExamType::Internal).unwrap();
        assert_eq!(json, "\"INTERNAL\"");
        let session: Session = serde_json::from_str("\"AN\"").unwrap();
        assert_eq!(session, Session::An);
    }
}
