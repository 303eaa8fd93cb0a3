use crate::exam::{CycleId, ExamType, Session};
use crate::subject::Subject;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// One scheduled exam. Within a cycle no two entries share
/// `(date, session, department)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub cycle_id: CycleId,
    pub subject_code: String,
    pub subject_name: String,
    pub department: String,
    pub date: NaiveDate,
    pub session: Session,
}

impl TimetableEntry {
    pub fn time_start(&self) -> &'static str {
        self.session.time_start()
    }

    pub fn time_end(&self) -> &'static str {
        self.session.time_end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
}

impl ViolationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationSeverity::Low => "LOW",
            ViolationSeverity::Medium => "MEDIUM",
            ViolationSeverity::High => "HIGH",
        }
    }
}

impl FromStr for ViolationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_uppercase().as_str() {
            "LOW" => Ok(ViolationSeverity::Low),
            "MEDIUM" => Ok(ViolationSeverity::Medium),
            "HIGH" => Ok(ViolationSeverity::High),
            _ => Err(format!("unrecognized violation severity '{raw}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// The calendar ran out of slots before the subject's turn came.
    InsufficientSlots,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::InsufficientSlots => "INSUFFICIENT_SLOTS",
        }
    }
}

impl FromStr for ViolationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "INSUFFICIENT_SLOTS" => Ok(ViolationKind::InsufficientSlots),
            other => Err(format!("unrecognized violation type '{other}'")),
        }
    }
}

/// A subject the scheduler could not place. Part of a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub cycle_id: CycleId,
    pub subject_code: String,
    pub subject_name: String,
    pub department: String,
    pub kind: ViolationKind,
    pub severity: ViolationSeverity,
    pub description: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.as_str(), self.description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub entries: Vec<TimetableEntry>,
    pub violations: Vec<Violation>,
}

impl Timetable {
    pub fn is_complete(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn entries_for_department<'a>(
        &'a self,
        department: &'a str,
    ) -> impl Iterator<Item = &'a TimetableEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.department == department)
    }

    pub fn summary(&self) -> TimetableSummary {
        let departments: BTreeSet<&str> = self
            .entries
            .iter()
            .map(|e| e.department.as_str())
            .chain(self.violations.iter().map(|v| v.department.as_str()))
            .collect();
        let dates: BTreeSet<NaiveDate> = self.entries.iter().map(|e| e.date).collect();
        TimetableSummary {
            scheduled: self.entries.len(),
            violations: self.violations.len(),
            departments: departments.len(),
            dates_used: dates.len(),
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSummary {
    pub scheduled: usize,
    pub violations: usize,
    pub departments: usize,
    pub dates_used: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl TimetableSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("scheduled={}", self.scheduled));
        parts.push(format!("violations={}", self.violations));
        parts.push(format!("departments={}", self.departments));
        parts.push(format!("dates={}", self.dates_used));
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            parts.push(format!("window={first}..{last}"));
        }
        parts.join(", ")
    }
}

/// Per-department queue of subjects sorted by code, with the cursor of the
/// next subject to place.
struct DepartmentLane<'a> {
    department: &'a str,
    subjects: Vec<&'a Subject>,
    cursor: usize,
}

impl<'a> DepartmentLane<'a> {
    fn next(&mut self) -> Option<&'a Subject> {
        let subject = self.subjects.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(subject)
    }

    fn remaining(&self) -> &[&'a Subject] {
        &self.subjects[self.cursor.min(self.subjects.len())..]
    }
}

/// Greedy slot filler: walks dates ascending, sessions in their fixed order
/// and departments by code, placing at most one subject per department per
/// slot.
#[derive(Debug, Clone, Copy)]
pub struct TimetableScheduler {
    cycle_id: CycleId,
}

impl TimetableScheduler {
    pub fn new(cycle_id: CycleId) -> Self {
        Self { cycle_id }
    }

    pub fn schedule(
        &self,
        subjects: &[Subject],
        available_dates: &[NaiveDate],
        exam_type: ExamType,
    ) -> Timetable {
        let mut dates = available_dates.to_vec();
        dates.sort();
        dates.dedup();

        let mut lanes = Self::lanes(subjects);
        let total = subjects.len();
        let mut entries = Vec::with_capacity(total);

        'dates: for &date in &dates {
            for &session in exam_type.sessions() {
                if entries.len() == total {
                    break 'dates;
                }
                for lane in lanes.iter_mut() {
                    if let Some(subject) = lane.next() {
                        log::trace!(
                            "cycle {}: {} {} -> {} ({})",
                            self.cycle_id,
                            date,
                            session,
                            subject.code,
                            lane.department
                        );
                        entries.push(TimetableEntry {
                            cycle_id: self.cycle_id,
                            subject_code: subject.code.clone(),
                            subject_name: subject.name.clone(),
                            department: subject.department.clone(),
                            date,
                            session,
                        });
                    }
                }
            }
        }

        let violations = self.violations(&lanes, dates.len(), exam_type);
        if !violations.is_empty() {
            log::warn!(
                "cycle {}: {} subject(s) could not be placed within {} date(s)",
                self.cycle_id,
                violations.len(),
                dates.len()
            );
        }
        Timetable {
            entries,
            violations,
        }
    }

    fn lanes(subjects: &[Subject]) -> Vec<DepartmentLane<'_>> {
        let mut by_department: BTreeMap<&str, Vec<&Subject>> = BTreeMap::new();
        for subject in subjects {
            by_department
                .entry(subject.department.as_str())
                .or_default()
                .push(subject);
        }
        by_department
            .into_iter()
            .map(|(department, mut queue)| {
                queue.sort_by(|a, b| a.code.cmp(&b.code));
                DepartmentLane {
                    department,
                    subjects: queue,
                    cursor: 0,
                }
            })
            .collect()
    }

    fn violations(
        &self,
        lanes: &[DepartmentLane<'_>],
        date_count: usize,
        exam_type: ExamType,
    ) -> Vec<Violation> {
        let slots = date_count * exam_type.sessions().len();
        lanes
            .iter()
            .flat_map(|lane| lane.remaining().iter())
            .map(|subject| Violation {
                cycle_id: self.cycle_id,
                subject_code: subject.code.clone(),
                subject_name: subject.name.clone(),
                department: subject.department.clone(),
                kind: ViolationKind::InsufficientSlots,
                severity: ViolationSeverity::High,
                description: format!(
                    "{} ({}) could not be scheduled: all {slots} {exam_type} slot(s) across {date_count} available date(s) are used by earlier {} subjects",
                    subject.code, subject.name, subject.department
                ),
            })
            .collect()
    }
}
