use crate::exam::ExamType;
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which exam formats a subject is examined in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectExamType {
    Sem,
    Internal,
    #[default]
    Both,
}

impl SubjectExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectExamType::Sem => "SEM",
            SubjectExamType::Internal => "INTERNAL",
            SubjectExamType::Both => "BOTH",
        }
    }

    pub fn covers(&self, exam_type: ExamType) -> bool {
        match self {
            SubjectExamType::Both => true,
            SubjectExamType::Sem => exam_type == ExamType::Sem,
            SubjectExamType::Internal => exam_type == ExamType::Internal,
        }
    }
}

impl FromStr for SubjectExamType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match raw.to_ascii_uppercase().as_str() {
            "SEM" | "SEMESTER" => Ok(SubjectExamType::Sem),
            "INTERNAL" => Ok(SubjectExamType::Internal),
            "BOTH" | "" => Ok(SubjectExamType::Both),
            _ => Err(ValidationError::new(format!(
                "unrecognized subject exam type '{raw}'"
            ))),
        }
    }
}

/// Reference data: one examinable subject. `code` is unique within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    pub name: String,
    pub department: String,
    pub year: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(default)]
    pub exam_type: SubjectExamType,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Subject {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
        year: u8,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            department: department.into(),
            year,
            semester: None,
            exam_type: SubjectExamType::Both,
            active: true,
        }
    }

    pub fn with_semester(mut self, semester: u8) -> Self {
        self.semester = Some(semester);
        self
    }

    pub fn with_exam_type(mut self, exam_type: SubjectExamType) -> Self {
        self.exam_type = exam_type;
        self
    }

    /// True when the subject belongs in a cycle for this year/semester/exam type.
    /// A missing semester on either side matches any semester.
    pub fn is_examined_in(&self, exam_type: ExamType, year: u8, semester: Option<u8>) -> bool {
        if !self.active || self.year != year || !self.exam_type.covers(exam_type) {
            return false;
        }
        match (semester, self.semester) {
            (Some(wanted), Some(own)) => wanted == own,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subject_exam_type_is_reported_as_typed() {
        assert_eq!("both".parse::<SubjectExamType>().unwrap(), SubjectExamType::Both);
        let err = "Final".parse::<SubjectExamType>().unwrap_err();
        assert!(err.to_string().contains("'Final'"));
    }

    #[test]
    fn selection_respects_year_semester_and_exam_type() {
        let subject = Subject::new("CS301", "Data Structures", "CSE", 2)
            .with_semester(3)
            .with_exam_type(SubjectExamType::Sem);
        assert!(subject.is_examined_in(ExamType::Sem, 2, Some(3)));
        assert!(subject.is_examined_in(ExamType::Sem, 2, None));
        assert!(!subject.is_examined_in(ExamType::Sem, 2, Some(4)));
        assert!(!subject.is_examined_in(ExamType::Internal, 2, Some(3)));
        assert!(!subject.is_examined_in(ExamType::Sem, 3, Some(3)));
    }

    #[test]
    fn inactive_subjects_are_never_examined() {
        let mut subject = Subject::new("EC201", "Signals", "ECE", 2);
        subject.active = false;
        assert!(!subject.is_examined_in(ExamType::Internal, 2, None));
    }
}
