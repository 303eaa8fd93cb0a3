use crate::exam::RunParameters;
use crate::hall::Hall;
use crate::student::Student;
use crate::subject::Subject;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_run_parameters(params: &RunParameters) -> Result<(), ValidationError> {
    if params.start_date > params.end_date {
        return Err(ValidationError::new(format!(
            "start date {} must be on or before end date {}",
            params.start_date, params.end_date
        )));
    }
    if params.year == 0 {
        return Err(ValidationError::new("year must be at least 1"));
    }
    if params.semester == Some(0) {
        return Err(ValidationError::new("semester must be at least 1"));
    }
    if let Some(session) = params.session {
        if !params.exam_type.allows_session(session) {
            return Err(ValidationError::new(format!(
                "session {session} is not valid for {} exams",
                params.exam_type
            )));
        }
    }
    if let Some(halls) = &params.halls {
        if halls.is_empty() {
            return Err(ValidationError::new("explicit hall list must not be empty"));
        }
        let mut seen = HashSet::with_capacity(halls.len());
        for id in halls {
            if !seen.insert(*id) {
                return Err(ValidationError::new(format!(
                    "hall {id} listed more than once"
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_subjects(subjects: &[Subject]) -> Result<(), ValidationError> {
    let mut codes = HashSet::with_capacity(subjects.len());
    for subject in subjects {
        if subject.code.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "subject '{}' has an empty code",
                subject.name
            )));
        }
        if subject.department.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "subject {} has an empty department",
                subject.code
            )));
        }
        if !codes.insert(subject.code.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate subject code {}",
                subject.code
            )));
        }
    }
    Ok(())
}

pub fn validate_hall(hall: &Hall) -> Result<(), ValidationError> {
    if hall.capacity == 0 {
        return Err(ValidationError::new(format!(
            "hall {} must have a capacity of at least 1",
            hall.number
        )));
    }
    if hall.columns == 0 || hall.rows_per_column == 0 {
        return Err(ValidationError::new(format!(
            "hall {} layout {}x{} must have at least one column and one row",
            hall.number, hall.columns, hall.rows_per_column
        )));
    }
    Ok(())
}

pub fn validate_halls(halls: &[Hall]) -> Result<(), ValidationError> {
    let mut ids = HashSet::with_capacity(halls.len());
    let mut numbers = HashSet::with_capacity(halls.len());
    for hall in halls {
        if !ids.insert(hall.id) {
            return Err(ValidationError::new(format!("duplicate hall id {}", hall.id)));
        }
        if !numbers.insert(hall.number.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate hall number {}",
                hall.number
            )));
        }
        validate_hall(hall)?;
    }
    Ok(())
}

pub fn validate_students(students: &[Student]) -> Result<(), ValidationError> {
    let mut register_numbers = HashSet::with_capacity(students.len());
    for student in students {
        if student.register_number.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "student '{}' has an empty register number",
                student.name
            )));
        }
        if student.department.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "student {} has an empty department",
                student.register_number
            )));
        }
        if !register_numbers.insert(student.register_number.as_str()) {
            return Err(ValidationError::new(format!(
                "duplicate register number {}",
                student.register_number
            )));
        }
    }
    Ok(())
}
