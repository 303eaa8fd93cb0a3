use crate::repository::PersistenceError;
use crate::validation::ValidationError;
use chrono::NaiveDate;
use std::fmt;

/// Fatal run errors. Any of these aborts a run before the repository is
/// touched. Subjects left unplaced by a short calendar are not errors; they
/// come back as `Violation`s inside a successful result.
#[derive(Debug)]
pub enum PlannerError {
    InsufficientDates {
        start: NaiveDate,
        end: NaiveDate,
    },
    InsufficientCapacity {
        required: usize,
        available: usize,
    },
    NotFound {
        kind: &'static str,
        id: String,
    },
    Validation(ValidationError),
    Persistence(PersistenceError),
}

impl PlannerError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        PlannerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InsufficientDates { start, end } => write!(
                f,
                "no usable exam dates between {start} and {end} after removing weekends and holidays"
            ),
            PlannerError::InsufficientCapacity {
                required,
                available,
            } => write!(
                f,
                "{required} students exceed the {available} seats available in the selected halls"
            ),
            PlannerError::NotFound { kind, id } => write!(f, "{kind} {id} not found"),
            PlannerError::Validation(err) => write!(f, "validation error: {err}"),
            PlannerError::Persistence(err) => write!(f, "persistence error: {err}"),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Validation(err) => Some(err),
            PlannerError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for PlannerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for PlannerError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
