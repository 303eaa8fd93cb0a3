pub mod file;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExamStore;

use crate::exam::{CycleId, ExamCycle};
use crate::hall::{Hall, HallId};
use crate::seating::SeatAllocation;
use crate::student::Student;
use crate::subject::Subject;
use crate::timetable::{TimetableEntry, Violation};
use crate::validation::{self, ValidationError};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
    NotFound(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            PersistenceError::NotFound(what) => write!(f, "{what} not stored"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<ValidationError> for PersistenceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait SubjectRepository: Send + Sync {
    fn subjects(&self) -> PersistenceResult<Vec<Subject>>;

    fn subject(&self, code: &str) -> PersistenceResult<Option<Subject>> {
        Ok(self.subjects()?.into_iter().find(|s| s.code == code))
    }
}

pub trait HallRepository: Send + Sync {
    fn halls(&self) -> PersistenceResult<Vec<Hall>>;

    fn hall(&self, id: HallId) -> PersistenceResult<Option<Hall>> {
        Ok(self.halls()?.into_iter().find(|h| h.id == id))
    }
}

pub trait StudentRepository: Send + Sync {
    fn students(&self) -> PersistenceResult<Vec<Student>>;

    fn student(&self, register_number: &str) -> PersistenceResult<Option<Student>> {
        Ok(self
            .students()?
            .into_iter()
            .find(|s| s.register_number == register_number))
    }
}

/// Cycle-owned output. The `replace_*` methods upsert the cycle and swap its
/// rows in one atomic step: either every old row is gone and every new row is
/// present, or nothing changed.
pub trait CycleRepository: Send + Sync {
    fn cycle(&self, id: CycleId) -> PersistenceResult<Option<ExamCycle>>;
    fn save_cycle(&self, cycle: &ExamCycle) -> PersistenceResult<()>;

    fn replace_timetable(
        &self,
        cycle: &ExamCycle,
        entries: &[TimetableEntry],
        violations: &[Violation],
    ) -> PersistenceResult<()>;
    fn timetable(&self, id: CycleId) -> PersistenceResult<Vec<TimetableEntry>>;
    fn violations(&self, id: CycleId) -> PersistenceResult<Vec<Violation>>;

    fn replace_allocations(
        &self,
        cycle: &ExamCycle,
        allocations: &[SeatAllocation],
    ) -> PersistenceResult<()>;
    fn allocations(&self, id: CycleId) -> PersistenceResult<Vec<SeatAllocation>>;
}

/// Loader side of the reference data, used by ingestion and test setup.
/// Each call replaces the whole collection after validating it.
pub trait ReferenceDataWriter {
    fn replace_subjects(&self, subjects: &[Subject]) -> PersistenceResult<()>;
    fn replace_halls(&self, halls: &[Hall]) -> PersistenceResult<()>;
    fn replace_students(&self, students: &[Student]) -> PersistenceResult<()>;
}

pub(crate) fn validate_reference_subjects(subjects: &[Subject]) -> PersistenceResult<()> {
    validation::validate_subjects(subjects)?;
    Ok(())
}

pub(crate) fn validate_reference_halls(halls: &[Hall]) -> PersistenceResult<()> {
    validation::validate_halls(halls)?;
    Ok(())
}

pub(crate) fn validate_reference_students(students: &[Student]) -> PersistenceResult<()> {
    validation::validate_students(students)?;
    Ok(())
}

/// Rows handed to `replace_*` must all belong to the cycle being replaced.
pub(crate) fn validate_cycle_rows<I>(cycle: &ExamCycle, row_cycles: I) -> PersistenceResult<()>
where
    I: IntoIterator<Item = CycleId>,
{
    if let Some(other) = row_cycles.into_iter().find(|id| *id != cycle.id) {
        return Err(PersistenceError::InvalidData(format!(
            "row for cycle {other} passed to replace of cycle {}",
            cycle.id
        )));
    }
    Ok(())
}
