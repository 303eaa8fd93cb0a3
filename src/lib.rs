pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod exam;
pub mod frames;
pub mod hall;
pub mod planner;
pub mod repository;
pub mod seating;
pub mod student;
pub mod subject;
pub mod timetable;
pub mod validation;

pub use calendar::{ExamCalendar, ExamCalendarConfig, generate_available_dates};
pub use config::PlannerConfig;
pub use error::{PlannerError, PlannerResult};
pub use exam::{
    CycleId, CycleStatus, ExamCycle, ExamType, Holiday, OrderingMode, RunParameters, Session,
};
pub use hall::{Hall, HallId};
pub use planner::{ExamPlanner, Repositories, RunOutcome, SeatingPlan};
pub use repository::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use repository::SqliteExamStore;
pub use seating::{HallLayout, HallLayoutMapper, SeatAllocation, SeatingAllocator};
pub use student::Student;
pub use subject::{Subject, SubjectExamType};
pub use timetable::{Timetable, TimetableEntry, TimetableScheduler, Violation};
pub use validation::ValidationError;
