use crate::calendar::ExamCalendar;
use crate::config::PlannerConfig;
use crate::conflict::{Clash, ConflictGraph};
use crate::error::{PlannerError, PlannerResult};
use crate::exam::{CycleId, CycleStatus, ExamCycle, RunParameters};
use crate::hall::{Hall, HallId};
use crate::repository::{CycleRepository, HallRepository, StudentRepository, SubjectRepository};
use crate::seating::{
    DepartmentSummary, HallLayout, HallLayoutMapper, HallSummary, PlacementPolicy, SeatAllocation,
    SeatingAllocator, department_summaries, hall_summaries,
};
use crate::student::Student;
use crate::subject::Subject;
use crate::timetable::{Timetable, TimetableEntry, TimetableScheduler};
use crate::validation::{self, ValidationError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_INVIGILATOR_RATIO: u32 = 30;

/// Constructor-injected data access. Reference data is only read.
#[derive(Clone, Copy)]
pub struct Repositories<'a> {
    pub subjects: &'a dyn SubjectRepository,
    pub halls: &'a dyn HallRepository,
    pub students: &'a dyn StudentRepository,
    pub cycles: &'a dyn CycleRepository,
}

impl<'a> Repositories<'a> {
    pub fn new(
        subjects: &'a dyn SubjectRepository,
        halls: &'a dyn HallRepository,
        students: &'a dyn StudentRepository,
        cycles: &'a dyn CycleRepository,
    ) -> Self {
        Self {
            subjects,
            halls,
            students,
            cycles,
        }
    }

    /// All four repositories served by one store.
    pub fn from_store<S>(store: &'a S) -> Self
    where
        S: SubjectRepository + HallRepository + StudentRepository + CycleRepository,
    {
        Self::new(store, store, store, store)
    }
}

/// Advisory lock per cycle id. Runs against one cycle are serialized; runs
/// against different cycles proceed independently. An entry lives only while
/// some run holds or waits on it.
#[derive(Default)]
pub struct CycleLocks {
    locks: Mutex<HashMap<CycleId, Arc<Mutex<()>>>>,
}

impl CycleLocks {
    pub fn handle(&self, cycle_id: CycleId) -> Arc<Mutex<()>> {
        self.locks.lock().entry(cycle_id).or_default().clone()
    }

    /// Gives back a handle from `handle`, removing the entry when no other
    /// run still references it.
    pub fn release(&self, cycle_id: CycleId, handle: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        drop(handle);
        if locks
            .get(&cycle_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&cycle_id);
        }
    }

    /// Runs `f` while holding the lock of `cycle_id`.
    pub fn with_cycle<T>(&self, cycle_id: CycleId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(cycle_id);
        let result = {
            let _guard = handle.lock();
            f()
        };
        self.release(cycle_id, handle);
        result
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Distinguishes "did work" from "nothing to do". `Empty` runs never touch the
/// repository.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Completed(T),
    Empty { reason: String },
}

impl<T> RunOutcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, RunOutcome::Empty { .. })
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            RunOutcome::Empty { .. } => None,
        }
    }

    pub fn into_completed(self) -> Option<T> {
        match self {
            RunOutcome::Completed(value) => Some(value),
            RunOutcome::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeatingPlan {
    pub policy: PlacementPolicy,
    pub allocations: Vec<SeatAllocation>,
    pub hall_summaries: Vec<HallSummary>,
    pub department_summaries: Vec<DepartmentSummary>,
}

pub struct ExamPlanner<'a> {
    repos: Repositories<'a>,
    locks: CycleLocks,
    invigilator_ratio: u32,
    calendar: ExamCalendar,
}

impl<'a> ExamPlanner<'a> {
    pub fn new(repos: Repositories<'a>) -> Self {
        Self {
            repos,
            locks: CycleLocks::default(),
            invigilator_ratio: DEFAULT_INVIGILATOR_RATIO,
            calendar: ExamCalendar::default(),
        }
    }

    pub fn with_config(repos: Repositories<'a>, config: &PlannerConfig) -> Result<Self, ValidationError> {
        let mut planner = Self::new(repos).with_invigilator_ratio(config.invigilator_ratio);
        if let Some(calendar) = &config.calendar {
            planner.calendar = ExamCalendar::from_config(calendar)?;
        }
        Ok(planner)
    }

    pub fn with_invigilator_ratio(mut self, ratio: u32) -> Self {
        self.invigilator_ratio = ratio.max(1);
        self
    }

    pub fn with_calendar(mut self, calendar: ExamCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn calendar(&self) -> &ExamCalendar {
        &self.calendar
    }

    /// Schedules every subject of the cycle and replaces the cycle's timetable
    /// and violations. Unplaced subjects come back as violations, not errors.
    pub fn run_timetable(&self, params: &RunParameters) -> PlannerResult<RunOutcome<Timetable>> {
        validation::validate_run_parameters(params)?;
        self.locks
            .with_cycle(params.cycle_id, || self.timetable_locked(params))
    }

    /// Seats every student of the cycle's year and replaces the cycle's
    /// allocations.
    pub fn run_seating(&self, params: &RunParameters) -> PlannerResult<RunOutcome<SeatingPlan>> {
        validation::validate_run_parameters(params)?;
        self.locks
            .with_cycle(params.cycle_id, || self.seating_locked(params))
    }

    /// Number of cycles with a run in progress or waiting.
    pub fn active_cycle_locks(&self) -> usize {
        self.locks.len()
    }

    fn timetable_locked(&self, params: &RunParameters) -> PlannerResult<RunOutcome<Timetable>> {
        let mut cycle = self.resolve_cycle(params)?;
        let subjects = self.select_subjects(&cycle)?;

        let mut calendar = self.calendar.clone();
        calendar.add_holidays(params.holiday_dates());
        let dates = calendar.available_dates(params.start_date, params.end_date)?;

        if subjects.is_empty() {
            log::info!(
                "cycle {}: no {} subjects for year {}, timetable left untouched",
                cycle.id,
                cycle.exam_type,
                cycle.year
            );
            return Ok(RunOutcome::Empty {
                reason: format!(
                    "no active {} subjects for year {}",
                    cycle.exam_type, cycle.year
                ),
            });
        }

        let timetable = TimetableScheduler::new(cycle.id).schedule(&subjects, &dates, cycle.exam_type);
        cycle.status = CycleStatus::Complete;
        self.repos
            .cycles
            .replace_timetable(&cycle, &timetable.entries, &timetable.violations)?;

        log::info!(
            "cycle {}: timetable {}",
            cycle.id,
            timetable.summary().to_cli_summary()
        );
        Ok(RunOutcome::Completed(timetable))
    }

    fn seating_locked(&self, params: &RunParameters) -> PlannerResult<RunOutcome<SeatingPlan>> {
        let cycle = self.resolve_cycle(params)?;
        let halls = self.select_halls(params.halls.as_deref())?;
        let students = self.select_students(&cycle)?;

        if students.is_empty() {
            log::info!(
                "cycle {}: no students in year {}, seating left untouched",
                cycle.id,
                cycle.year
            );
            return Ok(RunOutcome::Empty {
                reason: format!("no students in year {}", cycle.year),
            });
        }

        let allocator = SeatingAllocator::new(cycle.id, cycle.exam_type, params.ordering);
        let allocations = allocator.allocate(&students, &halls)?;
        let hall_summaries =
            hall_summaries(&allocations, &halls, cycle.exam_type, self.invigilator_ratio);
        let department_summaries = department_summaries(&allocations);
        self.repos.cycles.replace_allocations(&cycle, &allocations)?;

        log::info!(
            "cycle {}: seated {} students in {} hall(s) using {}",
            cycle.id,
            allocations.len(),
            hall_summaries.len(),
            allocator.policy().label()
        );
        Ok(RunOutcome::Completed(SeatingPlan {
            policy: allocator.policy(),
            allocations,
            hall_summaries,
            department_summaries,
        }))
    }

    pub fn timetable(&self, cycle_id: CycleId) -> PlannerResult<Timetable> {
        self.require_cycle(cycle_id)?;
        Ok(Timetable {
            entries: self.repos.cycles.timetable(cycle_id)?,
            violations: self.repos.cycles.violations(cycle_id)?,
        })
    }

    pub fn allocations(&self, cycle_id: CycleId) -> PlannerResult<Vec<SeatAllocation>> {
        self.require_cycle(cycle_id)?;
        Ok(self.repos.cycles.allocations(cycle_id)?)
    }

    /// Occupancy of the stored allocations, recomputed on every call.
    pub fn hall_summaries(&self, cycle_id: CycleId) -> PlannerResult<Vec<HallSummary>> {
        let cycle = self.require_cycle(cycle_id)?;
        let allocations = self.repos.cycles.allocations(cycle_id)?;
        let mut halls = self.repos.halls.halls()?;
        halls.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(hall_summaries(
            &allocations,
            &halls,
            cycle.exam_type,
            self.invigilator_ratio,
        ))
    }

    pub fn hall_layout(&self, cycle_id: CycleId, hall_id: HallId) -> PlannerResult<HallLayout> {
        let cycle = self.require_cycle(cycle_id)?;
        let hall = self
            .repos
            .halls
            .hall(hall_id)?
            .ok_or_else(|| PlannerError::not_found("hall", hall_id))?;
        let allocations = self.repos.cycles.allocations(cycle_id)?;
        Ok(HallLayoutMapper::new(cycle.exam_type).map(&allocations, &hall))
    }

    /// Where one student sits in a cycle. Unknown register numbers and
    /// students without a seat are both `NotFound`.
    pub fn student_seat(
        &self,
        cycle_id: CycleId,
        register_number: &str,
    ) -> PlannerResult<SeatAllocation> {
        self.require_cycle(cycle_id)?;
        let student = self
            .repos
            .students
            .student(register_number)?
            .ok_or_else(|| PlannerError::not_found("student", register_number))?;
        self.repos
            .cycles
            .allocations(cycle_id)?
            .into_iter()
            .find(|a| a.register_number == student.register_number)
            .ok_or_else(|| PlannerError::not_found("seat for student", register_number))
    }

    /// The slot of one subject, or `None` when the subject was left unplaced
    /// (it is then listed among the violations).
    pub fn subject_slot(
        &self,
        cycle_id: CycleId,
        code: &str,
    ) -> PlannerResult<Option<TimetableEntry>> {
        self.require_cycle(cycle_id)?;
        let subject = self
            .repos
            .subjects
            .subject(code)?
            .ok_or_else(|| PlannerError::not_found("subject", code))?;
        Ok(self
            .repos
            .cycles
            .timetable(cycle_id)?
            .into_iter()
            .find(|e| e.subject_code == subject.code))
    }

    /// Same-day pairs of subjects that share students. Advisory only.
    pub fn conflict_report(&self, cycle_id: CycleId) -> PlannerResult<Vec<Clash>> {
        let cycle = self.require_cycle(cycle_id)?;
        let subjects = self.select_subjects(&cycle)?;
        let entries = self.repos.cycles.timetable(cycle_id)?;
        let clashes = ConflictGraph::build(&subjects).clashes(&entries);
        if !clashes.is_empty() {
            log::debug!("cycle {}: {} same-day clash(es)", cycle_id, clashes.len());
        }
        Ok(clashes)
    }

    fn require_cycle(&self, cycle_id: CycleId) -> PlannerResult<ExamCycle> {
        self.repos
            .cycles
            .cycle(cycle_id)?
            .ok_or_else(|| PlannerError::not_found("cycle", cycle_id))
    }

    /// The stored cycle refreshed with this run's window, or a new PENDING
    /// cycle. Nothing is written here.
    fn resolve_cycle(&self, params: &RunParameters) -> PlannerResult<ExamCycle> {
        let Some(existing) = self.repos.cycles.cycle(params.cycle_id)? else {
            return Ok(ExamCycle::from_parameters(params));
        };
        if existing.exam_type != params.exam_type || existing.year != params.year {
            return Err(ValidationError::new(format!(
                "cycle {} is a {} cycle for year {}, not {} for year {}",
                existing.id, existing.exam_type, existing.year, params.exam_type, params.year
            ))
            .into());
        }
        let mut cycle = ExamCycle::from_parameters(params);
        cycle.status = existing.status;
        Ok(cycle)
    }

    fn select_subjects(&self, cycle: &ExamCycle) -> PlannerResult<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self
            .repos
            .subjects
            .subjects()?
            .into_iter()
            .filter(|s| s.is_examined_in(cycle.exam_type, cycle.year, cycle.semester))
            .collect();
        subjects.sort_by(|a, b| a.code.cmp(&b.code));
        validation::validate_subjects(&subjects)?;
        Ok(subjects)
    }

    fn select_students(&self, cycle: &ExamCycle) -> PlannerResult<Vec<Student>> {
        let students: Vec<Student> = self
            .repos
            .students
            .students()?
            .into_iter()
            .filter(|s| s.year == cycle.year)
            .collect();
        validation::validate_students(&students)?;
        Ok(students)
    }

    /// Active halls ordered by hall number, or the requested subset in the
    /// same order.
    fn select_halls(&self, requested: Option<&[HallId]>) -> PlannerResult<Vec<Hall>> {
        let all = self.repos.halls.halls()?;
        let mut halls = match requested {
            None => all.into_iter().filter(|h| h.active).collect::<Vec<_>>(),
            Some(ids) => {
                let mut picked = Vec::with_capacity(ids.len());
                for id in ids {
                    let hall = all
                        .iter()
                        .find(|h| h.id == *id)
                        .ok_or_else(|| PlannerError::not_found("hall", id))?;
                    if !hall.active {
                        return Err(ValidationError::new(format!(
                            "hall {} is not active",
                            hall.number
                        ))
                        .into());
                    }
                    picked.push(hall.clone());
                }
                picked
            }
        };
        halls.sort_by(|a, b| a.number.cmp(&b.number));
        validation::validate_halls(&halls)?;
        Ok(halls)
    }
}
