use super::{
    CycleRepository, HallRepository, PersistenceResult, ReferenceDataWriter, StudentRepository,
    SubjectRepository,
};
use crate::exam::{CycleId, ExamCycle};
use crate::hall::Hall;
use crate::seating::SeatAllocation;
use crate::student::Student;
use crate::subject::Subject;
use crate::timetable::{TimetableEntry, Violation};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct CycleRows {
    cycle: Option<ExamCycle>,
    timetable: Vec<TimetableEntry>,
    violations: Vec<Violation>,
    allocations: Vec<SeatAllocation>,
}

/// Process-local store for all four repositories. Each replace swaps a cycle's
/// rows under one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    subjects: RwLock<Vec<Subject>>,
    halls: RwLock<Vec<Hall>>,
    students: RwLock<Vec<Student>>,
    cycles: RwLock<HashMap<CycleId, CycleRows>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_data(
        subjects: Vec<Subject>,
        halls: Vec<Hall>,
        students: Vec<Student>,
    ) -> PersistenceResult<Self> {
        let store = Self::new();
        store.replace_subjects(&subjects)?;
        store.replace_halls(&halls)?;
        store.replace_students(&students)?;
        Ok(store)
    }

    pub fn cycle_ids(&self) -> Vec<CycleId> {
        let mut ids: Vec<CycleId> = self
            .cycles
            .read()
            .iter()
            .filter(|(_, rows)| rows.cycle.is_some())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

impl ReferenceDataWriter for InMemoryStore {
    fn replace_subjects(&self, subjects: &[Subject]) -> PersistenceResult<()> {
        super::validate_reference_subjects(subjects)?;
        *self.subjects.write() = subjects.to_vec();
        Ok(())
    }

    fn replace_halls(&self, halls: &[Hall]) -> PersistenceResult<()> {
        super::validate_reference_halls(halls)?;
        *self.halls.write() = halls.to_vec();
        Ok(())
    }

    fn replace_students(&self, students: &[Student]) -> PersistenceResult<()> {
        super::validate_reference_students(students)?;
        *self.students.write() = students.to_vec();
        Ok(())
    }
}

impl SubjectRepository for InMemoryStore {
    fn subjects(&self) -> PersistenceResult<Vec<Subject>> {
        Ok(self.subjects.read().clone())
    }
}

impl HallRepository for InMemoryStore {
    fn halls(&self) -> PersistenceResult<Vec<Hall>> {
        Ok(self.halls.read().clone())
    }
}

impl StudentRepository for InMemoryStore {
    fn students(&self) -> PersistenceResult<Vec<Student>> {
        Ok(self.students.read().clone())
    }
}

impl CycleRepository for InMemoryStore {
    fn cycle(&self, id: CycleId) -> PersistenceResult<Option<ExamCycle>> {
        Ok(self.cycles.read().get(&id).and_then(|rows| rows.cycle.clone()))
    }

    fn save_cycle(&self, cycle: &ExamCycle) -> PersistenceResult<()> {
        self.cycles.write().entry(cycle.id).or_default().cycle = Some(cycle.clone());
        Ok(())
    }

    fn replace_timetable(
        &self,
        cycle: &ExamCycle,
        entries: &[TimetableEntry],
        violations: &[Violation],
    ) -> PersistenceResult<()> {
        super::validate_cycle_rows(
            cycle,
            entries
                .iter()
                .map(|e| e.cycle_id)
                .chain(violations.iter().map(|v| v.cycle_id)),
        )?;
        let mut cycles = self.cycles.write();
        let rows = cycles.entry(cycle.id).or_default();
        rows.cycle = Some(cycle.clone());
        rows.timetable = entries.to_vec();
        rows.violations = violations.to_vec();
        Ok(())
    }

    fn timetable(&self, id: CycleId) -> PersistenceResult<Vec<TimetableEntry>> {
        Ok(self
            .cycles
            .read()
            .get(&id)
            .map(|rows| rows.timetable.clone())
            .unwrap_or_default())
    }

    fn violations(&self, id: CycleId) -> PersistenceResult<Vec<Violation>> {
        Ok(self
            .cycles
            .read()
            .get(&id)
            .map(|rows| rows.violations.clone())
            .unwrap_or_default())
    }

    fn replace_allocations(
        &self,
        cycle: &ExamCycle,
        allocations: &[SeatAllocation],
    ) -> PersistenceResult<()> {
        super::validate_cycle_rows(cycle, allocations.iter().map(|a| a.cycle_id))?;
        let mut cycles = self.cycles.write();
        let rows = cycles.entry(cycle.id).or_default();
        rows.cycle = Some(cycle.clone());
        rows.allocations = allocations.to_vec();
        Ok(())
    }

    fn allocations(&self, id: CycleId) -> PersistenceResult<Vec<SeatAllocation>> {
        Ok(self
            .cycles
            .read()
            .get(&id)
            .map(|rows| rows.allocations.clone())
            .unwrap_or_default())
    }
}
