use super::{
    CycleRepository, HallRepository, PersistenceError, PersistenceResult, ReferenceDataWriter,
    StudentRepository, SubjectRepository,
};
use crate::exam::{CycleId, CycleStatus, ExamCycle, ExamType, Session};
use crate::hall::Hall;
use crate::seating::SeatAllocation;
use crate::student::Student;
use crate::subject::{Subject, SubjectExamType};
use crate::timetable::{TimetableEntry, Violation, ViolationKind, ViolationSeverity};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteExamStore {
    connection: Mutex<Connection>,
}

impl SqliteExamStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS subjects (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                year INTEGER NOT NULL,
                semester INTEGER,
                exam_type TEXT NOT NULL,
                active INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS halls (
                id INTEGER PRIMARY KEY,
                number TEXT NOT NULL UNIQUE,
                capacity INTEGER NOT NULL,
                columns INTEGER NOT NULL,
                rows_per_column INTEGER NOT NULL,
                active INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS students (
                register_number TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                year INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exam_cycles (
                id INTEGER PRIMARY KEY,
                exam_type TEXT NOT NULL,
                year INTEGER NOT NULL,
                semester INTEGER,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                status TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS timetable_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES exam_cycles(id) ON DELETE CASCADE,
                subject_code TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                department TEXT NOT NULL,
                date TEXT NOT NULL,
                session TEXT NOT NULL,
                UNIQUE (cycle_id, date, session, department)
            );
            CREATE TABLE IF NOT EXISTS violations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES exam_cycles(id) ON DELETE CASCADE,
                subject_code TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                department TEXT NOT NULL,
                violation_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                description TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS seat_allocations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle_id INTEGER NOT NULL REFERENCES exam_cycles(id) ON DELETE CASCADE,
                hall_id INTEGER NOT NULL,
                hall_number TEXT NOT NULL,
                seat_number INTEGER NOT NULL,
                register_number TEXT NOT NULL,
                student_name TEXT NOT NULL,
                department TEXT NOT NULL,
                is_left_seat INTEGER NOT NULL,
                UNIQUE (cycle_id, hall_id, seat_number, is_left_seat),
                UNIQUE (cycle_id, register_number)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn upsert_cycle(tx: &Transaction, cycle: &ExamCycle) -> PersistenceResult<()> {
        tx.execute(
            "INSERT INTO exam_cycles (id, exam_type, year, semester, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                exam_type = excluded.exam_type,
                year = excluded.year,
                semester = excluded.semester,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                status = excluded.status",
            params![
                cycle.id,
                cycle.exam_type.as_str(),
                cycle.year,
                cycle.semester,
                format_date(cycle.start_date),
                format_date(cycle.end_date),
                cycle.status.as_str(),
            ],
        )?;
        Ok(())
    }

    fn insert_timetable(tx: &Transaction, entries: &[TimetableEntry]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO timetable_entries (cycle_id, subject_code, subject_name, department, date, session)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.cycle_id,
                entry.subject_code,
                entry.subject_name,
                entry.department,
                format_date(entry.date),
                entry.session.as_str(),
            ])?;
        }
        Ok(())
    }

    fn insert_violations(tx: &Transaction, violations: &[Violation]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO violations (cycle_id, subject_code, subject_name, department, violation_type, severity, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for violation in violations {
            stmt.execute(params![
                violation.cycle_id,
                violation.subject_code,
                violation.subject_name,
                violation.department,
                violation.kind.as_str(),
                violation.severity.as_str(),
                violation.description,
            ])?;
        }
        Ok(())
    }

    fn insert_allocations(tx: &Transaction, allocations: &[SeatAllocation]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO seat_allocations (cycle_id, hall_id, hall_number, seat_number, register_number, student_name, department, is_left_seat)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for allocation in allocations {
            stmt.execute(params![
                allocation.cycle_id,
                allocation.hall_id,
                allocation.hall_number,
                allocation.seat_number,
                allocation.register_number,
                allocation.student_name,
                allocation.department,
                allocation.is_left_seat,
            ])?;
        }
        Ok(())
    }
}

impl ReferenceDataWriter for SqliteExamStore {
    fn replace_subjects(&self, subjects: &[Subject]) -> PersistenceResult<()> {
        super::validate_reference_subjects(subjects)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM subjects", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO subjects (code, name, department, year, semester, exam_type, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for subject in subjects {
                stmt.execute(params![
                    subject.code,
                    subject.name,
                    subject.department,
                    subject.year,
                    subject.semester,
                    subject.exam_type.as_str(),
                    subject.active,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_halls(&self, halls: &[Hall]) -> PersistenceResult<()> {
        super::validate_reference_halls(halls)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM halls", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO halls (id, number, capacity, columns, rows_per_column, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for hall in halls {
                stmt.execute(params![
                    hall.id,
                    hall.number,
                    hall.capacity,
                    hall.columns,
                    hall.rows_per_column,
                    hall.active,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_students(&self, students: &[Student]) -> PersistenceResult<()> {
        super::validate_reference_students(students)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM students", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO students (register_number, name, department, year) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for student in students {
                stmt.execute(params![
                    student.register_number,
                    student.name,
                    student.department,
                    student.year,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl SubjectRepository for SqliteExamStore {
    fn subjects(&self) -> PersistenceResult<Vec<Subject>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT code, name, department, year, semester, exam_type, active FROM subjects ORDER BY code ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Subject {
                code: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                year: row.get(3)?,
                semester: row.get(4)?,
                exam_type: parse_column::<SubjectExamType>(row, 5)?,
                active: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl HallRepository for SqliteExamStore {
    fn halls(&self) -> PersistenceResult<Vec<Hall>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, number, capacity, columns, rows_per_column, active FROM halls ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Hall {
                id: row.get(0)?,
                number: row.get(1)?,
                capacity: row.get(2)?,
                columns: row.get(3)?,
                rows_per_column: row.get(4)?,
                active: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl StudentRepository for SqliteExamStore {
    fn students(&self) -> PersistenceResult<Vec<Student>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT register_number, name, department, year FROM students ORDER BY register_number ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Student {
                register_number: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                year: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CycleRepository for SqliteExamStore {
    fn cycle(&self, id: CycleId) -> PersistenceResult<Option<ExamCycle>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, exam_type, year, semester, start_date, end_date, status FROM exam_cycles WHERE id = ?1",
        )?;
        let cycle = stmt
            .query_row(params![id], |row| {
                Ok(ExamCycle {
                    id: row.get(0)?,
                    exam_type: parse_column::<ExamType>(row, 1)?,
                    year: row.get(2)?,
                    semester: row.get(3)?,
                    start_date: date_column(row, 4)?,
                    end_date: date_column(row, 5)?,
                    status: parse_column::<CycleStatus>(row, 6)?,
                })
            })
            .optional()?;
        Ok(cycle)
    }

    fn save_cycle(&self, cycle: &ExamCycle) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        Self::upsert_cycle(&tx, cycle)?;
        tx.commit()?;
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
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        Self::upsert_cycle(&tx, cycle)?;
        tx.execute("DELETE FROM timetable_entries WHERE cycle_id = ?1", params![cycle.id])?;
        tx.execute("DELETE FROM violations WHERE cycle_id = ?1", params![cycle.id])?;
        Self::insert_timetable(&tx, entries)?;
        Self::insert_violations(&tx, violations)?;
        tx.commit()?;
        Ok(())
    }

    fn timetable(&self, id: CycleId) -> PersistenceResult<Vec<TimetableEntry>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT cycle_id, subject_code, subject_name, department, date, session
             FROM timetable_entries WHERE cycle_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok(TimetableEntry {
                cycle_id: row.get(0)?,
                subject_code: row.get(1)?,
                subject_name: row.get(2)?,
                department: row.get(3)?,
                date: date_column(row, 4)?,
                session: parse_column::<Session>(row, 5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn violations(&self, id: CycleId) -> PersistenceResult<Vec<Violation>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT cycle_id, subject_code, subject_name, department, violation_type, severity, description
             FROM violations WHERE cycle_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok(Violation {
                cycle_id: row.get(0)?,
                subject_code: row.get(1)?,
                subject_name: row.get(2)?,
                department: row.get(3)?,
                kind: parse_column::<ViolationKind>(row, 4)?,
                severity: parse_column::<ViolationSeverity>(row, 5)?,
                description: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn replace_allocations(
        &self,
        cycle: &ExamCycle,
        allocations: &[SeatAllocation],
    ) -> PersistenceResult<()> {
        super::validate_cycle_rows(cycle, allocations.iter().map(|a| a.cycle_id))?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        Self::upsert_cycle(&tx, cycle)?;
        tx.execute("DELETE FROM seat_allocations WHERE cycle_id = ?1", params![cycle.id])?;
        Self::insert_allocations(&tx, allocations)?;
        tx.commit()?;
        Ok(())
    }

    fn allocations(&self, id: CycleId) -> PersistenceResult<Vec<SeatAllocation>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT cycle_id, hall_id, hall_number, seat_number, register_number, student_name, department, is_left_seat
             FROM seat_allocations WHERE cycle_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok(SeatAllocation {
                cycle_id: row.get(0)?,
                hall_id: row.get(1)?,
                hall_number: row.get(2)?,
                seat_number: row.get(3)?,
                register_number: row.get(4)?,
                student_name: row.get(5)?,
                department: row.get(6)?,
                is_left_seat: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text: String = row.get(idx)?;
    text.parse::<T>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(PersistenceError::InvalidData(err.to_string())),
        )
    })
}
