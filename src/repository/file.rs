use super::{CycleRepository, PersistenceError, PersistenceResult};
use crate::exam::{CycleId, ExamCycle, Holiday};
use crate::hall::{DEFAULT_COLUMNS, DEFAULT_ROWS_PER_COLUMN, Hall, HallId};
use crate::seating::SeatAllocation;
use crate::student::Student;
use crate::subject::{Subject, SubjectExamType};
use crate::timetable::{Timetable, TimetableEntry, Violation};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const SUBJECT_ALIASES: &[(&str, &str)] = &[
    ("subject_code", "code"),
    ("subjectcode", "code"),
    ("course_code", "code"),
    ("subject_name", "name"),
    ("subjectname", "name"),
    ("title", "name"),
    ("dept", "department"),
    ("branch", "department"),
    ("sem", "semester"),
    ("type", "exam_type"),
    ("examtype", "exam_type"),
    ("is_active", "active"),
];

const HALL_ALIASES: &[(&str, &str)] = &[
    ("hall_id", "id"),
    ("hallid", "id"),
    ("hallno", "number"),
    ("hall_no", "number"),
    ("hall_number", "number"),
    ("hall", "number"),
    ("room", "number"),
    ("seats", "capacity"),
    ("cols", "columns"),
    ("rows", "rows_per_column"),
    ("rowspercolumn", "rows_per_column"),
    ("is_active", "active"),
];

const STUDENT_ALIASES: &[(&str, &str)] = &[
    ("register_no", "register_number"),
    ("registerno", "register_number"),
    ("reg_no", "register_number"),
    ("regno", "register_number"),
    ("roll_number", "register_number"),
    ("roll_no", "register_number"),
    ("rollno", "register_number"),
    ("student_name", "name"),
    ("dept", "department"),
    ("branch", "department"),
];

const HOLIDAY_ALIASES: &[(&str, &str)] = &[
    ("holiday_date", "date"),
    ("holiday", "date"),
    ("description", "reason"),
    ("name", "reason"),
    ("occasion", "reason"),
];

const HOLIDAY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y"];

/// Canonical snake_case form of a header cell: `Register Number`,
/// `registerNumber` and `register-number` all become `register_number`.
pub fn canonical_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
            prev_lower = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn normalize_headers(headers: &StringRecord, aliases: &[(&str, &str)]) -> StringRecord {
    headers
        .iter()
        .map(|raw| {
            let key = canonical_header(raw);
            aliases
                .iter()
                .find(|(alias, _)| *alias == key)
                .map(|(_, canonical)| (*canonical).to_string())
                .unwrap_or(key)
        })
        .collect()
}

fn read_records<T, R>(reader: R, aliases: &[(&str, &str)]) -> PersistenceResult<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = normalize_headers(reader.headers()?, aliases);
    reader.set_headers(headers);
    let mut records = Vec::new();
    for record in reader.deserialize::<T>() {
        records.push(record?);
    }
    Ok(records)
}

#[derive(Deserialize)]
struct SubjectCsvRecord {
    code: String,
    name: String,
    department: String,
    year: u8,
    #[serde(default)]
    semester: Option<u8>,
    #[serde(default)]
    exam_type: Option<String>,
    #[serde(default)]
    active: Option<String>,
}

impl SubjectCsvRecord {
    fn into_subject(self) -> PersistenceResult<Subject> {
        let exam_type = match self.exam_type.as_deref() {
            Some(raw) => raw.parse::<SubjectExamType>()?,
            None => SubjectExamType::default(),
        };
        Ok(Subject {
            code: self.code,
            name: self.name,
            department: self.department,
            year: self.year,
            semester: self.semester,
            exam_type,
            active: parse_flag(self.active.as_deref())?,
        })
    }
}

#[derive(Deserialize)]
struct HallCsvRecord {
    id: HallId,
    number: String,
    capacity: u32,
    #[serde(default)]
    columns: Option<u32>,
    #[serde(default)]
    rows_per_column: Option<u32>,
    #[serde(default)]
    active: Option<String>,
}

impl HallCsvRecord {
    fn into_hall(self) -> PersistenceResult<Hall> {
        Ok(Hall {
            id: self.id,
            number: self.number,
            capacity: self.capacity,
            columns: self.columns.unwrap_or(DEFAULT_COLUMNS),
            rows_per_column: self.rows_per_column.unwrap_or(DEFAULT_ROWS_PER_COLUMN),
            active: parse_flag(self.active.as_deref())?,
        })
    }
}

#[derive(Deserialize)]
struct StudentCsvRecord {
    register_number: String,
    #[serde(default)]
    name: String,
    department: String,
    year: u8,
}

#[derive(Deserialize)]
struct HolidayCsvRecord {
    date: String,
    #[serde(default)]
    reason: String,
}

pub fn load_subjects_from_reader<R: Read>(reader: R) -> PersistenceResult<Vec<Subject>> {
    let records: Vec<SubjectCsvRecord> = read_records(reader, SUBJECT_ALIASES)?;
    let subjects = records
        .into_iter()
        .map(SubjectCsvRecord::into_subject)
        .collect::<PersistenceResult<Vec<_>>>()?;
    super::validate_reference_subjects(&subjects)?;
    Ok(subjects)
}

pub fn load_halls_from_reader<R: Read>(reader: R) -> PersistenceResult<Vec<Hall>> {
    let records: Vec<HallCsvRecord> = read_records(reader, HALL_ALIASES)?;
    let halls = records
        .into_iter()
        .map(HallCsvRecord::into_hall)
        .collect::<PersistenceResult<Vec<_>>>()?;
    super::validate_reference_halls(&halls)?;
    Ok(halls)
}

pub fn load_students_from_reader<R: Read>(reader: R) -> PersistenceResult<Vec<Student>> {
    let records: Vec<StudentCsvRecord> = read_records(reader, STUDENT_ALIASES)?;
    let students: Vec<Student> = records
        .into_iter()
        .map(|r| Student::new(r.register_number, r.name, r.department, r.year))
        .collect();
    super::validate_reference_students(&students)?;
    Ok(students)
}

pub fn load_holidays_from_reader<R: Read>(reader: R) -> PersistenceResult<Vec<Holiday>> {
    let records: Vec<HolidayCsvRecord> = read_records(reader, HOLIDAY_ALIASES)?;
    records
        .into_iter()
        .map(|r| -> PersistenceResult<Holiday> {
            Ok(Holiday::new(parse_holiday_date(&r.date)?, r.reason))
        })
        .collect()
}

pub fn load_subjects_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Subject>> {
    load_subjects_from_reader(File::open(path)?)
}

pub fn load_halls_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Hall>> {
    load_halls_from_reader(File::open(path)?)
}

pub fn load_students_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Student>> {
    load_students_from_reader(File::open(path)?)
}

pub fn load_holidays_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Holiday>> {
    load_holidays_from_reader(File::open(path)?)
}

#[derive(Serialize)]
struct TimetableCsvRecord<'a> {
    date: String,
    day: String,
    session: &'a str,
    time_start: &'a str,
    time_end: &'a str,
    department: &'a str,
    subject_code: &'a str,
    subject_name: &'a str,
}

impl<'a> From<&'a TimetableEntry> for TimetableCsvRecord<'a> {
    fn from(entry: &'a TimetableEntry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            day: entry.date.format("%A").to_string(),
            session: entry.session.as_str(),
            time_start: entry.time_start(),
            time_end: entry.time_end(),
            department: &entry.department,
            subject_code: &entry.subject_code,
            subject_name: &entry.subject_name,
        }
    }
}

#[derive(Serialize)]
struct AllocationCsvRecord<'a> {
    hall_number: &'a str,
    seat_number: u32,
    side: &'a str,
    register_number: &'a str,
    student_name: &'a str,
    department: &'a str,
}

pub fn save_timetable_to_csv<P: AsRef<Path>>(
    entries: &[TimetableEntry],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in entries {
        writer.serialize(TimetableCsvRecord::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

/// `side` is `L`/`R` for bench seating and empty otherwise.
pub fn save_allocations_to_csv<P: AsRef<Path>>(
    allocations: &[SeatAllocation],
    bench_paired: bool,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for allocation in allocations {
        let side = match (bench_paired, allocation.is_left_seat) {
            (false, _) => "",
            (true, true) => "L",
            (true, false) => "R",
        };
        writer.serialize(AllocationCsvRecord {
            hall_number: &allocation.hall_number,
            seat_number: allocation.seat_number,
            side,
            register_number: &allocation.register_number,
            student_name: &allocation.student_name,
            department: &allocation.department,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_timetable_to_json<P: AsRef<Path>>(timetable: &Timetable, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, timetable)?;
    Ok(())
}

pub fn save_allocations_to_json<P: AsRef<Path>>(
    allocations: &[SeatAllocation],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, allocations)?;
    Ok(())
}

/// Everything a cycle owns, as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub cycle: ExamCycle,
    #[serde(default)]
    pub timetable: Vec<TimetableEntry>,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub allocations: Vec<SeatAllocation>,
}

impl CycleSnapshot {
    pub fn capture<R>(repository: &R, cycle_id: CycleId) -> PersistenceResult<Self>
    where
        R: CycleRepository + ?Sized,
    {
        let cycle = repository
            .cycle(cycle_id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("cycle {cycle_id}")))?;
        Ok(Self {
            cycle,
            timetable: repository.timetable(cycle_id)?,
            violations: repository.violations(cycle_id)?,
            allocations: repository.allocations(cycle_id)?,
        })
    }

    /// Writes the snapshot back, replacing whatever the repository holds for
    /// the cycle.
    pub fn restore<R>(&self, repository: &R) -> PersistenceResult<()>
    where
        R: CycleRepository + ?Sized,
    {
        repository.replace_timetable(&self.cycle, &self.timetable, &self.violations)?;
        repository.replace_allocations(&self.cycle, &self.allocations)?;
        Ok(())
    }
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &CycleSnapshot,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<CycleSnapshot> {
    let file = File::open(path)?;
    let snapshot: CycleSnapshot = serde_json::from_reader(file)?;
    super::validate_cycle_rows(
        &snapshot.cycle,
        snapshot
            .timetable
            .iter()
            .map(|e| e.cycle_id)
            .chain(snapshot.violations.iter().map(|v| v.cycle_id))
            .chain(snapshot.allocations.iter().map(|a| a.cycle_id)),
    )?;
    Ok(snapshot)
}

fn parse_flag(input: Option<&str>) -> PersistenceResult<bool> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(true);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn parse_holiday_date(input: &str) -> PersistenceResult<NaiveDate> {
    let trimmed = input.trim();
    HOLIDAY_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| PersistenceError::InvalidData(format!("invalid date '{input}'")))
}
