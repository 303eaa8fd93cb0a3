use chrono::NaiveDate;
use exam_planner::repository::file::{
    CycleSnapshot, load_halls_from_reader, load_holidays_from_reader, load_snapshot_from_json,
    load_students_from_csv, load_students_from_reader, load_subjects_from_reader,
    save_allocations_to_csv, save_snapshot_to_json, save_timetable_to_csv,
};
use exam_planner::repository::{CycleRepository, PersistenceError};
use exam_planner::{
    ExamPlanner, ExamType, Hall, InMemoryStore, Repositories, RunParameters, Student, Subject,
    SubjectExamType,
};
use std::io::Write;
use tempfile::{NamedTempFile, tempdir};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn student_headers_accept_common_spellings() {
    for header in ["Register Number", "regno", "registerNo", "Roll No", "register_number"] {
        let text = format!("{header},Name,Dept,Year\nCSE001,Asha,CSE,2\nECE001,Ravi,ECE,2\n");
        let students = load_students_from_reader(text.as_bytes()).unwrap();
        assert_eq!(students.len(), 2, "header {header}");
        assert_eq!(students[0].register_number, "CSE001");
        assert_eq!(students[1].department, "ECE");
    }
}

#[test]
fn hall_headers_and_optional_columns() {
    let text = "Hall ID,hallNo,Capacity,Active\n1,101,30,\n2,LAB-2,24,no\n";
    let halls = load_halls_from_reader(text.as_bytes()).unwrap();
    assert_eq!(halls.len(), 2);
    assert_eq!(halls[0].number, "101");
    assert!(halls[0].active);
    assert!(!halls[1].active);
    assert_eq!(halls[1].columns, Hall::new(9, "x", 1).columns);

    let with_layout = "id,Hall Number,capacity,columns,rows\n3,201,12,2,6\n";
    let halls = load_halls_from_reader(with_layout.as_bytes()).unwrap();
    assert_eq!((halls[0].columns, halls[0].rows_per_column), (2, 6));
}

#[test]
fn subject_rows_parse_exam_type_and_semester() {
    let text = "Subject Code,Subject Name,Department,Year,Sem,Exam Type\n\
                CS301,Data Structures,CSE,2,3,SEM\n\
                CS303,Lab,CSE,2,,internal\n\
                EC301,Signals,ECE,2,3,\n";
    let subjects = load_subjects_from_reader(text.as_bytes()).unwrap();
    assert_eq!(
        subjects,
        vec![
            Subject::new("CS301", "Data Structures", "CSE", 2)
                .with_semester(3)
                .with_exam_type(SubjectExamType::Sem),
            Subject::new("CS303", "Lab", "CSE", 2).with_exam_type(SubjectExamType::Internal),
            Subject::new("EC301", "Signals", "ECE", 2).with_semester(3),
        ]
    );
}

#[test]
fn bad_rows_are_rejected() {
    let duplicate = "code,name,department,year\nCS301,A,CSE,2\nCS301,B,CSE,2\n";
    assert!(matches!(
        load_subjects_from_reader(duplicate.as_bytes()).unwrap_err(),
        PersistenceError::InvalidData(_)
    ));

    let bad_type = "code,name,department,year,exam_type\nCS301,A,CSE,2,FINAL\n";
    assert!(load_subjects_from_reader(bad_type.as_bytes()).is_err());

    let not_a_number = "register_number,name,department,year\nCSE001,Asha,CSE,second\n";
    assert!(matches!(
        load_students_from_reader(not_a_number.as_bytes()).unwrap_err(),
        PersistenceError::Csv(_)
    ));
}

#[test]
fn holidays_accept_several_date_formats() {
    let text = "Holiday Date,Occasion\n2025-12-25,Christmas\n01.01.2026,New Year\n26/01/2026,Republic Day\n";
    let holidays = load_holidays_from_reader(text.as_bytes()).unwrap();
    let dates: Vec<NaiveDate> = holidays.iter().map(|h| h.date).collect();
    assert_eq!(dates, vec![d(2025, 12, 25), d(2026, 1, 1), d(2026, 1, 26)]);
    assert_eq!(holidays[1].reason, "New Year");

    let bad = "date\nsoon\n";
    assert!(matches!(
        load_holidays_from_reader(bad.as_bytes()).unwrap_err(),
        PersistenceError::InvalidData(_)
    ));
}

#[test]
fn students_load_from_a_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "regno,student_name,branch,year").unwrap();
    writeln!(file, "MECH001, Kiran ,MECH,3").unwrap();
    file.flush().unwrap();

    let students = load_students_from_csv(file.path()).unwrap();
    assert_eq!(students, vec![Student::new("MECH001", "Kiran", "MECH", 3)]);
}

fn planned_store() -> (InMemoryStore, RunParameters) {
    let subjects = vec![
        Subject::new("CS301", "Data Structures", "CSE", 2),
        Subject::new("CS302", "Computer Organization", "CSE", 2),
        Subject::new("EC301", "Signals", "ECE", 2),
    ];
    let students = (1..=6)
        .map(|i| {
            let dept = if i % 2 == 0 { "ECE" } else { "CSE" };
            Student::new(format!("{dept}{i:03}"), format!("Student {i}"), dept, 2)
        })
        .collect();
    let store =
        InMemoryStore::with_reference_data(subjects, vec![Hall::new(1, "101", 4)], students)
            .unwrap();
    let params = RunParameters::new(1, ExamType::Internal, 2, d(2025, 12, 1), d(2025, 12, 1));
    {
        let planner = ExamPlanner::new(Repositories::from_store(&store));
        planner.run_timetable(&params).unwrap();
        planner.run_seating(&params).unwrap();
    }
    (store, params)
}

#[test]
fn exports_write_one_row_per_entry() {
    let (store, _) = planned_store();
    let dir = tempdir().unwrap();

    let timetable_path = dir.path().join("timetable.csv");
    save_timetable_to_csv(&store.timetable(1).unwrap(), &timetable_path).unwrap();
    let text = std::fs::read_to_string(&timetable_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("date,day,session,time_start,time_end,department,subject_code,subject_name")
    );
    let first = lines.next().unwrap();
    assert!(first.starts_with("2025-12-01,Monday,SINGLE,"), "{first}");
    assert!(first.ends_with("CSE,CS301,Data Structures"), "{first}");
    assert_eq!(lines.count(), 1);

    let seating_path = dir.path().join("seating.csv");
    save_allocations_to_csv(&store.allocations(1).unwrap(), true, &seating_path).unwrap();
    let text = std::fs::read_to_string(&seating_path).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 6);
    assert!(rows[0].starts_with("101,1,L,"));
    assert!(rows[1].starts_with("101,1,R,"));
}

#[test]
fn snapshot_round_trips_into_a_fresh_store() {
    let (store, _) = planned_store();
    let dir = tempdir().unwrap();
    let path = dir.path().join("cycle-1.json");

    let snapshot = CycleSnapshot::capture(&store, 1).unwrap();
    assert_eq!(snapshot.timetable.len(), 2);
    assert_eq!(snapshot.violations.len(), 1);
    assert_eq!(snapshot.allocations.len(), 6);
    save_snapshot_to_json(&snapshot, &path).unwrap();

    let loaded = load_snapshot_from_json(&path).unwrap();
    assert_eq!(loaded, snapshot);

    let fresh = InMemoryStore::new();
    loaded.restore(&fresh).unwrap();
    assert_eq!(fresh.cycle(1).unwrap(), Some(snapshot.cycle.clone()));
    assert_eq!(fresh.timetable(1).unwrap(), snapshot.timetable);
    assert_eq!(fresh.allocations(1).unwrap(), snapshot.allocations);

    assert!(matches!(
        CycleSnapshot::capture(&store, 2).unwrap_err(),
        PersistenceError::NotFound(_)
    ));
}

#[test]
fn snapshot_with_foreign_rows_is_rejected() {
    let (store, _) = planned_store();
    let mut snapshot = CycleSnapshot::capture(&store, 1).unwrap();
    snapshot.allocations[0].cycle_id = 2;
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    save_snapshot_to_json(&snapshot, &path).unwrap();

    assert!(matches!(
        load_snapshot_from_json(&path).unwrap_err(),
        PersistenceError::InvalidData(_)
    ));
}
