#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("cli").unwrap();
    cmd.env_remove("EXAM_PLANNER_DB")
        .env_remove("EXAM_PLANNER_CONFIG")
        .env("EXAM_PLANNER_LOG", "off");
    cmd
}

fn fixtures() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("subjects.csv"),
        "Subject Code,Subject Name,Dept,Year\n\
         CS301,Data Structures,CSE,2\n\
         CS302,Computer Organization,CSE,2\n\
         EC301,Signals,ECE,2\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("halls.csv"),
        "hallNo,Hall ID,Capacity\n101,1,10\n102,2,10\n",
    )
    .unwrap();
    let mut students = String::from("Register Number,Name,Department,Year\n");
    for i in 1..=12 {
        let dept = if i <= 8 { "CSE" } else { "ECE" };
        students.push_str(&format!("{dept}{i:03},Student {i},{dept},2\n"));
    }
    fs::write(dir.path().join("students.csv"), students).unwrap();
    fs::write(
        dir.path().join("holidays.csv"),
        "date,reason\n01.12.2025,Founders day\n",
    )
    .unwrap();
    dir
}

fn load_script(dir: &Path) -> String {
    format!(
        "load subjects {0}/subjects.csv\n\
         load halls {0}/halls.csv\n\
         load students {0}/students.csv\n\
         set year 2\n\
         set start 2025-12-01\n\
         set end 2025-12-05\n",
        dir.display()
    )
}

#[test]
fn help_and_unknown_commands() {
    cli()
        .write_stdin("help\nfrobnicate\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam Planner (CLI)"))
        .stdout(predicate::str::contains("export cycle json <path>"))
        .stdout(predicate::str::contains("Unknown command. Type 'help'."));
}

#[test]
fn invalid_settings_are_reported() {
    cli()
        .write_stdin("set type final\nset start 1/12/2025\nset halls one\nset colour blue\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unrecognized exam type 'final'"))
        .stdout(predicate::str::contains("Invalid date (YYYY-MM-DD)"))
        .stdout(predicate::str::contains("Invalid hall list"))
        .stdout(predicate::str::contains("Unknown setting 'colour'"));
}

#[test]
fn empty_store_has_nothing_to_schedule() {
    cli()
        .write_stdin("timetable\nseating\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to schedule"))
        .stdout(predicate::str::contains("Nothing to seat"));
}

#[test]
fn loads_schedules_and_seats_a_cycle() {
    let dir = fixtures();
    let script = format!(
        "{}timetable\nseating\nhalls\nlayout 1\nconflicts\nseat CSE001\nslot EC301\nseat NOPE1\nquit\n",
        load_script(dir.path())
    );

    cli()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 3 subjects."))
        .stdout(predicate::str::contains("Loaded 2 halls."))
        .stdout(predicate::str::contains("Loaded 12 students."))
        .stdout(predicate::str::contains(
            "Timetable generated (scheduled=3, violations=0",
        ))
        .stdout(predicate::str::contains("CS302"))
        .stdout(predicate::str::contains(
            "Seating generated (12 students, policy linear)",
        ))
        .stdout(predicate::str::contains("Hall 101 (10 occupied)"))
        .stdout(predicate::str::contains("2025-12-01  CS301 / CS302"))
        .stdout(predicate::str::contains("CSE001 Student 1: hall 101, seat 1"))
        .stdout(predicate::str::contains("EC301 Signals: 2025-12-01 FN 09:30 AM-12:30 PM"))
        .stdout(predicate::str::contains("Error: student NOPE1 not found"));
}

#[test]
fn holidays_shift_the_timetable() {
    let dir = fixtures();
    let script = format!(
        "{}load holidays {}/holidays.csv\nset end 2025-12-01\ntimetable\n",
        load_script(dir.path()),
        dir.path().display()
    );

    cli()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 holidays."))
        .stdout(predicate::str::contains("Error:"));
}

#[test]
fn exports_write_files() {
    let dir = fixtures();
    let out = dir.path().join("out");
    fs::create_dir(&out).unwrap();
    let script = format!(
        "{}set type internal\ntimetable\nseating\n\
         export timetable csv {1}/timetable.csv\n\
         export seating csv {1}/seating.csv\n\
         export cycle json {1}/cycle.json\n\
         export seating xml {1}/seating.xml\n",
        load_script(dir.path()),
        out.display()
    );

    cli()
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("policy bench-paired/linear"))
        .stdout(predicate::str::contains("Exported cycle to"))
        .stdout(predicate::str::contains("Usage: export"));

    let timetable = fs::read_to_string(out.join("timetable.csv")).unwrap();
    assert!(timetable.starts_with("date,day,session"));
    assert_eq!(timetable.lines().count(), 4);
    let seating = fs::read_to_string(out.join("seating.csv")).unwrap();
    assert!(seating.lines().nth(1).unwrap().starts_with("101,1,L,CSE001"));
    let cycle = fs::read_to_string(out.join("cycle.json")).unwrap();
    assert!(cycle.contains("\"INTERNAL\""));
    assert!(!out.join("seating.xml").exists());
}

#[test]
fn bad_csv_is_a_load_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("halls.csv");
    fs::write(&path, "id,number,capacity\n1,101,lots\n").unwrap();

    cli()
        .write_stdin(format!("load halls {}\n", path.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Load error:"));
}
