use std::io::{self, Write};
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate};
use exam_planner::conflict::Clash;
use exam_planner::frames::{allocation_frame, hall_summary_frame, timetable_frame};
use exam_planner::repository::file::{
    self, CycleSnapshot, load_halls_from_csv, load_holidays_from_csv, load_students_from_csv,
    load_subjects_from_csv,
};
use exam_planner::repository::{
    CycleRepository, HallRepository, InMemoryStore, ReferenceDataWriter, StudentRepository,
    SubjectRepository,
};
use exam_planner::{
    ExamPlanner, ExamType, OrderingMode, PlannerConfig, Repositories, RunOutcome, RunParameters,
    Session,
};
use polars::prelude::{AnyValue, DataFrame};

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: &AnyValue| -> String {
        match av {
            AnyValue::Null => String::new(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::Float64(v) => format!("{v:.1}"),
            _ => av.to_string(),
        }
    };

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            if let Ok(ref av) = col.get(row_idx) {
                widths[ci] = widths[ci].max(cell(av).len());
            }
        }
    }

    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push(' ');
        out.push_str(name);
        out.push_str(&" ".repeat(widths[i] - name.len()));
        out.push_str(" |");
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let s = col.get(row_idx).map(|av| cell(&av)).unwrap_or_default();
            out.push(' ');
            out.push_str(&s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            out.push_str(" |");
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  load <subjects|halls|students|holidays> <csv> Load reference data from CSV\n  params                                       Show run parameters\n  set <key> <value>                            Set cycle|type|year|semester|session|start|end|ordering|halls\n  timetable                                    Generate the exam timetable\n  seating                                      Generate the seating plan\n  layout <hall_id>                             Show the seat grid of a hall\n  show                                         Show stored seat allocations\n  seat <register_number>                       Show where a student sits\n  slot <subject_code>                          Show when a subject is examined\n  halls                                        Show hall occupancy\n  conflicts                                    List same-day exams sharing students\n  export <timetable|seating> <csv|json> <path> Write results to a file\n  export cycle json <path>                     Write the whole cycle to a file\n  quit|exit                                    Exit"
    );
}

fn print_params(params: &RunParameters) {
    let halls = params
        .halls
        .as_ref()
        .map(|ids| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","))
        .unwrap_or_else(|| "all".to_string());
    println!(
        "cycle={} type={} year={} semester={} session={} start={} end={} ordering={} halls={} holidays={}",
        params.cycle_id,
        params.exam_type,
        params.year,
        params.semester.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
        params.session.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
        params.start_date,
        params.end_date,
        params.ordering.as_str(),
        halls,
        params.holidays.len()
    );
}

/// Applies one `set` command. Returns an error message for the user.
fn apply_setting(params: &mut RunParameters, key: &str, value: &str) -> Result<(), String> {
    match key {
        "cycle" => params.cycle_id = value.parse().map_err(|_| "Invalid cycle id".to_string())?,
        "type" => params.exam_type = ExamType::from_str(value).map_err(|e| e.to_string())?,
        "year" => params.year = value.parse().map_err(|_| "Invalid year".to_string())?,
        "semester" => {
            params.semester = match value {
                "-" | "none" => None,
                v => Some(v.parse().map_err(|_| "Invalid semester".to_string())?),
            }
        }
        "session" => {
            params.session = match value {
                "-" | "none" => None,
                v => Some(Session::from_str(v).map_err(|e| e.to_string())?),
            }
        }
        "start" | "end" => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| "Invalid date (YYYY-MM-DD)".to_string())?;
            if key == "start" {
                params.start_date = date;
            } else {
                params.end_date = date;
            }
        }
        "ordering" => params.ordering = OrderingMode::from_str(value).map_err(|e| e.to_string())?,
        "halls" => {
            params.halls = match value {
                "all" => None,
                csv => Some(
                    csv.split(',')
                        .map(|p| p.trim().parse::<i32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| "Invalid hall list (e.g. 1,2,3 or all)".to_string())?,
                ),
            }
        }
        other => return Err(format!("Unknown setting '{other}'")),
    }
    Ok(())
}

fn print_clashes(clashes: &[Clash]) {
    if clashes.is_empty() {
        println!("No same-day clashes.");
        return;
    }
    for clash in clashes {
        println!("{}  {} / {}", clash.date, clash.first, clash.second);
    }
}

fn run_shell<S>(store: &S, config: &PlannerConfig)
where
    S: SubjectRepository
        + HallRepository
        + StudentRepository
        + CycleRepository
        + ReferenceDataWriter,
{
    let planner = match ExamPlanner::with_config(Repositories::from_store(store), config) {
        Ok(planner) => planner,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };

    let today = Local::now().date_naive();
    let mut params = RunParameters::new(1, ExamType::Sem, 1, today, today + Duration::days(14))
        .with_ordering(config.ordering);

    println!("Exam Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "params" => print_params(&params),
            "set" => match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => match apply_setting(&mut params, key, value) {
                    Ok(()) => print_params(&params),
                    Err(msg) => println!("{msg}"),
                },
                _ => println!("Usage: set <key> <value>"),
            },
            "load" => {
                let (Some(kind), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: load <subjects|halls|students|holidays> <csv>");
                    continue;
                };
                let result = match kind {
                    "subjects" => load_subjects_from_csv(path)
                        .and_then(|rows| store.replace_subjects(&rows).map(|_| rows.len())),
                    "halls" => load_halls_from_csv(path)
                        .and_then(|rows| store.replace_halls(&rows).map(|_| rows.len())),
                    "students" => load_students_from_csv(path)
                        .and_then(|rows| store.replace_students(&rows).map(|_| rows.len())),
                    "holidays" => load_holidays_from_csv(path).map(|rows| {
                        let count = rows.len();
                        params.holidays = rows;
                        count
                    }),
                    _ => {
                        println!("Usage: load <subjects|halls|students|holidays> <csv>");
                        continue;
                    }
                };
                match result {
                    Ok(count) => println!("Loaded {count} {kind}."),
                    Err(e) => println!("Load error: {e}"),
                }
            }
            "timetable" => match planner.run_timetable(&params) {
                Ok(RunOutcome::Completed(timetable)) => {
                    println!("Timetable generated ({})", timetable.summary().to_cli_summary());
                    match timetable_frame(&timetable.entries) {
                        Ok(df) => println!("{}", render_df_as_text_table(&df)),
                        Err(e) => println!("Render error: {e}"),
                    }
                    for violation in &timetable.violations {
                        println!("{violation}");
                    }
                }
                Ok(RunOutcome::Empty { reason }) => println!("Nothing to schedule: {reason}"),
                Err(e) => println!("Error: {e}"),
            },
            "seating" => match planner.run_seating(&params) {
                Ok(RunOutcome::Completed(plan)) => {
                    println!(
                        "Seating generated ({} students, policy {})",
                        plan.allocations.len(),
                        plan.policy.label()
                    );
                    match hall_summary_frame(&plan.hall_summaries) {
                        Ok(df) => println!("{}", render_df_as_text_table(&df)),
                        Err(e) => println!("Render error: {e}"),
                    }
                    for dept in &plan.department_summaries {
                        println!(
                            "{}: {} students, halls {}..{}",
                            dept.department, dept.students, dept.first_hall, dept.last_hall
                        );
                    }
                }
                Ok(RunOutcome::Empty { reason }) => println!("Nothing to seat: {reason}"),
                Err(e) => println!("Error: {e}"),
            },
            "layout" => {
                let Some(hall_id) = parts.next().and_then(|s| s.parse::<i32>().ok()) else {
                    println!("Usage: layout <hall_id>");
                    continue;
                };
                match planner.hall_layout(params.cycle_id, hall_id) {
                    Ok(layout) => println!(
                        "Hall {} ({} occupied)\n{}",
                        layout.hall_number,
                        layout.occupied(),
                        layout.render_text()
                    ),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "halls" => match planner
                .hall_summaries(params.cycle_id)
                .map(|summaries| hall_summary_frame(&summaries))
            {
                Ok(Ok(df)) => println!("{}", render_df_as_text_table(&df)),
                Ok(Err(e)) => println!("Render error: {e}"),
                Err(e) => println!("Error: {e}"),
            },
            "conflicts" => match planner.conflict_report(params.cycle_id) {
                Ok(clashes) => print_clashes(&clashes),
                Err(e) => println!("Error: {e}"),
            },
            "show" => match planner.allocations(params.cycle_id) {
                Ok(allocations) => match allocation_frame(&allocations) {
                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                    Err(e) => println!("Render error: {e}"),
                },
                Err(e) => println!("Error: {e}"),
            },
            "seat" => {
                let Some(register_number) = parts.next() else {
                    println!("Usage: seat <register_number>");
                    continue;
                };
                match planner.student_seat(params.cycle_id, register_number) {
                    Ok(seat) => {
                        let side = match (params.exam_type, seat.is_left_seat) {
                            (ExamType::Internal, true) => " (left)",
                            (ExamType::Internal, false) => " (right)",
                            (ExamType::Sem, _) => "",
                        };
                        println!(
                            "{} {}: hall {}, seat {}{side}",
                            seat.register_number, seat.student_name, seat.hall_number, seat.seat_number
                        );
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "slot" => {
                let Some(code) = parts.next() else {
                    println!("Usage: slot <subject_code>");
                    continue;
                };
                match planner.subject_slot(params.cycle_id, code) {
                    Ok(Some(entry)) => println!(
                        "{} {}: {} {} {}-{}",
                        entry.subject_code,
                        entry.subject_name,
                        entry.date,
                        entry.session,
                        entry.time_start(),
                        entry.time_end()
                    ),
                    Ok(None) => println!("{code} is not scheduled in cycle {}", params.cycle_id),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "export" => {
                let (Some(what), Some(format), Some(path)) = (parts.next(), parts.next(), parts.next())
                else {
                    println!("Usage: export <timetable|seating|cycle> <csv|json> <path>");
                    continue;
                };
                let cycle_id = params.cycle_id;
                let result = match (what, format) {
                    ("timetable", "csv") => planner
                        .timetable(cycle_id)
                        .map_err(|e| e.to_string())
                        .and_then(|t| {
                            file::save_timetable_to_csv(&t.entries, path).map_err(|e| e.to_string())
                        }),
                    ("timetable", "json") => planner
                        .timetable(cycle_id)
                        .map_err(|e| e.to_string())
                        .and_then(|t| file::save_timetable_to_json(&t, path).map_err(|e| e.to_string())),
                    ("seating", "csv") => planner
                        .allocations(cycle_id)
                        .map_err(|e| e.to_string())
                        .and_then(|a| {
                            let bench = params.exam_type == ExamType::Internal;
                            file::save_allocations_to_csv(&a, bench, path).map_err(|e| e.to_string())
                        }),
                    ("seating", "json") => planner
                        .allocations(cycle_id)
                        .map_err(|e| e.to_string())
                        .and_then(|a| file::save_allocations_to_json(&a, path).map_err(|e| e.to_string())),
                    ("cycle", "json") => CycleSnapshot::capture(store, cycle_id)
                        .and_then(|s| file::save_snapshot_to_json(&s, path))
                        .map_err(|e| e.to_string()),
                    _ => {
                        println!("Usage: export <timetable|seating|cycle> <csv|json> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Exported {what} to {path}"),
                    Err(e) => println!("Export error: {e}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}

fn main() {
    let config = match PlannerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();

    match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => match exam_planner::SqliteExamStore::new(path) {
            Ok(store) => run_shell(&store, &config),
            Err(e) => {
                eprintln!("Failed to open database {}: {e}", path.display());
                std::process::exit(2);
            }
        },
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            eprintln!(
                "Database {} requested but the `sqlite` feature is disabled; using memory.",
                path.display()
            );
            run_shell(&InMemoryStore::new(), &config);
        }
        None => run_shell(&InMemoryStore::new(), &config),
    }
}
