use crate::seating::{HallSummary, SeatAllocation};
use crate::timetable::TimetableEntry;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// `num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_i32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn string_series(name: &'static str, values: Vec<&str>) -> Column {
    Series::new(PlSmallStr::from_static(name), values).into()
}

/// Timetable as a frame with a `Date` dtype `date` column, one row per entry.
pub fn timetable_frame(entries: &[TimetableEntry]) -> PolarsResult<DataFrame> {
    let dates: Vec<i32> = entries.iter().map(|e| date_to_i32(e.date)).collect();
    let date_series =
        Series::new(PlSmallStr::from_static("date"), dates).cast(&DataType::Date)?;

    DataFrame::new(vec![
        date_series.into(),
        string_series("session", entries.iter().map(|e| e.session.as_str()).collect()),
        string_series("time_start", entries.iter().map(|e| e.time_start()).collect()),
        string_series("time_end", entries.iter().map(|e| e.time_end()).collect()),
        string_series(
            "department",
            entries.iter().map(|e| e.department.as_str()).collect(),
        ),
        string_series(
            "subject_code",
            entries.iter().map(|e| e.subject_code.as_str()).collect(),
        ),
        string_series(
            "subject_name",
            entries.iter().map(|e| e.subject_name.as_str()).collect(),
        ),
    ])
}

pub fn allocation_frame(allocations: &[SeatAllocation]) -> PolarsResult<DataFrame> {
    let seats: Vec<u32> = allocations.iter().map(|a| a.seat_number).collect();
    let left: Vec<bool> = allocations.iter().map(|a| a.is_left_seat).collect();
    DataFrame::new(vec![
        string_series(
            "hall_number",
            allocations.iter().map(|a| a.hall_number.as_str()).collect(),
        ),
        Series::new(PlSmallStr::from_static("seat_number"), seats).into(),
        Series::new(PlSmallStr::from_static("is_left_seat"), left).into(),
        string_series(
            "register_number",
            allocations.iter().map(|a| a.register_number.as_str()).collect(),
        ),
        string_series(
            "student_name",
            allocations.iter().map(|a| a.student_name.as_str()).collect(),
        ),
        string_series(
            "department",
            allocations.iter().map(|a| a.department.as_str()).collect(),
        ),
    ])
}

/// Department breakdown is flattened to `DEPT:count` pairs joined by `, `.
pub fn hall_summary_frame(summaries: &[HallSummary]) -> PolarsResult<DataFrame> {
    let capacity: Vec<u32> = summaries.iter().map(|s| s.capacity).collect();
    let occupied: Vec<u32> = summaries.iter().map(|s| s.occupied).collect();
    let utilization: Vec<f64> = summaries
        .iter()
        .map(|s| (s.utilization * 10.0).round() / 10.0)
        .collect();
    let invigilators: Vec<u32> = summaries.iter().map(|s| s.invigilators).collect();
    let breakdown: Vec<String> = summaries
        .iter()
        .map(|s| {
            s.department_breakdown
                .iter()
                .map(|(dept, count)| format!("{dept}:{count}"))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();

    DataFrame::new(vec![
        string_series(
            "hall_number",
            summaries.iter().map(|s| s.hall_number.as_str()).collect(),
        ),
        Series::new(PlSmallStr::from_static("capacity"), capacity).into(),
        Series::new(PlSmallStr::from_static("occupied"), occupied).into(),
        Series::new(PlSmallStr::from_static("utilization"), utilization).into(),
        Series::new(PlSmallStr::from_static("invigilators"), invigilators).into(),
        Series::new(PlSmallStr::from_static("departments"), breakdown).into(),
    ])
}
