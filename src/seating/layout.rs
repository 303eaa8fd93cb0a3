use super::SeatAllocation;
use crate::exam::ExamType;
use crate::hall::{Hall, HallId};
use serde::{Deserialize, Serialize};

pub const EMPTY_SEAT_MARKER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatCell {
    Empty,
    Single(String),
    Bench {
        left: Option<String>,
        right: Option<String>,
    },
}

impl SeatCell {
    /// Printable form: a register number, `left | right` for benches, or the
    /// empty marker.
    pub fn label(&self) -> String {
        match self {
            SeatCell::Empty => EMPTY_SEAT_MARKER.to_string(),
            SeatCell::Single(reg) => reg.clone(),
            SeatCell::Bench { left, right } => format!(
                "{} | {}",
                left.as_deref().unwrap_or(EMPTY_SEAT_MARKER),
                right.as_deref().unwrap_or(EMPTY_SEAT_MARKER)
            ),
        }
    }

    pub fn occupants(&self) -> usize {
        match self {
            SeatCell::Empty => 0,
            SeatCell::Single(_) => 1,
            SeatCell::Bench { left, right } => {
                usize::from(left.is_some()) + usize::from(right.is_some())
            }
        }
    }
}

/// Hall grid indexed `grid[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallLayout {
    pub hall_id: HallId,
    pub hall_number: String,
    pub columns: u32,
    pub rows_per_column: u32,
    pub grid: Vec<Vec<SeatCell>>,
}

impl HallLayout {
    pub fn cell(&self, row: usize, column: usize) -> Option<&SeatCell> {
        self.grid.get(row)?.get(column)
    }

    pub fn occupied(&self) -> usize {
        self.grid.iter().flatten().map(SeatCell::occupants).sum()
    }

    /// One line per row, cells separated by tabs.
    pub fn render_text(&self) -> String {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(SeatCell::label)
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Projects flat allocations onto a hall's column-major grid. Seat `n` lands
/// in column `(n-1) / rows_per_column`, row `(n-1) % rows_per_column`;
/// seats outside the grid are dropped.
#[derive(Debug, Clone, Copy)]
pub struct HallLayoutMapper {
    exam_type: ExamType,
}

impl HallLayoutMapper {
    pub fn new(exam_type: ExamType) -> Self {
        Self { exam_type }
    }

    pub fn map(&self, allocations: &[SeatAllocation], hall: &Hall) -> HallLayout {
        let rows = hall.rows_per_column as usize;
        let columns = hall.columns as usize;
        let blank = match self.exam_type {
            ExamType::Sem => SeatCell::Empty,
            ExamType::Internal => SeatCell::Bench {
                left: None,
                right: None,
            },
        };
        let mut grid = vec![vec![blank; columns]; rows];

        for allocation in allocations.iter().filter(|a| a.hall_id == hall.id) {
            let Some((row, column)) = position(allocation.seat_number, rows, columns) else {
                log::debug!(
                    "hall {}: seat {} outside {}x{} grid, dropped",
                    hall.number,
                    allocation.seat_number,
                    columns,
                    rows
                );
                continue;
            };
            let cell = &mut grid[row][column];
            let reg = allocation.register_number.clone();
            match self.exam_type {
                ExamType::Sem => *cell = SeatCell::Single(reg),
                ExamType::Internal => {
                    if let SeatCell::Bench { left, right } = cell {
                        if allocation.is_left_seat {
                            *left = Some(reg);
                        } else {
                            *right = Some(reg);
                        }
                    }
                }
            }
        }

        HallLayout {
            hall_id: hall.id,
            hall_number: hall.number.clone(),
            columns: hall.columns,
            rows_per_column: hall.rows_per_column,
            grid,
        }
    }
}

fn position(seat_number: u32, rows: usize, columns: usize) -> Option<(usize, usize)> {
    if seat_number == 0 || rows == 0 {
        return None;
    }
    let index = (seat_number - 1) as usize;
    let (column, row) = (index / rows, index % rows);
    (column < columns).then_some((row, column))
}
