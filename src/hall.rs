use crate::exam::ExamType;
use serde::{Deserialize, Serialize};

pub type HallId = i32;

pub const DEFAULT_COLUMNS: u32 = 4;
pub const DEFAULT_ROWS_PER_COLUMN: u32 = 15;

/// Reference data: a physical exam hall.
///
/// `capacity` counts seats for SEM exams and benches for INTERNAL exams.
/// The layout is `columns` columns of `rows_per_column` positions, addressed
/// column-major by seat number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub id: HallId,
    pub number: String,
    pub capacity: u32,
    #[serde(default = "default_columns")]
    pub columns: u32,
    #[serde(default = "default_rows_per_column")]
    pub rows_per_column: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

fn default_rows_per_column() -> u32 {
    DEFAULT_ROWS_PER_COLUMN
}

fn default_active() -> bool {
    true
}

impl Hall {
    pub fn new(id: HallId, number: impl Into<String>, capacity: u32) -> Self {
        Self {
            id,
            number: number.into(),
            capacity,
            columns: DEFAULT_COLUMNS,
            rows_per_column: DEFAULT_ROWS_PER_COLUMN,
            active: true,
        }
    }

    pub fn with_layout(mut self, columns: u32, rows_per_column: u32) -> Self {
        self.columns = columns;
        self.rows_per_column = rows_per_column;
        self
    }

    /// Maximum number of occupants for the given exam format.
    pub fn effective_capacity(&self, exam_type: ExamType) -> u32 {
        self.capacity.saturating_mul(exam_type.seats_per_unit())
    }

    /// Number of addressable grid positions.
    pub fn grid_positions(&self) -> u32 {
        self.columns.saturating_mul(self.rows_per_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_capacity_doubles_for_benches() {
        let hall = Hall::new(1, "101", 30);
        assert_eq!(hall.effective_capacity(ExamType::Sem), 30);
        assert_eq!(hall.effective_capacity(ExamType::Internal), 60);
        assert_eq!(hall.grid_positions(), 60);
    }
}
