mod allocator;
mod layout;
mod summary;

pub use allocator::SeatingAllocator;
pub use layout::{EMPTY_SEAT_MARKER, HallLayout, HallLayoutMapper, SeatCell};
pub use summary::{DepartmentSummary, HallSummary, department_summaries, hall_summaries};

use crate::exam::{CycleId, ExamType, OrderingMode};
use crate::hall::HallId;
use serde::{Deserialize, Serialize};

/// One occupied seat. `(hall_id, seat_number, is_left_seat)` is unique within a
/// cycle. For SEM exams every seat is a "left" seat; for INTERNAL exams
/// `seat_number` is the bench number and the flag names the side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAllocation {
    pub cycle_id: CycleId,
    pub hall_id: HallId,
    pub hall_number: String,
    pub seat_number: u32,
    pub register_number: String,
    pub student_name: String,
    pub department: String,
    pub is_left_seat: bool,
}

/// How students are poured into halls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    Linear,
    Alternating,
    /// Two students per bench; the wrapped mode orders the fill sequence.
    BenchPaired(OrderingMode),
}

impl PlacementPolicy {
    pub fn select(exam_type: ExamType, ordering: OrderingMode) -> Self {
        match (exam_type, ordering) {
            (ExamType::Internal, ordering) => PlacementPolicy::BenchPaired(ordering),
            (ExamType::Sem, OrderingMode::Linear) => PlacementPolicy::Linear,
            (ExamType::Sem, OrderingMode::Alternating) => PlacementPolicy::Alternating,
        }
    }

    pub fn ordering(&self) -> OrderingMode {
        match self {
            PlacementPolicy::Linear => OrderingMode::Linear,
            PlacementPolicy::Alternating => OrderingMode::Alternating,
            PlacementPolicy::BenchPaired(ordering) => *ordering,
        }
    }

    pub fn is_bench_paired(&self) -> bool {
        matches!(self, PlacementPolicy::BenchPaired(_))
    }

    pub fn label(&self) -> String {
        match self {
            PlacementPolicy::Linear => "linear".to_string(),
            PlacementPolicy::Alternating => "alternating".to_string(),
            PlacementPolicy::BenchPaired(ordering) => format!("bench-paired/{}", ordering.as_str()),
        }
    }
}
