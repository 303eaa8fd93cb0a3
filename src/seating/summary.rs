use super::SeatAllocation;
use crate::exam::ExamType;
use crate::hall::{Hall, HallId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallSummary {
    pub hall_id: HallId,
    pub hall_number: String,
    /// Effective capacity for the exam type.
    pub capacity: u32,
    pub occupied: u32,
    pub department_breakdown: BTreeMap<String, u32>,
    pub utilization: f64,
    pub invigilators: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub department: String,
    pub students: u32,
    pub first_hall: String,
    pub last_hall: String,
}

/// Occupancy per hall that received at least one student, in hall-list order.
pub fn hall_summaries(
    allocations: &[SeatAllocation],
    halls: &[Hall],
    exam_type: ExamType,
    invigilator_ratio: u32,
) -> Vec<HallSummary> {
    let mut by_hall: HashMap<HallId, BTreeMap<String, u32>> = HashMap::new();
    for allocation in allocations {
        *by_hall
            .entry(allocation.hall_id)
            .or_default()
            .entry(allocation.department.clone())
            .or_insert(0) += 1;
    }

    halls
        .iter()
        .filter_map(|hall| {
            let department_breakdown = by_hall.remove(&hall.id)?;
            let occupied: u32 = department_breakdown.values().sum();
            let capacity = hall.effective_capacity(exam_type);
            let utilization = if capacity == 0 {
                0.0
            } else {
                (occupied as f64 / capacity as f64) * 100.0
            };
            Some(HallSummary {
                hall_id: hall.id,
                hall_number: hall.number.clone(),
                capacity,
                occupied,
                department_breakdown,
                utilization,
                invigilators: (occupied / invigilator_ratio.max(1)).max(1),
            })
        })
        .collect()
}

/// Per department: head count and the first and last hall it was seated in,
/// following allocation order. Sorted by department.
pub fn department_summaries(allocations: &[SeatAllocation]) -> Vec<DepartmentSummary> {
    let mut summaries: BTreeMap<&str, DepartmentSummary> = BTreeMap::new();
    for allocation in allocations {
        summaries
            .entry(allocation.department.as_str())
            .and_modify(|summary| {
                summary.students += 1;
                summary.last_hall = allocation.hall_number.clone();
            })
            .or_insert_with(|| DepartmentSummary {
                department: allocation.department.clone(),
                students: 1,
                first_hall: allocation.hall_number.clone(),
                last_hall: allocation.hall_number.clone(),
            });
    }
    summaries.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(hall: &Hall, seat_number: u32, department: &str) -> SeatAllocation {
        SeatAllocation {
            cycle_id: 1,
            hall_id: hall.id,
            hall_number: hall.number.clone(),
            seat_number,
            register_number: format!("{department}{seat_number:03}"),
            student_name: String::new(),
            department: department.to_string(),
            is_left_seat: true,
        }
    }

    #[test]
    fn summaries_skip_empty_halls_and_count_departments() {
        let halls = vec![Hall::new(1, "101", 4), Hall::new(2, "102", 4), Hall::new(3, "103", 4)];
        let allocations = vec![
            seat(&halls[0], 1, "CSE"),
            seat(&halls[0], 2, "ECE"),
            seat(&halls[0], 3, "CSE"),
            seat(&halls[1], 1, "ECE"),
        ];
        let summaries = hall_summaries(&allocations, &halls, ExamType::Sem, 30);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].occupied, 3);
        assert_eq!(summaries[0].department_breakdown.get("CSE"), Some(&2));
        assert_eq!(summaries[0].invigilators, 1);
        assert!((summaries[0].utilization - 75.0).abs() < 1e-9);

        let departments = department_summaries(&allocations);
        assert_eq!(departments[0].department, "CSE");
        assert_eq!(departments[1].first_hall, "101");
        assert_eq!(departments[1].last_hall, "102");
    }
}
