use super::{PlacementPolicy, SeatAllocation};
use crate::error::{PlannerError, PlannerResult};
use crate::exam::{CycleId, ExamType, OrderingMode};
use crate::hall::Hall;
use crate::student::Student;
use std::collections::{BTreeMap, VecDeque};

/// Fills halls in list order, each to its effective capacity, before rolling
/// over to the next one. Seat numbers restart at 1 in every hall.
#[derive(Debug, Clone, Copy)]
pub struct SeatingAllocator {
    cycle_id: CycleId,
    exam_type: ExamType,
    policy: PlacementPolicy,
}

impl SeatingAllocator {
    pub fn new(cycle_id: CycleId, exam_type: ExamType, ordering: OrderingMode) -> Self {
        Self {
            cycle_id,
            exam_type,
            policy: PlacementPolicy::select(exam_type, ordering),
        }
    }

    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Total occupants the halls can take under this allocator's exam type.
    pub fn total_capacity(&self, halls: &[Hall]) -> usize {
        halls
            .iter()
            .map(|h| h.effective_capacity(self.exam_type) as usize)
            .sum()
    }

    pub fn allocate(&self, students: &[Student], halls: &[Hall]) -> PlannerResult<Vec<SeatAllocation>> {
        let available = self.total_capacity(halls);
        if students.len() > available {
            log::warn!(
                "cycle {}: {} students exceed {} {} seats across {} hall(s)",
                self.cycle_id,
                students.len(),
                available,
                self.exam_type,
                halls.len()
            );
            return Err(PlannerError::InsufficientCapacity {
                required: students.len(),
                available,
            });
        }

        let order = match self.policy.ordering() {
            OrderingMode::Linear => linear_order(students),
            OrderingMode::Alternating => alternating_order(students),
        };

        let mut allocations = Vec::with_capacity(order.len());
        let mut queue = order.into_iter().peekable();
        for hall in halls {
            if queue.peek().is_none() {
                break;
            }
            let limit = hall.effective_capacity(self.exam_type) as usize;
            let before = allocations.len();
            for position in 0..limit {
                let Some(student) = queue.next() else {
                    break;
                };
                let (seat_number, is_left_seat) = self.seat_for(position);
                allocations.push(SeatAllocation {
                    cycle_id: self.cycle_id,
                    hall_id: hall.id,
                    hall_number: hall.number.clone(),
                    seat_number,
                    register_number: student.register_number.clone(),
                    student_name: student.name.clone(),
                    department: student.department.clone(),
                    is_left_seat,
                });
            }
            log::debug!(
                "cycle {}: hall {} seated {} of {}",
                self.cycle_id,
                hall.number,
                allocations.len() - before,
                limit
            );
        }
        Ok(allocations)
    }

    /// Seat address of the `position`-th occupant (0-based) of a hall.
    fn seat_for(&self, position: usize) -> (u32, bool) {
        if self.policy.is_bench_paired() {
            ((position / 2 + 1) as u32, position % 2 == 0)
        } else {
            ((position + 1) as u32, true)
        }
    }
}

/// Students sorted by department, then register number.
fn linear_order(students: &[Student]) -> Vec<&Student> {
    let mut order: Vec<&Student> = students.iter().collect();
    order.sort_by(|a, b| {
        (a.department.as_str(), a.register_number.as_str())
            .cmp(&(b.department.as_str(), b.register_number.as_str()))
    });
    order
}

/// One student per department per turn, departments in sorted order, each
/// department's queue sorted by register number. Exhausted queues drop out.
fn alternating_order(students: &[Student]) -> Vec<&Student> {
    let mut queues: BTreeMap<&str, Vec<&Student>> = BTreeMap::new();
    for student in students {
        queues
            .entry(student.department.as_str())
            .or_default()
            .push(student);
    }
    let mut queues: Vec<VecDeque<&Student>> = queues
        .into_values()
        .map(|mut queue| {
            queue.sort_by(|a, b| a.register_number.cmp(&b.register_number));
            VecDeque::from(queue)
        })
        .collect();

    let mut order = Vec::with_capacity(students.len());
    while order.len() < students.len() {
        for queue in queues.iter_mut() {
            if let Some(student) = queue.pop_front() {
                order.push(student);
            }
        }
        queues.retain(|q| !q.is_empty());
    }
    order
}
