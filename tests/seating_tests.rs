use exam_planner::seating::{
    HallLayoutMapper, PlacementPolicy, SeatCell, SeatingAllocator, department_summaries,
    hall_summaries,
};
use exam_planner::{ExamType, Hall, OrderingMode, PlannerError, Student};
use std::collections::{BTreeMap, HashSet};

fn students(dept: &str, count: usize) -> Vec<Student> {
    (1..=count)
        .map(|i| Student::new(format!("{dept}{i:03}"), format!("{dept} student {i}"), dept, 2))
        .collect()
}

fn occupancy(allocations: &[exam_planner::SeatAllocation]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for allocation in allocations {
        *counts.entry(allocation.hall_id).or_insert(0) += 1;
    }
    counts
}

#[test]
fn linear_fill_rolls_over_and_restarts_numbering() {
    let halls = vec![Hall::new(1, "101", 30), Hall::new(2, "102", 30)];
    let allocator = SeatingAllocator::new(1, ExamType::Sem, OrderingMode::Linear);
    assert_eq!(allocator.policy(), PlacementPolicy::Linear);

    let allocations = allocator.allocate(&students("CSE", 45), &halls).unwrap();

    assert_eq!(allocations.len(), 45);
    let first: Vec<u32> = allocations
        .iter()
        .filter(|a| a.hall_id == 1)
        .map(|a| a.seat_number)
        .collect();
    let second: Vec<u32> = allocations
        .iter()
        .filter(|a| a.hall_id == 2)
        .map(|a| a.seat_number)
        .collect();
    assert_eq!(first, (1..=30).collect::<Vec<_>>());
    assert_eq!(second, (1..=15).collect::<Vec<_>>());
    assert_eq!(allocations[30].register_number, "CSE031");
    assert_eq!(allocations[30].hall_number, "102");
    assert!(allocations.iter().all(|a| a.is_left_seat));
}

#[test]
fn linear_fill_groups_departments_by_register_number() {
    let mut all = students("ECE", 2);
    all.extend(students("CSE", 2));
    let halls = vec![Hall::new(1, "101", 10)];
    let allocations = SeatingAllocator::new(1, ExamType::Sem, OrderingMode::Linear)
        .allocate(&all, &halls)
        .unwrap();
    let order: Vec<&str> = allocations.iter().map(|a| a.register_number.as_str()).collect();
    assert_eq!(order, vec!["CSE001", "CSE002", "ECE001", "ECE002"]);
}

#[test]
fn alternating_fill_separates_departments() {
    let mut all = students("CSE", 4);
    all.extend(students("ECE", 4));
    let halls = vec![Hall::new(1, "101", 8)];
    let allocations = SeatingAllocator::new(1, ExamType::Sem, OrderingMode::Alternating)
        .allocate(&all, &halls)
        .unwrap();

    assert!(
        allocations
            .windows(2)
            .all(|pair| pair[0].department != pair[1].department)
    );
    assert_eq!(allocations[0].register_number, "CSE001");
    assert_eq!(allocations[1].register_number, "ECE001");
}

#[test]
fn bench_fill_leaves_only_the_last_bench_half_empty() {
    let halls = vec![Hall::new(1, "101", 30)];
    let allocator = SeatingAllocator::new(1, ExamType::Internal, OrderingMode::Linear);
    assert_eq!(
        allocator.policy(),
        PlacementPolicy::BenchPaired(OrderingMode::Linear)
    );

    let allocations = allocator.allocate(&students("CSE", 59), &halls).unwrap();

    assert_eq!(allocations.len(), 59);
    for bench in 1..=29 {
        let sides: Vec<bool> = allocations
            .iter()
            .filter(|a| a.seat_number == bench)
            .map(|a| a.is_left_seat)
            .collect();
        assert_eq!(sides, vec![true, false], "bench {bench} not fully paired");
    }
    let last: Vec<&exam_planner::SeatAllocation> =
        allocations.iter().filter(|a| a.seat_number == 30).collect();
    assert_eq!(last.len(), 1);
    assert!(last[0].is_left_seat);
}

#[test]
fn bench_capacity_is_twice_the_hall_capacity() {
    let halls = vec![Hall::new(1, "101", 2), Hall::new(2, "102", 2)];
    let allocations = SeatingAllocator::new(1, ExamType::Internal, OrderingMode::Alternating)
        .allocate(&students("CSE", 6), &halls)
        .unwrap();
    assert_eq!(occupancy(&allocations), BTreeMap::from([(1, 4), (2, 2)]));
    assert!(allocations.iter().all(|a| a.seat_number <= 2));
}

#[test]
fn overflowing_students_fail_before_placement() {
    let halls = vec![Hall::new(1, "101", 10), Hall::new(2, "102", 10)];
    let err = SeatingAllocator::new(1, ExamType::Sem, OrderingMode::Linear)
        .allocate(&students("CSE", 21), &halls)
        .unwrap_err();
    assert!(matches!(
        err,
        PlannerError::InsufficientCapacity {
            required: 21,
            available: 20
        }
    ));

    // the same students fit once benches double the capacity
    assert!(SeatingAllocator::new(1, ExamType::Internal, OrderingMode::Linear)
        .allocate(&students("CSE", 21), &halls)
        .is_ok());
}

#[test]
fn seats_are_unique_and_within_capacity() {
    let mut all = students("CSE", 37);
    all.extend(students("ECE", 22));
    all.extend(students("MECH", 9));
    let halls = vec![
        Hall::new(1, "101", 20),
        Hall::new(2, "102", 25),
        Hall::new(3, "103", 30),
    ];
    for (exam_type, ordering) in [
        (ExamType::Sem, OrderingMode::Linear),
        (ExamType::Sem, OrderingMode::Alternating),
        (ExamType::Internal, OrderingMode::Alternating),
    ] {
        let allocations = SeatingAllocator::new(1, exam_type, ordering)
            .allocate(&all, &halls)
            .unwrap();
        let mut seats = HashSet::new();
        for a in &allocations {
            assert!(seats.insert((a.hall_id, a.seat_number, a.is_left_seat)));
        }
        for (hall_id, count) in occupancy(&allocations) {
            let hall = halls.iter().find(|h| h.id == hall_id).unwrap();
            assert!(count as u32 <= hall.effective_capacity(exam_type));
        }
        let registers: HashSet<&str> = allocations.iter().map(|a| a.register_number.as_str()).collect();
        assert_eq!(registers.len(), all.len());
    }
}

#[test]
fn identical_inputs_give_identical_seating() {
    let mut all = students("CSE", 12);
    all.extend(students("ECE", 7));
    let mut shuffled = all.clone();
    shuffled.reverse();
    let halls = vec![Hall::new(1, "101", 8), Hall::new(2, "102", 8)];
    let allocator = SeatingAllocator::new(3, ExamType::Internal, OrderingMode::Alternating);
    assert_eq!(
        allocator.allocate(&all, &halls).unwrap(),
        allocator.allocate(&shuffled, &halls).unwrap()
    );
}

#[test]
fn summaries_describe_each_used_hall() {
    let mut all = students("CSE", 25);
    all.extend(students("ECE", 10));
    let halls = vec![
        Hall::new(1, "101", 30),
        Hall::new(2, "102", 30),
        Hall::new(3, "103", 30),
    ];
    let allocations = SeatingAllocator::new(1, ExamType::Sem, OrderingMode::Linear)
        .allocate(&all, &halls)
        .unwrap();

    let summaries = hall_summaries(&allocations, &halls, ExamType::Sem, 30);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].occupied, 30);
    assert_eq!(summaries[0].department_breakdown.get("CSE"), Some(&25));
    assert_eq!(summaries[0].department_breakdown.get("ECE"), Some(&5));
    assert_eq!(summaries[0].invigilators, 1);
    assert_eq!(summaries[1].occupied, 5);

    let departments = department_summaries(&allocations);
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[1].department, "ECE");
    assert_eq!(departments[1].students, 10);
    assert_eq!(departments[1].first_hall, "101");
    assert_eq!(departments[1].last_hall, "102");
}

#[test]
fn layout_places_benches_column_major() {
    let hall = Hall::new(1, "101", 6).with_layout(2, 3);
    let allocations = SeatingAllocator::new(1, ExamType::Internal, OrderingMode::Linear)
        .allocate(&students("CSE", 9), &[hall.clone()])
        .unwrap();

    let layout = HallLayoutMapper::new(ExamType::Internal).map(&allocations, &hall);

    assert_eq!(layout.grid.len(), 3);
    assert_eq!(layout.grid[0].len(), 2);
    assert_eq!(
        layout.cell(0, 0),
        Some(&SeatCell::Bench {
            left: Some("CSE001".to_string()),
            right: Some("CSE002".to_string()),
        })
    );
    // bench 4 starts column 1
    assert_eq!(
        layout.cell(0, 1),
        Some(&SeatCell::Bench {
            left: Some("CSE007".to_string()),
            right: Some("CSE008".to_string()),
        })
    );
    assert_eq!(layout.cell(1, 1).map(SeatCell::label), Some("CSE009 | -".to_string()));
    assert_eq!(layout.cell(2, 1).map(SeatCell::label), Some("- | -".to_string()));
    assert_eq!(layout.occupied(), 9);

    // mapping is pure
    assert_eq!(
        HallLayoutMapper::new(ExamType::Internal).map(&allocations, &hall),
        layout
    );
}

#[test]
fn bench_tail_is_half_filled_only_in_the_last_hall() {
    let halls = vec![Hall::new(1, "101", 2), Hall::new(2, "102", 3)];
    let allocations = SeatingAllocator::new(1, ExamType::Internal, OrderingMode::Linear)
        .allocate(&students("CSE", 9), &halls)
        .unwrap();

    let benches = |hall_id: i32| -> BTreeMap<u32, Vec<bool>> {
        let mut benches: BTreeMap<u32, Vec<bool>> = BTreeMap::new();
        for a in allocations.iter().filter(|a| a.hall_id == hall_id) {
            benches.entry(a.seat_number).or_default().push(a.is_left_seat);
        }
        benches
    };

    let first = benches(1);
    assert_eq!(first.len(), 2);
    assert!(first.values().all(|sides| sides == &vec![true, false]));

    let second = benches(2);
    assert_eq!(second.len(), 3);
    assert_eq!(second[&1], vec![true, false]);
    assert_eq!(second[&2], vec![true, false]);
    assert_eq!(second[&3], vec![true]);
    assert_eq!(allocations.last().unwrap().register_number, "CSE009");
}
