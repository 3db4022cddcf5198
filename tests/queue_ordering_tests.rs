//! Active-queue ordering properties.

use std::cmp::Ordering;
use taskdesk::models::task::{
    archive_ordering, queue_ordering, sort_active_queue, TaskPriority, TaskStatus, TaskType,
};

mod common;
use common::{sample_task, ts};

#[test]
fn incidents_sort_before_everything_else() {
    let mut tasks = vec![
        sample_task(TaskType::Consultation, TaskStatus::Unassigned, TaskPriority::High),
        sample_task(TaskType::Incident, TaskStatus::Waiting, TaskPriority::Low),
    ];

    sort_active_queue(&mut tasks);

    assert_eq!(tasks[0].task_type, TaskType::Incident);
}

#[test]
fn untouched_work_sorts_before_work_in_progress() {
    let mut tasks = vec![
        sample_task(TaskType::Other, TaskStatus::Queued, TaskPriority::High),
        sample_task(TaskType::Other, TaskStatus::InProgress, TaskPriority::High),
        sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::High),
    ];

    sort_active_queue(&mut tasks);

    assert_eq!(tasks[0].status, TaskStatus::Unassigned);
    assert_eq!(tasks[1].status, TaskStatus::InProgress);
    assert_eq!(tasks[2].status, TaskStatus::Queued);
}

#[test]
fn priority_orders_within_equal_type_and_status() {
    let mut tasks = vec![
        sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Low),
        sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::High),
        sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium),
    ];

    sort_active_queue(&mut tasks);

    assert_eq!(tasks[0].priority, TaskPriority::High);
    assert_eq!(tasks[1].priority, TaskPriority::Medium);
    assert_eq!(tasks[2].priority, TaskPriority::Low);
}

#[test]
fn earlier_deadline_wins_and_missing_deadline_sorts_last() {
    let mut a = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);
    let mut b = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);
    let c = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);

    a.deadline = Some(ts(18, 0));
    b.deadline = Some(ts(12, 0));

    let mut tasks = vec![a, c, b];
    sort_active_queue(&mut tasks);

    assert_eq!(tasks[0].deadline, Some(ts(12, 0)));
    assert_eq!(tasks[1].deadline, Some(ts(18, 0)));
    assert_eq!(tasks[2].deadline, None);
}

#[test]
fn ordering_is_insertion_order_independent() {
    let make = || {
        vec![
            sample_task(TaskType::Incident, TaskStatus::InProgress, TaskPriority::Low),
            sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::High),
            sample_task(TaskType::Incident, TaskStatus::Unassigned, TaskPriority::Medium),
            sample_task(TaskType::Consultation, TaskStatus::Waiting, TaskPriority::High),
        ]
    };

    let mut forward = make();
    let mut reversed = make();
    reversed.reverse();

    sort_active_queue(&mut forward);
    sort_active_queue(&mut reversed);

    let keys = |tasks: &[taskdesk::models::task::Task]| {
        tasks
            .iter()
            .map(|t| (t.task_type, t.status, t.priority))
            .collect::<Vec<_>>()
    };

    assert_eq!(keys(&forward), keys(&reversed));
    assert_eq!(forward[0].task_type, TaskType::Incident);
    assert_eq!(forward[0].status, TaskStatus::Unassigned);
}

#[test]
fn equal_keys_compare_equal_so_stable_sort_keeps_fetch_order() {
    let a = sample_task(TaskType::Other, TaskStatus::Queued, TaskPriority::Medium);
    let b = sample_task(TaskType::Other, TaskStatus::Queued, TaskPriority::Medium);

    assert_eq!(queue_ordering(&a, &b), Ordering::Equal);
}

#[test]
fn archive_orders_by_completion_desc_with_missing_stamp_last() {
    let mut early = sample_task(TaskType::Other, TaskStatus::Done, TaskPriority::Medium);
    let mut late = sample_task(TaskType::Other, TaskStatus::Done, TaskPriority::Medium);
    let unstamped = sample_task(TaskType::Other, TaskStatus::Done, TaskPriority::Medium);

    early.completed_at = Some(ts(10, 0));
    late.completed_at = Some(ts(16, 0));

    let mut tasks = vec![early, unstamped, late];
    tasks.sort_by(archive_ordering);

    assert_eq!(tasks[0].completed_at, Some(ts(16, 0)));
    assert_eq!(tasks[1].completed_at, Some(ts(10, 0)));
    assert_eq!(tasks[2].completed_at, None);
}
