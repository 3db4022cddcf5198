//! Status state machine properties.

use taskdesk::models::task::{TaskPriority, TaskStatus, TaskType};
use uuid::Uuid;

mod common;
use common::sample_task;

#[test]
fn first_entry_into_work_stamps_taken_at_and_claims() {
    let mut task = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);
    let staff = Uuid::new_v4();

    task.apply_status(TaskStatus::InProgress, Some(staff));

    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(task.taken_at.is_some());
    assert_eq!(task.assigned_to_id, Some(staff));
}

#[test]
fn taken_at_is_stamped_only_once() {
    let mut task = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);

    task.apply_status(TaskStatus::InProgress, Some(Uuid::new_v4()));
    let first_taken = task.taken_at;

    task.apply_status(TaskStatus::Waiting, None);
    task.apply_status(TaskStatus::InProgress, Some(Uuid::new_v4()));

    assert_eq!(task.taken_at, first_taken);
}

#[test]
fn completed_at_is_stamped_only_once() {
    let mut task = sample_task(TaskType::Other, TaskStatus::InProgress, TaskPriority::Medium);

    task.apply_status(TaskStatus::Done, None);
    let first_completed = task.completed_at;
    assert!(first_completed.is_some());

    // Reopen and complete again; the original stamp survives.
    task.apply_status(TaskStatus::InProgress, None);
    task.apply_status(TaskStatus::Done, None);

    assert_eq!(task.completed_at, first_completed);
}

#[test]
fn same_status_reapplication_only_refreshes_updated_at() {
    let mut task = sample_task(TaskType::Other, TaskStatus::Queued, TaskPriority::Medium);
    let before = task.updated_at;

    task.apply_status(TaskStatus::Queued, Some(Uuid::new_v4()));

    assert_eq!(task.status, TaskStatus::Queued);
    assert!(task.taken_at.is_none());
    assert!(task.completed_at.is_none());
    assert!(task.assigned_to_id.is_none());
    assert!(task.updated_at >= before);
}

#[test]
fn reentering_work_does_not_reassign_without_actor() {
    let mut task = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);
    let original = Uuid::new_v4();

    task.apply_status(TaskStatus::InProgress, Some(original));
    task.apply_status(TaskStatus::Waiting, None);
    task.apply_status(TaskStatus::InProgress, None);

    assert_eq!(task.assigned_to_id, Some(original));
}

#[test]
fn any_transition_between_states_is_accepted() {
    // The graph is free: even terminal states can be left again.
    let mut task = sample_task(TaskType::Other, TaskStatus::Done, TaskPriority::Medium);

    task.apply_status(TaskStatus::InProgress, Some(Uuid::new_v4()));
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(task.is_active());

    task.apply_status(TaskStatus::Cancelled, None);
    assert_eq!(task.status, TaskStatus::Cancelled);
    assert!(!task.is_active());
}

#[test]
fn overdue_requires_deadline_and_active_status() {
    let mut task = sample_task(TaskType::Other, TaskStatus::InProgress, TaskPriority::Medium);
    assert!(!task.is_overdue());

    task.deadline = Some(chrono::Utc::now() - chrono::Duration::hours(1));
    assert!(task.is_overdue());

    task.apply_status(TaskStatus::Done, None);
    assert!(!task.is_overdue());
}

#[test]
fn elapsed_time_helpers_need_their_stamps() {
    let mut task = sample_task(TaskType::Other, TaskStatus::Unassigned, TaskPriority::Medium);
    assert_eq!(task.time_to_take_minutes(), None);
    assert_eq!(task.time_to_complete_hours(), None);

    task.taken_at = Some(common::ts(10, 30));
    assert_eq!(task.time_to_take_minutes(), Some(90));

    task.completed_at = Some(common::ts(14, 0));
    assert_eq!(task.time_to_complete_hours(), Some(3.5));
}
