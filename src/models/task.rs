//! Task domain model: the ticket entity, its closed enumerations, the status
//! state machine and the active-queue ordering.
//!
//! Status, type and priority are stored and transferred as their original
//! Russian display strings; the enums here are the only place those strings
//! are interpreted.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "Сбой")]
    Incident,
    #[serde(rename = "Новая разработка")]
    NewDevelopment,
    #[serde(rename = "Консультация")]
    Consultation,
    #[serde(rename = "Прочее")]
    Other,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Incident => "Сбой",
            TaskType::NewDevelopment => "Новая разработка",
            TaskType::Consultation => "Консультация",
            TaskType::Other => "Прочее",
        }
    }
}

impl TryFrom<&str> for TaskType {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Сбой" => Ok(TaskType::Incident),
            "Новая разработка" => Ok(TaskType::NewDevelopment),
            "Консультация" => Ok(TaskType::Consultation),
            "Прочее" => Ok(TaskType::Other),
            other => Err(AppError::Validation(format!("Invalid task type: {}", other))),
        }
    }
}

impl TryFrom<String> for TaskType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskType::try_from(value.as_str())
    }
}

/// Task status. Free transition graph among the six states; Done and
/// Cancelled are terminal only in the sense that nothing routes out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Неразобранная")]
    Unassigned,
    #[serde(rename = "В работе")]
    InProgress,
    #[serde(rename = "В очереди")]
    Queued,
    #[serde(rename = "Ожидает")]
    Waiting,
    #[serde(rename = "Готово")]
    Done,
    #[serde(rename = "Отменено")]
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Unassigned => "Неразобранная",
            TaskStatus::InProgress => "В работе",
            TaskStatus::Queued => "В очереди",
            TaskStatus::Waiting => "Ожидает",
            TaskStatus::Done => "Готово",
            TaskStatus::Cancelled => "Отменено",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Неразобранная" => Ok(TaskStatus::Unassigned),
            "В работе" => Ok(TaskStatus::InProgress),
            "В очереди" => Ok(TaskStatus::Queued),
            "Ожидает" => Ok(TaskStatus::Waiting),
            "Готово" => Ok(TaskStatus::Done),
            "Отменено" => Ok(TaskStatus::Cancelled),
            other => Err(AppError::Validation(format!("Invalid status: {}", other))),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskStatus::try_from(value.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "Высокий")]
    High,
    #[serde(rename = "Средний")]
    Medium,
    #[serde(rename = "Низкий")]
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "Высокий",
            TaskPriority::Medium => "Средний",
            TaskPriority::Low => "Низкий",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Высокий" => Ok(TaskPriority::High),
            "Средний" => Ok(TaskPriority::Medium),
            "Низкий" => Ok(TaskPriority::Low),
            other => Err(AppError::Validation(format!("Invalid priority: {}", other))),
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskPriority::try_from(value.as_str())
    }
}

/// A tracked unit of requested IT work.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    /// Human-facing number, `TASK-<YYYYMMDD>-<NNNN>`. Immutable and unique.
    pub task_number: String,

    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub task_type: TaskType,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    // Requester details; the email doubles as the ownership key.
    pub requester_name: String,
    pub requester_department: String,
    pub requester_email: Option<String>,
    pub requester_phone: Option<String>,

    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub screenshot_url: Option<String>,
    pub completion_comment: Option<String>,
    pub assigned_to_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    /// Stamped exactly once, on first entry into "В работе".
    pub taken_at: Option<DateTime<Utc>>,
    /// Stamped exactly once, on first entry into "Готово".
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Apply a status transition with its timestamp side effects.
    ///
    /// Any transition among the six states is legal. First entry into
    /// InProgress stamps `taken_at` and, when an acting user is given,
    /// claims the task for them. First entry into Done stamps
    /// `completed_at`. Re-entering a state never re-stamps either
    /// timestamp; `updated_at` always refreshes.
    pub fn apply_status(&mut self, new_status: TaskStatus, acting_user: Option<Uuid>) {
        let old_status = self.status;
        self.status = new_status;

        if new_status == TaskStatus::InProgress && old_status != TaskStatus::InProgress {
            if self.taken_at.is_none() {
                self.taken_at = Some(Utc::now());
            }
            if let Some(user_id) = acting_user {
                self.assigned_to_id = Some(user_id);
            }
        }

        if new_status == TaskStatus::Done
            && old_status != TaskStatus::Done
            && self.completed_at.is_none()
        {
            self.completed_at = Some(Utc::now());
        }

        self.updated_at = Utc::now();
    }

    /// Active means not yet in a terminal state.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Overdue: has a deadline, still active, deadline in the past.
    pub fn is_overdue(&self) -> bool {
        match self.deadline {
            Some(deadline) => self.is_active() && Utc::now() > deadline,
            None => false,
        }
    }

    /// Minutes from creation to first being taken into work.
    pub fn time_to_take_minutes(&self) -> Option<i64> {
        let taken_at = self.taken_at?;
        Some((taken_at - self.created_at).num_minutes())
    }

    /// Hours from being taken into work to completion, rounded to 2 decimals.
    pub fn time_to_complete_hours(&self) -> Option<f64> {
        let taken_at = self.taken_at?;
        let completed_at = self.completed_at?;
        let hours = (completed_at - taken_at).num_seconds() as f64 / 3600.0;
        Some((hours * 100.0).round() / 100.0)
    }
}

/// Active-queue ordering: a stable multi-key comparison, most significant
/// key first. Incidents before everything, then untouched work before work
/// in progress before the rest, then high priority first, then soonest
/// deadline (no deadline sorts last).
pub fn queue_ordering(a: &Task, b: &Task) -> Ordering {
    fn type_rank(task: &Task) -> u8 {
        match task.task_type {
            TaskType::Incident => 0,
            _ => 1,
        }
    }

    fn status_rank(task: &Task) -> u8 {
        match task.status {
            TaskStatus::Unassigned => 0,
            TaskStatus::InProgress => 1,
            _ => 2,
        }
    }

    fn priority_rank(task: &Task) -> u8 {
        match task.priority {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }

    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| status_rank(a).cmp(&status_rank(b)))
        .then_with(|| priority_rank(a).cmp(&priority_rank(b)))
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Sort the active queue in place. `sort_by` is stable, so ties keep their
/// fetch order.
pub fn sort_active_queue(tasks: &mut [Task]) {
    tasks.sort_by(queue_ordering);
}

/// Completed-archive ordering: most recently completed first, tasks without
/// a completion stamp last.
pub fn archive_ordering(a: &Task, b: &Task) -> Ordering {
    match (a.completed_at, b.completed_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Create task request (web form or trusted integration)
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub requester_name: String,
    pub requester_department: String,
    pub requester_email: Option<String>,
    pub requester_phone: Option<String>,
    /// Free-form date string; unparseable input yields no deadline.
    pub deadline: Option<String>,
    pub estimated_hours: Option<f64>,
    pub screenshot_url: Option<String>,
}

/// Allow-listed task update. Every field is individually optional; absent
/// fields are left untouched. Status changes route through `apply_status`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub estimated_hours: Option<f64>,
    pub screenshot_url: Option<String>,
    pub completion_comment: Option<String>,
    pub assigned_to_id: Option<Uuid>,
}

/// Status transition request
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

/// List filter: any subset, AND-combined.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
}
