//! Task repository (database access layer).
//!
//! Query methods return rows in their persisted order; the active-queue
//! policy ordering lives in `models::task` and is applied by the service.

use crate::{error::AppError, models::task::*};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TaskRepository {
    db: PgPool,
}

impl TaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a fully-formed task. A task_number collision surfaces as a
    /// unique-violation database error; the allocator retries on it.
    pub async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let created = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (
                id, task_number, title, description, task_type, status, priority,
                requester_name, requester_department, requester_email, requester_phone,
                deadline, estimated_hours, screenshot_url, completion_comment,
                assigned_to_id, created_at, taken_at, completed_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(&task.task_number)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.requester_name)
        .bind(&task.requester_department)
        .bind(&task.requester_email)
        .bind(&task.requester_phone)
        .bind(task.deadline)
        .bind(task.estimated_hours)
        .bind(&task.screenshot_url)
        .bind(&task.completion_comment)
        .bind(task.assigned_to_id)
        .bind(task.created_at)
        .bind(task.taken_at)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .fetch_one(&self.db)
        .await?;

        Ok(created)
    }

    /// Persist a mutated task entity. Identity fields (id, task_number,
    /// created_at) are never written back.
    pub async fn save(&self, task: &Task) -> Result<Task, AppError> {
        let saved = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET
                title = $2,
                description = $3,
                task_type = $4,
                status = $5,
                priority = $6,
                requester_name = $7,
                requester_department = $8,
                requester_email = $9,
                requester_phone = $10,
                deadline = $11,
                estimated_hours = $12,
                screenshot_url = $13,
                completion_comment = $14,
                assigned_to_id = $15,
                taken_at = $16,
                completed_at = $17,
                updated_at = $18
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.requester_name)
        .bind(&task.requester_department)
        .bind(&task.requester_email)
        .bind(&task.requester_phone)
        .bind(task.deadline)
        .bind(task.estimated_hours)
        .bind(&task.screenshot_url)
        .bind(&task.completion_comment)
        .bind(task.assigned_to_id)
        .bind(task.taken_at)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .fetch_one(&self.db)
        .await?;

        Ok(saved)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(task)
    }

    pub async fn find_by_number(&self, task_number: &str) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_number = $1")
            .bind(task_number)
            .fetch_optional(&self.db)
            .await?;

        Ok(task)
    }

    /// Filtered list: any subset of status/type/priority, AND-combined,
    /// newest-created first.
    pub async fn list_filtered(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR task_type = $2)
              AND ($3::text IS NULL OR priority = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&filter.status)
        .bind(&filter.task_type)
        .bind(&filter.priority)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// All non-terminal tasks, in creation order. The prioritized queue
    /// ordering is applied on top by the service.
    pub async fn active(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE status NOT IN ('Готово', 'Отменено') ORDER BY created_at",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Terminal tasks, most recently completed first.
    pub async fn completed(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE status IN ('Готово', 'Отменено')
            ORDER BY completed_at DESC NULLS LAST
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Terminal tasks a given staff member was personally assigned.
    pub async fn completed_by_assignee(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE status IN ('Готово', 'Отменено') AND assigned_to_id = $1
            ORDER BY completed_at DESC NULLS LAST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Ownership scope: tasks authored by a given requester email.
    pub async fn by_requester_email(&self, email: &str) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE requester_email = $1 ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    pub async fn by_assignee(&self, user_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE assigned_to_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    pub async fn unassigned(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE status = 'Неразобранная' ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Active tasks whose deadline has passed.
    pub async fn overdue(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE deadline < NOW() AND status NOT IN ('Готово', 'Отменено')
            ORDER BY deadline
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Done tasks completed at or after the given instant.
    pub async fn done_since(&self, since: DateTime<Utc>) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE status = 'Готово' AND completed_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// All done tasks, for grouped statistics.
    pub async fn all_done(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE status = 'Готово'")
            .fetch_all(&self.db)
            .await?;

        Ok(tasks)
    }

    pub async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE created_at >= $1")
            .bind(since)
            .fetch_all(&self.db)
            .await?;

        Ok(tasks)
    }

    pub async fn by_assignee_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE assigned_to_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    pub async fn by_department_since(
        &self,
        department: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE requester_department = $1 AND created_at >= $2",
        )
        .bind(department)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(tasks)
    }

    /// Lexicographically maximal task number with the given day prefix.
    /// Sequence numbers are zero-padded, so string order equals numeric
    /// order within a day.
    pub async fn max_number_with_prefix(&self, prefix: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT task_number FROM tasks WHERE task_number LIKE $1 ORDER BY task_number DESC LIMIT 1",
        )
        .bind(format!("{}%", prefix))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| r.0))
    }
}
