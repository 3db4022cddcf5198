//! Task service: creation with number allocation, ownership-scoped queries,
//! status transitions and the prioritized active queue.

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::task::*,
    repository::{TaskRepository, UserRepository},
    services::Notifier,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Allocation retry budget for task-number collisions. The unique
/// constraint on task_number makes the losing concurrent creator retry.
const ALLOCATION_ATTEMPTS: u32 = 3;

/// Day prefix for task numbers: `TASK-YYYYMMDD`.
pub fn day_prefix(date: NaiveDate) -> String {
    format!("TASK-{}", date.format("%Y%m%d"))
}

/// Next number for a day given the current maximum: parse the trailing
/// sequence and increment, or start at 1.
pub fn next_task_number(prefix: &str, last: Option<&str>) -> String {
    let next_seq = last
        .and_then(|number| number.rsplit('-').next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1);

    format!("{}-{:04}", prefix, next_seq)
}

/// Whether a string is a well-formed task number.
pub fn is_task_number(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    // At least four digits: the sequence grows past 9999 unpadded.
    let re = RE.get_or_init(|| Regex::new(r"^TASK-\d{8}-\d{4,}$").expect("valid regex"));
    re.is_match(value)
}

/// Parse a deadline from any of the five supported formats. Unparseable
/// input yields no deadline, never an error.
pub fn parse_deadline(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Second variant is the HTML datetime-local format.
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

pub struct TaskService {
    db: PgPool,
    notifier: Arc<Notifier>,
}

impl TaskService {
    pub fn new(db: PgPool, notifier: Arc<Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Create a task from a submission. Allocates the day-scoped number,
    /// retrying on a concurrent collision, then dispatches the new-task
    /// notification after the write commits.
    pub async fn create_task(&self, req: CreateTaskRequest) -> Result<Task, AppError> {
        if req.title.trim().is_empty() {
            return Err(AppError::validation("Title must not be empty"));
        }
        if req.requester_name.trim().is_empty() {
            return Err(AppError::validation("Requester name must not be empty"));
        }
        if req.requester_department.trim().is_empty() {
            return Err(AppError::validation("Requester department must not be empty"));
        }

        let task_type = match &req.task_type {
            Some(value) => TaskType::try_from(value.as_str())?,
            None => TaskType::Other,
        };
        let priority = match &req.priority {
            Some(value) => TaskPriority::try_from(value.as_str())?,
            None => TaskPriority::Medium,
        };
        let deadline = req.deadline.as_deref().and_then(parse_deadline);

        let repo = TaskRepository::new(self.db.clone());

        let mut last_error = AppError::AllocationFailed;
        for attempt in 1..=ALLOCATION_ATTEMPTS {
            let now = Utc::now();
            let prefix = day_prefix(now.date_naive());
            let last = repo.max_number_with_prefix(&prefix).await?;
            let task_number = next_task_number(&prefix, last.as_deref());

            let task = Task {
                id: Uuid::new_v4(),
                task_number,
                title: req.title.clone(),
                description: req.description.clone(),
                task_type,
                status: TaskStatus::Unassigned,
                priority,
                requester_name: req.requester_name.clone(),
                requester_department: req.requester_department.clone(),
                requester_email: req.requester_email.clone(),
                requester_phone: req.requester_phone.clone(),
                deadline,
                estimated_hours: req.estimated_hours,
                screenshot_url: req.screenshot_url.clone(),
                completion_comment: None,
                assigned_to_id: None,
                created_at: now,
                taken_at: None,
                completed_at: None,
                updated_at: now,
            };

            match repo.insert(&task).await {
                Ok(created) => {
                    tracing::info!(
                        task_id = %created.id,
                        task_number = %created.task_number,
                        "Task created"
                    );
                    self.dispatch_new_task(created.clone());
                    return Ok(created);
                }
                Err(e) if e.is_unique_violation() => {
                    tracing::warn!(
                        attempt,
                        "Task number collision, retrying allocation"
                    );
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(
            attempts = ALLOCATION_ATTEMPTS,
            error = %last_error,
            "Task number allocation retry budget exhausted"
        );
        Err(AppError::AllocationFailed)
    }

    /// Ticket visible to the caller. For the "user" role an unowned ticket
    /// reads as not-found so nothing about its existence leaks.
    pub async fn get_task(&self, ctx: &AuthContext, id: Uuid) -> Result<Task, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let task = repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;

        check_visibility(ctx, &task)?;
        Ok(task)
    }

    pub async fn get_task_by_number(
        &self,
        ctx: &AuthContext,
        task_number: &str,
    ) -> Result<Task, AppError> {
        if !is_task_number(task_number) {
            return Err(AppError::validation("Malformed task number"));
        }

        let repo = TaskRepository::new(self.db.clone());
        let task = repo
            .find_by_number(task_number)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;

        check_visibility(ctx, &task)?;
        Ok(task)
    }

    /// Filtered list scoped by ownership: the "user" role sees only its own
    /// submissions, staff and admin see everything.
    pub async fn list_tasks(&self, ctx: &AuthContext, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let repo = TaskRepository::new(self.db.clone());

        if ctx.capabilities().owner_filter_required {
            let mut tasks = repo.by_requester_email(&ctx.email).await?;
            tasks.retain(|task| matches_filter(task, filter));
            Ok(tasks)
        } else {
            repo.list_filtered(filter).await
        }
    }

    /// Prioritized active queue (staff view).
    pub async fn active_queue(&self) -> Result<Vec<Task>, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let mut tasks = repo.active().await?;
        sort_active_queue(&mut tasks);
        Ok(tasks)
    }

    /// Completed archive. Staff see only tasks they personally handled;
    /// admin sees the whole archive.
    pub async fn archive(&self, ctx: &AuthContext) -> Result<Vec<Task>, AppError> {
        let repo = TaskRepository::new(self.db.clone());

        match ctx.role {
            crate::models::user::Role::Admin => repo.completed().await,
            _ => repo.completed_by_assignee(ctx.user_id).await,
        }
    }

    /// Tasks the caller submitted (requester email match).
    pub async fn my_tasks(&self, ctx: &AuthContext) -> Result<Vec<Task>, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        repo.by_requester_email(&ctx.email).await
    }

    /// Tasks assigned to the caller.
    pub async fn assigned_to_me(&self, ctx: &AuthContext) -> Result<Vec<Task>, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        repo.by_assignee(ctx.user_id).await
    }

    /// Apply an allow-listed update. A status field routes through the
    /// state machine; everything else is a plain field assignment.
    pub async fn update_task(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        req: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        // Parse enum fields before touching the entity: no partial writes.
        let new_type = req
            .task_type
            .as_deref()
            .map(TaskType::try_from)
            .transpose()?;
        let new_priority = req
            .priority
            .as_deref()
            .map(TaskPriority::try_from)
            .transpose()?;
        let new_status = req
            .status
            .as_deref()
            .map(TaskStatus::try_from)
            .transpose()?;

        let repo = TaskRepository::new(self.db.clone());
        let mut task = repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;
        let old_status = task.status;

        if let Some(title) = req.title {
            if title.trim().is_empty() {
                return Err(AppError::validation("Title must not be empty"));
            }
            task.title = title;
        }
        if let Some(description) = req.description {
            task.description = description;
        }
        if let Some(task_type) = new_type {
            task.task_type = task_type;
        }
        if let Some(priority) = new_priority {
            task.priority = priority;
        }
        if let Some(deadline) = req.deadline.as_deref() {
            task.deadline = parse_deadline(deadline);
        }
        if let Some(hours) = req.estimated_hours {
            task.estimated_hours = Some(hours);
        }
        if let Some(url) = req.screenshot_url {
            task.screenshot_url = Some(url);
        }
        if let Some(comment) = req.completion_comment {
            task.completion_comment = Some(comment);
        }
        if let Some(assignee) = req.assigned_to_id {
            task.assigned_to_id = Some(assignee);
        }

        if let Some(status) = new_status {
            // An explicit assignee in the same request claims for them,
            // otherwise the acting caller claims.
            let acting = req.assigned_to_id.or(Some(ctx.user_id));
            task.apply_status(status, acting);
        } else {
            task.updated_at = Utc::now();
        }

        let saved = repo.save(&task).await?;

        if let Some(status) = new_status {
            if status != old_status {
                self.dispatch_status_change(saved.clone());
            }
        }

        Ok(saved)
    }

    /// Status transition. Claiming semantics: entering work assigns the
    /// acting caller unless the ticket already carries that transition's
    /// timestamps.
    pub async fn transition_status(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        new_status: &str,
    ) -> Result<Task, AppError> {
        let status = TaskStatus::try_from(new_status)?;

        let repo = TaskRepository::new(self.db.clone());
        let mut task = repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;
        let old_status = task.status;

        task.apply_status(status, Some(ctx.user_id));
        let saved = repo.save(&task).await?;

        tracing::info!(
            task_number = %saved.task_number,
            from = old_status.as_str(),
            to = status.as_str(),
            "Status transition"
        );

        if status != old_status {
            self.dispatch_status_change(saved.clone());
        }

        Ok(saved)
    }

    /// Explicit assignment without a status change.
    pub async fn assign_task(&self, id: Uuid, user_id: Uuid) -> Result<Task, AppError> {
        let user_repo = UserRepository::new(self.db.clone());
        if user_repo.find_by_id(&user_id).await?.is_none() {
            return Err(AppError::not_found("user"));
        }

        let repo = TaskRepository::new(self.db.clone());
        let mut task = repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;

        task.assigned_to_id = Some(user_id);
        task.updated_at = Utc::now();

        repo.save(&task).await
    }

    /// Notification dispatch is post-commit and isolated: a spawned task
    /// that logs and swallows its own failures.
    fn dispatch_new_task(&self, task: Task) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify_new_task(&task).await;
        });
    }

    fn dispatch_status_change(&self, task: Task) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            notifier.notify_status_change(&task).await;
        });
    }
}

/// Ownership gate for single-ticket reads. Roles carrying the owner
/// filter see an unowned ticket as not-found.
fn check_visibility(ctx: &AuthContext, task: &Task) -> Result<(), AppError> {
    if ctx.capabilities().owner_filter_required
        && task.requester_email.as_deref() != Some(ctx.email.as_str())
    {
        return Err(AppError::not_found("task"));
    }
    Ok(())
}

fn matches_filter(task: &Task, filter: &TaskFilter) -> bool {
    if let Some(status) = &filter.status {
        if task.status.as_str() != status {
            return false;
        }
    }
    if let Some(task_type) = &filter.task_type {
        if task.task_type.as_str() != task_type {
            return false;
        }
    }
    if let Some(priority) = &filter.priority {
        if task.priority.as_str() != priority {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn context(role: Role, email: &str) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            email: email.to_string(),
            role,
        }
    }

    fn ticket(requester_email: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            task_number: "TASK-20240115-0001".to_string(),
            title: "Не работает принтер".to_string(),
            description: String::new(),
            task_type: TaskType::Incident,
            status: TaskStatus::Unassigned,
            priority: TaskPriority::Medium,
            requester_name: "Пётр Петров".to_string(),
            requester_department: "Бухгалтерия".to_string(),
            requester_email: requester_email.map(str::to_string),
            requester_phone: None,
            deadline: None,
            estimated_hours: None,
            screenshot_url: None,
            completion_comment: None,
            assigned_to_id: None,
            created_at: now,
            taken_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_day_prefix() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(day_prefix(date), "TASK-20240115");
    }

    #[test]
    fn test_next_task_number_first_of_day() {
        assert_eq!(next_task_number("TASK-20240115", None), "TASK-20240115-0001");
    }

    #[test]
    fn test_next_task_number_increments() {
        assert_eq!(
            next_task_number("TASK-20240115", Some("TASK-20240115-0007")),
            "TASK-20240115-0008"
        );
        assert_eq!(
            next_task_number("TASK-20240115", Some("TASK-20240115-0099")),
            "TASK-20240115-0100"
        );
    }

    #[test]
    fn test_next_task_number_garbage_restarts() {
        assert_eq!(
            next_task_number("TASK-20240115", Some("TASK-20240115-bogus")),
            "TASK-20240115-0001"
        );
    }

    #[test]
    fn test_is_task_number() {
        assert!(is_task_number("TASK-20240115-0007"));
        assert!(!is_task_number("TASK-2024115-0007"));
        assert!(!is_task_number("TICKET-20240115-0007"));
        assert!(!is_task_number("TASK-20240115-7"));
        assert!(!is_task_number("TASK-20240115-007"));
    }

    #[test]
    fn test_allocated_numbers_past_9999_stay_recognizable() {
        let rolled = next_task_number("TASK-20240115", Some("TASK-20240115-9999"));
        assert_eq!(rolled, "TASK-20240115-10000");
        assert!(is_task_number(&rolled));
    }

    #[test]
    fn test_parse_deadline_formats() {
        for input in [
            "2024-01-15",
            "15.01.2024",
            "15/01/2024",
            "2024-01-15 10:30:00",
            "2024-01-15T10:30",
        ] {
            let parsed = parse_deadline(input);
            assert!(parsed.is_some(), "failed to parse {}", input);
            assert_eq!(parsed.unwrap().date_naive().to_string(), "2024-01-15");
        }
    }

    #[test]
    fn test_parse_deadline_unparseable_is_none() {
        assert!(parse_deadline("not a date").is_none());
        assert!(parse_deadline("").is_none());
        assert!(parse_deadline("2024-13-45").is_none());
    }

    #[test]
    fn test_owner_sees_own_ticket() {
        let ctx = context(Role::User, "petrov@company.com");
        let task = ticket(Some("petrov@company.com"));
        assert!(check_visibility(&ctx, &task).is_ok());
    }

    #[test]
    fn test_unowned_ticket_reads_as_not_found() {
        let ctx = context(Role::User, "petrov@company.com");
        let task = ticket(Some("sidorov@company.com"));
        let err = check_visibility(&ctx, &task).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_ticket_without_requester_email_hidden_from_user_role() {
        let ctx = context(Role::User, "petrov@company.com");
        let task = ticket(None);
        assert!(check_visibility(&ctx, &task).is_err());
    }

    #[test]
    fn test_staff_and_admin_see_everything() {
        let task = ticket(Some("petrov@company.com"));
        for role in [Role::ItStaff, Role::Admin] {
            let ctx = context(role, "other@company.com");
            assert!(check_visibility(&ctx, &task).is_ok());
        }
    }

    #[test]
    fn test_matches_filter_single_keys() {
        let task = ticket(None);

        assert!(matches_filter(&task, &TaskFilter::default()));
        assert!(matches_filter(
            &task,
            &TaskFilter {
                status: Some("Неразобранная".to_string()),
                ..Default::default()
            }
        ));
        assert!(!matches_filter(
            &task,
            &TaskFilter {
                status: Some("В работе".to_string()),
                ..Default::default()
            }
        ));
        assert!(!matches_filter(
            &task,
            &TaskFilter {
                task_type: Some("Консультация".to_string()),
                ..Default::default()
            }
        ));
        assert!(!matches_filter(
            &task,
            &TaskFilter {
                priority: Some("Высокий".to_string()),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn test_matches_filter_keys_are_and_combined() {
        let task = ticket(None);

        // All keys match.
        assert!(matches_filter(
            &task,
            &TaskFilter {
                status: Some("Неразобранная".to_string()),
                task_type: Some("Сбой".to_string()),
                priority: Some("Средний".to_string()),
            }
        ));

        // One mismatching key rejects regardless of the others.
        assert!(!matches_filter(
            &task,
            &TaskFilter {
                status: Some("Неразобранная".to_string()),
                task_type: Some("Сбой".to_string()),
                priority: Some("Низкий".to_string()),
            }
        ));
    }
}
