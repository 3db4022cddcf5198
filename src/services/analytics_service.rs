//! Analytics aggregator: read-side statistics over historical task state.
//!
//! All aggregation is pure computation over fetched rows; every aggregate
//! tolerates zero matching tasks and reports zeros instead of failing.

use crate::{
    error::AppError,
    models::task::{Task, TaskStatus},
    models::user::User,
    repository::{TaskRepository, UserRepository},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Default trailing window in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
pub struct Overview {
    pub total_completed_tasks: usize,
    pub avg_time_to_take_minutes: f64,
    pub avg_time_to_complete_hours: f64,
    pub period_days: i64,
}

#[derive(Debug, Serialize)]
pub struct GroupStat {
    pub label: String,
    pub total: usize,
    pub avg_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct DailyTrend {
    pub date: String,
    pub created: usize,
    pub completed: usize,
}

#[derive(Debug, Serialize)]
pub struct PerformanceStats {
    pub overview: Overview,
    pub task_type_statistics: Vec<GroupStat>,
    pub priority_statistics: Vec<GroupStat>,
    pub user_statistics: Vec<GroupStat>,
    pub daily_trends: Vec<DailyTrend>,
}

#[derive(Debug, Serialize)]
pub struct OverdueAnalysis {
    pub total: usize,
    /// days overdue -> task count
    pub by_days: BTreeMap<i64, usize>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct UserPerformance {
    pub user_id: Uuid,
    pub period_days: i64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub status_distribution: BTreeMap<String, usize>,
    pub avg_time_to_complete_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct DepartmentPerformance {
    pub department: String,
    pub period_days: i64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub status_distribution: BTreeMap<String, usize>,
    pub avg_time_to_take_minutes: f64,
    pub avg_time_to_complete_hours: f64,
}

pub struct AnalyticsService {
    db: PgPool,
}

impl AnalyticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fleet-wide performance statistics over the trailing window.
    pub async fn performance_stats(&self) -> Result<PerformanceStats, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let user_repo = UserRepository::new(self.db.clone());

        let now = Utc::now();
        let since = now - Duration::days(DEFAULT_WINDOW_DAYS);

        let done_in_window = repo.done_since(since).await?;
        let all_done = repo.all_done().await?;
        let created_in_window = repo.created_since(since).await?;
        let users = user_repo.list().await?;

        Ok(PerformanceStats {
            overview: Overview {
                total_completed_tasks: done_in_window.len(),
                avg_time_to_take_minutes: avg_time_to_take(&done_in_window),
                avg_time_to_complete_hours: avg_time_to_complete(&done_in_window),
                period_days: DEFAULT_WINDOW_DAYS,
            },
            task_type_statistics: stats_by_type(&all_done),
            priority_statistics: stats_by_priority(&all_done),
            user_statistics: stats_by_assignee(&all_done, &users),
            daily_trends: daily_trends(
                &created_in_window,
                &all_done,
                DEFAULT_WINDOW_DAYS,
                now.date_naive(),
            ),
        })
    }

    /// Overdue tasks grouped by how many days past deadline they are.
    pub async fn overdue_analysis(&self) -> Result<OverdueAnalysis, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let overdue = repo.overdue().await?;

        Ok(group_overdue(overdue))
    }

    /// Per-assignee breakdown over a caller-chosen window.
    pub async fn user_performance(
        &self,
        user_id: Uuid,
        days: i64,
    ) -> Result<UserPerformance, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let since = Utc::now() - Duration::days(days);
        let tasks = repo.by_assignee_since(user_id, since).await?;

        let done: Vec<Task> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .cloned()
            .collect();

        Ok(UserPerformance {
            user_id,
            period_days: days,
            total_tasks: tasks.len(),
            completed_tasks: done.len(),
            status_distribution: status_distribution(&tasks),
            avg_time_to_complete_hours: avg_time_to_complete(&done),
        })
    }

    /// Per-requesting-department breakdown over a caller-chosen window.
    pub async fn department_performance(
        &self,
        department: &str,
        days: i64,
    ) -> Result<DepartmentPerformance, AppError> {
        let repo = TaskRepository::new(self.db.clone());
        let since = Utc::now() - Duration::days(days);
        let tasks = repo.by_department_since(department, since).await?;

        let done: Vec<Task> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .cloned()
            .collect();

        Ok(DepartmentPerformance {
            department: department.to_string(),
            period_days: days,
            total_tasks: tasks.len(),
            completed_tasks: done.len(),
            status_distribution: status_distribution(&tasks),
            avg_time_to_take_minutes: avg_time_to_take(&done),
            avg_time_to_complete_hours: avg_time_to_complete(&done),
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average minutes from creation to being taken, over tasks that have the
/// stamp. Empty input averages to zero.
pub fn avg_time_to_take(tasks: &[Task]) -> f64 {
    let values: Vec<i64> = tasks.iter().filter_map(|t| t.time_to_take_minutes()).collect();
    if values.is_empty() {
        return 0.0;
    }

    round1(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Average hours from taken to completed, over tasks that have both stamps.
pub fn avg_time_to_complete(tasks: &[Task]) -> f64 {
    let values: Vec<f64> = tasks
        .iter()
        .filter_map(|t| t.time_to_complete_hours())
        .collect();
    if values.is_empty() {
        return 0.0;
    }

    round2(values.iter().sum::<f64>() / values.len() as f64)
}

fn hours_between(tasks: &[&Task], from_creation: bool) -> f64 {
    let values: Vec<f64> = tasks
        .iter()
        .filter_map(|t| {
            let completed_at = t.completed_at?;
            let start = if from_creation {
                t.created_at
            } else {
                t.taken_at?
            };
            Some((completed_at - start).num_seconds() as f64 / 3600.0)
        })
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

/// Completed-task counts and average creation-to-done hours per task type.
pub fn stats_by_type(done: &[Task]) -> Vec<GroupStat> {
    group_stats(done, |t| t.task_type.as_str().to_string(), true)
}

/// Completed-task counts and average creation-to-done hours per priority.
pub fn stats_by_priority(done: &[Task]) -> Vec<GroupStat> {
    group_stats(done, |t| t.priority.as_str().to_string(), true)
}

/// Completed-task counts and average taken-to-done hours per assignee name.
/// Tasks without an assignee are not attributed to anyone.
pub fn stats_by_assignee(done: &[Task], users: &[User]) -> Vec<GroupStat> {
    let names: BTreeMap<Uuid, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();

    let mut groups: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in done {
        if let Some(name) = task.assigned_to_id.and_then(|id| names.get(&id)) {
            groups.entry(name.to_string()).or_default().push(task);
        }
    }

    groups
        .into_iter()
        .map(|(label, tasks)| GroupStat {
            total: tasks.len(),
            avg_hours: hours_between(&tasks, false),
            label,
        })
        .collect()
}

fn group_stats<F>(done: &[Task], key: F, from_creation: bool) -> Vec<GroupStat>
where
    F: Fn(&Task) -> String,
{
    let mut groups: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in done {
        groups.entry(key(task)).or_default().push(task);
    }

    groups
        .into_iter()
        .map(|(label, tasks)| GroupStat {
            total: tasks.len(),
            avg_hours: hours_between(&tasks, from_creation),
            label,
        })
        .collect()
}

/// Created-vs-completed counts per calendar day, oldest day first.
pub fn daily_trends(created: &[Task], done: &[Task], days: i64, today: NaiveDate) -> Vec<DailyTrend> {
    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            DailyTrend {
                date: date.format("%Y-%m-%d").to_string(),
                created: created
                    .iter()
                    .filter(|t| t.created_at.date_naive() == date)
                    .count(),
                completed: done
                    .iter()
                    .filter(|t| t.completed_at.map_or(false, |c| c.date_naive() == date))
                    .count(),
            }
        })
        .collect()
}

/// Group overdue tasks by whole days past their deadline.
pub fn group_overdue(tasks: Vec<Task>) -> OverdueAnalysis {
    let now = Utc::now();
    let mut by_days: BTreeMap<i64, usize> = BTreeMap::new();

    for task in &tasks {
        if let Some(deadline) = task.deadline {
            let days = (now - deadline).num_days();
            *by_days.entry(days).or_insert(0) += 1;
        }
    }

    OverdueAnalysis {
        total: tasks.len(),
        by_days,
        tasks,
    }
}

fn status_distribution(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        *distribution
            .entry(task.status.as_str().to_string())
            .or_insert(0) += 1;
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskType};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
    }

    fn done_task(task_type: TaskType, taken_h: u32, completed_h: u32) -> Task {
        Task {
            id: Uuid::new_v4(),
            task_number: "TASK-20250610-0001".to_string(),
            title: "t".to_string(),
            description: String::new(),
            task_type,
            status: TaskStatus::Done,
            priority: TaskPriority::Medium,
            requester_name: "r".to_string(),
            requester_department: "d".to_string(),
            requester_email: None,
            requester_phone: None,
            deadline: None,
            estimated_hours: None,
            screenshot_url: None,
            completion_comment: None,
            assigned_to_id: None,
            created_at: at(8, 0),
            taken_at: Some(at(taken_h, 0)),
            completed_at: Some(at(completed_h, 0)),
            updated_at: at(completed_h, 0),
        }
    }

    #[test]
    fn empty_input_averages_to_zero() {
        assert_eq!(avg_time_to_take(&[]), 0.0);
        assert_eq!(avg_time_to_complete(&[]), 0.0);
        assert!(stats_by_type(&[]).is_empty());
        assert!(stats_by_priority(&[]).is_empty());
        assert!(stats_by_assignee(&[], &[]).is_empty());
    }

    #[test]
    fn averages_skip_unstamped_tasks() {
        let mut untaken = done_task(TaskType::Other, 9, 12);
        untaken.taken_at = None;
        untaken.completed_at = None;
        let tasks = vec![done_task(TaskType::Other, 9, 12), untaken];

        // 8:00 -> 9:00 is 60 minutes; the unstamped task contributes nothing.
        assert_eq!(avg_time_to_take(&tasks), 60.0);
        assert_eq!(avg_time_to_complete(&tasks), 3.0);
    }

    #[test]
    fn rounding_is_one_and_two_decimals() {
        let mut task = done_task(TaskType::Other, 8, 9);
        task.taken_at = Some(at(8, 20));
        task.completed_at = Some(at(8, 30));

        assert_eq!(avg_time_to_take(&[task.clone()]), 20.0);
        // 10 minutes is 0.1666.. hours, rounded to 0.17.
        assert_eq!(avg_time_to_complete(&[task]), 0.17);
    }

    #[test]
    fn type_stats_group_and_average_from_creation() {
        let tasks = vec![
            done_task(TaskType::Incident, 9, 10),
            done_task(TaskType::Incident, 9, 14),
            done_task(TaskType::Other, 9, 12),
        ];

        let stats = stats_by_type(&tasks);
        let incident = stats.iter().find(|s| s.label == "Сбой").unwrap();
        assert_eq!(incident.total, 2);
        // (2h + 6h) / 2 from creation at 8:00.
        assert_eq!(incident.avg_hours, 4.0);
    }

    #[test]
    fn assignee_stats_use_taken_to_done_and_skip_unassigned() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ivanov".to_string(),
            email: "ivanov@example.com".to_string(),
            name: "Иванов И.И.".to_string(),
            department: "ИТ".to_string(),
            role: "it_staff".to_string(),
            telegram_username: None,
            password_hash: String::new(),
            is_active: true,
            created_at: at(0, 0),
            last_login: None,
        };

        let mut assigned = done_task(TaskType::Other, 9, 13);
        assigned.assigned_to_id = Some(user.id);
        let unassigned = done_task(TaskType::Other, 9, 13);

        let stats = stats_by_assignee(&[assigned, unassigned], &[user]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].label, "Иванов И.И.");
        assert_eq!(stats[0].total, 1);
        assert_eq!(stats[0].avg_hours, 4.0);
    }

    #[test]
    fn daily_trends_cover_window_oldest_first() {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let created = vec![done_task(TaskType::Other, 9, 12)];

        let trends = daily_trends(&created, &created, 7, today);
        assert_eq!(trends.len(), 7);
        assert_eq!(trends[0].date, "2025-06-04");
        assert_eq!(trends[6].date, "2025-06-10");
        assert_eq!(trends[6].created, 1);
        assert_eq!(trends[6].completed, 1);
        assert_eq!(trends[0].created, 0);
    }

    #[test]
    fn overdue_grouping_counts_whole_days() {
        let mut task = done_task(TaskType::Other, 9, 12);
        task.status = TaskStatus::InProgress;
        task.completed_at = None;
        task.deadline = Some(Utc::now() - Duration::days(3));

        let analysis = group_overdue(vec![task]);
        assert_eq!(analysis.total, 1);
        assert_eq!(analysis.by_days.get(&3), Some(&1));
    }
}
