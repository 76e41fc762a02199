/// Task model and store operations
///
/// This module provides the Task model, the sole entity managed by the
/// Taskforge API, together with its CRUD operations against PostgreSQL.
/// The store translates domain operations into SQL; it owns no business
/// rules. Version comparison and existence checks live in the service
/// layer of `taskforge-api`.
///
/// # Versioning
///
/// Every successful update increments `version` by exactly 1 and resets
/// `updated_at`. `apply_update` optionally takes an expected version which
/// is pushed into the WHERE clause, turning the write into a conditional
/// update (compare-and-swap): the statement matches zero rows when another
/// writer got there first.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('critical', 'high', 'medium', 'low');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(5000),
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     estimated_hours NUMERIC(10, 2),
///     version INTEGER NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskforge_shared::models::task::{Task, CreateTask, TaskPriority};
/// use taskforge_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     priority: TaskPriority::High,
///     tags: vec!["docs".to_string()],
///     ..Default::default()
/// }).await?;
///
/// assert_eq!(task.version, 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::{Validate, ValidationError};

/// Columns selected/returned by every task query, in `Task` field order.
const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, \
     tags, estimated_hours, version, created_at, updated_at";

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet (the default for new tasks)
    #[default]
    Pending,

    /// Actively being worked on
    InProgress,

    /// Finished
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire/database string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Drop everything
    Critical,

    /// Important, schedule soon
    High,

    /// Normal work (the default for new tasks)
    #[default]
    Medium,

    /// Nice to have
    Low,
}

impl TaskPriority {
    /// Converts priority to its wire/database string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Critical => "critical",
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

/// Task model representing one work item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID, assigned by the database and never reused
    pub id: i64,

    /// Short summary (1-200 characters)
    pub title: String,

    /// Longer free-form description (up to 5000 characters)
    pub description: Option<String>,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// When the task should be done
    pub due_date: Option<DateTime<Utc>>,

    /// Ordered labels for categorization, each up to 50 characters
    pub tags: Vec<String>,

    /// Estimated effort in hours, two decimal places
    pub estimated_hours: Option<Decimal>,

    /// Optimistic-locking version, starts at 1 and increments by 1 per update
    pub version: i32,

    /// When the task was created (never mutated)
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Only user-settable fields; id, version and timestamps come from the
/// database at insert time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    /// Task title (required)
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    /// Optional description
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: Option<String>,

    /// Initial status (defaults to pending)
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default)]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Tags (defaults to empty)
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,

    /// Optional effort estimate in hours
    #[validate(custom(function = "validate_estimated_hours"))]
    pub estimated_hours: Option<Decimal>,
}

/// Input for a partial task update
///
/// Every field is optional; fields absent from the request leave the stored
/// value untouched. A present field replaces the stored value wholesale
/// (tags are replaced, not merged).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    /// New title
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,

    /// New description
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date
    pub due_date: Option<DateTime<Utc>>,

    /// Replacement tag list
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    /// New effort estimate
    #[validate(custom(function = "validate_estimated_hours"))]
    pub estimated_hours: Option<Decimal>,
}

impl UpdateTask {
    /// Returns true when no field is present. An empty update is still
    /// applied: it bumps version and updated_at without touching user
    /// fields.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
            && self.estimated_hours.is_none()
    }
}

/// Filters for listing tasks
///
/// Status and priority filter by equality; tag matches tasks whose tag
/// array contains the value exactly (no substring matching).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Only tasks with this priority
    pub priority: Option<TaskPriority>,

    /// Only tasks whose tags contain this value
    pub tag: Option<String>,
}

impl TaskFilter {
    /// Builds the WHERE clause for this filter, numbering bind placeholders
    /// from `first_bind`. Returns the clause (empty string when no filter is
    /// set) and the next free placeholder number.
    ///
    /// Bind order is always status, priority, tag.
    fn where_clause(&self, first_bind: usize) -> (String, usize) {
        let mut clauses = Vec::new();
        let mut next = first_bind;

        if self.status.is_some() {
            clauses.push(format!("status = ${}", next));
            next += 1;
        }
        if self.priority.is_some() {
            clauses.push(format!("priority = ${}", next));
            next += 1;
        }
        if self.tag.is_some() {
            clauses.push(format!("${} = ANY(tags)", next));
            next += 1;
        }

        if clauses.is_empty() {
            (String::new(), next)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), next)
        }
    }
}

/// Validates that each tag is at most 50 characters
fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    for tag in tags {
        if tag.chars().count() > 50 {
            let mut err = ValidationError::new("tag_too_long");
            err.message = Some("each tag must not exceed 50 characters".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Validates that an effort estimate is non-negative with at most two
/// decimal places
fn validate_estimated_hours(hours: &Decimal) -> Result<(), ValidationError> {
    if hours.is_sign_negative() {
        let mut err = ValidationError::new("estimated_hours_negative");
        err.message = Some("estimated hours must be non-negative".into());
        return Err(err);
    }
    if hours.round_dp(2) != *hours {
        let mut err = ValidationError::new("estimated_hours_precision");
        err.message = Some("estimated hours must have at most 2 decimal places".into());
        return Err(err);
    }
    Ok(())
}

impl Task {
    /// Creates a new task
    ///
    /// The database assigns the id, sets `version = 1` and stamps both
    /// timestamps from the same transaction clock, so
    /// `created_at == updated_at` on the returned row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. Input constraints
    /// must already have been validated; a row violating them never reaches
    /// this function.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO tasks (title, description, status, priority, due_date, tags, estimated_hours) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TASK_COLUMNS}"
        );

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.tags)
            .bind(data.estimated_hours)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, newest first, with pagination
    ///
    /// Returns the page of tasks and the total number of rows matching the
    /// filter before pagination, so callers can compute whether more pages
    /// exist. Limit and offset are bound as-is; range validation is the
    /// caller's job.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let (where_sql, next_bind) = filter.where_clause(1);

        // Total count with the same filter, before LIMIT/OFFSET
        let count_sql = format!("SELECT COUNT(*) FROM tasks{where_sql}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some(priority) = filter.priority {
            count_query = count_query.bind(priority);
        }
        if let Some(tag) = &filter.tag {
            count_query = count_query.bind(tag);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        let select_sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks{where_sql} \
             ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            next_bind,
            next_bind + 1
        );
        let mut select_query = sqlx::query_as::<_, Task>(&select_sql);
        if let Some(status) = filter.status {
            select_query = select_query.bind(status);
        }
        if let Some(priority) = filter.priority {
            select_query = select_query.bind(priority);
        }
        if let Some(tag) = &filter.tag {
            select_query = select_query.bind(tag);
        }
        let tasks = select_query.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok((tasks, total))
    }

    /// Applies a partial update to a task
    ///
    /// Only fields present in `changes` are written; absent fields keep
    /// their stored values. Every matched update increments `version` by 1
    /// and resets `updated_at`.
    ///
    /// When `expected_version` is given, the WHERE clause also matches on
    /// the version column, making the write a conditional update: it
    /// affects zero rows if a concurrent writer bumped the version after
    /// the caller observed it.
    ///
    /// Returns `None` when no row matched, meaning either the id does not
    /// exist or the version condition failed; the caller distinguishes the
    /// two by re-reading.
    pub async fn apply_update(
        pool: &PgPool,
        id: i64,
        changes: &UpdateTask,
        expected_version: Option<i32>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets = vec![
            "version = version + 1".to_string(),
            "updated_at = NOW()".to_string(),
        ];
        // $1 = id, present fields follow, expected version binds last
        let mut next_bind = 2;

        if changes.title.is_some() {
            sets.push(format!("title = ${next_bind}"));
            next_bind += 1;
        }
        if changes.description.is_some() {
            sets.push(format!("description = ${next_bind}"));
            next_bind += 1;
        }
        if changes.status.is_some() {
            sets.push(format!("status = ${next_bind}"));
            next_bind += 1;
        }
        if changes.priority.is_some() {
            sets.push(format!("priority = ${next_bind}"));
            next_bind += 1;
        }
        if changes.due_date.is_some() {
            sets.push(format!("due_date = ${next_bind}"));
            next_bind += 1;
        }
        if changes.tags.is_some() {
            sets.push(format!("tags = ${next_bind}"));
            next_bind += 1;
        }
        if changes.estimated_hours.is_some() {
            sets.push(format!("estimated_hours = ${next_bind}"));
            next_bind += 1;
        }

        let mut sql = format!("UPDATE tasks SET {} WHERE id = $1", sets.join(", "));
        if expected_version.is_some() {
            sql.push_str(&format!(" AND version = ${next_bind}"));
        }
        sql.push_str(&format!(" RETURNING {TASK_COLUMNS}"));

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(id);
        if let Some(title) = &changes.title {
            query = query.bind(title);
        }
        if let Some(description) = &changes.description {
            query = query.bind(description);
        }
        if let Some(status) = changes.status {
            query = query.bind(status);
        }
        if let Some(priority) = changes.priority {
            query = query.bind(priority);
        }
        if let Some(due_date) = changes.due_date {
            query = query.bind(due_date);
        }
        if let Some(tags) = &changes.tags {
            query = query.bind(tags);
        }
        if let Some(hours) = changes.estimated_hours {
            query = query.bind(hours);
        }
        if let Some(version) = expected_version {
            query = query.bind(version);
        }

        let task = query.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Returns whether a row existed to delete. Deleting twice is safe at
    /// this layer; the second call simply reports false.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Critical.as_str(), "critical");
        assert_eq!(TaskPriority::High.as_str(), "high");
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
        assert_eq!(TaskPriority::Low.as_str(), "low");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);

        let create: CreateTask = serde_json::from_str(r#"{"title": "T1"}"#).unwrap();
        assert_eq!(create.status, TaskStatus::Pending);
        assert_eq!(create.priority, TaskPriority::Medium);
        assert!(create.tags.is_empty());
        assert!(create.description.is_none());
        assert!(create.estimated_hours.is_none());
    }

    #[test]
    fn test_enum_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        let status: TaskStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, TaskStatus::InProgress);

        let priority: TaskPriority = serde_json::from_str(r#""critical""#).unwrap();
        assert_eq!(priority, TaskPriority::Critical);
    }

    #[test]
    fn test_create_task_validation() {
        let valid = CreateTask {
            title: "Write release notes".to_string(),
            tags: vec!["docs".to_string()],
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreateTask {
            title: String::new(),
            ..Default::default()
        };
        assert!(empty_title.validate().is_err());

        let long_title = CreateTask {
            title: "a".repeat(201),
            ..Default::default()
        };
        assert!(long_title.validate().is_err());

        let long_description = CreateTask {
            title: "ok".to_string(),
            description: Some("d".repeat(5001)),
            ..Default::default()
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_tag_length_validation() {
        let at_limit = CreateTask {
            title: "ok".to_string(),
            tags: vec!["x".repeat(50)],
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let over_limit = CreateTask {
            title: "ok".to_string(),
            tags: vec!["x".repeat(51)],
            ..Default::default()
        };
        assert!(over_limit.validate().is_err());
    }

    #[test]
    fn test_estimated_hours_validation() {
        let valid = CreateTask {
            title: "ok".to_string(),
            estimated_hours: Some(Decimal::new(850, 2)), // 8.50
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let negative = CreateTask {
            title: "ok".to_string(),
            estimated_hours: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let too_precise = CreateTask {
            title: "ok".to_string(),
            estimated_hours: Some(Decimal::new(8505, 3)), // 8.505
            ..Default::default()
        };
        assert!(too_precise.validate().is_err());
    }

    #[test]
    fn test_update_task_validation() {
        let valid = UpdateTask {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());
        assert!(!valid.is_empty());

        let empty_title = UpdateTask {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(empty_title.validate().is_err());

        let no_fields = UpdateTask::default();
        assert!(no_fields.validate().is_ok());
        assert!(no_fields.is_empty());
    }

    #[test]
    fn test_filter_where_clause_empty() {
        let filter = TaskFilter::default();
        let (sql, next) = filter.where_clause(1);
        assert_eq!(sql, "");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_filter_where_clause_single() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            ..Default::default()
        };
        let (sql, next) = filter.where_clause(1);
        assert_eq!(sql, " WHERE status = $1");
        assert_eq!(next, 2);

        let filter = TaskFilter {
            tag: Some("urgent".to_string()),
            ..Default::default()
        };
        let (sql, next) = filter.where_clause(1);
        assert_eq!(sql, " WHERE $1 = ANY(tags)");
        assert_eq!(next, 2);
    }

    #[test]
    fn test_filter_where_clause_combined() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(TaskPriority::High),
            tag: Some("urgent".to_string()),
        };
        let (sql, next) = filter.where_clause(1);
        assert_eq!(
            sql,
            " WHERE status = $1 AND priority = $2 AND $3 = ANY(tags)"
        );
        assert_eq!(next, 4);
    }

    #[test]
    fn test_update_partial_deserialization() {
        // Absent fields stay None so the store leaves them untouched
        let update: UpdateTask = serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert!(update.title.is_none());
        assert!(update.tags.is_none());
        assert!(update.priority.is_none());
    }
}
