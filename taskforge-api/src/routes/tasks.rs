/// Task CRUD endpoints
///
/// Route handlers own HTTP concerns only: deserialization, request
/// validation and status codes. All business logic is delegated to
/// `TaskService`.
///
/// # Endpoints
///
/// ```text
/// POST   /tasks            create            201 + Task        422
/// GET    /tasks/:id        fetch             200 + Task        404
/// GET    /tasks            list/filter       200 + page        422
/// PATCH  /tasks/:id        partial update    200 + Task        404/409/422
/// DELETE /tasks/:id        delete            204               404
/// ```
///
/// Listing accepts `status`, `priority` and `tag` filters plus `limit`
/// (1-100, default 50) and `offset` (>= 0, default 0). The update endpoint
/// takes the expected version for optimistic locking in the `If-Match`
/// query parameter; omitting it skips the version check.

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use crate::service::TaskService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskforge_shared::models::task::{
    CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask,
};
use validator::Validate;

/// Default page size for listing
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for listing
const MAX_LIMIT: i64 = 100;

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Filter by priority
    pub priority: Option<TaskPriority>,

    /// Filter by exact tag membership
    pub tag: Option<String>,

    /// Maximum tasks to return (1-100, default 50)
    pub limit: Option<i64>,

    /// Number of tasks to skip (default 0)
    pub offset: Option<i64>,
}

/// Query parameters for updating a task
#[derive(Debug, Default, Deserialize)]
pub struct UpdateParams {
    /// Expected version for optimistic locking; omit to skip the check
    #[serde(rename = "If-Match")]
    pub if_match: Option<i32>,
}

/// Paginated task list response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    /// Page of tasks, newest first
    pub tasks: Vec<Task>,

    /// Total rows matching the filter before pagination
    pub total: i64,

    /// Applied limit
    pub limit: i64,

    /// Applied offset
    pub offset: i64,
}

/// Validates paging parameters and applies defaults
///
/// `limit` must be within [1, 100], `offset` non-negative; out-of-range
/// values are rejected rather than clamped silently.
fn validate_paging(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    let offset = offset.unwrap_or(0);

    let mut details = Vec::new();
    if !(1..=MAX_LIMIT).contains(&limit) {
        details.push(ValidationErrorDetail {
            field: "limit".to_string(),
            message: format!("limit must be between 1 and {}", MAX_LIMIT),
        });
    }
    if offset < 0 {
        details.push(ValidationErrorDetail {
            field: "offset".to_string(),
            message: "offset must be non-negative".to_string(),
        });
    }

    if details.is_empty() {
        Ok((limit, offset))
    } else {
        Err(ApiError::ValidationError(details))
    }
}

/// Create task endpoint handler
///
/// Validates the request body against the data-model constraints before
/// anything reaches storage, then returns the created task with its
/// server-assigned id, `version = 1` and matching timestamps.
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    input.validate()?;

    let task = TaskService::new(state.db.clone()).create_task(input).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Get task endpoint handler
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = TaskService::new(state.db.clone()).get_task(id).await?;

    Ok(Json(task))
}

/// List tasks endpoint handler
///
/// Filters are optional and combine with AND. The response carries the
/// total count before pagination so clients can compute remaining pages.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TaskListResponse>> {
    let (limit, offset) = validate_paging(params.limit, params.offset)?;

    let filter = TaskFilter {
        status: params.status,
        priority: params.priority,
        tag: params.tag,
    };

    let (tasks, total) = TaskService::new(state.db.clone())
        .list_tasks(&filter, limit, offset)
        .await?;

    Ok(Json(TaskListResponse {
        tasks,
        total,
        limit,
        offset,
    }))
}

/// Update task endpoint handler (partial update)
///
/// Only fields present in the body are changed. With `If-Match` set, a
/// stale version yields 409 with the current and requested versions in the
/// body; without it the write is unconditional.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UpdateParams>,
    Json(changes): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    changes.validate()?;

    let task = TaskService::new(state.db.clone())
        .update_task(id, changes, params.if_match)
        .await?;

    Ok(Json(task))
}

/// Delete task endpoint handler
///
/// 204 on success; deleting an ID that does not exist (including an ID
/// already deleted) returns 404.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    TaskService::new(state.db.clone()).delete_task(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults() {
        let (limit, offset) = validate_paging(None, None).unwrap();
        assert_eq!(limit, 50);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_paging_bounds() {
        assert!(validate_paging(Some(1), Some(0)).is_ok());
        assert!(validate_paging(Some(100), Some(1000)).is_ok());

        assert!(validate_paging(Some(0), None).is_err());
        assert!(validate_paging(Some(101), None).is_err());
        assert!(validate_paging(None, Some(-1)).is_err());
    }

    #[test]
    fn test_paging_error_reports_both_fields() {
        let err = validate_paging(Some(0), Some(-5)).unwrap_err();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[0].field, "limit");
                assert_eq!(details[1].field, "offset");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_params_if_match_alias() {
        let params: UpdateParams = serde_urlencoded::from_str("If-Match=3").unwrap();
        assert_eq!(params.if_match, Some(3));

        let params: UpdateParams = serde_urlencoded::from_str("").unwrap();
        assert_eq!(params.if_match, None);
    }

    #[test]
    fn test_list_params_deserialization() {
        let params: ListParams =
            serde_urlencoded::from_str("status=pending&tag=urgent&limit=10").unwrap();
        assert_eq!(params.status, Some(TaskStatus::Pending));
        assert_eq!(params.tag.as_deref(), Some("urgent"));
        assert_eq!(params.limit, Some(10));
        assert!(params.priority.is_none());
        assert!(params.offset.is_none());
    }
}
