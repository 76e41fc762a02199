/// Task service - business rules on top of the task store
///
/// The service is the sole holder of the optimistic-concurrency protocol:
/// it performs existence checks, compares the caller's expected version
/// against the stored one, and shapes the outcome into domain errors. It
/// knows nothing about HTTP; route handlers translate `ServiceError` into
/// status codes via `ApiError`.
///
/// # Update protocol
///
/// `update_task` reads the current row, rejects a mismatched expected
/// version up front, then delegates the write with the version pushed into
/// the store's WHERE clause. The conditional write closes the window
/// between the read and the write: if a concurrent writer bumped the
/// version in between, the write matches zero rows and the conflict is
/// reported with the true current version. Callers that omit the expected
/// version opt out of the check entirely and the write is unconditional.

use taskforge_shared::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use sqlx::PgPool;
use thiserror::Error;

/// Errors raised by task business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No task exists with the given ID
    #[error("task {0} not found")]
    NotFound(i64),

    /// The caller's expected version does not match the stored one
    #[error("version conflict: current={current_version}, requested={requested_version}")]
    VersionConflict {
        current_version: i32,
        requested_version: i32,
    },

    /// Storage engine failure
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Unexpected state, e.g. a row vanishing mid-update
    #[error("{0}")]
    Internal(String),
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Task service holding the database pool
///
/// Cloning is cheap (the pool is reference counted); handlers construct
/// one from application state per request.
#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
}

impl TaskService {
    /// Creates a new service over the given pool
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a task from already-validated input
    ///
    /// # Errors
    ///
    /// Any storage failure surfaces as `ServiceError::Storage`, which the
    /// API layer reports as an opaque internal error.
    pub async fn create_task(&self, input: CreateTask) -> ServiceResult<Task> {
        let task = Task::create(&self.db, input).await?;

        tracing::info!(task_id = task.id, title = %task.title, "Created task");

        Ok(task)
    }

    /// Fetches a task by ID
    ///
    /// # Errors
    ///
    /// `NotFound` when no row exists for the ID.
    pub async fn get_task(&self, id: i64) -> ServiceResult<Task> {
        let task = Task::find_by_id(&self.db, id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        tracing::debug!(task_id = id, "Retrieved task");

        Ok(task)
    }

    /// Lists tasks with filters and pagination
    ///
    /// Limit and offset must already be validated/clamped by the transport
    /// layer; they are passed through to the store unchanged. Returns the
    /// page of tasks and the total count matching the filter.
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<(Vec<Task>, i64)> {
        let (tasks, total) = Task::list(&self.db, filter, limit, offset).await?;

        tracing::info!(
            count = tasks.len(),
            total,
            status = ?filter.status,
            priority = ?filter.priority,
            tag = ?filter.tag,
            "Listed tasks"
        );

        Ok((tasks, total))
    }

    /// Applies a partial update with optional optimistic locking
    ///
    /// 1. Fetch the current row; `NotFound` if absent.
    /// 2. If `expected_version` is given and differs from the stored
    ///    version, fail with `VersionConflict` carrying both versions.
    /// 3. Delegate the write to the store with the expected version in the
    ///    WHERE clause. A write that matches no row means the world changed
    ///    between steps 1 and 3: the row was deleted (internal failure) or
    ///    its version moved (conflict, reported with the fresh version).
    pub async fn update_task(
        &self,
        id: i64,
        changes: UpdateTask,
        expected_version: Option<i32>,
    ) -> ServiceResult<Task> {
        let existing = Task::find_by_id(&self.db, id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        if let Some(requested) = expected_version {
            if existing.version != requested {
                tracing::warn!(
                    task_id = id,
                    current_version = existing.version,
                    requested_version = requested,
                    "Version conflict on update"
                );
                return Err(ServiceError::VersionConflict {
                    current_version: existing.version,
                    requested_version: requested,
                });
            }
        }

        if changes.is_empty() {
            tracing::debug!(task_id = id, "No fields in update, bumping version only");
        }

        match Task::apply_update(&self.db, id, &changes, expected_version).await? {
            Some(task) => {
                tracing::info!(task_id = id, version = task.version, "Updated task");
                Ok(task)
            }
            None => {
                // Raced between the read and the conditional write
                match Task::find_by_id(&self.db, id).await? {
                    Some(row) => Err(ServiceError::VersionConflict {
                        current_version: row.version,
                        requested_version: expected_version.unwrap_or(existing.version),
                    }),
                    None => {
                        tracing::error!(task_id = id, "Task disappeared during update");
                        Err(ServiceError::Internal("Failed to update task".to_string()))
                    }
                }
            }
        }
    }

    /// Deletes a task
    ///
    /// The existence check makes delete non-idempotent at this boundary:
    /// the first call succeeds, a second call on the same ID fails with
    /// `NotFound`, even though the store's raw delete is safe to repeat.
    pub async fn delete_task(&self, id: i64) -> ServiceResult<()> {
        Task::find_by_id(&self.db, id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        let deleted = Task::delete(&self.db, id).await?;

        if !deleted {
            // Existed a moment ago; deleted concurrently
            tracing::error!(task_id = id, "Task disappeared during delete");
            return Err(ServiceError::Internal("Failed to delete task".to_string()));
        }

        tracing::info!(task_id = id, "Deleted task");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::NotFound(42);
        assert_eq!(err.to_string(), "task 42 not found");

        let err = ServiceError::VersionConflict {
            current_version: 2,
            requested_version: 1,
        };
        assert_eq!(err.to_string(), "version conflict: current=2, requested=1");
    }

    // Behavior against a live database (conflict detection, partial update
    // semantics, non-idempotent delete) is covered by the integration tests
    // in tests/.
}
