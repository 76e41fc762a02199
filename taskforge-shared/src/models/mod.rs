/// Database models for Taskforge
///
/// The system manages a single entity: the task. Its model, request/update
/// inputs, filters and store operations live in `task`.
///
/// # Example
///
/// ```no_run
/// use taskforge_shared::models::task::{Task, CreateTask};
/// use taskforge_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Ship the release".to_string(),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
