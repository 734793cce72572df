use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::{
    CreateTaskRequest, MessageResponse, Pagination, TaskListResponse, TaskResponse,
    UpdateTaskRequest,
};
use super::repo::Task;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/:id", put(update_task).delete(delete_task))
}

/// The ownership decision: a missing task answers NotFound, someone else's
/// task answers Forbidden without exposing any of its fields.
fn check_owner(task: Option<Task>, user_id: Uuid) -> ApiResult<Task> {
    let task = task.ok_or_else(|| ApiError::NotFound("Task not found".into()))?;
    if task.user_id != user_id {
        return Err(ApiError::Forbidden("You do not own this task".into()));
    }
    Ok(task)
}

/// Loads the task and confirms the caller owns it, before any mutation.
async fn owned_task(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<Task> {
    check_owner(Task::find_by_id(&state.db, id).await?, user_id)
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    let task = Task::create(&state.db, user_id, title, payload.description.as_deref()).await?;

    info!(user_id = %user_id, task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<TaskListResponse>> {
    let page = p.page.max(1);
    let limit = p.limit.clamp(1, 100);
    let offset = page.saturating_sub(1).saturating_mul(limit);

    let tasks = Task::list_page(&state.db, user_id, limit, offset).await?;
    let total = Task::count_by_user(&state.db, user_id).await?;

    Ok(Json(TaskListResponse {
        data: tasks.into_iter().map(TaskResponse::from).collect(),
        page,
        limit,
        total,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    owned_task(&state, user_id, id).await?;

    let task = Task::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.status,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    info!(user_id = %user_id, task_id = %id, "task updated");
    Ok(Json(task.into()))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    owned_task(&state, user_id, id).await?;

    Task::delete(&state.db, id).await?;

    info!(user_id = %user_id, task_id = %id, "task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn clamp(page: i64, limit: i64) -> (i64, i64, i64) {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        (page, limit, page.saturating_sub(1).saturating_mul(limit))
    }

    #[test]
    fn pagination_offset_is_one_indexed() {
        assert_eq!(clamp(1, 10), (1, 10, 0));
        assert_eq!(clamp(3, 10), (3, 10, 20));
        assert_eq!(clamp(2, 25), (2, 25, 25));
    }

    #[test]
    fn pagination_clamps_out_of_range_values() {
        assert_eq!(clamp(0, 10), (1, 10, 0));
        assert_eq!(clamp(-5, 0), (1, 1, 0));
        assert_eq!(clamp(1, 1000), (1, 100, 0));
    }

    #[test]
    fn pagination_offset_saturates_at_extreme_page() {
        let (page, limit, offset) = clamp(i64::MAX, 100);
        assert_eq!(page, i64::MAX);
        assert_eq!(limit, 100);
        assert_eq!(offset, i64::MAX);
    }

    fn task_owned_by(user_id: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id,
            title: "buy milk".into(),
            description: Some("two litres".into()),
            status: "To Do".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn missing_task_answers_not_found() {
        let err = check_owner(None, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn own_task_passes_ownership_check() {
        let user_id = Uuid::new_v4();
        let task = task_owned_by(user_id);
        let id = task.id;
        let task = check_owner(Some(task), user_id).expect("owner may proceed");
        assert_eq!(task.id, id);
    }

    #[test]
    fn foreign_task_answers_forbidden_without_leaking_it() {
        let task = task_owned_by(Uuid::new_v4());
        let err = check_owner(Some(task), Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        let message = err.to_string();
        assert!(!message.contains("buy milk"));
        assert!(!message.contains("two litres"));
    }
}
