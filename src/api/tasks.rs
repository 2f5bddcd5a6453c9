use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{read_multipart, require_image, require_storage};
use crate::core::metrics::{PROOFS_UPLOADED_TOTAL, TASKS_CREATED_TOTAL};
use crate::core::state::AppState;
use crate::core::time::{parse_date, primitive_now_utc, to_primitive_utc};
use crate::db::models::{Task, User};
use crate::repositories;
use crate::schemas::calendar::{CalendarPayload, CalendarQuery};
use crate::schemas::task::{
    TaskCreateRequest, TaskListPayload, TaskPayload, TaskResponse, TaskStatusUpdate, TaskSummary,
};
use crate::schemas::Envelope;
use crate::services::calendar::{group_by_week, CalendarView, DAYS_PER_WEEK};
use crate::services::notifications::{self, Notice};
use crate::services::storage::{object_key, TASK_PROOFS_FOLDER};
use crate::services::task_lifecycle::{
    announces_verification, can_access, status_after_proof, validate_new_task, LifecycleError,
    ProofChange,
};

const MAX_TZ_OFFSET_MINUTES: i32 = 14 * 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_task))
        .route("/get", get(list_tasks))
        .route("/calendar", get(calendar))
        .route("/update/:id", patch(update_status))
        .route("/upload-proof/:id", post(upload_proof))
        .route("/remove-proof/:id", post(remove_proof))
}

async fn add_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TaskCreateRequest>,
) -> Result<Json<Envelope<TaskPayload>>, ApiError> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Not authorized (addTask)"));
    }

    let input = validate_new_task(payload.into()).map_err(|err| {
        tracing::debug!(error = %err, "Task payload rejected");
        ApiError::Validation("Missing information (addTask)")
    })?;

    let assignee = repositories::users::find_by_id(state.db(), &input.assigned_to)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignee"))?
        .ok_or(ApiError::NotFound("User not found"))?;

    let task = repositories::tasks::create(
        state.db(),
        repositories::tasks::CreateTask {
            id: &Uuid::new_v4().to_string(),
            name: &input.name,
            instructions: &input.instructions,
            deadline: input.deadline,
            category: input.category,
            assigned_to: &assignee.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create task"))?;

    notifications::emit(state.db(), Notice::task_assigned(&task)).await;
    metrics::counter!(TASKS_CREATED_TOTAL).increment(1);
    tracing::info!(
        action = "task_create",
        admin_id = %user.id,
        task_id = %task.id,
        assigned_to = %task.assigned_to,
        "Task created"
    );

    Ok(Json(Envelope::ok_with("Task created", TaskPayload { task: TaskResponse::from_db(task) })))
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<TaskListPayload>>, ApiError> {
    let tasks = repositories::tasks::list_for_account(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load tasks"))?;

    Ok(Json(Envelope::ok_with(
        "Tasks fetched successfully",
        TaskListPayload { tasks: tasks.into_iter().map(TaskSummary::from_db).collect() },
    )))
}

async fn calendar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Envelope<CalendarPayload>>, ApiError> {
    let minutes = query.tz_offset_minutes.unwrap_or(0).clamp(-MAX_TZ_OFFSET_MINUTES, MAX_TZ_OFFSET_MINUTES);
    let offset = UtcOffset::from_whole_seconds(minutes * 60)
        .map_err(|_| ApiError::BadRequest("Invalid tzOffsetMinutes".to_string()))?;
    let today = OffsetDateTime::now_utc().to_offset(offset).date();

    let target = match query.target.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => {
            Some(parse_date(raw).ok_or_else(|| ApiError::BadRequest("Invalid target date".to_string()))?)
        }
        None => None,
    };
    let view = match target {
        Some(target) => CalendarView::focused_on(today, target)
            .ok_or_else(|| ApiError::BadRequest("Invalid target date".to_string()))?,
        None => CalendarView::new(today, query.offset.unwrap_or(0)),
    };

    let week = view.week();
    let from = local_midnight_utc(week[0], offset)?;
    let to = week[DAYS_PER_WEEK - 1]
        .next_day()
        .ok_or_else(|| ApiError::BadRequest("Invalid target date".to_string()))
        .and_then(|day| local_midnight_utc(day, offset))?;

    let tasks = repositories::tasks::list_for_account_between(state.db(), &user.id, from, to)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load tasks"))?;
    let buckets = group_by_week(tasks, &week, offset);

    Ok(Json(Envelope::ok(CalendarPayload::build(today, view, buckets, target))))
}

fn local_midnight_utc(date: time::Date, offset: UtcOffset) -> Result<PrimitiveDateTime, ApiError> {
    to_primitive_utc(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset))
        .ok_or_else(|| ApiError::BadRequest("Invalid target date".to_string()))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(task_id): Path<String>,
    Json(payload): Json<TaskStatusUpdate>,
) -> Result<Json<Envelope<TaskPayload>>, ApiError> {
    let status = payload
        .parsed()
        .ok_or_else(|| ApiError::BadRequest("Invalid task status".to_string()))?;

    let previous = load_task(&state, &task_id).await?;
    let task = repositories::tasks::set_status(state.db(), &task_id, status, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update task"))?
        .ok_or(ApiError::NotFound("Task not found"))?;

    if announces_verification(previous.status, task.status) {
        notifications::emit(state.db(), Notice::proof_verified(&task)).await;
    }

    tracing::info!(
        action = "task_status",
        admin_id = %admin.id,
        task_id = %task.id,
        from = ?previous.status,
        to = ?task.status,
        "Task status updated"
    );

    Ok(Json(Envelope::ok_with("Task updated", TaskPayload { task: TaskResponse::from_db(task) })))
}

async fn upload_proof(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Envelope<TaskPayload>>, ApiError> {
    let task = load_accessible_task(&state, &user, &task_id).await?;
    status_after_proof(task.status, ProofChange::Attach).map_err(lifecycle_error)?;

    let storage = require_storage(&state)?;
    let form = read_multipart(multipart, "proof", state.settings()).await?;
    let file = require_image(form.file, state.settings())?;

    let key = object_key(TASK_PROOFS_FOLDER, &task.id, &file.extension());
    let stored = storage
        .upload_bytes(&key, &file.content_type, file.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload proof"))?;

    let updated = match repositories::tasks::set_proof(
        state.db(),
        &task.id,
        &stored.url,
        &stored.key,
        primitive_now_utc(),
    )
    .await
    {
        Ok(Some(updated)) => updated,
        // Completed (or swept) since it was loaded.
        Ok(None) => {
            storage.delete_quietly(&stored.key).await;
            return Err(lifecycle_error(LifecycleError::AlreadyCompleted));
        }
        Err(err) => {
            storage.delete_quietly(&stored.key).await;
            return Err(ApiError::internal(err, "Failed to save proof"));
        }
    };

    if let Some(previous) = task.proof_key.as_deref() {
        storage.delete_quietly(previous).await;
    }

    metrics::counter!(PROOFS_UPLOADED_TOTAL).increment(1);
    tracing::info!(
        action = "proof_upload",
        account_id = %user.id,
        task_id = %updated.id,
        size = stored.size,
        sha256 = %stored.sha256,
        "Proof uploaded"
    );

    Ok(Json(Envelope::ok_with("Proof uploaded", TaskPayload { task: TaskResponse::from_db(updated) })))
}

async fn remove_proof(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<Envelope<TaskPayload>>, ApiError> {
    let task = load_accessible_task(&state, &user, &task_id).await?;
    status_after_proof(task.status, ProofChange::Remove).map_err(lifecycle_error)?;

    let updated = repositories::tasks::clear_proof(state.db(), &task.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove proof"))?
        .ok_or_else(|| lifecycle_error(LifecycleError::AlreadyCompleted))?;

    if let (Some(key), Some(storage)) = (task.proof_key.as_deref(), state.storage()) {
        storage.delete_quietly(key).await;
    }

    tracing::info!(action = "proof_remove", account_id = %user.id, task_id = %updated.id, "Proof removed");

    Ok(Json(Envelope::ok_with("Proof removed", TaskPayload { task: TaskResponse::from_db(updated) })))
}

async fn load_task(state: &AppState, task_id: &str) -> Result<Task, ApiError> {
    repositories::tasks::find_by_id(state.db(), task_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load task"))?
        .ok_or(ApiError::NotFound("Task not found"))
}

// Someone else's task answers exactly like a missing one.
async fn load_accessible_task(state: &AppState, user: &User, task_id: &str) -> Result<Task, ApiError> {
    let task = load_task(state, task_id).await?;
    if can_access(user, &task) {
        Ok(task)
    } else {
        Err(ApiError::NotFound("Task not found"))
    }
}

fn lifecycle_error(err: LifecycleError) -> ApiError {
    match err {
        LifecycleError::AlreadyCompleted => ApiError::BadRequest("Task already completed".to_string()),
        other => ApiError::BadRequest(other.to_string()),
    }
}
