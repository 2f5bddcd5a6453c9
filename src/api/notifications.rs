use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::notification::{NotificationListPayload, NotificationResponse};
use crate::schemas::{Empty, Envelope};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/get", get(list_notifications))
        .route("/mark-read/:id", patch(mark_read))
        .route("/mark-all-read", patch(mark_all_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<NotificationListPayload>>, ApiError> {
    let rows = repositories::notifications::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load notifications"))?;
    let unread_count = repositories::notifications::count_unread(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;

    Ok(Json(Envelope::ok(NotificationListPayload {
        notifications: rows.into_iter().map(NotificationResponse::from_db).collect(),
        unread_count,
    })))
}

async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<String>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    repositories::notifications::mark_read(
        state.db(),
        &notification_id,
        &user.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update notification"))?;

    Ok(Json(Envelope::ok(Empty {})))
}

async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    let updated =
        repositories::notifications::mark_all_read(state.db(), &user.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update notifications"))?;
    tracing::debug!(account_id = %user.id, updated, "Notifications marked read");

    Ok(Json(Envelope::ok(Empty {})))
}
