use axum::extract::{Multipart, Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;
use validator::Validate;

use crate::api::cookies::clear_session_cookie;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser, SessionUser};
use crate::api::validation::{read_multipart, require_image, require_storage, UploadedFile};
use crate::core::state::AppState;
use crate::core::time::{parse_date, primitive_now_utc};
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;
use crate::schemas::task::{TaskListPayload, TaskSummary};
use crate::schemas::user::{
    non_blank, PicturePayload, ProfileUpdateRequest, UserCreateRequest, UserListPayload,
    UserPayload, UserResponse,
};
use crate::schemas::{Empty, Envelope};
use crate::services::storage::{object_key, PROFILE_PICTURES_FOLDER};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/is-auth", get(is_auth))
        .route("/logout", get(logout))
        .route("/add", post(add_user))
        .route("/add-with-picture", post(add_user_with_picture))
        .route("/upload-picture", post(upload_picture))
        .route("/list", get(list_students))
        .route("/:id/tasks", get(tasks_for_user))
        .route("/update", patch(update_profile))
}

async fn is_auth(
    State(state): State<AppState>,
    SessionUser(claims): SessionUser,
) -> Result<Json<Envelope<UserPayload>>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or_else(|| ApiError::Rejected("User not found".to_string()))?;

    Ok(Json(Envelope::ok_with(
        "Found user (isAuth)",
        UserPayload { user: UserResponse::from_db(user) },
    )))
}

async fn logout(State(state): State<AppState>) -> Result<(HeaderMap, Json<Envelope<Empty>>), ApiError> {
    let cookie = clear_session_cookie(state.settings())
        .ok_or_else(|| ApiError::internal("invalid cookie value", "Failed to clear session"))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((headers, Json(Envelope::done("Logged out successfully"))))
}

async fn add_user(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(payload): Json<UserCreateRequest>,
) -> Result<Json<Envelope<UserPayload>>, ApiError> {
    provision(&state, &admin.id, payload, None).await
}

async fn add_user_with_picture(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    multipart: Multipart,
) -> Result<Json<Envelope<UserPayload>>, ApiError> {
    let form = read_multipart(multipart, "picture", state.settings()).await?;

    let mut payload = UserCreateRequest::default();
    for (name, value) in form.fields {
        payload.set_field(&name, value);
    }

    provision(&state, &admin.id, payload, form.file).await
}

async fn provision(
    state: &AppState,
    admin_id: &str,
    payload: UserCreateRequest,
    picture_file: Option<UploadedFile>,
) -> Result<Json<Envelope<UserPayload>>, ApiError> {
    let account =
        payload.normalized().ok_or_else(|| ApiError::Rejected("Missing details".to_string()))?;
    account.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let role = account
        .parsed_role()
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{}'", account.role)))?;
    let birth_date = match account.birth_date.as_deref() {
        Some(raw) => Some(
            parse_date(raw).ok_or_else(|| ApiError::BadRequest("Invalid birthDate".to_string()))?,
        ),
        None => None,
    };
    let email = account.email.to_lowercase();

    let existing = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Rejected("User already exists!".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let stored = match picture_file {
        Some(file) => {
            let file = require_image(Some(file), state.settings())?;
            let storage = require_storage(state)?;
            let key = object_key(PROFILE_PICTURES_FOLDER, &id, &file.extension());
            let stored = storage
                .upload_bytes(&key, &file.content_type, file.bytes)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to upload picture"))?;
            Some(stored)
        }
        None => None,
    };

    let picture = stored.as_ref().map(|object| object.url.as_str()).or(account.picture.as_deref());
    let created = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &id,
            email: &email,
            name: &account.name,
            role,
            status: AccountStatus::Invited,
            phone_number: account.phone_number.as_deref(),
            birth_date,
            picture,
            picture_key: stored.as_ref().map(|object| object.key.as_str()),
            created_at: primitive_now_utc(),
        },
    )
    .await;

    let user = match created {
        Ok(user) => user,
        Err(err) => {
            if let (Some(object), Some(storage)) = (stored.as_ref(), state.storage()) {
                storage.delete_quietly(&object.key).await;
            }
            return Err(ApiError::internal(err, "Failed to create user"));
        }
    };

    tracing::info!(
        action = "user_create",
        admin_id,
        account_id = %user.id,
        role = ?user.role,
        "Account provisioned"
    );

    Ok(Json(Envelope::ok_with(
        "User added successfully",
        UserPayload { user: UserResponse::from_db(user) },
    )))
}

async fn upload_picture(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<Envelope<PicturePayload>>, ApiError> {
    let storage = require_storage(&state)?;
    let form = read_multipart(multipart, "picture", state.settings()).await?;
    let file = require_image(form.file, state.settings())?;

    let key = object_key(PROFILE_PICTURES_FOLDER, &user.id, &file.extension());
    let stored = storage
        .upload_bytes(&key, &file.content_type, file.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload picture"))?;

    let updated = repositories::users::set_picture(
        state.db(),
        &user.id,
        &stored.url,
        &stored.key,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save picture"))?;

    if let Some(previous) = user.picture_key.as_deref().filter(|previous| *previous != stored.key) {
        storage.delete_quietly(previous).await;
    }

    tracing::info!(action = "picture_upload", account_id = %updated.id, size = stored.size, "Profile picture replaced");

    Ok(Json(Envelope::ok_with(
        "Picture uploaded",
        PicturePayload { url: stored.url, user: UserResponse::from_db(updated) },
    )))
}

async fn list_students(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Envelope<UserListPayload>>, ApiError> {
    let users = repositories::users::list_by_role(state.db(), UserRole::Student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(Envelope::ok(UserListPayload {
        users: users.into_iter().map(UserResponse::directory_entry).collect(),
    })))
}

async fn tasks_for_user(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(account_id): Path<String>,
) -> Result<Json<Envelope<TaskListPayload>>, ApiError> {
    let account = repositories::users::find_by_id(state.db(), &account_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::NotFound("User not found"))?;

    let tasks = repositories::tasks::list_for_account(state.db(), &account.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load tasks"))?;

    Ok(Json(Envelope::ok_with(
        "Tasks fetched successfully",
        TaskListPayload { tasks: tasks.into_iter().map(TaskSummary::from_db).collect() },
    )))
}

async fn update_profile(
    State(state): State<AppState>,
    SessionUser(claims): SessionUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<Envelope<UserPayload>>, ApiError> {
    let birth_date = match non_blank(payload.birth_date.clone()) {
        Some(raw) => Some(
            parse_date(&raw).ok_or_else(|| ApiError::BadRequest("Invalid birthDate".to_string()))?,
        ),
        None => None,
    };
    let phone_number = payload.phone_change();

    let updated = repositories::users::update_profile(
        state.db(),
        &claims.sub,
        repositories::users::UpdateProfile {
            name: non_blank(payload.name),
            social_links: payload.social_links,
            phone_number,
            birth_date,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or(ApiError::NotFound("No user found"))?;

    Ok(Json(Envelope::ok_with(
        "Update information successfully",
        UserPayload { user: UserResponse::from_db(updated) },
    )))
}
