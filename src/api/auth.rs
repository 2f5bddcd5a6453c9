use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::cookies::session_cookie;
use crate::api::errors::ApiError;
use crate::core::identity::IdentityError;
use crate::core::redis::login_rate_key;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{UserPayload, UserResponse};
use crate::schemas::Envelope;

const LOGIN_RATE_LIMIT: u64 = 10;
const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;

#[derive(Debug, Deserialize)]
struct GoogleLoginRequest {
    #[serde(default)]
    credential: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/google", post(google_login))
}

async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<(HeaderMap, Json<Envelope<UserPayload>>), ApiError> {
    let credential = payload
        .credential
        .filter(|value| !value.trim().is_empty())
        .ok_or(ApiError::Unauthorized("Authentication failed"))?;

    let identity = match state.identity().verify(credential.trim()).await {
        Ok(identity) => identity,
        Err(IdentityError::NotConfigured) => {
            return Err(ApiError::ServiceUnavailable(
                "Google sign-in is not configured".to_string(),
            ));
        }
        Err(err) => {
            tracing::warn!(error = %err, "Google credential rejected");
            return Err(ApiError::Unauthorized("Authentication failed"));
        }
    };

    let allowed = state
        .redis()
        .rate_limit(&login_rate_key(&identity.email), LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let account = repositories::users::find_by_email(state.db(), &identity.email.to_lowercase())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Forbidden("Your email is not registered. Please contact your admin."))?;

    if !account.status.can_login() {
        tracing::info!(account_id = %account.id, status = ?account.status, "Login refused for inactive account");
        return Err(ApiError::Forbidden("Your email is not active. Please contact your admin."));
    }

    let user = repositories::users::record_login(
        state.db(),
        &account.id,
        &identity.subject,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record login"))?;

    let token = security::issue_session(&user.id, &user.email, user.role, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to issue session"))?;
    let cookie = session_cookie(&token, state.settings())
        .ok_or_else(|| ApiError::internal("invalid cookie value", "Failed to build session cookie"))?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    tracing::info!(action = "login", account_id = %user.id, role = ?user.role, "User signed in");

    Ok((
        headers,
        Json(Envelope::ok_with("Login success", UserPayload { user: UserResponse::from_db(user) })),
    ))
}
