use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;

use crate::api::cookies::read_cookie;
use crate::api::errors::ApiError;
use crate::core::security::{self, SessionClaims};
use crate::core::state::AppState;
use crate::db::models::User;
use crate::repositories;

pub(crate) struct SessionUser(pub(crate) SessionClaims);
pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let cookie_name = &app_state.settings().security().cookie_name;
        let token = read_cookie(&parts.headers, cookie_name)
            .ok_or(ApiError::NotAuthenticated(None))?;

        let claims = security::validate_session(&token, app_state.settings())
            .map_err(|_| ApiError::NotAuthenticated(Some("Invalid session".to_string())))?;

        Ok(SessionUser(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser(claims) = SessionUser::from_request_parts(parts, state).await?;

        let user = repositories::users::find_by_id(state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError::NotFound("User not found")),
        }
    }
}

// The role is read from the stored account, not from the token, so a
// demotion takes effect on the next request.
#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Not authorized"))
        }
    }
}
