//! Request extractors for authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::db::fetch_user_by_id;
use super::models::UserRecord;
use super::token::TokenError;
use crate::errors::{ApiError, unauthorized};
use crate::state::AppState;

/// Any signed-in user.
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserRecord);

/// A signed-in user with the `admin` role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub UserRecord);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = state
            .auth
            .token_from_headers(&parts.headers)
            .ok_or_else(|| unauthorized("Not authorized to access this route"))?;

        let claims = state.auth.verify(&token).map_err(|err| match err {
            TokenError::Expired => unauthorized("Token expired"),
            TokenError::Invalid => unauthorized("Invalid token"),
        })?;

        let user = fetch_user_by_id(&state.pool, &claims.sub)
            .await?
            .ok_or_else(|| unauthorized("User not found"))?;

        Ok(AuthUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("Access denied. Admin only.".to_string()));
        }
        Ok(AdminUser(user))
    }
}
