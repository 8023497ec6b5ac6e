use axum::Router;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use metrics::counter;
use serde_json::json;

use super::accounts::{authenticate, hash_blocking, verify_blocking};
use super::db;
use super::extract::AuthUser;
use super::models::{UserRecord, UserView};
use crate::api::form::FormData;
use crate::api::response::Reply;
use crate::errors::{ApiError, ApiResult, bad_request, unauthorized};
use crate::media::{self, MediaFolder};
use crate::state::AppState;
use crate::validation::is_valid_email;
use crate::validation::payload::Violations;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/check", get(check_admin))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
}

async fn check_admin(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let exists = db::admin_exists(&state.pool).await?;
    Ok(Reply::ok(json!({ "exists": exists }), "Admin check completed"))
}

/// Issue a token for `user` and return it in both the body and a cookie.
fn token_response(
    state: &AppState,
    user: &UserRecord,
    message: &str,
) -> ApiResult<impl IntoResponse + use<>> {
    let token = state.auth.issue(&user.id)?;
    let cookie = state.auth.session_cookie(&token);
    let body = Reply::ok(
        json!({ "user": UserView::from(user), "token": token }),
        message,
    );
    Ok(([(SET_COOKIE, cookie)], body))
}

async fn login(State(state): State<AppState>, form: FormData) -> ApiResult<impl IntoResponse> {
    let payload = &form.payload;
    let mut violations = Violations::new();
    let email = violations
        .require("email", payload.non_empty_text("email"), "Email is required")
        .map(|email| email.to_lowercase());
    if let Some(email) = &email {
        violations.check(is_valid_email(email), "email", "Please enter a valid email");
    }
    let password = violations.require(
        "password",
        payload.text("password").filter(|p| !p.is_empty()),
        "Password is required",
    );
    violations.finish()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(bad_request("Email and password are required"));
    };

    match authenticate(&state.pool, &email, &password).await? {
        Some(user) => {
            counter!("auth.logins", "outcome" => "success").increment(1);
            tracing::info!(user_id = %user.id, "login succeeded");
            token_response(&state, &user, "Login successful")
        }
        None => {
            counter!("auth.logins", "outcome" => "failure").increment(1);
            tracing::warn!("login failed for {email}");
            Err(unauthorized("Invalid credentials"))
        }
    }
}

async fn logout(State(state): State<AppState>, _user: AuthUser) -> impl IntoResponse {
    (
        [(SET_COOKIE, state.auth.clear_cookie())],
        Reply::ok((), "Logged out successfully"),
    )
}

async fn me(AuthUser(user): AuthUser) -> Reply<UserView> {
    Reply::ok(UserView::from(user), "User retrieved successfully")
}

async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut form: FormData,
) -> ApiResult<Reply<UserView>> {
    let payload = &form.payload;
    let mut violations = Violations::new();

    let name = payload.non_empty_text("name");
    if let Some(name) = &name {
        violations.length("name", name, 2, 50, "Name must be between 2 and 50 characters");
    }
    let email = payload.non_empty_text("email").map(|e| e.to_lowercase());
    if let Some(email) = &email {
        violations.check(is_valid_email(email), "email", "Please enter a valid email");
    }
    violations.finish()?;

    let avatar_file = form.take_file("avatar");
    if let Some(file) = &avatar_file {
        media::check_image(file)?;
    }

    let previous = user.avatar.as_ref().map(|avatar| avatar.0.clone());
    let avatar = match &avatar_file {
        Some(file) => Some(media::upload(state.media.as_ref(), file, MediaFolder::Avatars).await?),
        None => previous.clone(),
    };

    let updated = db::update_profile(
        &state.pool,
        &user.id,
        name.as_deref().unwrap_or(&user.name),
        email.as_deref().unwrap_or(&user.email),
        avatar.as_ref(),
    )
    .await;

    match updated {
        Ok(updated) => {
            if avatar_file.is_some() {
                media::discard(state.media.as_ref(), previous.iter()).await;
            }
            Ok(Reply::ok(UserView::from(updated), "Profile updated successfully"))
        }
        Err(err) => {
            if avatar_file.is_some() {
                media::discard(state.media.as_ref(), avatar.iter()).await;
            }
            Err(err.into())
        }
    }
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    form: FormData,
) -> ApiResult<impl IntoResponse> {
    let payload = &form.payload;
    let mut violations = Violations::new();
    let current = violations.require(
        "currentPassword",
        payload.text("currentPassword").filter(|p| !p.is_empty()),
        "Current password is required",
    );
    let new_password = violations.require(
        "newPassword",
        payload.text("newPassword").filter(|p| !p.is_empty()),
        "New password is required",
    );
    if let Some(new_password) = &new_password {
        violations.check(
            new_password.chars().count() >= 6,
            "newPassword",
            "New password must be at least 6 characters",
        );
    }
    violations.finish()?;
    let (Some(current), Some(new_password)) = (current, new_password) else {
        return Err(bad_request("Current and new password are required"));
    };

    if !verify_blocking(current, user.password_hash.clone()).await? {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let password_hash = hash_blocking(new_password).await?;
    db::update_password(&state.pool, &user.id, &password_hash).await?;
    tracing::info!(user_id = %user.id, "password changed");

    token_response(&state, &user, "Password changed successfully")
}
