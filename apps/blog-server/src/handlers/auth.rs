//! Authentication handlers.

use actix_web::{HttpResponse, http::header, web};
use validator::Validate;

use blogicum_core::domain::{NewAccount, User};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterRequest};

use super::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let password_hash = state.passwords.hash(&form.password)?;
    let user = state
        .blog
        .register(
            NewAccount {
                username: form.username,
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
            },
            password_hash,
        )
        .await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, "/"))
        .json(ApiResponse::ok(issue_token(&state, &user)?)))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let invalid = || AppError::Unauthorized("Invalid username or password.".to_string());

    let user = state
        .blog
        .find_login(&form.username)
        .await?
        .ok_or_else(invalid)?;

    if !state.passwords.verify(&form.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(issue_token(&state, &user)?)))
}

/// GET /auth/me/ - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    tracing::debug!(username = %identity.username, "Resolving current user");
    let user = state.blog.current_user(&identity.viewer()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::user(user))))
}
