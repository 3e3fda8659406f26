//! Author profiles.

use actix_web::{HttpResponse, http::header, web};
use validator::Validate;

use blogicum_core::domain::ProfileChanges;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{PageQuery, ProfileFeedResponse, ProfileRequest};

use super::render;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn user_profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.page_request(query.page.as_deref());
    let (author, posts) = state
        .blog
        .profile(&identity.viewer(), &path, page)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfileFeedResponse {
        profile: render::profile(author),
        page_obj: render::page(posts, render::summary),
    })))
}

/// GET /profile/edit/
pub async fn edit_profile_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = state.blog.current_user(&identity.viewer()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::profile_form(user))))
}

/// POST /profile/edit/
pub async fn edit_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let user = state
        .blog
        .update_profile(
            &identity.viewer(),
            ProfileChanges {
                username: form.username,
                first_name: form.first_name,
                last_name: form.last_name,
                email: form.email,
            },
        )
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, format!("/profile/{}/", user.username)))
        .json(ApiResponse::ok_with_message(
            render::user(user),
            "Profile updated.",
        )))
}
