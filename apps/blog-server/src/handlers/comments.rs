//! Comment handlers. Every route is scoped to its post.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;
use validator::Validate;

use blogicum_core::domain::Comment;
use blogicum_core::{Action, Viewer};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{CommentRequest, CommentResponse};

use super::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn post_location(post_id: Uuid) -> (header::HeaderName, String) {
    (header::LOCATION, format!("/posts/{}/", post_id))
}

/// Render a comment written by `viewer`, with their current username.
async fn own_comment(
    state: &AppState,
    viewer: &Viewer,
    comment: Comment,
) -> AppResult<CommentResponse> {
    let author = state.blog.current_user(viewer).await?;
    Ok(render::comment(comment, author.username))
}

/// POST /posts/{id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let viewer = identity.viewer();
    let comment = state
        .blog
        .add_comment(&viewer, path.into_inner(), form.text)
        .await?;
    let post_id = comment.post_id;

    Ok(HttpResponse::Created()
        .insert_header(post_location(post_id))
        .json(ApiResponse::ok(own_comment(&state, &viewer, comment).await?)))
}

/// GET /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();
    let comment = state
        .blog
        .owned_comment(&viewer, post_id, comment_id, Action::Edit)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(own_comment(&state, &viewer, comment).await?)))
}

/// POST /posts/{id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let form = body.into_inner();
    form.validate()?;

    let viewer = identity.viewer();
    let comment = state
        .blog
        .update_comment(&viewer, post_id, comment_id, form.text)
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header(post_location(post_id))
        .json(ApiResponse::ok_with_message(
            own_comment(&state, &viewer, comment).await?,
            "Comment updated.",
        )))
}

/// GET /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_comment_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();
    let comment = state
        .blog
        .owned_comment(&viewer, post_id, comment_id, Action::Delete)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(own_comment(&state, &viewer, comment).await?)))
}

/// POST /posts/{id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let viewer = identity.viewer();
    let comment = state
        .blog
        .delete_comment(&viewer, post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header(post_location(post_id))
        .json(ApiResponse::ok_with_message(
            own_comment(&state, &viewer, comment).await?,
            "Comment deleted.",
        )))
}
