//! Feeds, post detail and the post editor.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;
use validator::Validate;

use blogicum_core::domain::PostDraft;
use blogicum_core::{Action, PostDetail};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{CategoryFeedResponse, PageQuery, PostDetailResponse, PostRequest};

use super::render;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn draft(form: PostRequest) -> PostDraft {
    PostDraft {
        title: form.title,
        text: form.text,
        pub_date: form.pub_date,
        location_id: form.location_id,
        category_id: form.category_id,
        image: form.image.filter(|path| !path.is_empty()),
        is_published: form.is_published,
    }
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.page_request(query.page.as_deref());
    let posts = state.blog.feed(&identity.viewer(), page).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::page(posts, render::summary))))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.page_request(query.page.as_deref());
    let (category, posts) = state
        .blog
        .category_feed(&identity.viewer(), &path, page)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CategoryFeedResponse {
        category: render::category(category),
        page_obj: render::page(posts, render::summary),
    })))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state
        .blog
        .post_detail(&identity.viewer(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(detail_response(detail))))
}

fn detail_response(detail: PostDetail) -> PostDetailResponse {
    let comments = detail
        .comments
        .iter()
        .map(|c| render::comment(c.clone(), detail.commenter(c)))
        .collect();
    PostDetailResponse {
        post: render::post(detail.post, detail.labels, detail.comments.len() as u64),
        comments,
    }
}

/// POST /posts/create/
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let viewer = identity.viewer();
    let post = state.blog.create_post(&viewer, draft(form)).await?;
    let labels = state.blog.post_labels(&post).await?;

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("/profile/{}/", labels.author_username),
        ))
        .json(ApiResponse::ok_with_message(
            render::post(post, labels, 0),
            "Post created.",
        )))
}

/// GET /posts/{id}/edit/
pub async fn edit_post_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .owned_post(&identity.viewer(), path.into_inner(), Action::Edit)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::post_form(post))))
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let viewer = identity.viewer();
    let post = state
        .blog
        .update_post(&viewer, path.into_inner(), draft(form))
        .await?;
    let detail = state.blog.post_detail(&viewer, post.id).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, format!("/posts/{}/", post.id)))
        .json(ApiResponse::ok_with_message(
            detail_response(detail),
            "Post updated.",
        )))
}

/// GET /posts/{id}/delete/
pub async fn delete_post_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .owned_post(&identity.viewer(), path.into_inner(), Action::Delete)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::post_form(post))))
}

/// POST /posts/{id}/delete/
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .delete_post(&identity.viewer(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::LOCATION, "/"))
        .json(ApiResponse::ok_with_message(
            render::post_form(post),
            "Post deleted.",
        )))
}
