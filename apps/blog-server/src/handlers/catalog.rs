//! Categories and locations: public listings and staff management.

use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use blogicum_core::domain::{CategoryDraft, LocationDraft};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{CategoryRequest, LocationRequest};

use super::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn category_draft(form: CategoryRequest) -> CategoryDraft {
    CategoryDraft {
        title: form.title,
        description: form.description,
        slug: form.slug,
        is_published: form.is_published,
    }
}

fn location_draft(form: LocationRequest) -> LocationDraft {
    LocationDraft {
        name: form.name,
        is_published: form.is_published,
    }
}

/// GET /categories/
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.blog.published_categories().await?;
    let body: Vec<_> = categories.into_iter().map(render::category).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /locations/
pub async fn list_locations(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let locations = state.blog.published_locations().await?;
    let body: Vec<_> = locations.into_iter().map(render::location).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// POST /admin/categories/
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let category = state
        .blog
        .create_category(&identity.viewer(), category_draft(form))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(render::category(category))))
}

/// POST /admin/categories/{id}/
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let category = state
        .blog
        .update_category(&identity.viewer(), path.into_inner(), category_draft(form))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::category(category))))
}

/// POST /admin/locations/
pub async fn create_location(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<LocationRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let location = state
        .blog
        .create_location(&identity.viewer(), location_draft(form))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(render::location(location))))
}

/// POST /admin/locations/{id}/
pub async fn update_location(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<LocationRequest>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    form.validate()?;

    let location = state
        .blog
        .update_location(&identity.viewer(), path.into_inner(), location_draft(form))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::location(location))))
}
