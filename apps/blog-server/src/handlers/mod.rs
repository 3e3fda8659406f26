//! HTTP handlers and route configuration.

mod auth;
mod catalog;
mod comments;
mod health;
mod pages;
mod posts;
mod profile;
mod render;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actix_web::web;
use blogicum_core::ports::RateLimiter;

use crate::middleware::error::AppError;
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Page not found".to_string()).into()),
    )
    .route("/", web::get().to(posts::index))
    .route("/health", web::get().to(health::health_check))
    .route("/category/{slug}/", web::get().to(posts::category_posts))
    .service(
        web::scope("/posts")
            .route("/create/", web::post().to(posts::create_post))
            .route("/{id}/", web::get().to(posts::post_detail))
            .service(
                web::resource("/{id}/edit/")
                    .route(web::get().to(posts::edit_post_form))
                    .route(web::post().to(posts::edit_post)),
            )
            .service(
                web::resource("/{id}/delete/")
                    .route(web::get().to(posts::delete_post_form))
                    .route(web::post().to(posts::delete_post)),
            )
            .route("/{id}/comment/", web::post().to(comments::add_comment))
            .service(
                web::resource("/{id}/edit_comment/{comment_id}/")
                    .route(web::get().to(comments::edit_comment_form))
                    .route(web::post().to(comments::edit_comment)),
            )
            .service(
                web::resource("/{id}/delete_comment/{comment_id}/")
                    .route(web::get().to(comments::delete_comment_form))
                    .route(web::post().to(comments::delete_comment)),
            ),
    )
    .service(
        web::scope("/profile")
            .service(
                web::resource("/edit/")
                    .route(web::get().to(profile::edit_profile_form))
                    .route(web::post().to(profile::edit_profile)),
            )
            .route("/{username}/", web::get().to(profile::user_profile)),
    )
    .service(
        web::scope("/auth")
            .wrap(RateLimitMiddleware::new(limiter))
            .route("/registration/", web::post().to(auth::register))
            .route("/login/", web::post().to(auth::login))
            .route("/me/", web::get().to(auth::me)),
    )
    .route("/categories/", web::get().to(catalog::list_categories))
    .route("/locations/", web::get().to(catalog::list_locations))
    .service(
        web::scope("/admin")
            .route("/categories/", web::post().to(catalog::create_category))
            .route("/categories/{id}/", web::post().to(catalog::update_category))
            .route("/locations/", web::post().to(catalog::create_location))
            .route("/locations/{id}/", web::post().to(catalog::update_location)),
    )
    .service(
        web::scope("/pages")
            .route("/about/", web::get().to(pages::about))
            .route("/rules/", web::get().to(pages::rules)),
    )
    .default_service(web::to(pages::not_found));
}
