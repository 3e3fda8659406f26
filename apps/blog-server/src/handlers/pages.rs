//! Static informational pages and the fallback for unknown routes.

use actix_web::HttpResponse;
use blogicum_shared::dto::StaticPageResponse;
use blogicum_shared::{ApiResponse, ErrorResponse};

use crate::observability::RequestId;

fn static_page(slug: &str, title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(StaticPageResponse {
        slug: slug.to_string(),
        title: title.to_string(),
        body: body.to_string(),
    }))
}

/// GET /pages/about/
pub async fn about() -> HttpResponse {
    static_page(
        "about",
        "About",
        "Blogicum is a place to share your stories: travel notes, news and \
         everything in between. Write posts, attach them to a category and a \
         place, and discuss them in the comments.",
    )
}

/// GET /pages/rules/
pub async fn rules() -> HttpResponse {
    static_page(
        "rules",
        "Rules",
        "Be polite to other authors. Do not publish content you have no rights \
         to. Posts breaking these rules are removed together with their comments.",
    )
}

/// Any route that matched nothing.
pub async fn not_found(request_id: RequestId) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("The requested page does not exist.")
            .with_request_id(request_id.as_str()),
    )
}
