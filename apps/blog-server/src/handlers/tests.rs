use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use blogicum_core::Viewer;
use blogicum_core::domain::{
    Category, CategoryDraft, Location, LocationDraft, NewAccount, Post, PostDraft, User,
};
use blogicum_core::ports::{BaseRepository, RateLimiter};
use blogicum_infra::{InMemoryRateLimiter, InMemoryStore, RateLimitConfig};

use super::configure_routes;
use crate::config::{AdminConfig, AppConfig};
use crate::observability::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::state::AppState;

macro_rules! test_app {
    ($state:expr) => {
        test_app!($state, RateLimitConfig::default())
    };
    ($state:expr, $limits:expr) => {{
        let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new($limits));
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .configure(move |cfg| configure_routes(cfg, limiter)),
        )
        .await
    }};
}

struct Fixture {
    store: InMemoryStore,
    state: AppState,
}

impl Fixture {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::from_repositories(store.repositories(), &AppConfig::default());
        Self { store, state }
    }

    /// A registered user and a bearer header for them.
    async fn user(&self, username: &str) -> (User, (header::HeaderName, String)) {
        let user = self
            .state
            .blog
            .register(
                NewAccount {
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    first_name: "First".to_string(),
                    last_name: "Last".to_string(),
                },
                "not-a-real-hash".to_string(),
            )
            .await
            .unwrap();
        let token = self
            .state
            .tokens
            .generate_token(user.id, &user.username, user.roles())
            .unwrap();
        (user, (header::AUTHORIZATION, format!("Bearer {}", token)))
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        self.store
            .categories()
            .insert(Category::new(CategoryDraft {
                title: slug.to_uppercase(),
                description: "Description".to_string(),
                slug: slug.to_string(),
                is_published,
            }))
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, category: &Category, is_published: bool) -> Post {
        self.state
            .blog
            .create_post(
                &Viewer::User(author.id),
                PostDraft {
                    title: "A day in Moscow".to_string(),
                    text: "It was sunny.".to_string(),
                    pub_date: Utc::now() - Duration::hours(1),
                    location_id: None,
                    category_id: category.id,
                    image: None,
                    is_published,
                },
            )
            .await
            .unwrap()
    }
}

fn post_form(category: &Category) -> Value {
    json!({
        "title": "Fresh post",
        "text": "Body",
        "pub_date": (Utc::now() - Duration::minutes(5)).to_rfc3339(),
        "category_id": category.id,
    })
}

#[actix_web::test]
async fn feed_lists_only_published_posts() {
    let fx = Fixture::new();
    let (author, _) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let public = fx.post(&author, &news, true).await;
    fx.post(&author, &news, false).await;

    let app = test_app!(fx.state);
    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(public.id));
    assert_eq!(body["data"]["number"], 1);
    assert_eq!(body["data"]["has_next"], false);
}

#[actix_web::test]
async fn draft_detail_is_not_found_except_for_its_author() {
    let fx = Fixture::new();
    let (author, author_auth) = fx.user("leo").await;
    let (_, reader_auth) = fx.user("anna").await;
    let news = fx.category("news", true).await;
    let draft = fx.post(&author, &news, false).await;
    let uri = format!("/posts/{}/", draft.id);

    let app = test_app!(fx.state);

    let anonymous = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);

    let reader = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header(reader_auth)
            .to_request(),
    )
    .await;
    assert_eq!(reader.status(), StatusCode::NOT_FOUND);

    let owner = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header(author_auth)
            .to_request(),
    )
    .await;
    assert_eq!(owner.status(), StatusCode::OK);
}

#[actix_web::test]
async fn creating_a_post_requires_a_token() {
    let fx = Fixture::new();
    let news = fx.category("news", true).await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .set_json(post_form(&news))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn created_post_redirects_to_author_profile() {
    let fx = Fixture::new();
    let (author, auth) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let app = test_app!(fx.state);

    let mut form = post_form(&news);
    form["author_id"] = json!(uuid::Uuid::new_v4());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header(auth)
            .set_json(form)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/profile/leo/"
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["author_id"], json!(author.id));
    assert_eq!(body["data"]["is_published"], true);
}

#[actix_web::test]
async fn invalid_post_form_reports_field_errors() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let app = test_app!(fx.state);

    let mut form = post_form(&news);
    form["title"] = json!("");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header(auth)
            .set_json(form)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["title"].is_array());
}

#[actix_web::test]
async fn non_owner_cannot_edit_post() {
    let fx = Fixture::new();
    let (author, _) = fx.user("leo").await;
    let (_, intruder_auth) = fx.user("boris").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, true).await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header(intruder_auth)
            .set_json(post_form(&news))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn comment_flow_and_foreign_delete() {
    let fx = Fixture::new();
    let (author, author_auth) = fx.user("leo").await;
    let (_, intruder_auth) = fx.user("boris").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, true).await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", post.id))
            .insert_header(author_auth)
            .set_json(json!({ "text": "First!" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = format!("/posts/{}/", post.id);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), location.as_str());
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["author_username"], "leo");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/delete_comment/{}/", post.id, comment_id))
            .insert_header(intruder_auth)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let detail: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(&location).to_request(),
    )
    .await;
    assert_eq!(detail["data"]["comments"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"]["comments"][0]["author_username"], "leo");
    assert_eq!(detail["data"]["post"]["comment_count"], 1);
    assert_eq!(detail["data"]["post"]["author_username"], "leo");
    assert_eq!(detail["data"]["post"]["category_title"], "NEWS");
}

#[actix_web::test]
async fn unpublished_category_page_is_not_found() {
    let fx = Fixture::new();
    fx.category("news", false).await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/news/").to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn own_profile_includes_drafts() {
    let fx = Fixture::new();
    let (author, auth) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    fx.post(&author, &news, false).await;
    let app = test_app!(fx.state);

    let public: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/profile/leo/").to_request(),
    )
    .await;
    let own: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/profile/leo/")
            .insert_header(auth)
            .to_request(),
    )
    .await;

    assert_eq!(public["data"]["page_obj"]["total_items"], 0);
    assert_eq!(own["data"]["page_obj"]["total_items"], 1);
    assert_eq!(own["data"]["profile"]["username"], "leo");
    assert!(own["data"]["profile"].get("email").is_none());
}

#[actix_web::test]
async fn register_then_login() {
    let fx = Fixture::new();
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .set_json(json!({
                "username": "leo",
                "email": "leo@example.com",
                "first_name": "Leo",
                "last_name": "Tolstoy",
                "password": "war-and-peace",
                "password_confirm": "war-and-peace",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "leo", "password": "anna-karenina" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let login: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "leo", "password": "war-and-peace" }))
            .to_request(),
    )
    .await;
    let token = login["data"]["access_token"].as_str().unwrap();

    let me: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/auth/me/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request(),
    )
    .await;
    assert_eq!(me["data"]["username"], "leo");
    assert_eq!(me["data"]["email"], "leo@example.com");
}

#[actix_web::test]
async fn duplicate_registration_is_a_field_error() {
    let fx = Fixture::new();
    fx.user("leo").await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/registration/")
            .set_json(json!({
                "username": "leo",
                "email": "other@example.com",
                "first_name": "Leo",
                "last_name": "Tolstoy",
                "password": "war-and-peace",
                "password_confirm": "war-and-peace",
            }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["username"][0], "This username is already taken.");
}

#[actix_web::test]
async fn auth_routes_are_rate_limited() {
    let fx = Fixture::new();
    let app = test_app!(
        fx.state,
        RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        }
    );

    let login = || {
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "nobody", "password": "whatever" }))
            .to_request()
    };

    for _ in 0..2 {
        let resp = test::call_service(&app, login()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let resp = test::call_service(&app, login()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
}

#[actix_web::test]
async fn catalog_admin_is_staff_only() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("anna").await;
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/categories/")
            .insert_header(auth)
            .set_json(json!({
                "title": "Travel",
                "description": "Trips",
                "slug": "travel",
            }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_routes_get_problem_details() {
    let fx = Fixture::new();
    let app = test_app!(fx.state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/nowhere/")
            .insert_header((REQUEST_ID_HEADER, "req-42"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["request_id"], "req-42");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/posts/not-a-uuid/").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn static_pages_and_health() {
    let fx = Fixture::new();
    let app = test_app!(fx.state);

    let about: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/pages/about/").to_request(),
    )
    .await;
    assert_eq!(about["data"]["slug"], "about");

    let health = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[actix_web::test]
async fn bootstrapped_staff_can_seed_a_fresh_server() {
    let fx = Fixture::new();
    fx.state
        .bootstrap_admin(&AdminConfig {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "s3cret-pass".to_string(),
        })
        .await
        .unwrap();
    let app = test_app!(fx.state);

    let login: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_json(json!({ "username": "admin", "password": "s3cret-pass" }))
            .to_request(),
    )
    .await;
    let auth = (
        header::AUTHORIZATION,
        format!("Bearer {}", login["data"]["access_token"].as_str().unwrap()),
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/admin/categories/")
            .insert_header(auth.clone())
            .set_json(json!({
                "title": "Travel",
                "description": "Trips and places",
                "slug": "travel",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header(auth)
            .set_json(json!({
                "title": "First trip",
                "text": "Kazan in May.",
                "pub_date": (Utc::now() - Duration::minutes(1)).to_rfc3339(),
                "category_id": category["data"]["id"],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let feed: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    let items = feed["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "First trip");
}

#[actix_web::test]
async fn listings_name_author_category_and_published_location() {
    let fx = Fixture::new();
    let (author, _) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let mut places = Vec::new();
    for (name, is_published) in [("Moscow", true), ("Hidden", false)] {
        let place = fx
            .store
            .locations()
            .insert(Location::new(LocationDraft {
                name: name.to_string(),
                is_published,
            }))
            .await
            .unwrap();
        fx.state
            .blog
            .create_post(
                &Viewer::User(author.id),
                PostDraft {
                    title: name.to_string(),
                    text: "Text".to_string(),
                    pub_date: Utc::now() - Duration::hours(1),
                    location_id: Some(place.id),
                    category_id: news.id,
                    image: None,
                    is_published: true,
                },
            )
            .await
            .unwrap();
        places.push(place);
    }
    let app = test_app!(fx.state);

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    for item in items {
        assert_eq!(item["author_username"], "leo");
        assert_eq!(item["category_title"], "NEWS");
        match item["title"].as_str().unwrap() {
            "Moscow" => {
                assert_eq!(item["location_id"], json!(places[0].id));
                assert_eq!(item["location_name"], "Moscow");
            }
            _ => {
                assert_eq!(item["location_id"], json!(places[1].id));
                assert!(item["location_name"].is_null());
            }
        }
    }
}

#[actix_web::test]
async fn whitespace_only_post_is_rejected() {
    let fx = Fixture::new();
    let (_, auth) = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let app = test_app!(fx.state);

    let mut form = post_form(&news);
    form["title"] = json!("   ");
    form["text"] = json!(" \n ");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts/create/")
            .insert_header(auth)
            .set_json(form)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["text"].is_array());
}
