use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, IdenStatic, Iterable, MockDatabase, MockExecResult,
    ModelTrait, Value,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, Post};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::{PostQuery, PostScope, Viewer, select_visible_posts};
use blogicum_core::ports::{BaseRepository, CategoryRepository, CommentRepository, PostRepository};

use crate::database::entity::{category, comment, post};
use crate::database::postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
};

fn post_model(author_id: Uuid, category_id: Uuid) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        title: "Test Post".to_owned(),
        text: "Content".to_owned(),
        pub_date: (now - Duration::days(1)).into(),
        author_id,
        location_id: None,
        category_id,
        image: None,
        is_published: true,
        created_at: now.into(),
    }
}

/// Row shape of a listing: the post columns plus its comment count.
fn listing_row(model: &post::Model, comment_count: i64) -> BTreeMap<String, Value> {
    let mut row: BTreeMap<String, Value> = post::Column::iter()
        .map(|col| (col.as_str().to_owned(), model.get(col)))
        .collect();
    row.insert("author_username".to_owned(), Value::from("leo"));
    row.insert("category_title".to_owned(), Value::from("News"));
    row.insert("location_name".to_owned(), Value::from("Moscow"));
    row.insert("location_is_published".to_owned(), Value::from(false));
    row.insert("comment_count".to_owned(), Value::BigInt(Some(comment_count)));
    row
}

fn count_row(total: i64) -> BTreeMap<String, Value> {
    BTreeMap::from([("num_items".to_owned(), Value::BigInt(Some(total)))])
}

/// Every SQL statement the mock connection received, in order.
fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
    Arc::try_unwrap(db)
        .expect("repository should have been dropped")
        .into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
        .collect()
}

#[tokio::test]
async fn test_find_post_by_id() {
    let model = post_model(Uuid::new_v4(), Uuid::new_v4());
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
}

#[tokio::test]
async fn test_insert_post_returns_stored_row() {
    let model = post_model(Uuid::new_v4(), Uuid::new_v4());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));
    let post: Post = model.clone().into();

    let saved = repo.insert(post).await.unwrap();

    assert_eq!(saved.id, model.id);
    assert_eq!(saved.author_id, model.author_id);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_category_by_slug() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![category::Model {
            id: Uuid::new_v4(),
            title: "News".to_owned(),
            description: "Latest news".to_owned(),
            slug: "news".to_owned(),
            is_published: false,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresCategoryRepository::new(Arc::new(db));

    let category: Category = repo.find_by_slug("news").await.unwrap().unwrap();

    assert_eq!(category.slug, "news");
    assert!(!category.is_published);
}

#[tokio::test]
async fn test_list_comments_for_post() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();
    let comments = vec![
        comment::Model {
            id: Uuid::new_v4(),
            post_id,
            author_id: Uuid::new_v4(),
            text: "First".to_owned(),
            created_at: (now - Duration::minutes(5)).into(),
        },
        comment::Model {
            id: Uuid::new_v4(),
            post_id,
            author_id: Uuid::new_v4(),
            text: "Second".to_owned(),
            created_at: now.into(),
        },
    ];

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([comments])
        .into_connection();

    let repo = PostgresCommentRepository::new(Arc::new(db));

    let result = repo.list_for_post(post_id).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].text, "First");
    assert!(result.iter().all(|c| c.post_id == post_id));
}

#[tokio::test]
async fn test_published_listing_filters_joins_and_orders() {
    let model = post_model(Uuid::new_v4(), Uuid::new_v4());

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(1)]])
            .append_query_results([vec![listing_row(&model, 3)]])
            .into_connection(),
    );
    let repo = PostgresPostRepository::new(db.clone());

    let page = repo
        .list(&PostQuery::published(Utc::now()), PageRequest::new(1, 10))
        .await
        .unwrap();

    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].post.id, model.id);
    assert_eq!(page.items[0].comment_count, 3);
    assert_eq!(page.items[0].labels.author_username, "leo");
    assert_eq!(page.items[0].labels.category_title, "News");
    assert_eq!(page.items[0].labels.location_name, None);

    drop(repo);
    let sql = executed_sql(db);
    assert_eq!(sql.len(), 2);

    let listing = &sql[1];
    assert!(listing.contains(r#"INNER JOIN "categories""#));
    assert!(listing.contains(r#""posts"."is_published" = $"#));
    assert!(listing.contains(r#""posts"."pub_date" <= $"#));
    assert!(listing.contains(r#""categories"."is_published" = $"#));
    assert!(listing.contains(r#"INNER JOIN "users""#));
    assert!(listing.contains(r#"LEFT JOIN "locations""#));
    assert!(listing.contains(r#"LEFT JOIN "comments""#));
    assert!(listing.contains(r#"COUNT("comments"."id")"#));
    assert!(listing.contains(r#"GROUP BY "posts"."id""#));
    assert!(listing.contains(r#"ORDER BY "posts"."pub_date" DESC"#));
    assert!(listing.contains("LIMIT"));
}

#[tokio::test]
async fn test_own_profile_listing_skips_publication_filter() {
    let author_id = Uuid::new_v4();
    let query = select_visible_posts(
        &Viewer::User(author_id),
        PostScope::ByAuthor(author_id),
        Utc::now(),
    );

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(0)]])
            .append_query_results([Vec::<BTreeMap<String, Value>>::new()])
            .into_connection(),
    );
    let repo = PostgresPostRepository::new(db.clone());

    let page = repo.list(&query, PageRequest::new(1, 10)).await.unwrap();
    assert!(page.items.is_empty());

    drop(repo);
    for statement in executed_sql(db) {
        assert!(statement.contains(r#""posts"."author_id" = $"#));
        assert!(!statement.contains("is_published"));
        assert!(!statement.contains(r#""posts"."pub_date" <="#));
    }
}

#[tokio::test]
async fn test_category_listing_filters_by_category() {
    let category_id = Uuid::new_v4();
    let query = select_visible_posts(
        &Viewer::Anonymous,
        PostScope::ByCategory(category_id),
        Utc::now(),
    );

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![count_row(0)]])
            .append_query_results([Vec::<BTreeMap<String, Value>>::new()])
            .into_connection(),
    );
    let repo = PostgresPostRepository::new(db.clone());

    repo.list(&query, PageRequest::new(1, 10)).await.unwrap();

    drop(repo);
    let sql = executed_sql(db);
    let listing = &sql[1];
    assert!(listing.contains(r#""posts"."category_id" = $"#));
    assert!(listing.contains(r#""categories"."is_published" = $"#));
    assert!(!listing.contains(r#""posts"."author_id""#));
}

#[tokio::test]
async fn test_find_matching_applies_published_predicate() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection(),
    );
    let repo = PostgresPostRepository::new(db.clone());

    let found = repo
        .find_matching(Uuid::new_v4(), &PostQuery::published(Utc::now()))
        .await
        .unwrap();
    assert!(found.is_none());

    drop(repo);
    let sql = executed_sql(db);
    assert!(sql[0].contains(r#""posts"."id" = $"#));
    assert!(sql[0].contains(r#""posts"."pub_date" <= $"#));
    assert!(sql[0].contains(r#""categories"."is_published" = $"#));
}
