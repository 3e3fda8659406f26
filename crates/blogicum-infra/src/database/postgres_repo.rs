//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, PostLabels, PostSummary, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::policy::{PostOrder, PostQuery, Visibility};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_core::service::Repositories;

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Every repository, sharing one connection pool.
pub fn repositories(db: DbConn) -> Repositories {
    let db = Arc::new(db);
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
        locations: Arc::new(PostgresLocationRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db)),
    }
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{}***@{}", first, domain),
            _ => format!("***@{}", domain),
        },
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

/// A post row annotated with related names and its comment count.
#[derive(Debug, FromQueryResult)]
struct PostWithCount {
    id: Uuid,
    title: String,
    text: String,
    pub_date: DateTimeWithTimeZone,
    author_id: Uuid,
    location_id: Option<Uuid>,
    category_id: Uuid,
    image: Option<String>,
    is_published: bool,
    created_at: DateTimeWithTimeZone,
    author_username: String,
    category_title: String,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    comment_count: i64,
}

impl From<PostWithCount> for PostSummary {
    fn from(row: PostWithCount) -> Self {
        let post = post::Model {
            id: row.id,
            title: row.title,
            text: row.text,
            pub_date: row.pub_date,
            author_id: row.author_id,
            location_id: row.location_id,
            category_id: row.category_id,
            image: row.image,
            is_published: row.is_published,
            created_at: row.created_at,
        };
        let location_name = row
            .location_name
            .filter(|_| row.location_is_published.unwrap_or(false));
        Self {
            post: post.into(),
            labels: PostLabels {
                author_username: row.author_username,
                category_title: row.category_title,
                location_name,
            },
            comment_count: row.comment_count.max(0) as u64,
        }
    }
}

/// Translate the filter part of a [`PostQuery`] into SQL. Joins the category
/// so its publication flag can be checked.
fn filter_posts(select: Select<PostEntity>, query: &PostQuery) -> Select<PostEntity> {
    let mut condition = Condition::all();

    if let Some(author_id) = query.author_id {
        condition = condition.add(post::Column::AuthorId.eq(author_id));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(post::Column::CategoryId.eq(category_id));
    }
    if let Visibility::PublishedAt(now) = query.visibility {
        condition = condition
            .add(post::Column::IsPublished.eq(true))
            .add(post::Column::PubDate.lte(DateTimeWithTimeZone::from(now)))
            .add(category::Column::IsPublished.eq(true));
    }

    select
        .join(JoinType::InnerJoin, post::Relation::Category.def())
        .filter(condition)
}

fn order_posts(select: Select<PostEntity>, order: PostOrder) -> Select<PostEntity> {
    match order {
        PostOrder::PubDateDesc => select
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::CreatedAt),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let mut select = order_posts(filter_posts(PostEntity::find(), query), query.order)
            .join(JoinType::InnerJoin, post::Relation::Author.def())
            .join(JoinType::LeftJoin, post::Relation::Location.def())
            .column_as(user::Column::Username, "author_username")
            .column_as(category::Column::Title, "category_title")
            .column_as(location::Column::Name, "location_name")
            .column_as(location::Column::IsPublished, "location_is_published");

        select = if query.with_comment_count {
            select
                .join(JoinType::LeftJoin, post::Relation::Comments.def())
                .column_as(
                    Expr::col((CommentEntity, comment::Column::Id)).count(),
                    "comment_count",
                )
                .group_by(post::Column::Id)
                .group_by(user::Column::Id)
                .group_by(category::Column::Id)
                .group_by(location::Column::Id)
        } else {
            select.column_as(Expr::value(0i64), "comment_count")
        };

        let paginator = select
            .into_model::<PostWithCount>()
            .paginate(self.conn(), page.per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator
            .fetch_page(page.clamp(total) - 1)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(?query, total, page = page.page, "Listed posts");

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }

    async fn find_matching(&self, id: Uuid, query: &PostQuery) -> Result<Option<Post>, RepoError> {
        let result = filter_posts(PostEntity::find_by_id(id), query)
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::IsPublished.eq(true))
            .order_by_asc(category::Column::Title)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .filter(location::Column::IsPublished.eq(true))
            .order_by_asc(location::Column::Name)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.conn())
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
