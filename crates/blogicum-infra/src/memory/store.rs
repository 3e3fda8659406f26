use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, PostLabels, PostSummary, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::policy::{PostOrder, PostQuery};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::service::Repositories;

// Locks are always taken in field order to stay deadlock free.
#[derive(Default)]
struct Tables {
    users: RwLock<HashMap<Uuid, User>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    locations: RwLock<HashMap<Uuid, Location>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
}

/// Shared handle on the in-memory tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryCategoryRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryLocationRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository {
            tables: self.tables.clone(),
        }
    }

    /// Every repository over the same tables.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.users()),
            posts: Arc::new(self.posts()),
            categories: Arc::new(self.categories()),
            locations: Arc::new(self.locations()),
            comments: Arc::new(self.comments()),
        }
    }
}

fn constraint(msg: &str) -> RepoError {
    RepoError::Constraint(msg.to_string())
}

/// The related tables a listing reads names from.
struct Related<'a> {
    users: &'a HashMap<Uuid, User>,
    categories: &'a HashMap<Uuid, Category>,
    locations: &'a HashMap<Uuid, Location>,
    comments: &'a HashMap<Uuid, Comment>,
}

impl Related<'_> {
    fn labels(&self, post: &Post) -> PostLabels {
        PostLabels {
            author_username: self
                .users
                .get(&post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            category_title: self
                .categories
                .get(&post.category_id)
                .map(|c| c.title.clone())
                .unwrap_or_default(),
            location_name: post
                .location_id
                .and_then(|id| self.locations.get(&id))
                .filter(|l| l.is_published)
                .map(|l| l.name.clone()),
        }
    }

    fn summarize(&self, post: &Post, count: bool) -> PostSummary {
        let comment_count = if count {
            self.comments.values().filter(|c| c.post_id == post.id).count() as u64
        } else {
            0
        };
        PostSummary {
            post: post.clone(),
            labels: self.labels(post),
            comment_count,
        }
    }
}

/// Apply a query's filters, mimicking the inner join on categories.
fn post_matches(post: &Post, categories: &HashMap<Uuid, Category>, query: &PostQuery) -> bool {
    categories
        .get(&post.category_id)
        .is_some_and(|category| query.matches(post, category.is_published))
}

fn check_post_references(
    post: &Post,
    users: &HashMap<Uuid, User>,
    categories: &HashMap<Uuid, Category>,
    locations: &HashMap<Uuid, Location>,
) -> Result<(), RepoError> {
    if !users.contains_key(&post.author_id) {
        return Err(constraint("posts.author_id references a missing user"));
    }
    if !categories.contains_key(&post.category_id) {
        return Err(constraint("posts.category_id references a missing category"));
    }
    if post.location_id.is_some_and(|id| !locations.contains_key(&id)) {
        return Err(constraint("posts.location_id references a missing location"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub struct InMemoryUserRepository {
    tables: Arc<Tables>,
}

fn check_user_unique(users: &HashMap<Uuid, User>, user: &User) -> Result<(), RepoError> {
    for other in users.values().filter(|u| u.id != user.id) {
        if other.username == user.username {
            return Err(constraint("users.username must be unique"));
        }
        if other.email == user.email {
            return Err(constraint("users.email must be unique"));
        }
    }
    Ok(())
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.tables.users.write().await;
        if users.contains_key(&user.id) {
            return Err(constraint("users.id must be unique"));
        }
        check_user_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.tables.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        check_user_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.tables.users.write().await;
        let mut posts = self.tables.posts.write().await;
        let mut comments = self.tables.comments.write().await;

        users.remove(&id).ok_or(RepoError::NotFound)?;
        posts.retain(|_, p| p.author_id != id);
        comments.retain(|_, c| c.author_id != id && posts.contains_key(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.tables.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.tables.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

pub struct InMemoryPostRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let users = self.tables.users.read().await;
        let categories = self.tables.categories.read().await;
        let locations = self.tables.locations.read().await;
        let mut posts = self.tables.posts.write().await;

        if posts.contains_key(&post.id) {
            return Err(constraint("posts.id must be unique"));
        }
        check_post_references(&post, &users, &categories, &locations)?;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let users = self.tables.users.read().await;
        let categories = self.tables.categories.read().await;
        let locations = self.tables.locations.read().await;
        let mut posts = self.tables.posts.write().await;

        if !posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        check_post_references(&post, &users, &categories, &locations)?;
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.tables.posts.write().await;
        let mut comments = self.tables.comments.write().await;

        posts.remove(&id).ok_or(RepoError::NotFound)?;
        comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, RepoError> {
        let users = self.tables.users.read().await;
        let categories = self.tables.categories.read().await;
        let locations = self.tables.locations.read().await;
        let posts = self.tables.posts.read().await;
        let comments = self.tables.comments.read().await;

        let mut selected: Vec<&Post> = posts
            .values()
            .filter(|p| post_matches(p, &categories, query))
            .collect();

        match query.order {
            PostOrder::PubDateDesc => selected.sort_by(|a, b| {
                b.pub_date
                    .cmp(&a.pub_date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
        }

        let related = Related {
            users: &users,
            categories: &categories,
            locations: &locations,
            comments: &comments,
        };
        let summaries = selected
            .into_iter()
            .map(|p| related.summarize(p, query.with_comment_count))
            .collect();

        Ok(Page::from_vec(summaries, page))
    }

    async fn find_matching(&self, id: Uuid, query: &PostQuery) -> Result<Option<Post>, RepoError> {
        let categories = self.tables.categories.read().await;
        let posts = self.tables.posts.read().await;

        Ok(posts
            .get(&id)
            .filter(|p| post_matches(p, &categories, query))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub struct InMemoryCategoryRepository {
    tables: Arc<Tables>,
}

fn check_slug_unique(
    categories: &HashMap<Uuid, Category>,
    category: &Category,
) -> Result<(), RepoError> {
    if categories
        .values()
        .any(|c| c.id != category.id && c.slug == category.slug)
    {
        return Err(constraint("categories.slug must be unique"));
    }
    Ok(())
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.categories.read().await.get(&id).cloned())
    }

    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut categories = self.tables.categories.write().await;
        if categories.contains_key(&category.id) {
            return Err(constraint("categories.id must be unique"));
        }
        check_slug_unique(&categories, &category)?;
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut categories = self.tables.categories.write().await;
        if !categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        check_slug_unique(&categories, &category)?;
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut categories = self.tables.categories.write().await;
        let mut posts = self.tables.posts.write().await;
        let mut comments = self.tables.comments.write().await;

        categories.remove(&id).ok_or(RepoError::NotFound)?;
        posts.retain(|_, p| p.category_id != id);
        comments.retain(|_, c| posts.contains_key(&c.post_id));
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let categories = self.tables.categories.read().await;
        Ok(categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let categories = self.tables.categories.read().await;
        let mut published: Vec<Category> = categories
            .values()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        published.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(published)
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

pub struct InMemoryLocationRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryLocationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.locations.read().await.get(&id).cloned())
    }

    async fn insert(&self, location: Location) -> Result<Location, RepoError> {
        let mut locations = self.tables.locations.write().await;
        if locations.contains_key(&location.id) {
            return Err(constraint("locations.id must be unique"));
        }
        locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update(&self, location: Location) -> Result<Location, RepoError> {
        let mut locations = self.tables.locations.write().await;
        if !locations.contains_key(&location.id) {
            return Err(RepoError::NotFound);
        }
        locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut locations = self.tables.locations.write().await;
        let mut posts = self.tables.posts.write().await;

        locations.remove(&id).ok_or(RepoError::NotFound)?;
        for post in posts.values_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let locations = self.tables.locations.read().await;
        let mut published: Vec<Location> = locations
            .values()
            .filter(|l| l.is_published)
            .cloned()
            .collect();
        published.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(published)
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub struct InMemoryCommentRepository {
    tables: Arc<Tables>,
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.comments.read().await.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let users = self.tables.users.read().await;
        let posts = self.tables.posts.read().await;
        let mut comments = self.tables.comments.write().await;

        if comments.contains_key(&comment.id) {
            return Err(constraint("comments.id must be unique"));
        }
        if !users.contains_key(&comment.author_id) {
            return Err(constraint("comments.author_id references a missing user"));
        }
        if !posts.contains_key(&comment.post_id) {
            return Err(constraint("comments.post_id references a missing post"));
        }
        comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut comments = self.tables.comments.write().await;
        if !comments.contains_key(&comment.id) {
            return Err(RepoError::NotFound);
        }
        comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut comments = self.tables.comments.write().await;
        comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let comments = self.tables.comments.read().await;
        let mut selected: Vec<Comment> = comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::domain::{CategoryDraft, LocationDraft, NewAccount, PostDraft};
    use chrono::{Duration, Utc};

    fn account(username: &str) -> User {
        User::new(
            NewAccount {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
            },
            "hash".to_string(),
        )
    }

    fn category(slug: &str, is_published: bool) -> Category {
        Category::new(CategoryDraft {
            title: slug.to_uppercase(),
            description: "Description".to_string(),
            slug: slug.to_string(),
            is_published,
        })
    }

    fn draft(category_id: Uuid, offset: Duration) -> PostDraft {
        PostDraft {
            title: "Title".to_string(),
            text: "Text".to_string(),
            pub_date: Utc::now() + offset,
            location_id: None,
            category_id,
            image: None,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_constraint_violation() {
        let store = InMemoryStore::new();
        store.users().insert(account("leo")).await.unwrap();

        let result = store.users().insert(account("leo")).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn post_requires_existing_category() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();

        let result = store
            .posts()
            .insert(Post::new(author.id, draft(Uuid::new_v4(), -Duration::days(1))))
            .await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_counts_comments() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();
        let news = store.categories().insert(category("news", true)).await.unwrap();

        let older = store
            .posts()
            .insert(Post::new(author.id, draft(news.id, -Duration::days(2))))
            .await
            .unwrap();
        let newer = store
            .posts()
            .insert(Post::new(author.id, draft(news.id, -Duration::days(1))))
            .await
            .unwrap();
        store
            .comments()
            .insert(Comment::new(older.id, author.id, "First!".to_string()))
            .await
            .unwrap();

        let page = store
            .posts()
            .list(&PostQuery::published(Utc::now()), PageRequest::default())
            .await
            .unwrap();

        let ids: Vec<Uuid> = page.items.iter().map(|s| s.post.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(page.items[0].comment_count, 0);
        assert_eq!(page.items[1].comment_count, 1);
        assert_eq!(page.items[0].labels.author_username, "leo");
        assert_eq!(page.items[0].labels.category_title, "NEWS");
    }

    #[tokio::test]
    async fn list_labels_hide_unpublished_locations() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();
        let news = store.categories().insert(category("news", true)).await.unwrap();
        let hidden = store
            .locations()
            .insert(Location::new(LocationDraft {
                name: "Secret base".to_string(),
                is_published: false,
            }))
            .await
            .unwrap();
        let mut with_location = draft(news.id, -Duration::days(1));
        with_location.location_id = Some(hidden.id);
        store
            .posts()
            .insert(Post::new(author.id, with_location))
            .await
            .unwrap();

        let page = store
            .posts()
            .list(&PostQuery::published(Utc::now()), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items[0].post.location_id, Some(hidden.id));
        assert_eq!(page.items[0].labels.location_name, None);
    }

    #[tokio::test]
    async fn deleting_post_cascades_to_comments() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();
        let news = store.categories().insert(category("news", true)).await.unwrap();
        let post = store
            .posts()
            .insert(Post::new(author.id, draft(news.id, -Duration::days(1))))
            .await
            .unwrap();
        let comment = store
            .comments()
            .insert(Comment::new(post.id, author.id, "Hi".to_string()))
            .await
            .unwrap();

        store.posts().delete(post.id).await.unwrap();

        assert!(store.comments().find_by_id(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_location_detaches_posts() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();
        let news = store.categories().insert(category("news", true)).await.unwrap();
        let place = store
            .locations()
            .insert(Location::new(LocationDraft {
                name: "Yasnaya Polyana".to_string(),
                is_published: true,
            }))
            .await
            .unwrap();
        let mut located = draft(news.id, -Duration::days(1));
        located.location_id = Some(place.id);
        let post = store
            .posts()
            .insert(Post::new(author.id, located))
            .await
            .unwrap();

        store.locations().delete(place.id).await.unwrap();

        let post = store.posts().find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.location_id, None);
    }

    #[tokio::test]
    async fn unpublished_category_hides_posts_from_published_query() {
        let store = InMemoryStore::new();
        let author = store.users().insert(account("leo")).await.unwrap();
        let hidden = store
            .categories()
            .insert(category("hidden", false))
            .await
            .unwrap();
        let post = store
            .posts()
            .insert(Post::new(author.id, draft(hidden.id, -Duration::days(1))))
            .await
            .unwrap();

        let found = store
            .posts()
            .find_matching(post.id, &PostQuery::published(Utc::now()))
            .await
            .unwrap();

        assert!(found.is_none());
    }
}
