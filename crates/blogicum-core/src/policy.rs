//! Post visibility and ownership rules.
//!
//! Everything here is a pure function of the viewer, the item and the
//! evaluation instant. Callers pass `now` in on every request; nothing is
//! cached between requests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, Post};
use crate::error::DomainError;

/// The identity making the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    /// Whether this viewer is the user `user_id`. Always false when anonymous.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.id() == Some(user_id)
    }

    /// The viewer's id, or `Unauthorized` for anonymous requests.
    pub fn require(&self) -> Result<Uuid, DomainError> {
        self.id().ok_or(DomainError::Unauthorized)
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

/// Which posts a listing is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    AllPublished,
    ByCategory(Uuid),
    ByAuthor(Uuid),
}

/// Publication filter of a [`PostQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No publication filter at all.
    Everything,
    /// Only posts that pass the published predicate at the given instant.
    PublishedAt(DateTime<Utc>),
}

/// Sort order of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Newest publication date first.
    #[default]
    PubDateDesc,
}

/// A fully specified listing query for the post store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub visibility: Visibility,
    pub order: PostOrder,
    /// Annotate each post with its number of comments.
    pub with_comment_count: bool,
}

impl PostQuery {
    /// Every post that is public at `now`, regardless of author or category.
    pub fn published(now: DateTime<Utc>) -> Self {
        Self {
            author_id: None,
            category_id: None,
            visibility: Visibility::PublishedAt(now),
            order: PostOrder::PubDateDesc,
            with_comment_count: true,
        }
    }

    /// Evaluate the filter part of the query against one post.
    ///
    /// `category_published` is the publication flag of the post's category.
    pub fn matches(&self, post: &Post, category_published: bool) -> bool {
        if self.author_id.is_some_and(|id| id != post.author_id) {
            return false;
        }
        if self.category_id.is_some_and(|id| id != post.category_id) {
            return false;
        }
        match self.visibility {
            Visibility::Everything => true,
            Visibility::PublishedAt(now) => is_published(post, category_published, now),
        }
    }
}

/// The published predicate: the post is flagged published, its publication
/// date has been reached, and its category is published.
pub fn is_published(post: &Post, category_published: bool, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category_published
}

/// Build the query selecting the posts of `scope` that `viewer` may see.
///
/// Authors browsing their own profile see all of their posts, drafts and
/// scheduled ones included. Everybody else only sees published posts.
pub fn select_visible_posts(viewer: &Viewer, scope: PostScope, now: DateTime<Utc>) -> PostQuery {
    let mut query = PostQuery::published(now);
    match scope {
        PostScope::AllPublished => {}
        PostScope::ByCategory(category_id) => query.category_id = Some(category_id),
        PostScope::ByAuthor(author_id) => {
            query.author_id = Some(author_id);
            if viewer.is(author_id) {
                query.visibility = Visibility::Everything;
            }
        }
    }
    query
}

/// Whether `viewer` may see `post`: its author always can, others only once
/// it is published.
pub fn can_view_post(
    viewer: &Viewer,
    post: &Post,
    category_published: bool,
    now: DateTime<Utc>,
) -> bool {
    viewer.is(post.author_id) || is_published(post, category_published, now)
}

/// Mutations guarded by ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
}

/// Anything with an immutable owner.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

/// Only the owner may edit or delete an item.
pub fn authorize<T: Owned + ?Sized>(viewer: &Viewer, item: &T, _action: Action) -> bool {
    viewer.is(item.owner_id())
}

/// [`authorize`], turned into a `Forbidden` error on denial.
pub fn ensure_authorized<T: Owned + ?Sized>(
    viewer: &Viewer,
    item: &T,
    action: Action,
) -> Result<(), DomainError> {
    if authorize(viewer, item, action) {
        Ok(())
    } else {
        tracing::debug!(?viewer, owner = %item.owner_id(), ?action, "Mutation denied");
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostDraft;
    use chrono::Duration;

    fn post(author_id: Uuid, is_published: bool, offset: Duration) -> Post {
        Post::new(
            author_id,
            PostDraft {
                title: "Title".to_string(),
                text: "Text".to_string(),
                pub_date: Utc::now() + offset,
                location_id: None,
                category_id: Uuid::new_v4(),
                image: None,
                is_published,
            },
        )
    }

    #[test]
    fn published_predicate_requires_all_three_conditions() {
        let now = Utc::now();
        let author = Uuid::new_v4();

        assert!(is_published(&post(author, true, -Duration::days(1)), true, now));
        assert!(!is_published(&post(author, false, -Duration::days(1)), true, now));
        assert!(!is_published(&post(author, true, Duration::days(365)), true, now));
        assert!(!is_published(&post(author, true, -Duration::days(1)), false, now));
    }

    #[test]
    fn anonymous_listing_is_filtered() {
        let now = Utc::now();
        let author = Uuid::new_v4();

        let query = select_visible_posts(&Viewer::Anonymous, PostScope::ByAuthor(author), now);

        assert_eq!(query.author_id, Some(author));
        assert_eq!(query.visibility, Visibility::PublishedAt(now));
        assert!(!query.matches(&post(author, false, -Duration::days(1)), true));
    }

    #[test]
    fn author_sees_own_drafts_on_own_profile() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let viewer = Viewer::User(author);

        let query = select_visible_posts(&viewer, PostScope::ByAuthor(author), now);

        assert_eq!(query.visibility, Visibility::Everything);
        assert!(query.matches(&post(author, false, Duration::days(365)), false));
    }

    #[test]
    fn other_user_on_profile_gets_published_only() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let viewer = Viewer::User(Uuid::new_v4());

        let query = select_visible_posts(&viewer, PostScope::ByAuthor(author), now);

        assert_eq!(query.visibility, Visibility::PublishedAt(now));
    }

    #[test]
    fn author_gets_no_override_outside_profile() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let viewer = Viewer::User(author);

        for scope in [PostScope::AllPublished, PostScope::ByCategory(Uuid::new_v4())] {
            let query = select_visible_posts(&viewer, scope, now);
            assert_eq!(query.visibility, Visibility::PublishedAt(now));
            assert_eq!(query.order, PostOrder::PubDateDesc);
            assert!(query.with_comment_count);
        }
    }

    #[test]
    fn category_scope_filters_other_categories() {
        let now = Utc::now();
        let entry = post(Uuid::new_v4(), true, -Duration::days(1));

        let own = select_visible_posts(
            &Viewer::Anonymous,
            PostScope::ByCategory(entry.category_id),
            now,
        );
        let other =
            select_visible_posts(&Viewer::Anonymous, PostScope::ByCategory(Uuid::new_v4()), now);

        assert!(own.matches(&entry, true));
        assert!(!other.matches(&entry, true));
    }

    #[test]
    fn scheduled_post_visible_to_owner_only() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let scheduled = post(author, true, Duration::days(365));

        assert!(can_view_post(&Viewer::User(author), &scheduled, true, now));
        assert!(!can_view_post(&Viewer::User(Uuid::new_v4()), &scheduled, true, now));
        assert!(!can_view_post(&Viewer::Anonymous, &scheduled, true, now));
    }

    #[test]
    fn only_owner_is_authorized() {
        let author = Uuid::new_v4();
        let comment = Comment::new(Uuid::new_v4(), author, "Nice".to_string());

        for action in [Action::Edit, Action::Delete] {
            assert!(authorize(&Viewer::User(author), &comment, action));
            assert!(!authorize(&Viewer::User(Uuid::new_v4()), &comment, action));
            assert!(!authorize(&Viewer::Anonymous, &comment, action));
        }
        assert!(matches!(
            ensure_authorized(&Viewer::Anonymous, &comment, Action::Delete),
            Err(DomainError::Forbidden)
        ));
    }
}
