use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{BlogService, PostDetail};
use crate::domain::{Category, Post, PostDraft, PostLabels, PostSummary, User};
use crate::error::{DomainError, FieldErrors};
use crate::pagination::{Page, PageRequest};
use crate::ports::BaseRepository;
use crate::policy::{Action, PostQuery, PostScope, Viewer, ensure_authorized, select_visible_posts};

impl BlogService {
    /// The home feed: every published post, newest first.
    pub async fn feed(
        &self,
        viewer: &Viewer,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, DomainError> {
        let query = select_visible_posts(viewer, PostScope::AllPublished, Utc::now());
        Ok(self.repos.posts.list(&query, page).await?)
    }

    /// Published posts of a published category.
    pub async fn category_feed(
        &self,
        viewer: &Viewer,
        slug: &str,
        page: PageRequest,
    ) -> Result<(Category, Page<PostSummary>), DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let query = select_visible_posts(viewer, PostScope::ByCategory(category.id), Utc::now());
        let posts = self.repos.posts.list(&query, page).await?;
        Ok((category, posts))
    }

    /// A user's profile and posts. Owners see their drafts too.
    pub async fn profile(
        &self,
        viewer: &Viewer,
        username: &str,
        page: PageRequest,
    ) -> Result<(User, Page<PostSummary>), DomainError> {
        let author = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let query = select_visible_posts(viewer, PostScope::ByAuthor(author.id), Utc::now());
        let posts = self.repos.posts.list(&query, page).await?;
        Ok((author, posts))
    }

    /// Fetch a post the viewer is allowed to see.
    ///
    /// The author gets the post whatever its state. Anybody else only gets it
    /// once published; otherwise the post does not exist for them.
    pub async fn resolve_post(&self, viewer: &Viewer, post_id: Uuid) -> Result<Post, DomainError> {
        if let Some(post) = self.repos.posts.find_by_id(post_id).await? {
            if viewer.is(post.author_id) {
                return Ok(post);
            }
        }

        self.repos
            .posts
            .find_matching(post_id, &PostQuery::published(Utc::now()))
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    pub async fn post_detail(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
    ) -> Result<PostDetail, DomainError> {
        let post = self.resolve_post(viewer, post_id).await?;
        let labels = self.post_labels(&post).await?;
        let comments = self.repos.comments.list_for_post(post.id).await?;

        let mut commenters = HashMap::new();
        for comment in &comments {
            if commenters.contains_key(&comment.author_id) {
                continue;
            }
            if let Some(author) = self.repos.users.find_by_id(comment.author_id).await? {
                commenters.insert(author.id, author.username);
            }
        }

        Ok(PostDetail {
            post,
            labels,
            comments,
            commenters,
        })
    }

    /// Author, category and location names of a single post.
    pub async fn post_labels(&self, post: &Post) -> Result<PostLabels, DomainError> {
        let author_username = self
            .repos
            .users
            .find_by_id(post.author_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();
        let category_title = self
            .repos
            .categories
            .find_by_id(post.category_id)
            .await?
            .map(|c| c.title)
            .unwrap_or_default();
        let location_name = match post.location_id {
            Some(id) => self
                .repos
                .locations
                .find_by_id(id)
                .await?
                .filter(|l| l.is_published)
                .map(|l| l.name),
            None => None,
        };

        Ok(PostLabels {
            author_username,
            category_title,
            location_name,
        })
    }

    pub async fn create_post(&self, viewer: &Viewer, draft: PostDraft) -> Result<Post, DomainError> {
        let author_id = viewer.require()?;
        self.check_post_draft(&draft).await?;

        let post = self.repos.posts.insert(Post::new(author_id, draft)).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Load a post for an ownership-guarded action.
    ///
    /// Posts the viewer cannot see are reported missing, visible posts of
    /// somebody else are forbidden.
    pub async fn owned_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        action: Action,
    ) -> Result<Post, DomainError> {
        viewer.require()?;
        let post = self.resolve_post(viewer, post_id).await?;
        ensure_authorized(viewer, &post, action)?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let mut post = self.owned_post(viewer, post_id, Action::Edit).await?;
        self.check_post_draft(&draft).await?;

        post.apply(draft);
        let post = self.repos.posts.update(post).await?;
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, viewer: &Viewer, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self.owned_post(viewer, post_id, Action::Delete).await?;
        self.repos.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(post)
    }

    /// References in a draft must point at existing rows.
    async fn check_post_draft(&self, draft: &PostDraft) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        if self
            .repos
            .categories
            .find_by_id(draft.category_id)
            .await?
            .is_none()
        {
            errors.add("category_id", "Select a valid category.");
        }

        if let Some(location_id) = draft.location_id {
            if self.repos.locations.find_by_id(location_id).await?.is_none() {
                errors.add("location_id", "Select a valid location.");
            }
        }

        errors.into_result()
    }
}
