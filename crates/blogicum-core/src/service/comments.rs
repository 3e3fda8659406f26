use chrono::Utc;
use uuid::Uuid;

use super::BlogService;
use crate::domain::Comment;
use crate::error::DomainError;
use crate::policy::{Action, Viewer, authorize, can_view_post};
use crate::ports::BaseRepository;

impl BlogService {
    /// Comment on a post the viewer can see. Author and post are always taken
    /// from the request context.
    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        let author_id = viewer.require()?;
        let post = self.resolve_post(viewer, post_id).await?;

        let comment = self
            .repos
            .comments
            .insert(Comment::new(post.id, author_id, text))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");
        Ok(comment)
    }

    /// Load a comment for an ownership-guarded action.
    ///
    /// The comment must belong to `post_id`. A non-owner gets `Forbidden` if
    /// they can see the post and `NotFound` if they cannot.
    pub async fn owned_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
        action: Action,
    ) -> Result<Comment, DomainError> {
        viewer.require()?;
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;

        if authorize(viewer, &comment, action) {
            return Ok(comment);
        }

        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;
        let category_published = self
            .repos
            .categories
            .find_by_id(post.category_id)
            .await?
            .is_some_and(|c| c.is_published);

        if can_view_post(viewer, &post, category_published, Utc::now()) {
            tracing::debug!(comment_id = %comment_id, ?action, "Comment mutation denied");
            Err(DomainError::Forbidden)
        } else {
            Err(DomainError::not_found("comment", comment_id))
        }
    }

    pub async fn update_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        let mut comment = self
            .owned_comment(viewer, post_id, comment_id, Action::Edit)
            .await?;
        comment.text = text;
        let comment = self.repos.comments.update(comment).await?;
        tracing::info!(comment_id = %comment.id, "Comment updated");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .owned_comment(viewer, post_id, comment_id, Action::Delete)
            .await?;
        self.repos.comments.delete(comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");
        Ok(comment)
    }
}
