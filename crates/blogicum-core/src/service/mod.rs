//! Use cases - one method per user-facing operation.
//!
//! `BlogService` wires the repositories to the visibility policy. Handlers
//! translate HTTP into these calls and never reach the repositories directly.

mod accounts;
mod catalog;
mod comments;
mod posts;

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Comment, Post, PostLabels};
use crate::pagination::{DEFAULT_PAGE_SIZE, PageRequest};
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

/// The set of repositories a [`BlogService`] runs on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// A single post with its discussion.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub labels: PostLabels,
    pub comments: Vec<Comment>,
    /// Usernames of the comment authors, by user id.
    pub commenters: HashMap<Uuid, String>,
}

impl PostDetail {
    pub fn commenter(&self, comment: &Comment) -> String {
        self.commenters
            .get(&comment.author_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
    page_size: u64,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Turn a raw `?page=` value into a request with the configured page size.
    pub fn page_request(&self, raw: Option<&str>) -> PageRequest {
        PageRequest::from_param(raw, self.page_size)
    }
}
