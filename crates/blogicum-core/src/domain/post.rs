use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog entry, possibly scheduled for the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    /// Publication instant. A future value schedules the post.
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Uuid,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Author-editable post fields. There is deliberately no author here: the
/// author always comes from the authenticated viewer.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category_id: Uuid,
    pub image: Option<String>,
    pub is_published: bool,
}

/// Display names of the rows a post points at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostLabels {
    pub author_username: String,
    pub category_title: String,
    /// Only set while the location is published.
    pub location_name: Option<String>,
}

/// A listed post together with its labels and comment count.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub post: Post,
    pub labels: PostLabels,
    pub comment_count: u64,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            image: draft.image,
            is_published: draft.is_published,
            created_at: Utc::now(),
        }
    }

    /// Replace the editable fields. Author and creation time are kept.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.text = draft.text;
        self.pub_date = draft.pub_date;
        self.location_id = draft.location_id;
        self.category_id = draft.category_id;
        self.image = draft.image;
        self.is_published = draft.is_published;
    }
}
