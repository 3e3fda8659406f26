use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Location entity - an optional place attached to posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocationDraft {
    pub name: String,
    pub is_published: bool,
}

impl Location {
    pub fn new(draft: LocationDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            is_published: draft.is_published,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, draft: LocationDraft) {
        self.name = draft.name;
        self.is_published = draft.is_published;
    }
}
