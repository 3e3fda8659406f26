//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::{Category, CategoryDraft};
pub use comment::Comment;
pub use location::{Location, LocationDraft};
pub use post::{Post, PostDraft, PostLabels, PostSummary};
pub use user::{NewAccount, ProfileChanges, User};
