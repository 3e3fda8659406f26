//! In-memory store - used when no database is configured, and in tests.
//!
//! Every table lives behind its own async `RwLock`. Relational rules the
//! PostgreSQL schema enforces (unique columns, cascades, `SET NULL` on
//! locations) are reproduced by hand. Data is lost on process restart.

mod store;

pub use store::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPostRepository, InMemoryStore, InMemoryUserRepository,
};
