//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog.
//! Entities, the post visibility and ownership policy, pagination, the ports
//! infrastructure must implement, and the use cases wired on top of them.
//! No infrastructure dependencies live here.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::{DomainError, FieldErrors, RepoError};
pub use pagination::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use policy::{Action, PostQuery, PostScope, Viewer};
pub use service::{BlogService, PostDetail, Repositories};
