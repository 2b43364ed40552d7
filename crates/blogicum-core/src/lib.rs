//! # Blogicum Core
//!
//! The domain layer of Blogicum.
//! This crate holds the blog entities, the visibility and authorization rules,
//! and the use cases built on top of the repository ports. It has zero
//! infrastructure dependencies.

pub mod authorization;
pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;
pub mod service;
pub mod urls;
pub mod visibility;

pub use authorization::{Actor, ensure_author};
pub use error::{DomainError, FieldErrors, RepoError};
pub use pagination::{Page, paginate};
pub use service::{BlogService, BlogSettings};
pub use visibility::{FeedItem, FeedOptions, filter_annotate, is_publicly_visible};
