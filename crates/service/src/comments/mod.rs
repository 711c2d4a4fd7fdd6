//! Comment posting and listing on top of a [`CommentStore`](crate::storage::CommentStore).

pub mod service;

pub use service::{CommentService, StoreStatus};
