//! Service layer for the comment board.
//! - `storage`: the comment persistence abstraction and its backends.
//! - `comments`: validation and the read-prepend-write flow on top of a store.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod comments;
