pub mod errors;
pub mod comment;

pub use comment::{decode_list, encode_list, normalize_text, seed_comments, Comment, SOFT_TEXT_LIMIT};
