// Infrastructure: LP text, content hashing, the result cache and logging

pub mod cache;
pub mod hash;
pub mod logging;
pub mod lp_format;

pub use cache::ResultCache;
pub use hash::{content_hash, ContentHasher};
pub use lp_format::{parse_lp, write_lp, LpDocument};
