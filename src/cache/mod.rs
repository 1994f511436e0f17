pub mod user_cache;

pub use user_cache::{CachedUserStore, USER_CACHE_PREFIX};
