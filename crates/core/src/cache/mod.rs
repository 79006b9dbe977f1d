//! In-memory page cache shared by all tabs.
//!
//! - Keys are SHA-256 digests of the URL
//! - Only `text/gemini` and `text/plain` responses are stored
//! - Expiry is lazy: reads never delete, inserts trigger eviction
//! - Total body size never exceeds the configured maximum

pub mod hash;
pub mod page;

pub use hash::compute_cache_key;
pub use page::{CacheEntry, PageCache};
