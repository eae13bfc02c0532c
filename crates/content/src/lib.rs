//! Content read path for the site.
//!
//! [`CachedContentService`] serves the full article list from a local `moka`
//! tier, then a [`DistributedCache`](jawn_state::DistributedCache), then a
//! full [`ContentTable`](jawn_state::ContentTable) scan. [`OutputCache`]
//! holds rendered HTTP responses indexed by tag so a refresh can evict them.

mod cached;
mod error;
mod output_cache;
mod service;

pub use cached::{CacheSettings, CachedContentService};
pub use error::ContentError;
pub use output_cache::{CachedResponse, DEFAULT_OUTPUT_CACHE_BYTES, OutputCache, REFRESH_TAGS};
pub use service::ContentService;
