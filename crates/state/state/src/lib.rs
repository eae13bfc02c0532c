pub mod cache;
pub mod entity;
pub mod error;
pub mod key;
pub mod table;
pub mod testing;

pub use cache::DistributedCache;
pub use entity::ContentEntity;
pub use error::StateError;
pub use key::CacheKey;
pub use table::{CONTENT_TABLE, ContentTable};
