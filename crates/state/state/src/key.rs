use std::fmt;

/// Key addressing an entry in a [`DistributedCache`](crate::DistributedCache).
///
/// Backends that share a keyspace with other applications prepend their own
/// prefix to [`CacheKey::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key under which the full article list is cached.
    pub const CONTENT_TIPS: &'static str = "content_tips";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn content_tips() -> Self {
        Self::new(Self::CONTENT_TIPS)
    }

    pub fn canonical(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
