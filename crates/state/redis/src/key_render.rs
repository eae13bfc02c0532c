use jawn_state::CacheKey;

/// Render a cache key into the Redis key `{prefix}:{key}`.
///
/// An empty prefix yields the bare key.
pub(crate) fn render_key(prefix: &str, key: &CacheKey) -> String {
    if prefix.is_empty() {
        key.canonical().to_owned()
    } else {
        format!("{prefix}:{}", key.canonical())
    }
}
