/// Read-through caching around an async computation.
///
/// Returns the cached value when `$key` is present. Otherwise awaits `$block`,
/// queues the result for a background write with a TTL of `$ttl` seconds, and
/// returns it. A failed cache read is logged and treated as a miss, so an
/// unavailable cache never hides a working backend. Errors from the block are
/// propagated with `?`, so the enclosing function must return `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let tracks: Vec<Track> = cached!(cache, key, 3600, self.fetch_tracks(query, limit))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, bypassing cache");
                None
            }
        };

        if let Some(cached) = hit {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
