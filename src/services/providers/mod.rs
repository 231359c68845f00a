/// Recommendation search backends
///
/// The classification pipeline only needs an ordered list of tracks for a
/// text query; everything about authentication, caching and ranking stays
/// inside the provider.
use crate::{error::AppResult, models::Track};

pub mod spotify;

pub use spotify::SpotifyProvider;

/// Trait for external recommendation search services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Searches for at most `limit` tracks matching `query`, in service ranking order
    async fn search_tracks(&self, query: &str, limit: usize) -> AppResult<Vec<Track>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
