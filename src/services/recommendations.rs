use std::sync::Arc;

use crate::{models::Track, services::providers::RecommendationProvider};

/// Query used for any label missing from the table
pub const DEFAULT_QUERY: &str = "chill music";

/// Result cap used by the reference deployment
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

const QUERY_TABLE: [(&str, &str); 7] = [
    ("happy", "happy upbeat"),
    ("sad", "sad mellow"),
    ("angry", "angry intense"),
    ("surprise", "surprise energetic"),
    ("fear", "calm relaxing"),
    ("neutral", "chill neutral"),
    ("disgust", "disgust calm"),
];

/// Search query for a category label
pub fn query_for(label: &str) -> &'static str {
    QUERY_TABLE
        .iter()
        .find(|(category, _)| *category == label)
        .map(|(_, query)| *query)
        .unwrap_or(DEFAULT_QUERY)
}

/// Identifiers of tracks that expose one, in service ranking order
pub fn stable_ids(tracks: &[Track]) -> Vec<String> {
    tracks
        .iter()
        .filter_map(|track| track.stable_id())
        .map(str::to_string)
        .collect()
}

/// Turns a detected category into track recommendations
///
/// Never fails: a missing or failing provider yields no recommendations.
#[derive(Clone)]
pub struct RecommendationMapper {
    provider: Option<Arc<dyn RecommendationProvider>>,
    limit: usize,
}

impl RecommendationMapper {
    pub fn new(provider: Arc<dyn RecommendationProvider>, limit: usize) -> Self {
        Self {
            provider: Some(provider),
            limit,
        }
    }

    /// A mapper with no backing service; always recommends nothing
    pub fn disabled() -> Self {
        Self {
            provider: None,
            limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn recommend(&self, label: &str) -> Vec<String> {
        let Some(provider) = &self.provider else {
            return Vec::new();
        };
        if self.limit == 0 {
            return Vec::new();
        }

        let query = query_for(label);
        match provider.search_tracks(query, self.limit).await {
            Ok(tracks) => {
                let mut ids = stable_ids(&tracks);
                ids.truncate(self.limit);
                ids
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    provider = provider.name(),
                    category = %label,
                    query = %query,
                    "Recommendation search failed, continuing without recommendations"
                );
                Vec::new()
            }
        }
    }
}
