use std::sync::Arc;

use crate::{
    config::{Config, DEFAULT_MAX_REQUEST_BYTES},
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle, PredictionStore, SqlitePredictionStore},
    models::Vocabulary,
    services::{
        AnalyticsAggregator, CategoryDecoder, ClassificationService, Classifier, HttpClassifier,
        ImagePreprocessor, RecommendationMapper, RecommendationProvider, SpotifyProvider,
    },
};

/// Shared application state
///
/// Built once at startup; every component inside is immutable or internally
/// synchronized, so handlers share it by cloning the `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub classification: Arc<ClassificationService>,
    pub analytics: Arc<AnalyticsAggregator>,
    /// Body limit applied to `/predict`
    pub max_request_bytes: usize,
}

impl AppState {
    pub fn new(classification: ClassificationService, analytics: AnalyticsAggregator) -> Self {
        Self {
            classification: Arc::new(classification),
            analytics: Arc::new(analytics),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }

    pub fn with_max_request_bytes(mut self, max_request_bytes: usize) -> Self {
        self.max_request_bytes = max_request_bytes;
        self
    }

    /// Wires every component from explicit collaborators
    pub fn from_parts(
        config: &Config,
        vocabulary: Arc<Vocabulary>,
        store: Arc<dyn PredictionStore>,
        classifier: Arc<dyn Classifier>,
        recommender: RecommendationMapper,
    ) -> anyhow::Result<Self> {
        let preprocessor = ImagePreprocessor::new(config.image_size)?;
        let decoder = CategoryDecoder::new(vocabulary.clone());

        let classification = ClassificationService::new(
            preprocessor,
            classifier,
            decoder,
            store.clone(),
            recommender,
        );
        let analytics = AnalyticsAggregator::new(store, vocabulary, config.max_window_days);

        Ok(Self::new(classification, analytics).with_max_request_bytes(config.max_request_bytes))
    }

    /// Connects the store, cache and external services described by `config`
    ///
    /// Also returns the cache writer handle, if a cache was configured, so the
    /// caller can flush it on shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let vocabulary = Arc::new(Vocabulary::new(config.emotion_labels.clone())?);
        tracing::info!(labels = vocabulary.len(), "Vocabulary loaded");

        let pool = create_pool(&config.database_url).await?;
        let store: Arc<dyn PredictionStore> = Arc::new(SqlitePredictionStore::new(pool).await?);

        let classifier: Arc<dyn Classifier> = Arc::new(HttpClassifier::new(config.classifier_url.clone()));

        let (cache, cache_handle) = match &config.redis_url {
            Some(url) => {
                let (cache, handle) = Cache::new(create_redis_client(url)?);
                (Some(cache), Some(handle))
            }
            None => (None, None),
        };

        let recommender = match config.spotify_credentials() {
            Some((client_id, client_secret)) => {
                let provider: Arc<dyn RecommendationProvider> = Arc::new(SpotifyProvider::new(
                    client_id.to_string(),
                    client_secret.to_string(),
                    config.spotify_api_url.clone(),
                    config.spotify_auth_url.clone(),
                    cache,
                ));
                RecommendationMapper::new(provider, config.recommendation_limit)
            }
            None => {
                tracing::warn!("Spotify credentials not set, recommendations are disabled");
                RecommendationMapper::disabled()
            }
        };

        let state = Self::from_parts(config, vocabulary, store, classifier, recommender)?;
        Ok((state, cache_handle))
    }
}
