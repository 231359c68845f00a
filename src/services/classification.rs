use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::{
    db::PredictionStore,
    error::{AppError, AppResult},
    models::Category,
    services::{
        classifier::Classifier, decoder::CategoryDecoder, preprocessing::ImagePreprocessor,
        recommendations::RecommendationMapper,
    },
};

/// Result of classifying one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationOutcome {
    #[serde(rename = "emotion")]
    pub category: Category,
    #[serde(rename = "tracks")]
    pub recommendation_ids: Vec<String>,
}

/// Preprocess → classify → decode → record → recommend
///
/// Recording is part of the request: if the event cannot be stored the whole
/// classification fails with a storage error and no recommendation lookup is
/// made. Recommendation failures never fail the request.
#[derive(Clone)]
pub struct ClassificationService {
    preprocessor: ImagePreprocessor,
    classifier: Arc<dyn Classifier>,
    decoder: CategoryDecoder,
    store: Arc<dyn PredictionStore>,
    recommender: RecommendationMapper,
}

impl ClassificationService {
    pub fn new(
        preprocessor: ImagePreprocessor,
        classifier: Arc<dyn Classifier>,
        decoder: CategoryDecoder,
        store: Arc<dyn PredictionStore>,
        recommender: RecommendationMapper,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            decoder,
            store,
            recommender,
        }
    }

    #[instrument(skip_all, fields(bytes = image.len(), classifier = self.classifier.name()))]
    pub async fn classify(&self, image: Vec<u8>) -> AppResult<ClassificationOutcome> {
        let preprocessor = self.preprocessor;
        let input = tokio::task::spawn_blocking(move || preprocessor.preprocess(&image))
            .await
            .map_err(|e| AppError::Internal(format!("Preprocessing task failed: {}", e)))??;

        let scores = self.classifier.score(&input).await?;
        let category = self.decoder.decode(&scores)?;

        let event = self.store.record(&category).await?;
        tracing::info!(id = event.id, category = %category, "Classification recorded");

        let recommendation_ids = self.recommender.recommend(category.as_str()).await;

        Ok(ClassificationOutcome {
            category,
            recommendation_ids,
        })
    }
}
