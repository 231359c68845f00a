use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::preprocessing::InputTensor,
};

/// Pretrained emotion model, consumed as an opaque scoring function
///
/// Returns one non-negative score per vocabulary label, index-aligned with the
/// vocabulary order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn score(&self, input: &InputTensor) -> AppResult<Vec<f32>>;

    /// Classifier name for logging
    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<Vec<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

/// Classifier served over a TensorFlow-Serving style REST `predict` endpoint
#[derive(Clone)]
pub struct HttpClassifier {
    http_client: HttpClient,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            url,
        }
    }

    /// Row-major nested lists: `[batch][row][column][channel]`
    fn to_request(input: &InputTensor) -> PredictRequest {
        let instances = input
            .outer_iter()
            .map(|image| {
                image
                    .outer_iter()
                    .map(|row| row.outer_iter().map(|pixel| pixel.to_vec()).collect())
                    .collect()
            })
            .collect();

        PredictRequest { instances }
    }

    fn first_prediction(response: PredictResponse) -> AppResult<Vec<f32>> {
        response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Classifier("Model returned no predictions".to_string()))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn score(&self, input: &InputTensor) -> AppResult<Vec<f32>> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&Self::to_request(input))
            .send()
            .await
            .map_err(|e| AppError::Classifier(format!("Model server unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Classifier(format!(
                "Model server returned status {}: {}",
                status, body
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| AppError::Classifier(format!("Malformed model response: {}", e)))?;

        Self::first_prediction(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_request_layout_is_nested_row_major() {
        let data = vec![0.0, 0.125, 0.25, 0.5, 0.75, 1.0];
        let input = Array4::from_shape_vec((1, 2, 3, 1), data).unwrap();

        let json = serde_json::to_value(HttpClassifier::to_request(&input)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "instances": [[
                    [[0.0], [0.125], [0.25]],
                    [[0.5], [0.75], [1.0]]
                ]]
            })
        );
    }

    #[test]
    fn test_request_for_default_input_shape() {
        let input = Array4::<f32>::zeros((1, 48, 48, 1));
        let request = HttpClassifier::to_request(&input);

        assert_eq!(request.instances.len(), 1);
        assert_eq!(request.instances[0].len(), 48);
        assert_eq!(request.instances[0][0].len(), 48);
        assert_eq!(request.instances[0][0][0], vec![0.0]);
    }

    #[test]
    fn test_first_prediction() {
        let response: PredictResponse = serde_json::from_value(serde_json::json!({
            "predictions": [[0.1, 0.05, 0.05, 0.6, 0.1, 0.05, 0.05]]
        }))
        .unwrap();

        let scores = HttpClassifier::first_prediction(response).unwrap();
        assert_eq!(scores.len(), 7);
        assert_eq!(scores[3], 0.6);
    }

    #[test]
    fn test_first_prediction_empty() {
        let response = PredictResponse {
            predictions: vec![],
        };
        assert!(matches!(
            HttpClassifier::first_prediction(response),
            Err(AppError::Classifier(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_classifier_error() {
        let classifier = HttpClassifier::new("http://127.0.0.1:1/v1/models/emotion:predict".to_string());
        let input = Array4::<f32>::zeros((1, 48, 48, 1));

        let result = classifier.score(&input).await;
        assert!(matches!(result, Err(AppError::Classifier(_))));
    }
}
