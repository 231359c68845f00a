use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Category, Vocabulary},
};

/// Index of the largest score; the first index wins on exact ties
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Maps classifier scores to a vocabulary label
///
/// Plain argmax: no smoothing, thresholds or margin checks.
#[derive(Debug, Clone)]
pub struct CategoryDecoder {
    vocabulary: Arc<Vocabulary>,
}

impl CategoryDecoder {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn decode(&self, scores: &[f32]) -> AppResult<Category> {
        if scores.len() != self.vocabulary.len() {
            return Err(AppError::Classifier(format!(
                "Expected {} scores, got {}",
                self.vocabulary.len(),
                scores.len()
            )));
        }

        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(AppError::Classifier(format!(
                "Score at index {} is not finite",
                bad
            )));
        }

        argmax(scores)
            .and_then(|index| self.vocabulary.get(index))
            .cloned()
            .ok_or_else(|| AppError::Classifier("Empty score vector".to_string()))
    }
}
