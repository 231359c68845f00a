use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Label order of the reference emotion model's label encoder
pub const DEFAULT_EMOTIONS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "neutral", "sad", "surprise",
];

/// A single label from the classifier vocabulary
///
/// Only a [`Vocabulary`] hands these out, so a category can be serialized but
/// never read back from untrusted input:
///
/// ```compile_fail
/// let _: moodtune_api::models::Category = serde_json::from_str("\"elated\"").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, immutable set of category labels
///
/// The position of a label is the index of its score in the classifier output,
/// so the order must match the one the model was trained with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<Category>,
}

impl Vocabulary {
    /// Builds a vocabulary, rejecting empty, blank or duplicate labels
    pub fn new<I, S>(labels: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut categories = Vec::new();

        for label in labels {
            let label = label.into().trim().to_string();
            if label.is_empty() {
                return Err(AppError::InvalidInput(
                    "Vocabulary labels cannot be blank".to_string(),
                ));
            }
            if !seen.insert(label.clone()) {
                return Err(AppError::InvalidInput(format!(
                    "Duplicate vocabulary label: {}",
                    label
                )));
            }
            categories.push(Category(label));
        }

        if categories.is_empty() {
            return Err(AppError::InvalidInput(
                "Vocabulary must contain at least one label".to_string(),
            ));
        }

        Ok(Self { labels: categories })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at a classifier output position
    pub fn get(&self, index: usize) -> Option<&Category> {
        self.labels.get(index)
    }

    /// Finds the vocabulary entry for a raw label
    pub fn lookup(&self, label: &str) -> Option<&Category> {
        self.labels.iter().find(|c| c.as_str() == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.labels.iter()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            labels: DEFAULT_EMOTIONS
                .iter()
                .map(|label| Category(label.to_string()))
                .collect(),
        }
    }
}
