pub mod analytics;
pub mod classification;
pub mod classifier;
pub mod decoder;
pub mod preprocessing;
pub mod providers;
pub mod recommendations;

pub use analytics::AnalyticsAggregator;
pub use classification::{ClassificationOutcome, ClassificationService};
pub use classifier::{Classifier, HttpClassifier};
pub use decoder::CategoryDecoder;
pub use preprocessing::{ImagePreprocessor, InputTensor};
pub use providers::{RecommendationProvider, SpotifyProvider};
pub use recommendations::RecommendationMapper;
