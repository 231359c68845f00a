pub mod prediction;
pub mod recommendation;
pub mod vocabulary;

pub use prediction::{
    CategoryCount, CategoryCounts, DailyCounts, DailyHeatmap, DailyMatrix, Dashboard,
    PredictionEvent,
};
pub use recommendation::{SpotifySearchResponse, SpotifyToken, Track};
pub use vocabulary::{Category, Vocabulary, DEFAULT_EMOTIONS};
