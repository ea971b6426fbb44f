pub mod models;
pub mod processing;
pub mod recommender;
pub mod scoring;
pub mod survey;
pub mod utils;

pub use recommender::CareerRecommender;
pub use utils::{CareerError, PipelineStage};
