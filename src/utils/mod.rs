pub mod error;

pub use error::{CareerError, PipelineStage};
