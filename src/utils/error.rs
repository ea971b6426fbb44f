use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a failure belongs to, so callers can report where a
/// document broke instead of a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Decode,
    Recognition,
    Downstream,
    Configuration,
    Input,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PipelineStage::Decode => "decode",
            PipelineStage::Recognition => "recognition",
            PipelineStage::Downstream => "downstream",
            PipelineStage::Configuration => "configuration",
            PipelineStage::Input => "input",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CareerError {
    #[error("Image decode failed: {0}")]
    ImageDecode(#[source] image::ImageError),
    #[error("Text recognition error: {0}")]
    Recognition(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Survey error: {0}")]
    Survey(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Delimited table error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CareerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CareerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        match self {
            CareerError::ImageDecode(_) => PipelineStage::Decode,
            CareerError::Recognition(_) => PipelineStage::Recognition,
            CareerError::Config(_) => PipelineStage::Configuration,
            CareerError::Survey(_) | CareerError::Io { .. } | CareerError::Json(_) => {
                PipelineStage::Input
            }
            CareerError::Csv(_) => PipelineStage::Downstream,
        }
    }
}
