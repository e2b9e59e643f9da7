pub mod engine;
pub mod model;
pub mod preprocess;

pub use engine::{ClassificationEngine, ModelLocations, Prediction, CLASS_LABELS};
#[cfg(feature = "onnx-model")]
pub use model::OnnxModel;
pub use model::{PlaceholderModel, TumorModel, NUM_CLASSES};
pub use preprocess::{INPUT_CHANNELS, INPUT_SIZE};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Model artifact not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model initialization: {0}")]
    ModelInit(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model output mismatch: expected {expected} classes, got {got}")]
    BadOutput { expected: usize, got: usize },
}
