use ndarray::{Array, Ix4};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference session failed: {0}")]
    Session(String),
    #[error("model returned {actual} scores, expected {expected}")]
    OutputShape { expected: usize, actual: usize },
}

/// Seam between the HTTP layer and the model backend. The implementation
/// is read-only over its shared state, so concurrent callers need no
/// coordination beyond what the backend does internally.
pub trait ModelService: Send + Sync + 'static {
    fn classify(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, InferenceError>;
}
