use crate::{
    config::ModelSettings,
    labels::CLASS_NAMES,
    model_service::{InferenceError, ModelService},
    pipeline::INPUT_SIZE,
};
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// ONNX Runtime backend holding a pool of sessions picked round-robin, so
/// concurrent requests do not all serialize on one session mutex.
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtModelService {
    /// Builds the session pool and runs a warmup inference. Any failure
    /// here must keep the process from serving: the model artifact is a
    /// startup precondition, never retried per-request.
    pub fn new(model_settings: &ModelSettings) -> Result<Self, Box<dyn std::error::Error>> {
        ort::init().commit()?;

        let num_instances = model_settings.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_settings.get_model_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        let service = Self {
            counter: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(sessions),
        };

        // Warmup doubles as a fail-fast check that the artifact's output
        // dimensionality matches the label list.
        let size = INPUT_SIZE as usize;
        let zeros: Array<f32, Ix4> = Array::zeros((1, size, size, 3));
        let scores = service.classify(&zeros)?;
        if scores.len() != CLASS_NAMES.len() {
            return Err(format!(
                "model outputs {} classes but {} labels are configured",
                scores.len(),
                CLASS_NAMES.len()
            )
            .into());
        }

        tracing::info!(
            "Created {} ONNX session(s) for {:?}",
            num_instances,
            model_settings.get_model_path()
        );

        Ok(service)
    }
}

impl ModelService for OrtModelService {
    fn classify(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|e| InferenceError::Session(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Session(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Session(format!("inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Session(format!("failed to extract tensor: {}", e)))?;

        // Output is (1, num_classes); the flat slice is the score vector.
        tracing::debug!("Model output shape: {:?}", shape);
        if data.is_empty() {
            return Err(InferenceError::OutputShape {
                expected: CLASS_NAMES.len(),
                actual: 0,
            });
        }

        Ok(data.to_vec())
    }
}
