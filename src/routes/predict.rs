use crate::{
    labels::resolve_label,
    pipeline::{decode_image, preprocess},
    server::SharedState,
};
use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

#[derive(Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("upload declared content type {0:?}")]
    UnsupportedMediaType(Option<String>),
    #[error("decode failed: {0}")]
    UndecodableImage(crate::pipeline::PipelineError),
    #[error("no file field in multipart upload")]
    MissingFile,
    #[error("failed to read upload: {0}")]
    Upload(#[from] MultipartError),
    #[error("processing failed: {0}")]
    Processing(String),
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            PredictError::UnsupportedMediaType(_) => (
                StatusCode::BAD_REQUEST,
                "Only image uploads are supported".to_string(),
            ),
            PredictError::UndecodableImage(_) => (
                StatusCode::BAD_REQUEST,
                "Could not decode image".to_string(),
            ),
            PredictError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "No file field in upload".to_string(),
            ),
            PredictError::Upload(_) => (
                StatusCode::BAD_REQUEST,
                "Malformed multipart request".to_string(),
            ),
            PredictError::Processing(_) => {
                // Full detail stays server-side; the caller gets a
                // generic message.
                tracing::error!("Error processing image: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Processing error".to_string())
            }
        };

        (status, Json(ErrorDetail { detail })).into_response()
    }
}

/// Runs the upload through decode, preprocess, inference and label
/// resolution. Every error is translated to a JSON response here;
/// nothing propagates past this handler.
#[instrument(skip(state, multipart))]
pub async fn predict(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Prediction>, PredictError> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
        {
            return Err(PredictError::UnsupportedMediaType(content_type));
        }

        let bytes = field.bytes().await?;

        let image = decode_image(&bytes).map_err(PredictError::UndecodableImage)?;
        let tensor = preprocess(&image).map_err(|e| PredictError::Processing(e.to_string()))?;
        let scores = state
            .model
            .classify(&tensor)
            .map_err(|e| PredictError::Processing(e.to_string()))?;
        let label = resolve_label(&scores).ok_or_else(|| {
            PredictError::Processing(format!(
                "score vector of length {} does not match label list",
                scores.len()
            ))
        })?;

        tracing::debug!("Predicted class {}", label);

        return Ok(Json(Prediction {
            prediction: label.to_string(),
        }));
    }

    Err(PredictError::MissingFile)
}
