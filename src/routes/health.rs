use axum::{response::IntoResponse, response::Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Readiness {
    message: String,
}

/// Liveness signal, independent of model state.
pub async fn root() -> impl IntoResponse {
    Json(Readiness {
        message: "BANANA IS READY TO BE EATEN".into(),
    })
}
