mod labels;
mod model_service;
mod ort_service;
mod pipeline;
mod routes;
mod server;

pub mod app;
pub mod config;

pub use app::start_app;
