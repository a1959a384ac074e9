use crate::{config::Settings, model_service::ModelService, routes::api_routes};
use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

#[derive(Clone)]
pub struct SharedState {
    pub model: Arc<dyn ModelService>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(model: Arc<dyn ModelService>, config: &Settings) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let app_state = SharedState { model };

        let router = Router::new()
            .merge(api_routes())
            .with_state(app_state)
            .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
            .layer(cors_layer(&config.cors.allowed_origins)?);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", &self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn({
            let mut shutdown_rx = shutdown_rx.resubscribe();
            async move {
                let server = axum::serve(listener, router);
                server
                    .with_graceful_shutdown(async move {
                        shutdown_rx.recv().await.ok();
                    })
                    .await?;
                Ok(())
            }
        });

        Ok(server_handle)
    }
}

/// Browser access policy: configured origin allow-list, any method, any
/// header, credentials allowed. Methods and headers are mirrored from the
/// preflight request because wildcards cannot be combined with
/// credentials.
fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("invalid CORS origin {:?}: {}", origin, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_layer_accepts_valid_origins() {
        let origins = vec![
            "http://localhost:5173".to_string(),
            "https://howismybanana.netlify.app".to_string(),
        ];
        assert!(cors_layer(&origins).is_ok());
    }

    #[test]
    fn cors_layer_rejects_unparsable_origin() {
        let origins = vec!["not a header\nvalue".to_string()];
        assert!(cors_layer(&origins).is_err());
    }
}
