use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::presentation::http::{
    handlers::{AdminHandler, RagHandler},
    routes::{admin_routes, health_routes, rag_routes},
};

/// Questions are capped at 5000 characters; admin bodies carry paths and ids.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct HttpServer {
    rag_handler: Arc<RagHandler>,
    admin_handler: Arc<AdminHandler>,
    port: u16,
}

impl HttpServer {
    pub fn new(
        rag_handler: Arc<RagHandler>,
        admin_handler: Arc<AdminHandler>,
        port: Option<u16>,
    ) -> Self {
        Self {
            rag_handler,
            admin_handler,
            port: port.unwrap_or(3000),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes())
            .merge(rag_routes(self.rag_handler.clone()))
            .merge(admin_routes(self.admin_handler.clone()))
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
