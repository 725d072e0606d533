use crate::cli::ServeArgs;
use crate::web::api::{
    create_review_handler, get_overlay_handler, get_payloads, get_reviews, get_shots_handler,
};
use crate::web::stream::stream_overlay_handler;
use anyhow::Result;
use axum::{routing::get, Router};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const INDEX_TEXT: &str = "Shot Review server\n\n\
GET  /api/payloads\n\
GET  /api/reviews\n\
POST /api/reviews\n\
GET  /api/reviews/:id/shots\n\
GET  /api/reviews/:id/overlay?t=&width=&height=\n\
GET  /api/reviews/:id/overlay/stream?width=&height=&speed=\n";

async fn index_handler() -> &'static str {
    INDEX_TEXT
}

pub fn build_router(args: Arc<ServeArgs>) -> Router {
    let api = Router::new()
        .route("/payloads", get(get_payloads))
        .route("/reviews", get(get_reviews).post(create_review_handler))
        .route("/reviews/:review_id/shots", get(get_shots_handler))
        .route("/reviews/:review_id/overlay", get(get_overlay_handler))
        .route(
            "/reviews/:review_id/overlay/stream",
            get(stream_overlay_handler),
        );

    let router = Router::new().nest("/api", api);
    let router = match &args.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.route("/", get(index_handler)),
    };

    router
        .layer(TraceLayer::new_for_http())
        .with_state(args)
}

pub async fn run_server(args: ServeArgs) -> Result<()> {
    let mut current_port = args.port;
    let listener = loop {
        let addr = SocketAddr::new(args.host, current_port);
        match TcpListener::bind(addr) {
            Ok(listener) => {
                // must be non-blocking before handing it to tokio
                listener.set_nonblocking(true)?;
                info!("Successfully bound to {}", addr);
                break listener;
            }
            Err(e) => {
                warn!("Failed to bind to {}: {}. Trying next port...", addr, e);
                current_port = current_port
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("No available ports found"))?;
            }
        }
    };

    info!(
        "Reviews under {}, payloads under {}",
        args.review_root, args.payload_root
    );
    let app = build_router(Arc::new(args));

    let tokio_listener = tokio::net::TcpListener::from_std(listener)?;
    info!(
        "Shot Review server started on http://{:?}",
        tokio_listener.local_addr()?
    );

    axum::serve(tokio_listener, app).await?;

    Ok(())
}
