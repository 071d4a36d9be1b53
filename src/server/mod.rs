use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::storage::DocumentStore;
use crate::upload::UploadCoordinator;

pub mod routes;

/// Server state
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub coordinator: UploadCoordinator,
}

pub async fn start_server(
    port: u16,
    database_path: PathBuf,
    upload_dir: PathBuf,
) -> anyhow::Result<()> {
    let store = Arc::new(DocumentStore::open(&database_path)?);
    let coordinator = UploadCoordinator::new(store.clone(), upload_dir)?;
    let state = Arc::new(AppState { store, coordinator });

    let app = Router::new()
        .route(
            "/documents",
            get(routes::list_documents).post(routes::upload_document),
        )
        .route(
            "/documents/{id}",
            get(routes::get_document)
                .put(routes::update_document)
                .delete(routes::delete_document),
        )
        .route("/documents/{id}/download", get(routes::download_document))
        .route("/stats", get(routes::get_stats))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Docshelf running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
