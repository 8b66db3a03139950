//! REST surface over [`UserService`].

pub mod dto;
pub mod error;
pub mod handlers;

use crate::Database;
use crate::config::AppConfig;
use crate::users::UserService;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Shared by every handler.
#[derive(Debug)]
pub struct AppState {
    pub service: UserService,
    pub db: Arc<Database>,
    pub started: Instant,
}

impl AppState {
    #[must_use]
    pub fn new(service: UserService, db: Arc<Database>) -> Self {
        Self { service, db, started: Instant::now() }
    }
}

pub fn router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/users", get(handlers::list_users).post(handlers::create_user))
        .route("/api/users/stats", get(handlers::user_stats))
        .route(
            "/api/users/{id}",
            get(handlers::get_user).put(handlers::update_user).delete(handlers::delete_user),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(Extension(state))
}

/// Serves until Ctrl-C or SIGTERM, then closes the database.
///
/// # Errors
/// Binding the listener or a fatal server error.
pub async fn serve(cfg: &AppConfig, db: Arc<Database>) -> Result<(), Box<dyn std::error::Error>> {
    let service = UserService::new(&db, cfg.service_settings())?;
    let state = Arc::new(AppState::new(service, db.clone()));
    let app = router(state, cfg.body_limit_bytes);

    let listener = TcpListener::bind(&cfg.bind).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    db.close()?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                log::info!("received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
