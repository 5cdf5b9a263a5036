//! Web application router and middleware setup.

use crate::error::Result;
use crate::web::handlers;
use crate::web::state::AppState;
use crate::web::stream;
use axum::{routing::get, Router};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the axum application with all routes and middleware.
///
/// `static_dir` is the already resolved static directory; it is created if
/// missing. Pass `None` to disable static file serving.
pub fn create_app(state: AppState, static_dir: Option<PathBuf>) -> Result<Router> {
    let mut info_route = get(handlers::host_info);
    if state.config.enable_cors {
        info_route = info_route.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([axum::http::Method::GET]),
        );
    }

    let mut app = Router::new()
        .route(
            "/sse",
            get(stream::stream_handler).options(stream::preflight_handler),
        )
        .route("/info", info_route)
        .route("/health", get(handlers::health_check));

    if let Some(static_dir) = static_dir {
        if !static_dir.exists() {
            warn!(
                "HTML directory {:?} does not exist, creating it",
                static_dir
            );
            std::fs::create_dir_all(&static_dir)?;
        }
        info!("Web server enabled, static files from {:?}", static_dir);

        let index = static_dir.join(&state.config.index_file);
        app = app
            .route_service("/", ServeFile::new(index))
            .fallback_service(ServeDir::new(&static_dir));
    }

    let app = app
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state);

    Ok(app)
}
