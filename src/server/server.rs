use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration, time::Instant};

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::info;

use super::error_response::error_response;
use super::listing_routes::make_listing_routes;
use super::metrics::metrics_handler;
use super::note_routes::make_note_routes;
use super::session::Session;
use super::state::ServerState;
use super::user_routes::{make_auth_routes, make_user_routes};
use super::{log_requests, ServerConfig};
use crate::concert_store::{ConcertStats, ConcertStore};
use crate::listing::{ListingService, PageSizes};
use crate::notes::NoteService;
use crate::photo_storage::PhotoStorage;
use crate::user::{UserManager, UserStore};

pub const GIT_HASH: &str = env!("GIT_HASH");

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub user_id: Option<usize>,
    pub concerts: ConcertStats,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let concerts = match state.concert_store.get_stats() {
        Ok(stats) => stats,
        Err(err) => {
            tracing::error!("Failed to read concert stats: {:#}", err);
            return error_response(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            );
        }
    };
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        user_id: session.map(|s| s.user_id),
        concerts,
    };
    Json(stats).into_response()
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        concert_store: Arc<dyn ConcertStore>,
        user_store: Arc<dyn UserStore>,
        photo_storage: Arc<dyn PhotoStorage>,
        page_sizes: PageSizes,
    ) -> ServerState {
        let listing_service = ListingService::new(concert_store.clone(), page_sizes);
        let note_service = NoteService::new(
            concert_store.clone(),
            listing_service.clone(),
            photo_storage,
            config.max_upload_bytes,
        );
        ServerState {
            config,
            start_time: Instant::now(),
            concert_store,
            listing_service,
            note_service,
            user_manager: Arc::new(UserManager::new(user_store)),
            hash: GIT_HASH.to_owned(),
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let v1_routes: Router<ServerState> = Router::new()
        .merge(make_listing_routes())
        .merge(make_note_routes(&state))
        .nest("/auth", make_auth_routes())
        .nest("/users", make_user_routes());

    let home_router: Router<ServerState> = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)),
    };

    home_router
        .nest("/v1", v1_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(state: ServerState, metrics_port: u16) -> Result<()> {
    let port = state.config.port;
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::try_join!(
        async { axum::serve(listener, app).await },
        async { axum::serve(metrics_listener, make_metrics_app()).await },
    )?;
    Ok(())
}
