//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own databases and photo directory.

use super::constants::*;
use super::fixtures::{create_test_concerts, create_test_users};
use lmn_server::concert_store::SqliteConcertStore;
use lmn_server::listing::PageSizes;
use lmn_server::photo_storage::FsPhotoStorage;
use lmn_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Concert store for direct database access in tests
    #[allow(dead_code)]
    pub concert_store: Arc<SqliteConcertStore>,

    /// Root of the photo storage
    #[allow(dead_code)]
    pub media_path: PathBuf,

    // Keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the default page sizes.
    pub async fn spawn() -> Self {
        Self::spawn_with_page_sizes(PageSizes::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the fixtures cannot be created, the port cannot be bound or
    /// the server does not become ready within the timeout.
    pub async fn spawn_with_page_sizes(page_sizes: PageSizes) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let media_path = temp_dir.path().join("media");

        let concert_store = Arc::new(
            create_test_concerts(&temp_dir.path().join("concerts.db"))
                .expect("Failed to create test concerts"),
        );
        let user_store = Arc::new(
            create_test_users(&temp_dir.path().join("user.db"))
                .expect("Failed to create test users"),
        );
        let photo_storage = Arc::new(FsPhotoStorage::new(&media_path));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            content_cache_age_sec: 60,
            frontend_dir_path: None,
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        };
        let state = ServerState::new(
            config,
            concert_store.clone(),
            user_store,
            photo_storage,
            page_sizes,
        );
        let app = make_app(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            concert_store,
            media_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
