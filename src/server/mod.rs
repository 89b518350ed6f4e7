pub mod config;
mod error_response;
mod http_layers;
mod listing_routes;
pub mod metrics;
mod note_routes;
#[allow(clippy::module_inception)]
pub mod server;
pub(self) mod session;
pub mod state;
mod user_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::ServerState;
