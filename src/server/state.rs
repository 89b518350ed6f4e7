use axum::extract::FromRef;

use crate::concert_store::ConcertStore;
use crate::listing::ListingService;
use crate::notes::NoteService;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedConcertStore = Arc<dyn ConcertStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub concert_store: GuardedConcertStore,
    pub listing_service: ListingService,
    pub note_service: NoteService,
    pub user_manager: GuardedUserManager,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedConcertStore {
    fn from_ref(input: &ServerState) -> Self {
        input.concert_store.clone()
    }
}

impl FromRef<ServerState> for ListingService {
    fn from_ref(input: &ServerState) -> Self {
        input.listing_service.clone()
    }
}

impl FromRef<ServerState> for NoteService {
    fn from_ref(input: &ServerState) -> Self {
        input.note_service.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
