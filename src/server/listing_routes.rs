//! Public, read-only browsing of artists, venues and shows.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::ServerState;
use crate::concert_store::{Artist, ArtistId, Show, ShowId, Venue, VenueId};
use crate::listing::{ListingService, Page, PageRequest, ShowDetail, VenueWithShows};
use crate::service_error::ServiceResult;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ListQuery {
    pub search_name: Option<String>,
    /// Kept as text so that garbage falls back to the first page.
    pub page: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

#[derive(Serialize)]
struct ArtistShows {
    artist: Artist,
    shows: Page<Show>,
}

#[derive(Serialize)]
struct VenueShows {
    venue: Venue,
    shows: Page<Show>,
}

async fn list_artists(
    State(listing): State<ListingService>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<Page<Artist>>> {
    let page = listing.list_artists(query.search_name.as_deref(), query.page_request())?;
    Ok(Json(page))
}

async fn get_artist(
    State(listing): State<ListingService>,
    Path(id): Path<ArtistId>,
) -> ServiceResult<Json<Artist>> {
    Ok(Json(listing.get_artist(id)?))
}

async fn get_artist_shows(
    State(listing): State<ListingService>,
    Path(id): Path<ArtistId>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<ArtistShows>> {
    let shows = listing.shows_for_artist(id, query.page_request())?;
    let artist = listing.get_artist(id)?;
    Ok(Json(ArtistShows { artist, shows }))
}

async fn list_venues(
    State(listing): State<ListingService>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<Page<VenueWithShows>>> {
    let page = listing.list_venues(query.search_name.as_deref(), query.page_request())?;
    Ok(Json(page))
}

async fn get_venue(
    State(listing): State<ListingService>,
    Path(id): Path<VenueId>,
) -> ServiceResult<Json<Venue>> {
    Ok(Json(listing.get_venue(id)?))
}

async fn get_venue_shows(
    State(listing): State<ListingService>,
    Path(id): Path<VenueId>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<VenueShows>> {
    let shows = listing.shows_for_venue(id, query.page_request())?;
    let venue = listing.get_venue(id)?;
    Ok(Json(VenueShows { venue, shows }))
}

async fn get_show(
    State(listing): State<ListingService>,
    Path(id): Path<ShowId>,
) -> ServiceResult<Json<ShowDetail>> {
    Ok(Json(listing.get_show(id)?))
}

pub fn make_listing_routes() -> Router<ServerState> {
    Router::new()
        .route("/artists", get(list_artists))
        .route("/artists/{id}", get(get_artist))
        .route("/artists/{id}/shows", get(get_artist_shows))
        .route("/venues", get(list_venues))
        .route("/venues/{id}", get(get_venue))
        .route("/venues/{id}/shows", get(get_venue_shows))
        .route("/shows/{id}", get(get_show))
}
