use super::pagination::{Page, PageRequest, PageSizes};
use crate::concert_store::{
    Artist, ArtistId, ConcertStore, Show, ShowFilter, ShowId, Venue, VenueId, Window,
};
use crate::service_error::{EntityKind, ServiceError, ServiceResult};
use serde::Serialize;
use std::sync::Arc;

/// A show along with the artist and venue it references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShowDetail {
    #[serde(flatten)]
    pub show: Show,
    pub artist: Artist,
    pub venue: Venue,
}

/// A venue as listed: every show it hosted, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VenueWithShows {
    #[serde(flatten)]
    pub venue: Venue,
    pub shows: Vec<Show>,
}

/// Read-only, paginated views over artists, venues and shows.
#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ConcertStore>,
    page_sizes: PageSizes,
}

fn normalize_filter(name_filter: Option<&str>) -> Option<&str> {
    name_filter.map(str::trim).filter(|f| !f.is_empty())
}

impl ListingService {
    pub fn new(store: Arc<dyn ConcertStore>, page_sizes: PageSizes) -> Self {
        Self { store, page_sizes }
    }

    pub fn page_sizes(&self) -> &PageSizes {
        &self.page_sizes
    }

    pub fn list_artists(
        &self,
        name_filter: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<Artist>> {
        let filter = normalize_filter(name_filter);
        let total = self.store.count_artists(filter)?;
        Ok(Page::fetch(total, self.page_sizes.artists, page, |window| {
            self.store.list_artists(filter, window)
        })?)
    }

    pub fn list_venues(
        &self,
        name_filter: Option<&str>,
        page: PageRequest,
    ) -> ServiceResult<Page<VenueWithShows>> {
        let filter = normalize_filter(name_filter);
        let total = self.store.count_venues(filter)?;
        let venues = Page::fetch(total, self.page_sizes.venues, page, |window| {
            self.store.list_venues(filter, window)
        })?;
        venues.try_map(|venue| self.with_shows(venue))
    }

    fn with_shows(&self, venue: Venue) -> ServiceResult<VenueWithShows> {
        // The store lists newest first.
        let mut shows = self
            .store
            .list_shows(ShowFilter::Venue(venue.id), Window::all())?;
        shows.reverse();
        Ok(VenueWithShows { venue, shows })
    }

    pub fn shows_for_artist(
        &self,
        artist_id: ArtistId,
        page: PageRequest,
    ) -> ServiceResult<Page<Show>> {
        self.get_artist(artist_id)?;
        self.list_shows(ShowFilter::Artist(artist_id), page)
    }

    pub fn shows_for_venue(&self, venue_id: VenueId, page: PageRequest) -> ServiceResult<Page<Show>> {
        self.get_venue(venue_id)?;
        self.list_shows(ShowFilter::Venue(venue_id), page)
    }

    fn list_shows(&self, filter: ShowFilter, page: PageRequest) -> ServiceResult<Page<Show>> {
        let total = self.store.count_shows(filter)?;
        Ok(Page::fetch(total, self.page_sizes.shows, page, |window| {
            self.store.list_shows(filter, window)
        })?)
    }

    pub fn get_artist(&self, id: ArtistId) -> ServiceResult<Artist> {
        self.store
            .get_artist(id)?
            .ok_or(ServiceError::not_found(EntityKind::Artist, id))
    }

    pub fn get_venue(&self, id: VenueId) -> ServiceResult<Venue> {
        self.store
            .get_venue(id)?
            .ok_or(ServiceError::not_found(EntityKind::Venue, id))
    }

    pub fn get_show(&self, id: ShowId) -> ServiceResult<ShowDetail> {
        let show = self
            .store
            .get_show(id)?
            .ok_or(ServiceError::not_found(EntityKind::Show, id))?;
        self.show_detail(show)
    }

    /// Resolves the artist and venue of an already loaded show.
    pub fn show_detail(&self, show: Show) -> ServiceResult<ShowDetail> {
        let artist = self.get_artist(show.artist_id)?;
        let venue = self.get_venue(show.venue_id)?;
        Ok(ShowDetail {
            show,
            artist,
            venue,
        })
    }
}
