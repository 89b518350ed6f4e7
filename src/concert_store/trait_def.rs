//! ConcertStore trait definition.

use super::models::*;
use anyhow::Result;

/// Relational persistence for artists, venues, shows and notes.
///
/// Name-filtered listings match case-insensitive substrings and are ordered
/// by name (case-insensitive), ties broken by id. Shows are ordered by
/// `show_date` descending. Notes are ordered by `posted_date` descending,
/// ties broken by insertion order.
pub trait ConcertStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn create_artist(&self, name: &str) -> Result<Artist>;

    fn get_artist(&self, id: ArtistId) -> Result<Option<Artist>>;

    fn count_artists(&self, name_filter: Option<&str>) -> Result<usize>;

    fn list_artists(&self, name_filter: Option<&str>, window: Window) -> Result<Vec<Artist>>;

    /// Returns false if the artist does not exist.
    fn update_artist(&self, artist: &Artist) -> Result<bool>;

    /// Deletes the artist along with its shows and their notes.
    fn delete_artist(&self, id: ArtistId) -> Result<bool>;

    // =========================================================================
    // Venues
    // =========================================================================

    fn create_venue(&self, name: &str, city: &str, state: &str) -> Result<Venue>;

    fn get_venue(&self, id: VenueId) -> Result<Option<Venue>>;

    fn count_venues(&self, name_filter: Option<&str>) -> Result<usize>;

    fn list_venues(&self, name_filter: Option<&str>, window: Window) -> Result<Vec<Venue>>;

    fn update_venue(&self, venue: &Venue) -> Result<bool>;

    fn delete_venue(&self, id: VenueId) -> Result<bool>;

    // =========================================================================
    // Shows
    // =========================================================================

    /// Fails if the artist or the venue does not exist.
    fn create_show(&self, artist_id: ArtistId, venue_id: VenueId, show_date: i64) -> Result<Show>;

    fn get_show(&self, id: ShowId) -> Result<Option<Show>>;

    fn count_shows(&self, filter: ShowFilter) -> Result<usize>;

    fn list_shows(&self, filter: ShowFilter, window: Window) -> Result<Vec<Show>>;

    fn update_show(&self, show: &Show) -> Result<bool>;

    fn delete_show(&self, id: ShowId) -> Result<bool>;

    // =========================================================================
    // Notes
    // =========================================================================

    fn create_note(&self, note: &NewNoteRecord) -> Result<Note>;

    fn get_note(&self, id: NoteId) -> Result<Option<Note>>;

    fn count_notes(&self, filter: NoteFilter) -> Result<usize>;

    fn list_notes(&self, filter: NoteFilter, window: Window) -> Result<Vec<Note>>;

    /// Persists title, text and photo. `posted_date`, author and show are
    /// never rewritten.
    fn update_note(&self, note: &Note) -> Result<bool>;

    fn delete_note(&self, id: NoteId) -> Result<bool>;

    // =========================================================================
    // Stats
    // =========================================================================

    fn get_stats(&self) -> Result<ConcertStats>;
}
