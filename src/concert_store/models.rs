//! Concert entities as stored in the concerts database.
//!
//! Timestamps are Unix milliseconds (UTC).

use serde::{Deserialize, Serialize};

pub type ArtistId = i64;
pub type VenueId = i64;
pub type ShowId = i64;
pub type NoteId = i64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub city: String,
    pub state: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Show {
    pub id: ShowId,
    pub artist_id: ArtistId,
    pub venue_id: VenueId,
    pub show_date: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub user_id: usize,
    pub show_id: ShowId,
    pub title: String,
    pub text: String,
    /// Storage path of the attached photo, if any.
    pub photo: Option<String>,
    pub posted_date: i64,
}

/// A note that has not been inserted yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNoteRecord {
    pub user_id: usize,
    pub show_id: ShowId,
    pub title: String,
    pub text: String,
    pub photo: Option<String>,
    pub posted_date: i64,
}

/// Which notes a count or listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteFilter {
    All,
    Show(ShowId),
    User(usize),
}

/// Which shows a count or listing covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowFilter {
    Artist(ArtistId),
    Venue(VenueId),
}

/// Offset/limit slice of an ordered listing. A `None` limit reads to the end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Window {
    pub fn all() -> Self {
        Window {
            offset: 0,
            limit: None,
        }
    }

    pub fn new(offset: usize, limit: usize) -> Self {
        Window {
            offset,
            limit: Some(limit),
        }
    }

    pub(crate) fn sql_limit(&self) -> i64 {
        self.limit.map(|l| l as i64).unwrap_or(-1)
    }
}

/// Row counts reported on the server home endpoint.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ConcertStats {
    pub artists: usize,
    pub venues: usize,
    pub shows: usize,
    pub notes: usize,
}
