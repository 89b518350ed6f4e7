mod listing_service;
mod pagination;

pub use listing_service::{ListingService, ShowDetail, VenueWithShows};
pub use pagination::{Page, PageRequest, PageSizes};
