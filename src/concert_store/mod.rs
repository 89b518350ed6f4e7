mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::CONCERT_VERSIONED_SCHEMAS;
pub use store::SqliteConcertStore;
pub use trait_def::ConcertStore;
