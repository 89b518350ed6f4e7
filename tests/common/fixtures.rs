//! Test fixture creation
//!
//! Builds the concerts and user databases every test server starts from.

use super::constants::*;
use anyhow::Result;
use lmn_server::concert_store::{ConcertStore, SqliteConcertStore};
use lmn_server::user::{NewUser, SqliteUserStore, UserManager};
use std::path::Path;
use std::sync::Arc;

/// Seeds three artists, two venues and three shows.
///
/// Ids follow insertion order, see the constants module.
pub fn create_test_concerts(db_path: &Path) -> Result<SqliteConcertStore> {
    let store = SqliteConcertStore::new(db_path)?;

    let acdc = store.create_artist("ACDC")?;
    let rem = store.create_artist("REM")?;
    let yes = store.create_artist("Yes")?;

    let first_avenue = store.create_venue("First Avenue", "Minneapolis", "MN")?;
    let turf_club = store.create_venue("Turf Club", "Saint Paul", "MN")?;

    store.create_show(acdc.id, first_avenue.id, 1_500_000_000_000)?;
    store.create_show(rem.id, turf_club.id, 1_400_000_000_000)?;
    store.create_show(yes.id, first_avenue.id, 1_300_000_000_000)?;

    Ok(store)
}

/// Creates the user db with two password users.
pub fn create_test_users(db_path: &Path) -> Result<SqliteUserStore> {
    let store = SqliteUserStore::new(db_path)?;
    let manager = UserManager::new(Arc::new(store.clone()));

    for (handle, password) in [(TEST_USER, TEST_PASS), (OTHER_USER, OTHER_PASS)] {
        manager.add_user(NewUser {
            handle: handle.to_string(),
            email: format!("{}@example.com", handle),
            first_name: handle.to_string(),
            last_name: "Tester".to_string(),
        })?;
        manager.create_password_credentials(handle, password)?;
    }

    Ok(store)
}
