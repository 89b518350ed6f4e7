//! Shared constants for end-to-end tests
//!
//! When fixture data changes (user credentials, concert ids, etc.),
//! update only this file.
#![allow(dead_code)]

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// A second user, for ownership checks
pub const OTHER_USER: &str = "otheruser";

pub const OTHER_PASS: &str = "otherpass123";

/// Users are created in this order by the fixtures
pub const TEST_USER_ID: i64 = 1;
pub const OTHER_USER_ID: i64 = 2;

// ============================================================================
// Test Concert IDs
// ============================================================================

pub const ARTIST_ACDC_ID: i64 = 1;
pub const ARTIST_REM_ID: i64 = 2;
pub const ARTIST_YES_ID: i64 = 3;

pub const VENUE_FIRST_AVENUE_ID: i64 = 1;
pub const VENUE_TURF_CLUB_ID: i64 = 2;

/// ACDC at First Avenue
pub const SHOW_1_ID: i64 = 1;
/// REM at Turf Club
pub const SHOW_2_ID: i64 = 2;
/// Yes at First Avenue
pub const SHOW_3_ID: i64 = 3;

pub const NONEXISTENT_ID: i64 = 9999;

// ============================================================================
// Photos
// ============================================================================

/// Smallest byte string the server recognizes as a PNG
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Smallest byte string the server recognizes as a JPEG
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];

/// Upload limit the test server runs with
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
