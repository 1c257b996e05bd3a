//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fixture catalog or activity log changes, update only this file.

// ============================================================================
// Test Catalog
// ============================================================================

/// Artist ID for "Coldplay", listed by two catalog files
pub const COLDPLAY_ID: &str = "ARYY";
pub const COLDPLAY_NAME: &str = "Coldplay";
/// Location in the first catalog file listing Coldplay
pub const COLDPLAY_FIRST_LOCATION: &str = "London, England";
/// Location in the second catalog file listing Coldplay
pub const COLDPLAY_OTHER_LOCATION: &str = "UK";

/// Artist ID for "Beyoncé"
pub const BEYONCE_ID: &str = "ARZZ";
pub const BEYONCE_NAME: &str = "Beyoncé";

pub const FIX_YOU_ID: &str = "SOXX";
pub const FIX_YOU_TITLE: &str = "Fix You";
pub const FIX_YOU_DURATION: f64 = 294.5;

pub const YELLOW_ID: &str = "SOAA";
pub const YELLOW_TITLE: &str = "Yellow";
pub const YELLOW_DURATION: f64 = 266.77;

pub const HALO_ID: &str = "SOBB";
pub const HALO_TITLE: &str = "Halo";
pub const HALO_DURATION: f64 = 261.0;

pub const CATALOG_SONGS: usize = 3;
pub const CATALOG_ARTISTS: usize = 2;

// ============================================================================
// Test Activity Log
// ============================================================================

/// Listener who plays "Fix You" on the free tier, then "Yellow" on paid
pub const LILY_ID: i64 = 7;
/// Listener who plays "Halo"
pub const JACOB_ID: i64 = 8;
/// Listener whose only play matches nothing in the catalog
pub const KATE_ID: i64 = 9;

/// 2018-11-01 21:01:46.796 UTC, a Thursday
pub const FIX_YOU_TS: i64 = 1541106106796;
pub const FIX_YOU_START_TIME: &str = "2018-11-01 21:01:46.796";
/// 2018-11-01 21:06:13.796 UTC
pub const YELLOW_TS: i64 = 1541106373796;
/// 2018-11-01 21:17:33.796 UTC
pub const HALO_TS: i64 = 1541107053796;
/// 2018-11-02 08:00:00.000 UTC, a Friday
pub const HOME_TS: i64 = 1541145600000;
pub const UNMATCHED_TS: i64 = 1541145660000;
pub const LOGGED_OUT_TS: i64 = 1541145720000;

/// Events in the default activity log
pub const LOG_EVENTS: usize = 6;
/// NextSong events whose song matches the catalog exactly
pub const MATCHED_PLAYS: usize = 3;
/// Distinct non-null user ids in the default activity log
pub const DISTINCT_USERS: usize = 3;

pub const CREDENTIAL_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";
