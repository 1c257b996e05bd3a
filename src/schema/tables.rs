//! Staging and star-schema table definitions.
//!
//! Staging tables mirror the raw JSON sources and carry no keys; duplicates
//! and nulls are expected there. The star schema is one fact table
//! (`songplays`) and four dimensions (`users`, `songs`, `artists`, `time`).

use super::{SqlType, Table};
use crate::warehouse_column;

// =============================================================================
// Staging Tables
// =============================================================================

/// One row per raw user-interaction event from the activity logs.
pub const STAGING_EVENTS_TABLE: Table = Table {
    name: "staging_events",
    columns: &[
        warehouse_column!("artist", SqlType::VarChar),
        warehouse_column!("auth", SqlType::VarChar),
        warehouse_column!("firstName", SqlType::VarChar),
        warehouse_column!("gender", SqlType::VarChar),
        warehouse_column!("itemInSession", SqlType::Integer),
        warehouse_column!("lastName", SqlType::VarChar),
        warehouse_column!("length", SqlType::Float8), // seconds
        warehouse_column!("level", SqlType::VarChar), // 'free', 'paid'
        warehouse_column!("location", SqlType::VarChar),
        warehouse_column!("method", SqlType::VarChar),
        warehouse_column!("page", SqlType::VarChar),
        warehouse_column!("registration", SqlType::BigInt),
        warehouse_column!("sessionId", SqlType::Integer),
        warehouse_column!("song", SqlType::VarChar),
        warehouse_column!("status", SqlType::Integer),
        warehouse_column!("ts", SqlType::Timestamp),
        warehouse_column!("userAgent", SqlType::VarChar),
        warehouse_column!("userId", SqlType::Integer),
    ],
};

/// One row per song-catalog entry.
pub const STAGING_SONGS_TABLE: Table = Table {
    name: "staging_songs",
    columns: &[
        warehouse_column!("song_id", SqlType::VarChar),
        warehouse_column!("num_songs", SqlType::BigInt),
        warehouse_column!("artist_id", SqlType::VarChar),
        warehouse_column!("artist_latitude", SqlType::VarChar),
        warehouse_column!("artist_longitude", SqlType::VarChar),
        warehouse_column!("artist_location", SqlType::VarChar),
        warehouse_column!("artist_name", SqlType::VarChar),
        warehouse_column!("title", SqlType::VarChar),
        warehouse_column!("duration", SqlType::Float8), // seconds
        warehouse_column!("year", SqlType::Integer),
    ],
};

// =============================================================================
// Fact Table
// =============================================================================

pub const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        warehouse_column!("songplay_id", SqlType::BigInt, is_identity = true),
        warehouse_column!(
            "start_time",
            SqlType::Timestamp,
            non_null = true,
            is_dist_key = true,
            is_sort_key = true
        ),
        warehouse_column!("user_id", SqlType::Integer, non_null = true),
        warehouse_column!("level", SqlType::VarChar, non_null = true),
        warehouse_column!("song_id", SqlType::VarChar, non_null = true),
        warehouse_column!("artist_id", SqlType::VarChar, non_null = true),
        warehouse_column!("session_id", SqlType::Integer, non_null = true),
        warehouse_column!("location", SqlType::VarChar),
        warehouse_column!("user_agent", SqlType::VarChar),
    ],
};

// =============================================================================
// Dimension Tables
// =============================================================================

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        warehouse_column!(
            "user_id",
            SqlType::Integer,
            is_primary_key = true,
            is_sort_key = true
        ),
        warehouse_column!("first_name", SqlType::VarChar),
        warehouse_column!("last_name", SqlType::VarChar),
        warehouse_column!("gender", SqlType::VarChar),
        warehouse_column!("level", SqlType::VarChar, non_null = true),
    ],
};

pub const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        warehouse_column!(
            "song_id",
            SqlType::VarChar,
            is_primary_key = true,
            is_sort_key = true
        ),
        warehouse_column!("title", SqlType::VarChar, non_null = true),
        warehouse_column!("artist_id", SqlType::VarChar, non_null = true),
        warehouse_column!("year", SqlType::Integer),
        warehouse_column!("duration", SqlType::Float8, non_null = true),
    ],
};

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        warehouse_column!(
            "artist_id",
            SqlType::VarChar,
            is_primary_key = true,
            is_sort_key = true
        ),
        warehouse_column!("name", SqlType::VarChar, non_null = true),
        warehouse_column!("location", SqlType::VarChar),
        warehouse_column!("latitude", SqlType::VarChar),
        warehouse_column!("longitude", SqlType::VarChar),
    ],
};

/// Start times of song plays broken down into calendar units.
pub const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        warehouse_column!(
            "start_time",
            SqlType::Timestamp,
            is_primary_key = true,
            is_dist_key = true,
            is_sort_key = true
        ),
        warehouse_column!("hour", SqlType::SmallInt),
        warehouse_column!("day", SqlType::SmallInt),
        warehouse_column!("week", SqlType::SmallInt), // ISO week
        warehouse_column!("month", SqlType::SmallInt),
        warehouse_column!("year", SqlType::SmallInt),
        warehouse_column!("weekday", SqlType::VarChar), // '0' = Sunday
    ],
};

pub const STAGING_TABLES: &[&Table] = &[&STAGING_EVENTS_TABLE, &STAGING_SONGS_TABLE];

pub const WAREHOUSE_TABLES: &[&Table] = &[
    &SONGPLAYS_TABLE,
    &USERS_TABLE,
    &SONGS_TABLE,
    &ARTISTS_TABLE,
    &TIME_TABLE,
];

/// Every table, in creation order.
pub const ALL_TABLES: &[&Table] = &[
    &STAGING_EVENTS_TABLE,
    &STAGING_SONGS_TABLE,
    &SONGPLAYS_TABLE,
    &USERS_TABLE,
    &SONGS_TABLE,
    &ARTISTS_TABLE,
    &TIME_TABLE,
];
