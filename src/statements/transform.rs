//! Set-based transforms populating the star schema from the staging tables.
//!
//! The order of [`Transform::ALL`] matters: `time` is derived from the
//! `songplays` rows written by the first transform.

use crate::dialect::Dialect;
use crate::schema::{
    Table, ARTISTS_TABLE, SONGPLAYS_TABLE, SONGS_TABLE, STAGING_EVENTS_TABLE,
    STAGING_SONGS_TABLE, TIME_TABLE, USERS_TABLE,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    SongPlays,
    Users,
    Songs,
    Artists,
    Time,
}

// Plays are matched to catalog songs on exact title, artist name and
// duration. A casing or floating-point difference between the two sources
// drops the play. DISTINCT over the full tuple collapses identical events.
const SONGPLAYS_INSERT: &str = "INSERT INTO songplays
(start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT DISTINCT se.ts, se.userId, se.level, ss.song_id, ss.artist_id, se.sessionId, se.location, se.userAgent
FROM staging_events se
JOIN staging_songs ss ON se.song = ss.title AND se.artist = ss.artist_name AND se.length = ss.duration
WHERE se.page = 'NextSong'
AND se.userId IS NOT NULL
AND ss.song_id IS NOT NULL
AND ss.artist_id IS NOT NULL
ORDER BY se.ts";

const USERS_INSERT: &str = "INSERT INTO users
(user_id, first_name, last_name, gender, level)
SELECT userId, firstName, lastName, gender, level
FROM (
    SELECT userId, firstName, lastName, gender, level,
           ROW_NUMBER() OVER (
               PARTITION BY userId
               ORDER BY ts DESC NULLS LAST, sessionId DESC NULLS LAST,
                        itemInSession DESC NULLS LAST, level DESC NULLS LAST,
                        firstName DESC NULLS LAST, lastName DESC NULLS LAST,
                        gender DESC NULLS LAST
           ) AS recency
    FROM staging_events
    WHERE userId IS NOT NULL
) latest
WHERE recency = 1
ORDER BY userId";

const REDSHIFT_TIME_INSERT: &str = "INSERT INTO time
(start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT start_time,
EXTRACT(HOUR FROM start_time), EXTRACT(DAY FROM start_time),
EXTRACT(WEEK FROM start_time), EXTRACT(MONTH FROM start_time),
EXTRACT(YEAR FROM start_time), EXTRACT(DOW FROM start_time)
FROM songplays";

// %V is the ISO week and %w puts Sunday at 0, matching Redshift's WEEK and DOW.
const SQLITE_TIME_INSERT: &str = "INSERT INTO time
(start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT start_time,
CAST(strftime('%H', start_time) AS INTEGER), CAST(strftime('%d', start_time) AS INTEGER),
CAST(strftime('%V', start_time) AS INTEGER), CAST(strftime('%m', start_time) AS INTEGER),
CAST(strftime('%Y', start_time) AS INTEGER), strftime('%w', start_time)
FROM songplays";

impl Transform {
    pub const ALL: [Transform; 5] = [
        Transform::SongPlays,
        Transform::Users,
        Transform::Songs,
        Transform::Artists,
        Transform::Time,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Transform::SongPlays => "BuildSongPlay",
            Transform::Users => "BuildUser",
            Transform::Songs => "BuildSong",
            Transform::Artists => "BuildArtist",
            Transform::Time => "BuildTime",
        }
    }

    pub fn target(&self) -> &'static Table {
        match self {
            Transform::SongPlays => &SONGPLAYS_TABLE,
            Transform::Users => &USERS_TABLE,
            Transform::Songs => &SONGS_TABLE,
            Transform::Artists => &ARTISTS_TABLE,
            Transform::Time => &TIME_TABLE,
        }
    }

    /// Tables read by the transform.
    pub fn sources(&self) -> Vec<&'static Table> {
        match self {
            Transform::SongPlays => vec![&STAGING_EVENTS_TABLE, &STAGING_SONGS_TABLE],
            Transform::Users => vec![&STAGING_EVENTS_TABLE],
            Transform::Songs | Transform::Artists => vec![&STAGING_SONGS_TABLE],
            Transform::Time => vec![&SONGPLAYS_TABLE],
        }
    }

    pub fn sql(&self, dialect: Dialect) -> String {
        match self {
            Transform::SongPlays => SONGPLAYS_INSERT.to_string(),
            Transform::Users => USERS_INSERT.to_string(),
            Transform::Songs => first_seen_insert(
                "songs (song_id, title, artist_id, year, duration)",
                "song_id",
                &["title", "artist_id", "year", "duration"],
                dialect,
            ),
            Transform::Artists => first_seen_insert(
                "artists (artist_id, name, location, latitude, longitude)",
                "artist_id",
                &[
                    "artist_name",
                    "artist_location",
                    "artist_latitude",
                    "artist_longitude",
                ],
                dialect,
            ),
            Transform::Time => match dialect {
                Dialect::Redshift => REDSHIFT_TIME_INSERT.to_string(),
                Dialect::Sqlite => SQLITE_TIME_INSERT.to_string(),
            },
        }
    }
}

/// One row per non-null `key` of `staging_songs`, keeping the first row seen
/// for each key when the catalog disagrees with itself.
fn first_seen_insert(target: &str, key: &str, columns: &[&str], dialect: Dialect) -> String {
    let projection = std::iter::once(key)
        .chain(columns.iter().copied())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {target}
SELECT {projection}
FROM (
    SELECT {projection},
           ROW_NUMBER() OVER (PARTITION BY {key} ORDER BY {order}) AS seen
    FROM staging_songs
    WHERE {key} IS NOT NULL
) first_seen
WHERE seen = 1
ORDER BY {key}",
        order = dialect.load_order(columns),
    )
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
