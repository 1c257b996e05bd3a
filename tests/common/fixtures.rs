//! Test fixture creation for source files and pipeline configuration
//!
//! Sources are laid out the way the production buckets are: the activity log
//! as newline-delimited JSON partitioned by date, the catalog as one JSON
//! object per file, and a JSONPaths document for the events.

use super::constants::*;
use anyhow::Result;
use serde_json::{json, Value};
use songplays_etl::config::{FileConfig, PipelineConfig};
use songplays_etl::schema::STAGING_EVENTS_TABLE;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A NextSong event with plausible values for every logged field.
pub fn play_event(
    user_id: i64,
    song: &str,
    artist: &str,
    length: f64,
    ts: i64,
    level: &str,
) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": format!("First{}", user_id),
        "gender": "F",
        "itemInSession": 0,
        "lastName": format!("Last{}", user_id),
        "length": length,
        "level": level,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1541048010796.0,
        "sessionId": 100 + user_id,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)",
        // The activity log carries user ids as strings.
        "userId": user_id.to_string(),
    })
}

/// A non-play event, which has no song fields.
pub fn page_event(user_id: Option<i64>, page: &str, ts: i64) -> Value {
    let auth = match user_id {
        Some(_) => "Logged In",
        None => "Logged Out",
    };
    json!({
        "artist": null,
        "auth": auth,
        "firstName": user_id.map(|id| format!("First{}", id)),
        "gender": user_id.map(|_| "F"),
        "itemInSession": 1,
        "lastName": user_id.map(|id| format!("Last{}", id)),
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": page,
        "registration": null,
        "sessionId": 500,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": user_id.map(|id| id.to_string()).unwrap_or_default(),
    })
}

pub fn catalog_entry(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    artist_location: &str,
    duration: f64,
    year: i64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": artist_location,
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year,
    })
}

/// The default activity log: three catalog plays, one play of an unknown
/// song, one page view and one logged-out play.
pub fn default_events() -> Vec<Value> {
    let mut yellow = play_event(
        LILY_ID,
        YELLOW_TITLE,
        COLDPLAY_NAME,
        YELLOW_DURATION,
        YELLOW_TS,
        "paid",
    );
    yellow["itemInSession"] = json!(1);

    let mut logged_out = play_event(0, "Clocks", COLDPLAY_NAME, 307.0, LOGGED_OUT_TS, "free");
    logged_out["userId"] = json!("");
    logged_out["auth"] = json!("Logged Out");

    vec![
        play_event(
            LILY_ID,
            FIX_YOU_TITLE,
            COLDPLAY_NAME,
            FIX_YOU_DURATION,
            FIX_YOU_TS,
            "free",
        ),
        yellow,
        play_event(JACOB_ID, HALO_TITLE, BEYONCE_NAME, HALO_DURATION, HALO_TS, "free"),
        page_event(Some(JACOB_ID), "Home", HOME_TS),
        play_event(KATE_ID, "Nope", "Nobody", 100.0, UNMATCHED_TS, "free"),
        logged_out,
    ]
}

/// The default catalog, one song per file. Coldplay is listed twice with
/// different locations.
pub fn default_catalog() -> Vec<(&'static str, Value)> {
    vec![
        (
            "A/A/A/TRAAAXX128F.json",
            catalog_entry(
                FIX_YOU_ID,
                FIX_YOU_TITLE,
                COLDPLAY_ID,
                COLDPLAY_NAME,
                COLDPLAY_FIRST_LOCATION,
                FIX_YOU_DURATION,
                2005,
            ),
        ),
        (
            "A/A/B/TRAABAA128F.json",
            catalog_entry(
                YELLOW_ID,
                YELLOW_TITLE,
                COLDPLAY_ID,
                COLDPLAY_NAME,
                COLDPLAY_OTHER_LOCATION,
                YELLOW_DURATION,
                2000,
            ),
        ),
        (
            "A/B/A/TRABABB128F.json",
            catalog_entry(
                HALO_ID,
                HALO_TITLE,
                BEYONCE_ID,
                BEYONCE_NAME,
                "Houston, TX",
                HALO_DURATION,
                2008,
            ),
        ),
    ]
}

/// Source files, format spec and warehouse file of one test run, all kept
/// in a temporary directory.
pub struct TestWorkspace {
    pub dir: TempDir,
    pub events_dir: PathBuf,
    pub songs_dir: PathBuf,
    pub format_spec: PathBuf,
    pub warehouse_path: PathBuf,
}

impl TestWorkspace {
    /// A workspace holding the default activity log and catalog.
    pub fn new() -> Result<Self> {
        let workspace = Self::empty()?;
        workspace.write_events("2018/11/2018-11-01-events.json", &default_events())?;
        for (file, entry) in default_catalog() {
            workspace.write_song(file, &entry)?;
        }
        Ok(workspace)
    }

    /// A workspace with empty source directories and a JSONPaths document
    /// for the events table.
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        let events_dir = dir.path().join("log_data");
        let songs_dir = dir.path().join("song_data");
        fs::create_dir_all(&events_dir)?;
        fs::create_dir_all(&songs_dir)?;

        let paths: Vec<String> = STAGING_EVENTS_TABLE
            .column_names()
            .into_iter()
            .map(|name| format!("$['{}']", name))
            .collect();
        let format_spec = dir.path().join("log_json_path.json");
        fs::write(
            &format_spec,
            serde_json::to_string_pretty(&json!({ "jsonpaths": paths }))?,
        )?;

        let warehouse_path = dir.path().join("warehouse.db");
        Ok(Self {
            dir,
            events_dir,
            songs_dir,
            format_spec,
            warehouse_path,
        })
    }

    /// Writes `events` as newline-delimited JSON under the log directory.
    pub fn write_events(&self, file: &str, events: &[Value]) -> Result<PathBuf> {
        let lines: Vec<String> = events.iter().map(Value::to_string).collect();
        self.write_raw_events(file, &lines.join("\n"))
    }

    pub fn write_raw_events(&self, file: &str, content: &str) -> Result<PathBuf> {
        write_file(&self.events_dir.join(file), content)
    }

    pub fn write_song(&self, file: &str, entry: &Value) -> Result<PathBuf> {
        write_file(&self.songs_dir.join(file), &entry.to_string())
    }

    /// TOML configuration pointing a SQLite warehouse at this workspace.
    pub fn config_toml(&self, max_errors: u32) -> String {
        format!(
            r#"
[credential]
arn = '{arn}'

[storage]
events_uri = '{events}'
events_format_spec = '{format_spec}'
songs_uri = '{songs}'

[load]
max_errors = {max_errors}

[warehouse]
engine = "sqlite"
path = '{warehouse}'
"#,
            arn = CREDENTIAL_ARN,
            events = self.events_dir.display(),
            format_spec = self.format_spec.display(),
            songs = self.songs_dir.display(),
            warehouse = self.warehouse_path.display(),
        )
    }

    pub fn config(&self) -> Result<PipelineConfig> {
        self.config_with_max_errors(0)
    }

    pub fn config_with_max_errors(&self, max_errors: u32) -> Result<PipelineConfig> {
        Ok(PipelineConfig::resolve(FileConfig::parse(
            &self.config_toml(max_errors),
        )?)?)
    }

    /// Writes the configuration next to the sources and returns its path.
    pub fn write_config(&self, max_errors: u32) -> Result<PathBuf> {
        write_file(&self.dir.path().join("etl.toml"), &self.config_toml(max_errors))
    }
}

fn write_file(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(path.to_path_buf())
}
