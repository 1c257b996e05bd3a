mod table;
pub mod tables;

pub use table::{Column, SqlType, Table};
pub use tables::{
    ALL_TABLES, ARTISTS_TABLE, SONGPLAYS_TABLE, SONGS_TABLE, STAGING_EVENTS_TABLE,
    STAGING_SONGS_TABLE, STAGING_TABLES, TIME_TABLE, USERS_TABLE, WAREHOUSE_TABLES,
};
