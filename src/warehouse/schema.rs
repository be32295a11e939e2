//! The star schema: two staging tables, one fact table, four dimensions.

use crate::warehouse::{Column, ColumnType, Table};

use ColumnType::{BigInt, Decimal, Int, Varchar};

pub const STAGING_EVENTS: &str = "stg_events";
pub const STAGING_SONGS: &str = "stg_songs";
pub const SONGPLAY: &str = "songplay";
pub const DIM_USER: &str = "dim_user";
pub const DIM_SONG: &str = "dim_song";
pub const DIM_ARTIST: &str = "dim_artist";
pub const DIM_TIME: &str = "dim_time";

/// Raw listening-event log rows, bulk-loaded from the event JSON files.
pub fn staging_events() -> Table {
    Table::new(
        STAGING_EVENTS,
        vec![
            Column::new("artist", Varchar),
            Column::new("auth", Varchar),
            Column::new("firstname", Varchar),
            Column::new("gender", Varchar),
            Column::new("iteminsession", BigInt),
            Column::new("lastname", Varchar),
            Column::new("length", Decimal),
            Column::new("level", Varchar),
            Column::new("location", Varchar),
            Column::new("method", Varchar),
            Column::new("page", Varchar),
            Column::new("registration", Decimal),
            Column::new("sessionid", Int),
            Column::new("song", Varchar),
            Column::new("status", Int),
            Column::new("ts", BigInt),
            Column::new("useragent", Varchar),
            Column::new("userid", Int),
        ],
    )
}

/// Raw song-catalog rows, bulk-loaded from the song JSON files.
pub fn staging_songs() -> Table {
    Table::new(
        STAGING_SONGS,
        vec![
            Column::new("num_songs", Int),
            Column::new("artist_id", Varchar),
            Column::new("artist_latitude", Decimal),
            Column::new("artist_longitude", Decimal),
            Column::new("artist_name", Varchar),
            Column::new("song_id", Varchar).not_null(),
            Column::new("title", Varchar),
            Column::new("duration", Decimal),
            Column::new("year", Int),
        ],
    )
}

/// Fact table, one row per play event joined to its song and artist.
pub fn songplay() -> Table {
    Table::new(
        SONGPLAY,
        vec![
            Column::new("songplay_id", Int).identity(),
            Column::new("start_time", Varchar),
            Column::new("user_id", Varchar).not_null(),
            Column::new("level", Varchar),
            Column::new("song_id", Varchar).not_null(),
            Column::new("artist_id", Varchar).not_null(),
            Column::new("session_id", Varchar).not_null(),
            Column::new("location", Varchar),
            Column::new("user_agent", Varchar),
        ],
    )
}

pub fn dim_user() -> Table {
    Table::new(
        DIM_USER,
        vec![
            Column::new("user_id", Int).primary_key(),
            Column::new("first_name", Varchar),
            Column::new("last_name", Varchar),
            Column::new("gender", Varchar),
            Column::new("level", Varchar),
        ],
    )
}

pub fn dim_song() -> Table {
    Table::new(
        DIM_SONG,
        vec![
            Column::new("song_id", Varchar).primary_key(),
            Column::new("title", Varchar),
            Column::new("artist_id", Varchar).not_null(),
            Column::new("year", Int),
            Column::new("duration", Decimal),
        ],
    )
}

// `lattitude` is the deployed column name; downstream queries depend on it.
pub fn dim_artist() -> Table {
    Table::new(
        DIM_ARTIST,
        vec![
            Column::new("artist_id", Varchar).primary_key(),
            Column::new("name", Varchar),
            Column::new("location", Varchar),
            Column::new("lattitude", Decimal),
            Column::new("longitude", Decimal),
        ],
    )
}

/// Calendar breakdown of every distinct event timestamp. `start_time` holds
/// the raw epoch milliseconds, not a decoded timestamp.
pub fn dim_time() -> Table {
    Table::new(
        DIM_TIME,
        vec![
            Column::new("start_time", Varchar).primary_key(),
            Column::new("hour", Int).not_null(),
            Column::new("day", Int).not_null(),
            Column::new("week", Int).not_null(),
            Column::new("month", Int).not_null(),
            Column::new("year", Int).not_null(),
            Column::new("weekday", Int).not_null(),
        ],
    )
}

/// All tables in declaration order.
pub fn star_schema() -> Vec<Table> {
    vec![
        staging_events(),
        staging_songs(),
        songplay(),
        dim_user(),
        dim_song(),
        dim_artist(),
        dim_time(),
    ]
}
