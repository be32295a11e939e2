//! Ordered catalog of every statement the pipeline runs.
//!
//! Drop and create statements are rendered from the table definitions in
//! [`crate::warehouse::schema`]. Copy statements are rendered from a
//! [`CopySource`], the only parameterized template. Insert statements are
//! fixed SQL.

use std::fmt;

use crate::config::StorageConfig;
use crate::warehouse::schema::{
    self, DIM_ARTIST, DIM_SONG, DIM_TIME, DIM_USER, SONGPLAY, STAGING_EVENTS, STAGING_SONGS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Drop,
    Create,
    Copy,
    Insert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Drop => "drop",
            StatementKind::Create => "create",
            StatementKind::Copy => "copy",
            StatementKind::Insert => "insert",
        };
        f.write_str(name)
    }
}

/// A named, fully rendered SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub name: String,
    pub kind: StatementKind,
    pub sql: String,
}

impl Statement {
    pub fn new(kind: StatementKind, target: &str, sql: impl Into<String>) -> Self {
        Self {
            name: format!("{kind}_{target}"),
            kind,
            sql: sql.into(),
        }
    }
}

/// Bulk-copy of a JSON prefix in object storage into a staging table.
///
/// The warehouse fetches and parses the files itself; authorization comes
/// from the IAM role it assumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource<'a> {
    pub table: &'a str,
    pub path: &'a str,
    pub iam_role: &'a str,
    pub region: &'a str,
    pub json_format: &'a str,
}

impl CopySource<'_> {
    pub fn render(&self) -> String {
        format!(
            "COPY {table}\n    FROM '{path}'\nCREDENTIALS 'aws_iam_role={role}'\nCOMPUPDATE ON\nFORMAT AS JSON '{format}'\nREGION '{region}';",
            table = self.table,
            path = quote_literal(self.path),
            role = quote_literal(self.iam_role),
            format = quote_literal(self.json_format),
            region = quote_literal(self.region),
        )
    }
}

/// Escapes a value for use inside a single-quoted SQL literal.
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

pub const SONGPLAY_INSERT: &str = "
INSERT INTO songplay
    (
    start_time,
    user_id,
    level,
    song_id,
    artist_id,
    session_id,
    location,
    user_agent
    )
SELECT
    e.ts,
    e.userid,
    e.level,
    s.song_id,
    s.artist_id,
    e.sessionid,
    e.location,
    e.useragent
FROM stg_events AS e
JOIN stg_songs AS s
ON e.artist = s.artist_name
AND e.song = s.title
";

pub const DIM_USER_INSERT: &str = "
INSERT INTO dim_user
SELECT DISTINCT
    userid,
    firstname,
    lastname,
    gender,
    level
FROM stg_events
WHERE userid IS NOT NULL
";

pub const DIM_SONG_INSERT: &str = "
INSERT INTO dim_song
SELECT DISTINCT
    song_id,
    title,
    artist_id,
    year,
    duration
FROM stg_songs
";

pub const DIM_ARTIST_INSERT: &str = "
INSERT INTO dim_artist
SELECT DISTINCT
    s.artist_id,
    s.artist_name,
    e.location,
    s.artist_latitude,
    s.artist_longitude
FROM stg_songs AS s
JOIN stg_events AS e
ON s.artist_name = e.artist
";

pub const DIM_TIME_INSERT: &str = "
INSERT INTO dim_time
SELECT
    ts,
    EXTRACT(HOUR FROM start_ts),
    EXTRACT(DAY FROM start_ts),
    EXTRACT(WEEK FROM start_ts),
    EXTRACT(MONTH FROM start_ts),
    EXTRACT(YEAR FROM start_ts),
    EXTRACT(DOW FROM start_ts)
FROM (
    SELECT DISTINCT
        ts,
        TIMESTAMP 'epoch' + (ts / 1000) * INTERVAL '1 second' AS start_ts
    FROM stg_events
    WHERE ts IS NOT NULL
) AS t
";

/// Staged events that name a song but match no staged song on (artist, title).
/// These are the rows the songplay join drops.
pub const UNMATCHED_EVENTS_QUERY: &str = "
SELECT COUNT(*)
FROM stg_events AS e
WHERE e.song IS NOT NULL
AND NOT EXISTS (
    SELECT 1 FROM stg_songs AS s
    WHERE e.artist = s.artist_name
    AND e.song = s.title
)
";

pub const FIRST_EVENT_TS_QUERY: &str = "SELECT MIN(ts) FROM stg_events";
pub const LAST_EVENT_TS_QUERY: &str = "SELECT MAX(ts) FROM stg_events";

/// The four statement lists, in pipeline order.
#[derive(Debug, Clone)]
pub struct StatementCatalog {
    pub drop: Vec<Statement>,
    pub create: Vec<Statement>,
    pub copy: Vec<Statement>,
    pub insert: Vec<Statement>,
}

impl StatementCatalog {
    /// Renders every statement. `region` is the already resolved storage region.
    pub fn build(storage: &StorageConfig, iam_role: &str, region: &str) -> Self {
        let tables = schema::star_schema();

        let drop = tables
            .iter()
            .map(|t| Statement::new(StatementKind::Drop, t.name(), t.drop_sql()))
            .collect();
        let create = tables
            .iter()
            .map(|t| Statement::new(StatementKind::Create, t.name(), t.create_sql()))
            .collect();

        let copy = [
            (STAGING_EVENTS, storage.log_data.as_str()),
            (STAGING_SONGS, storage.song_data.as_str()),
        ]
        .into_iter()
        .map(|(table, path)| {
            let source = CopySource {
                table,
                path,
                iam_role,
                region,
                json_format: &storage.log_jsonpath,
            };
            Statement::new(StatementKind::Copy, table, source.render())
        })
        .collect();

        let insert = [
            (SONGPLAY, SONGPLAY_INSERT),
            (DIM_USER, DIM_USER_INSERT),
            (DIM_SONG, DIM_SONG_INSERT),
            (DIM_ARTIST, DIM_ARTIST_INSERT),
            (DIM_TIME, DIM_TIME_INSERT),
        ]
        .into_iter()
        .map(|(table, sql)| Statement::new(StatementKind::Insert, table, sql))
        .collect();

        Self {
            drop,
            create,
            copy,
            insert,
        }
    }

    /// Lists in the order they must run: drop, create, copy, insert.
    pub fn stages(&self) -> [(StatementKind, &[Statement]); 4] {
        [
            (StatementKind::Drop, self.drop.as_slice()),
            (StatementKind::Create, self.create.as_slice()),
            (StatementKind::Copy, self.copy.as_slice()),
            (StatementKind::Insert, self.insert.as_slice()),
        ]
    }

    pub fn statement_count(&self) -> usize {
        self.stages().iter().map(|(_, list)| list.len()).sum()
    }
}
