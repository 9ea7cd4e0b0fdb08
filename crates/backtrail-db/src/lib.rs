// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use backtrail_app::{HistoryEntry, HistoryEntryId};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const APP_NAME: &str = "backtrail";

const DEMO_SITES: [(&str, &str); 16] = [
    ("https://www.rust-lang.org/learn", "Learn Rust - Rust Programming Language"),
    ("https://doc.rust-lang.org/book/", "The Rust Programming Language"),
    ("https://docs.rs/ratatui/latest/ratatui/", "ratatui - Rust"),
    ("https://crates.io/crates/rusqlite", "rusqlite - crates.io"),
    ("https://news.ycombinator.com/", "Hacker News"),
    ("https://en.wikipedia.org/wiki/Coffee", "Coffee - Wikipedia"),
    ("https://www.sweetmarias.com/green-coffee.html", "Green Coffee Beans"),
    ("https://github.com/ratatui/ratatui", "GitHub - ratatui/ratatui"),
    ("https://www.openstreetmap.org/", "OpenStreetMap"),
    ("https://weather.gov/", "National Weather Service"),
    ("https://www.seriouseats.com/pizza", "Pizza recipes | Serious Eats"),
    ("https://archive.org/", "Internet Archive"),
    ("https://sqlite.org/lang_select.html", "SELECT - SQLite"),
    ("https://developer.mozilla.org/en-US/docs/Web/HTTP", "HTTP | MDN"),
    ("https://time-rs.github.io/book/", "Introduction - time"),
    ("https://www.reddit.com/r/espresso/", "r/espresso"),
];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "visits",
    &["id", "url", "title", "favicon", "visited_at"],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_visits_visited_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_visited_at ON visits (visited_at);",
    },
    RequiredIndex {
        name: "idx_visits_url",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_visits_url ON visits (url);",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
    pub visited_at: OffsetDateTime,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        log::info!("opened history database {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn insert_visit(&self, visit: &NewVisit) -> Result<HistoryEntryId> {
        if visit.url.trim().is_empty() {
            bail!("visit url is required");
        }
        let visited_at = visit
            .visited_at
            .to_offset(UtcOffset::UTC)
            .format(&Rfc3339)
            .context("format visit timestamp")?;
        self.conn
            .execute(
                "INSERT INTO visits (url, title, favicon, visited_at) VALUES (?, ?, ?, ?)",
                params![visit.url, visit.title, visit.favicon, visited_at],
            )
            .with_context(|| format!("insert visit {}", visit.url))?;
        Ok(HistoryEntryId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, url, title, favicon, visited_at
                FROM visits
                ORDER BY visited_at DESC, id DESC
                ",
            )
            .context("prepare history query")?;
        let rows = stmt
            .query_map([], |row| {
                let visited_at_raw: String = row.get(4)?;
                Ok(HistoryEntry {
                    id: HistoryEntryId::new(row.get(0)?),
                    url: row.get(1)?,
                    title: row.get(2)?,
                    favicon: row.get(3)?,
                    visited_at: parse_datetime(&visited_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query history")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect history")
    }

    pub fn count_visits(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))
            .context("count visits")?;
        usize::try_from(count).map_err(|_| anyhow!("visit count out of range: {count}"))
    }

    /// Deletes the given visits in one transaction and returns how many rows went away.
    pub fn delete_visits(&self, ids: &[HistoryEntryId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin delete transaction")?;
        let mut removed = 0usize;
        {
            let mut stmt = tx
                .prepare("DELETE FROM visits WHERE id = ?")
                .context("prepare visit delete")?;
            for id in ids {
                removed += stmt
                    .execute(params![id.get()])
                    .with_context(|| format!("delete visit {}", id.get()))?;
            }
        }
        tx.commit().context("commit visit delete")?;
        log::info!("deleted {removed} visits");
        Ok(removed)
    }

    pub fn clear_history(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM visits", [])
            .context("clear browsing history")?;
        log::info!("cleared browsing history ({removed} visits)");
        Ok(removed)
    }

    /// Fills the store with a deterministic spread of visits over the last ~two months.
    pub fn seed_demo_data(&self, now: OffsetDateTime) -> Result<usize> {
        let mut inserted = 0usize;
        for round in 0..3_i64 {
            for (index, (url, title)) in DEMO_SITES.iter().enumerate() {
                let step = round * DEMO_SITES.len() as i64 + index as i64;
                let visited_at = now
                    - Duration::days((step * 7) % 45)
                    - Duration::minutes((step * 53) % (24 * 60));
                self.insert_visit(&NewVisit {
                    url: (*url).to_owned(),
                    title: (*title).to_owned(),
                    favicon: None,
                    visited_at,
                })?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("BACKTRAIL_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set BACKTRAIL_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("history.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a backtrail history database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
