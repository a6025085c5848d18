//! Audit ledger: one CSV row per item id, the only state shared across runs.
//!
//! The whole file is rewritten on every upsert. Rows are keyed on the
//! `Item ID` column alone and carried over byte-for-byte, so rows written by
//! other tools or older versions keep their dedup effect even when their
//! status or timestamp does not parse. A missing, empty or unreadable file
//! reads as an empty ledger.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AutoApplyError;
use crate::state_machine::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "Item ID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "Status")]
    pub outcome: Outcome,
    #[serde(rename = "Applied At", with = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

const HEADERS: [&str; 5] = ["Item ID", "Title", "Organization", "Status", "Applied At"];

/// Raw contents of the ledger file.
#[derive(Debug, Default)]
struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn id_column(&self) -> usize {
        self.headers
            .iter()
            .position(|h| h.trim() == HEADERS[0])
            .unwrap_or(0)
    }

    fn id_of<'r>(&self, row: &'r StringRecord) -> Option<&'r str> {
        row.get(self.id_column()).map(str::trim)
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if any row carries `id`, whatever the rest of the row holds.
    pub fn has(&self, id: &str) -> bool {
        let table = self.read();
        table.rows.iter().any(|row| table.id_of(row) == Some(id))
    }

    /// Typed entry for `id`; `None` if absent or if its row does not parse.
    pub fn get(&self, id: &str) -> Option<LedgerEntry> {
        self.entries().into_iter().find(|e| e.id == id)
    }

    /// Replaces any entry for `id` with a fresh one and rewrites the file.
    pub fn record(
        &self,
        id: &str,
        title: &str,
        organization: &str,
        outcome: &Outcome,
    ) -> Result<LedgerEntry, AutoApplyError> {
        let entry = LedgerEntry {
            id: id.to_string(),
            title: title.to_string(),
            organization: organization.to_string(),
            outcome: outcome.clone(),
            recorded_at: Utc::now(),
        };

        let mut table = self.read();
        let before = table.rows.len();
        let id_column = table.id_column();
        table
            .rows
            .retain(|row| row.get(id_column).map(str::trim) != Some(id));
        if table.rows.len() < before {
            debug!(id, "replacing previous ledger row");
        }
        self.rewrite(&table.rows, &entry)?;

        debug!(id, outcome = %outcome, path = %self.path.display(), "ledger updated");
        Ok(entry)
    }

    /// Every entry that parses, in file order. Rows that do not parse are
    /// skipped here but stay in the file.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let table = self.read();
        let canonical = StringRecord::from(HEADERS.to_vec());
        let headers = if table.headers.is_empty() {
            &canonical
        } else {
            &table.headers
        };

        let mut entries = Vec::new();
        for (line, row) in table.rows.iter().enumerate() {
            match row.deserialize::<LedgerEntry>(Some(headers)) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(path = %self.path.display(), row = line + 1, error = %e, "ledger row does not parse");
                }
            }
        }
        entries
    }

    fn read(&self) -> Table {
        if !self.path.exists() {
            return Table::default();
        }
        let mut reader = match csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger unreadable, treating as empty");
                return Table::default();
            }
        };
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ledger header unreadable, treating as empty");
                return Table::default();
            }
        };

        let mut rows = Vec::new();
        for (line, row) in reader.records().enumerate() {
            match row {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(path = %self.path.display(), row = line + 1, error = %e, "dropping unreadable ledger row");
                }
            }
        }
        Table { headers, rows }
    }

    fn rewrite(&self, rows: &[StringRecord], entry: &LedgerEntry) -> Result<(), AutoApplyError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&tmp)?;
            writer.write_record(HEADERS)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.serialize(entry)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// `Applied At` is written as RFC 3339 in UTC. Naive ISO-8601 timestamps,
/// as other writers of this file produce, read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(de::Error::custom)
    }
}
