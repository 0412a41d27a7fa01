//! The persisted, date-keyed headline history.
//!
//! The store is a single JSON object mapping ISO dates to payload strings,
//! each payload being an encoded [`HeadlineRecord`]:
//!
//! ```text
//! {
//!   "2024-01-01": "{\"Opinion\":\"Campus protests grow\"}",
//!   "2024-01-02": "{\"Multimedia\":\"Photos: Spring Fling\"}"
//! }
//! ```
//!
//! # Update rules
//!
//! - Recording a date that already has an entry replaces it (last write wins).
//! - Entries for other dates are never touched.
//! - A missing file loads as an empty log. An unparsable file is an error and
//!   is never overwritten.
//! - [`EventLog::persist`] writes to a temporary file next to the store and
//!   renames it into place, so readers see either the old or the new file.

use crate::error::StoreError;
use crate::models::HeadlineRecord;
use chrono::NaiveDate;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info, instrument, warn};

/// Date → payload history, kept in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: BTreeMap<NaiveDate, String>,
}

/// Parse a store key. Only the zero-padded `YYYY-MM-DD` form that
/// [`EventLog::persist`] writes is accepted, so no two keys in a valid file
/// can name the same date.
fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .ok()
        .filter(|date| date.to_string() == key)
}

struct EventLogVisitor;

impl<'de> Visitor<'de> for EventLogVisitor {
    type Value = EventLog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping YYYY-MM-DD dates to payload strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<EventLog, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, payload)) = map.next_entry::<String, String>()? {
            let date = parse_date_key(&key)
                .ok_or_else(|| de::Error::custom(format!("invalid date key {key:?}")))?;
            if entries.insert(date, payload).is_some() {
                return Err(de::Error::custom(format!("duplicate date key {key:?}")));
            }
        }
        Ok(EventLog { entries })
    }
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EventLogVisitor)
    }
}

/// Mode for a store created from scratch; the process umask still applies.
#[cfg(unix)]
fn new_store_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn new_store_permissions() -> Option<fs::Permissions> {
    None
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log stored at `path`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Read`] if the file exists but cannot be read
    /// - [`StoreError::Corrupt`] if its contents are not a date → string object
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No existing store; starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        // Parsing from bytes reports invalid UTF-8 and empty files as JSON errors.
        let log: EventLog = serde_json::from_slice(&contents).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        if log.is_empty() {
            warn!("Store exists but holds no entries");
        }
        info!(days = log.len(), latest = ?log.latest().map(|(date, _)| date), "Loaded store");
        Ok(log)
    }

    /// Store `payload` under `date`, returning the payload it replaced.
    pub fn record(&mut self, date: NaiveDate, payload: String) -> Option<String> {
        let previous = self.entries.insert(date, payload);
        debug!(%date, replaced = previous.is_some(), "Recorded entry");
        previous
    }

    /// Encode `headlines` and record them under `date`.
    ///
    /// An empty record is not stored: the date is left as it was and `false`
    /// is returned.
    pub fn record_headlines(
        &mut self,
        date: NaiveDate,
        headlines: &HeadlineRecord,
    ) -> Result<bool, StoreError> {
        if headlines.is_empty() {
            return Ok(false);
        }
        let payload = headlines.to_payload()?;
        self.record(date, payload);
        Ok(true)
    }

    /// Write the whole log to `path`, replacing the file atomically.
    ///
    /// The parent directory must already exist.
    #[instrument(level = "info", skip_all, fields(path = %path.display(), days = self.len()))]
    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let write_err = |source: io::Error| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let existing = match fs::metadata(path) {
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(write_err(source)),
        };

        let mut builder = Builder::new();
        builder.prefix(".store").suffix(".tmp");
        if existing.is_none() {
            if let Some(permissions) = new_store_permissions() {
                builder.permissions(permissions);
            }
        }
        let mut tmp: NamedTempFile = builder.tempfile_in(dir).map_err(write_err)?;
        if let Some(permissions) = existing {
            tmp.as_file().set_permissions(permissions).map_err(write_err)?;
        }
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(bytes = json.len(), "Persisted store");
        Ok(())
    }

    /// Raw payload stored under `date`.
    pub fn get(&self, date: NaiveDate) -> Option<&str> {
        self.entries.get(&date).map(String::as_str)
    }

    /// Decode the headlines stored under `date`, if any.
    pub fn headlines(&self, date: NaiveDate) -> Option<Result<HeadlineRecord, serde_json::Error>> {
        self.get(date).map(HeadlineRecord::from_payload)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<(NaiveDate, &str)> {
        self.entries
            .iter()
            .next_back()
            .map(|(date, payload)| (*date, payload.as_str()))
    }

    /// Entries strictly earlier than `date`, oldest first.
    pub fn entries_before(&self, date: NaiveDate) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.entries
            .range(..date)
            .map(|(date, payload)| (*date, payload.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &str)> {
        self.entries
            .iter()
            .map(|(date, payload)| (*date, payload.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(pairs: &[(Section, &str)]) -> HeadlineRecord {
        let mut record = HeadlineRecord::new();
        for (section, headline) in pairs {
            record.insert(*section, headline.to_string());
        }
        record
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = EventLog::load(&dir.path().join("missing.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_fails_and_leaves_it_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let garbage = b"{\"2024-01-01\": \"{\\\"Opinion\\\"";
        fs::write(&path, garbage).unwrap();

        let err = EventLog::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(fs::read(&path).unwrap(), garbage);
    }

    #[test]
    fn test_load_rejects_non_date_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"yesterday": "{}"}"#).unwrap();

        assert!(matches!(
            EventLog::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_rejects_structured_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"2024-01-01": {"Opinion": "Not double encoded"}}"#).unwrap();

        assert!(matches!(
            EventLog::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_load_existing_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"2024-01-01": "{\"Opinion\": \"Campus protests grow\"}"}"#,
        )
        .unwrap();

        let log = EventLog::load(&path).unwrap();
        assert_eq!(log.len(), 1);
        let headlines = log.headlines(date("2024-01-01")).unwrap().unwrap();
        assert_eq!(headlines.get(Section::Opinion), Some("Campus protests grow"));
    }

    #[test]
    fn test_persist_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut log = EventLog::new();
        log.record(date("2024-01-01"), r#"{"Opinion":"A"}"#.to_string());
        log.record(date("2024-02-29"), r#"{"Podcasts":"Ünïcödé \"quoted\""}"#.to_string());
        log.record(date("2023-12-31"), "{}".to_string());

        log.persist(&path).unwrap();

        assert_eq!(EventLog::load(&path).unwrap(), log);
    }

    #[test]
    fn test_persisted_layout_is_double_encoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut log = EventLog::new();
        log.record_headlines(date("2024-01-02"), &record(&[(Section::Opinion, "Campus protests grow")]))
            .unwrap();
        log.persist(&path).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({"2024-01-02": "{\"Opinion\":\"Campus protests grow\"}"})
        );
    }

    #[test]
    fn test_same_day_record_replaces_previous_payload() {
        let mut log = EventLog::new();
        let day = date("2024-03-10");

        log.record_headlines(day, &record(&[(Section::Opinion, "First"), (Section::Podcasts, "Pod")]))
            .unwrap();
        log.record_headlines(day, &record(&[(Section::Multimedia, "Second")]))
            .unwrap();

        assert_eq!(log.len(), 1);
        let stored = log.headlines(day).unwrap().unwrap();
        assert_eq!(stored, record(&[(Section::Multimedia, "Second")]));
    }

    #[test]
    fn test_record_returns_replaced_payload() {
        let mut log = EventLog::new();
        let day = date("2024-03-10");
        assert_eq!(log.record(day, "one".to_string()), None);
        assert_eq!(log.record(day, "two".to_string()), Some("one".to_string()));
        assert_eq!(log.get(day), Some("two"));
    }

    #[test]
    fn test_later_day_leaves_earlier_entries_untouched() {
        let mut log = EventLog::new();
        log.record(date("2024-01-01"), r#"{"Opinion":"Old"}"#.to_string());
        log.record(date("2024-01-05"), r#"{"Opinion":"Older run"}"#.to_string());
        let today = date("2024-01-06");
        let before: Vec<(NaiveDate, String)> = log
            .entries_before(today)
            .map(|(d, p)| (d, p.to_string()))
            .collect();

        log.record_headlines(today, &record(&[(Section::Opinion, "New")]))
            .unwrap();

        let after: Vec<(NaiveDate, String)> = log
            .entries_before(today)
            .map(|(d, p)| (d, p.to_string()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().map(|(d, _)| d), Some(today));
    }

    #[test]
    fn test_empty_headlines_are_not_recorded() {
        let mut log = EventLog::new();
        let day = date("2024-04-01");
        log.record(day, r#"{"Opinion":"Earlier today"}"#.to_string());

        let recorded = log.record_headlines(day, &HeadlineRecord::new()).unwrap();

        assert!(!recorded);
        assert_eq!(log.get(day), Some(r#"{"Opinion":"Earlier today"}"#));
    }

    #[test]
    fn test_entries_are_chronological() {
        let mut log = EventLog::new();
        log.record(date("2024-05-02"), "b".to_string());
        log.record(date("2023-11-30"), "a".to_string());
        log.record(date("2024-05-10"), "c".to_string());

        let dates: Vec<String> = log.iter().map(|(d, _)| d.to_string()).collect();
        assert_eq!(dates, ["2023-11-30", "2024-05-02", "2024-05-10"]);
    }

    #[test]
    fn test_persist_replaces_existing_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{}").unwrap();

        let mut log = EventLog::load(&path).unwrap();
        log.record(date("2024-01-01"), "{}".to_string());
        log.persist(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
        assert_eq!(EventLog::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent").join("store.json");

        let err = EventLog::new().persist(&path).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_rejects_unpadded_date_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let contents = r#"{"2024-1-5": "{\"Opinion\":\"A\"}"}"#;
        fs::write(&path, contents).unwrap();

        assert!(matches!(
            EventLog::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_load_rejects_keys_naming_the_same_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let contents = r#"{"2024-1-1": "A", "2024-01-01": "B"}"#;
        fs::write(&path, contents).unwrap();

        assert!(matches!(
            EventLog::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_load_rejects_repeated_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"2024-01-01": "A", "2024-01-01": "B"}"#).unwrap();

        assert!(matches!(
            EventLog::load(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_date_key_must_be_canonical() {
        assert_eq!(parse_date_key("2024-02-29"), Some(date("2024-02-29")));
        assert_eq!(parse_date_key("2024-2-29"), None);
        assert_eq!(parse_date_key("2023-02-29"), None);
        assert_eq!(parse_date_key(" 2024-02-29"), None);
    }

    #[test]
    fn test_load_invalid_utf8_is_corrupt_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let bytes = b"{\"2024-01-01\": \"\xff\xfe\"}";
        fs::write(&path, bytes).unwrap();

        let err = EventLog::load(&path).unwrap_err();

        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_load_empty_file_is_corrupt_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"").unwrap();

        let err = EventLog::load(&path).unwrap_err();

        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(fs::read(&path).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_persist_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut log = EventLog::load(&path).unwrap();
        log.record(date("2024-01-01"), "{}".to_string());
        log.persist(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_store_gets_default_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let sibling = dir.path().join("plain.txt");
        fs::write(&sibling, "").unwrap();
        let path = dir.path().join("store.json");

        EventLog::new().persist(&path).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), mode(&sibling));
    }
}
