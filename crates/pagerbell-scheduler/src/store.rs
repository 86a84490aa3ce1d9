//! File-based state store — one small JSON record.
//! Human-readable, rewritten once per poll cycle.

use chrono::{DateTime, Utc};
use pagerbell_core::error::{PagerbellError, Result};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// The only durable entity: what we saw last cycle and when we last warned ahead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub was_on_call: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_advance_notification_sent: Option<DateTime<Utc>>,
}

/// State file store.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state. A missing file is the OFF_CALL default; anything unreadable
    /// is an error, never a silent default.
    pub fn load(&self) -> Result<PersistedState> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting off-call", self.path.display());
                return Ok(PersistedState::default());
            }
            Err(e) => {
                return Err(PagerbellError::storage_read(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&json).map_err(|e| {
            PagerbellError::storage_read(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    /// Save state, creating parent directories. Writes and fsyncs a sibling temp
    /// file, then renames it into place so readers only ever see a whole record.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PagerbellError::storage_write(format!(
                    "failed to create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| PagerbellError::storage_write(format!("serialize error: {e}")))?;

        let tmp = self.tmp_path();
        write_synced(&tmp, json.as_bytes()).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            PagerbellError::storage_write(format!("failed to write {}: {e}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            PagerbellError::storage_write(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        tracing::debug!("💾 Saved state to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));
        let state = store.load().unwrap();
        assert!(!state.was_on_call);
        assert!(state.last_advance_notification_sent.is_none());
    }

    #[test]
    fn test_round_trip_with_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("state.json");
        let store = StateStore::new(&path);

        let sent = Utc::now() - Duration::hours(3);
        let original = PersistedState {
            was_on_call: true,
            last_advance_notification_sent: Some(sent),
        };
        store.save(&original).unwrap();
        assert!(path.exists());
        assert!(!store.tmp_path().exists());

        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_round_trip_without_timestamp_omits_field() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));
        let original = PersistedState {
            was_on_call: true,
            last_advance_notification_sent: None,
        };
        store.save(&original).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"was_on_call\": true"));
        assert!(!raw.contains("last_advance_notification_sent"));
        assert!(!raw.contains("null"));
        assert_eq!(store.load().unwrap(), original);
    }

    #[test]
    fn test_reads_documented_layout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(
            &path,
            r#"{ "was_on_call": false, "last_advance_notification_sent": "2026-03-01T08:30:00Z" }"#,
        )
        .unwrap();
        let state = StateStore::new(&path).load().unwrap();
        assert_eq!(
            state.last_advance_notification_sent,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_corrupt_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PagerbellError::StorageRead(_)));
    }

    #[test]
    fn test_unreachable_record_is_read_error() {
        let tmp = TempDir::new().unwrap();
        // Parent is a regular file: ENOTDIR, not a missing record.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let err = StateStore::new(blocker.join("state.json")).load().unwrap_err();
        assert!(matches!(err, PagerbellError::StorageRead(_)));
    }

    #[test]
    fn test_directory_in_place_of_record_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::create_dir(&path).unwrap();
        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PagerbellError::StorageRead(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_record_is_not_defaulted() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        let store = StateStore::new(dir.join("state.json"));
        store
            .save(&PersistedState {
                was_on_call: true,
                last_advance_notification_sent: None,
            })
            .unwrap();

        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o000)).unwrap();
        let result = store.load();
        let readable_anyway = std::fs::read_dir(&dir).is_ok();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores mode bits; there the record is simply readable.
        if readable_anyway {
            assert!(result.unwrap().was_on_call);
        } else {
            assert!(matches!(result, Err(PagerbellError::StorageRead(_))));
        }
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));
        store
            .save(&PersistedState {
                was_on_call: true,
                last_advance_notification_sent: Some(Utc::now()),
            })
            .unwrap();
        store.save(&PersistedState::default()).unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_save_into_unwritable_parent_is_write_error() {
        let tmp = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = StateStore::new(blocker.join("state.json"));
        let err = store.save(&PersistedState::default()).unwrap_err();
        assert!(matches!(err, PagerbellError::StorageWrite(_)));
    }
}
