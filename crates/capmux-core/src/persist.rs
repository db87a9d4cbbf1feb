//! Explicit persistence hook for run snapshots.
//!
//! The orchestrator knows nothing about storage formats: callers register a
//! hook and it is invoked with a fresh snapshot after every externally
//! visible mutation. `snapshot_writer` is the provided file-backed hook,
//! rewriting a JSON document on each invocation so a crashed run leaves its
//! last known state on disk.

use crate::orchestrator::GroupSnapshot;
use std::path::PathBuf;
use tracing::warn;

/// Observer callback receiving the current snapshot of all groups.
pub type PersistHook = Box<dyn Fn(&[GroupSnapshot]) + Send>;

/// A hook that serializes each snapshot to `path` as pretty-printed JSON.
///
/// Write failures are logged, not raised: persistence is advisory and must
/// never take down a capture run.
pub fn snapshot_writer(path: impl Into<PathBuf>) -> impl Fn(&[GroupSnapshot]) + Send + 'static {
    let path = path.into();
    move |snapshot: &[GroupSnapshot]| {
        let json = match serde_json::to_vec_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %path.display(), "failed to serialize snapshot: {e}");
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, json) {
            warn!(path = %path.display(), "failed to persist snapshot: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capmux_proto::CaptureData;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_snapshot_writer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let snapshot = vec![GroupSnapshot {
            params: BTreeMap::from([("host".to_string(), "h1".to_string())]),
            results: vec![CaptureData::new("disk-info", json!({"disks": ["sda"]}))],
            complete: true,
        }];

        let hook = snapshot_writer(&path);
        hook(&snapshot);

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<GroupSnapshot> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].params["host"], "h1");
        assert_eq!(parsed[0].results[0].capture_type, "disk-info");
        assert!(parsed[0].complete);
    }

    #[test]
    fn test_snapshot_writer_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let hook = snapshot_writer(&path);

        hook(&[]);
        let first = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first.trim(), "[]");

        hook(&[GroupSnapshot {
            params: BTreeMap::new(),
            results: vec![],
            complete: false,
        }]);
        let second = std::fs::read_to_string(&path).unwrap();
        assert_ne!(first, second);
    }
}
