//! State snapshots of a whole registry.
//!
//! A [`Snapshot`] records, for one [`SnapshotKind`], the serialized state of
//! every live object that contributes to that kind. Snapshots are plain JSON
//! on disk and are restored onto live objects with matching IDs and classes
//! by [`ObjectManager::restore`](crate::ObjectManager::restore).

use std::path::Path;

use carta_types::{ClassName, ObjectId, ObjectPath, SnapshotKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RegistryError, RegistryResult};

/// Version written into every snapshot file.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One object's entry in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub class_name: ClassName,
    pub path: ObjectPath,
    pub state: Value,
}

/// Serialized state of a registry for one snapshot kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub format_version: u32,
    pub kind: SnapshotKind,
    pub saved_at: DateTime<Utc>,
    pub objects: Vec<ObjectSnapshot>,
}

/// Outcome of restoring a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Objects whose state was reset.
    pub restored: Vec<ObjectId>,
    /// Entries with no live object of the same ID and class.
    pub skipped: Vec<ObjectId>,
}

impl Snapshot {
    pub fn new(kind: SnapshotKind, objects: Vec<ObjectSnapshot>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            kind,
            saved_at: Utc::now(),
            objects,
        }
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse snapshot JSON, rejecting unknown format versions.
    pub fn from_json(text: &str) -> RegistryResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RegistryError::UnsupportedSnapshotVersion {
                found: snapshot.format_version,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> RegistryResult<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), objects = self.objects.len(), "saved snapshot");
        Ok(())
    }

    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The entry for `id`, if the snapshot has one.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectSnapshot> {
        self.objects.iter().find(|o| o.id == id)
    }
}
