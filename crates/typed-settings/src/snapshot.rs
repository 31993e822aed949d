//! Precomputed metadata snapshots.
//!
//! A snapshot records, per settings type, the full default map and the
//! field-name list. Built once by an operator action (deploy time), loaded
//! at process start, and installed into the registry so production
//! hydration never pays the live default-construction cost. The artifact is
//! derived and disposable: losing it costs performance, never correctness.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::SettingsRegistry;
use crate::value::RawMap;
use crate::Result;

/// One settings type's cached metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Complete default map: `to_map(default_instance, strip_defaults = false)`.
    pub defaults: RawMap,
    /// Field names in declaration order.
    pub properties: Vec<String>,
}

/// A flat, directly loadable summary of every registered settings type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub types: BTreeMap<String, SnapshotEntry>,
}

impl MetadataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn get(&self, type_name: &str) -> Option<&SnapshotEntry> {
        self.types.get(type_name)
    }
}

/// Compute a snapshot covering every type registered so far.
///
/// Fails if any type is not default-constructible (a required field with no
/// default); such a type has no meaningful defaults entry.
pub fn build_snapshot(registry: &SettingsRegistry) -> Result<MetadataSnapshot> {
    let mut types = BTreeMap::new();
    for name in registry.type_names() {
        let instance = registry.default_instance(&name)?;
        let defaults = registry.to_map(&instance, false)?;
        let properties = registry
            .resolve(&name)?
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect();
        types.insert(name, SnapshotEntry { defaults, properties });
    }
    Ok(MetadataSnapshot { types })
}

/// Durable storage for one snapshot artifact: a JSON document at a fixed,
/// operator-chosen path.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot atomically: temp file in the same directory, then
    /// rename over the target.
    pub fn persist(&self, snapshot: &MetadataSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(snapshot)?;

        // Unique temp file name to avoid conflicts with concurrent writers.
        let temp_name = format!(
            "{}.{}.tmp",
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("snapshot"),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(temp_name);
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), types = snapshot.len(), "persisted metadata snapshot");
        Ok(())
    }

    /// Load the stored snapshot. An absent file is not an error; it simply
    /// means live metadata resolution.
    pub fn load(&self) -> Result<Option<MetadataSnapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "loaded metadata snapshot");
        Ok(Some(snapshot))
    }

    /// Delete the stored artifact. Idempotent; a missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "cleared metadata snapshot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, TypeDescriptor};
    use serde_json::json;
    use tempfile::TempDir;

    fn registry() -> SettingsRegistry {
        let registry = SettingsRegistry::new();
        registry
            .register_type(
                TypeDescriptor::builder("CacheSettings")
                    .field(FieldDescriptor::bool("enabled").default(true))
                    .field(FieldDescriptor::int("ttl_seconds").default(300))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn build_snapshot_records_defaults_and_properties() {
        let registry = registry();
        let snapshot = build_snapshot(&registry).unwrap();

        let entry = snapshot.get("CacheSettings").unwrap();
        assert_eq!(entry.defaults.get("enabled"), Some(&json!(true)));
        assert_eq!(entry.defaults.get("ttl_seconds"), Some(&json!(300)));
        assert_eq!(entry.properties, vec!["enabled", "ttl_seconds"]);
    }

    #[test]
    fn store_round_trips_exactly() {
        let registry = registry();
        let snapshot = build_snapshot(&registry).unwrap();

        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache").join("typed-settings.json"));

        store.persist(&snapshot).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn absent_artifact_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("missing.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let registry = registry();
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("typed-settings.json"));

        store.persist(&build_snapshot(&registry).unwrap()).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed-settings.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = SnapshotStore::new(path);
        assert!(store.load().is_err());
    }
}
