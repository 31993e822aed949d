//! Typed, schema-validated settings objects stored as JSON column values.
//!
//! This crate converts between a loosely typed key/value map (as decoded
//! from a JSON column) and a strongly typed settings value graph:
//! - Explicit, registered schema tables per settings type - no runtime
//!   type introspection
//! - Scalar coercion, single-enum and enum-collection resolution, nested
//!   settings recursion
//! - Lean serialization: fields equal to their declared default are
//!   suppressed on write, so old rows keep working when types grow
//! - A precomputed metadata snapshot so production boots skip live
//!   default construction
//!
//! # Architecture
//!
//! - [`SettingsRegistry`] - the type metadata resolver: registered
//!   descriptors, memoized defaults, the installed snapshot
//! - `coerce` - the value coercion engine (raw JSON to typed values)
//! - `hydrate` - the hydration/dehydration controller on the registry
//! - [`SnapshotStore`] / [`build_snapshot`] - the cache bridge
//! - [`SettingsBridge`] - the storage-column boundary for host ORM glue
//!
//! # Usage
//!
//! ```rust
//! use typed_settings::{EnumDescriptor, FieldDescriptor, SettingsRegistry, TypeDescriptor};
//!
//! let registry = SettingsRegistry::new();
//! registry.register_enum(
//!     EnumDescriptor::builder("Frequency")
//!         .case("Daily", "daily")
//!         .case("Weekly", "weekly")
//!         .build()?,
//! )?;
//! registry.register_type(
//!     TypeDescriptor::builder("UserPreferences")
//!         .field(FieldDescriptor::string("theme").default("light"))
//!         .field(FieldDescriptor::enumeration("frequency", "Frequency").default("daily"))
//!         .build()?,
//! )?;
//!
//! let raw = serde_json::json!({"theme": "dark"});
//! let prefs = registry.hydrate("UserPreferences", raw.as_object().unwrap())?;
//! assert_eq!(prefs.get("theme").unwrap().as_str(), Some("dark"));
//! assert_eq!(
//!     prefs.get("frequency").unwrap().as_enum().unwrap().case_name(),
//!     "Daily"
//! );
//!
//! // Only non-default fields are persisted.
//! let lean = registry.to_map(&prefs, true)?;
//! assert_eq!(lean.keys().collect::<Vec<_>>(), vec!["theme"]);
//! # Ok::<(), typed_settings::SettingsError>(())
//! ```
//!
//! At deploy time, [`build_snapshot`] + [`SnapshotStore::persist`] write the
//! metadata artifact; at process start, [`SnapshotStore::load`] +
//! [`SettingsRegistry::install_snapshot`] make it the live fast path. An
//! absent artifact is never an error - the registry falls back to live
//! metadata resolution.

mod coerce;
mod error;
mod hydrate;
mod registry;
mod schema;
mod snapshot;
mod storage;
mod value;

pub use error::{Result, SettingsError};
pub use registry::SettingsRegistry;
pub use schema::{
    EnumBacking, EnumBuilder, EnumCase, EnumDescriptor, FieldDescriptor, FieldKind, ScalarKind,
    TypeBuilder, TypeDescriptor,
};
pub use snapshot::{build_snapshot, MetadataSnapshot, SnapshotEntry, SnapshotStore};
pub use storage::SettingsBridge;
pub use value::{EnumCaseValue, RawMap, SettingsInstance, SettingsValue};
