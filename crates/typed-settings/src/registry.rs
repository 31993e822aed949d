//! The type metadata resolver: an explicit, process-scoped schema table.
//!
//! Descriptors are registered once (typically at startup), then looked up on
//! every hydration. Registration is the only introspection-like cost in the
//! system; `defaults_of` is memoized per type, and an installed
//! [`MetadataSnapshot`] replaces even that first computation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::coerce::coerce_field;
use crate::schema::{EnumDescriptor, FieldDescriptor, FieldKind, TypeDescriptor};
use crate::snapshot::MetadataSnapshot;
use crate::value::{EnumCaseValue, RawMap, SettingsInstance};
use crate::{Result, SettingsError};

/// Holds every registered enum and settings type, the memoized per-type
/// defaults, and the optionally installed metadata snapshot.
///
/// All state is read-mostly: written during startup registration and the
/// operator-triggered snapshot install, read on every hydrate/dehydrate.
/// Racing `defaults_of` computations are deterministic and merely wasteful,
/// never corrupting.
pub struct SettingsRegistry {
    enums: RwLock<HashMap<String, Arc<EnumDescriptor>>>,
    types: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
    defaults: RwLock<HashMap<String, Arc<RawMap>>>,
    snapshot_defaults: RwLock<HashMap<String, Arc<RawMap>>>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self {
            enums: RwLock::new(HashMap::new()),
            types: RwLock::new(HashMap::new()),
            defaults: RwLock::new(HashMap::new()),
            snapshot_defaults: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_enum(&self, descriptor: EnumDescriptor) -> Result<()> {
        let mut enums = self.enums.write();
        if enums.contains_key(descriptor.name()) {
            return Err(SettingsError::DuplicateEnum(descriptor.name().to_string()));
        }
        enums.insert(descriptor.name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    /// Register a settings type.
    ///
    /// Every enum and nested type a field references must already be
    /// registered. Besides catching typos early, that ordering rule makes
    /// settings type graphs acyclic: a type can never reference itself,
    /// directly or transitively, because it is not registered yet while its
    /// own fields are validated.
    pub fn register_type(&self, descriptor: TypeDescriptor) -> Result<()> {
        for field in descriptor.fields() {
            self.validate_field(descriptor.name(), field)?;
        }

        let mut types = self.types.write();
        if types.contains_key(descriptor.name()) {
            return Err(SettingsError::DuplicateType(descriptor.name().to_string()));
        }
        types.insert(descriptor.name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    fn validate_field(&self, type_name: &str, field: &FieldDescriptor) -> Result<()> {
        match field.kind() {
            FieldKind::Enum(enum_name) => {
                let descriptor = self.resolve_enum(enum_name)?;
                if let Some(default) = field.default_value() {
                    if !default.is_null() && descriptor.case_for_raw(default).is_none() {
                        return Err(SettingsError::InvalidSchema(format!(
                            "`{}.{}` declares default {} which maps to no case of `{}`",
                            type_name,
                            field.name(),
                            default,
                            enum_name
                        )));
                    }
                }
            }
            FieldKind::EnumList(enum_name) => {
                let descriptor = self.resolve_enum(enum_name)?;
                match field.default_value() {
                    None | Some(Value::Null) => {}
                    Some(Value::Array(items)) => {
                        for item in items {
                            if descriptor.case_for_raw(item).is_none() {
                                return Err(SettingsError::InvalidSchema(format!(
                                    "`{}.{}` declares default element {} which maps to no case of `{}`",
                                    type_name,
                                    field.name(),
                                    item,
                                    enum_name
                                )));
                            }
                        }
                    }
                    Some(other) => {
                        return Err(SettingsError::InvalidSchema(format!(
                            "`{}.{}` declares non-sequence default {}",
                            type_name,
                            field.name(),
                            other
                        )));
                    }
                }
            }
            FieldKind::Nested(nested_name) => {
                self.resolve(nested_name)?;
                match field.default_value() {
                    None | Some(Value::Null) | Some(Value::Object(_)) => {}
                    Some(other) => {
                        return Err(SettingsError::InvalidSchema(format!(
                            "`{}.{}` declares non-object default {}",
                            type_name,
                            field.name(),
                            other
                        )));
                    }
                }
            }
            FieldKind::Scalar(_) | FieldKind::Raw => {}
        }
        Ok(())
    }

    pub fn resolve(&self, type_name: &str) -> Result<Arc<TypeDescriptor>> {
        self.types
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownType(type_name.to_string()))
    }

    pub fn resolve_enum(&self, enum_name: &str) -> Result<Arc<EnumDescriptor>> {
        self.enums
            .read()
            .get(enum_name)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownEnum(enum_name.to_string()))
    }

    /// Names of all registered settings types, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a typed case reference, for assigning enum fields in code.
    pub fn enum_case(&self, enum_name: &str, case_name: &str) -> Result<EnumCaseValue> {
        let descriptor = self.resolve_enum(enum_name)?;
        let index = descriptor.case_named(case_name).ok_or_else(|| {
            SettingsError::InvalidEnumValue {
                field: enum_name.to_string(),
                value: Value::String(case_name.to_string()),
            }
        })?;
        Ok(EnumCaseValue::new(descriptor, index))
    }

    /// The canonical "what counts as a default" map for a type: a
    /// default-constructed instance, dehydrated without stripping.
    ///
    /// Memoized for the process lifetime. When a snapshot is installed its
    /// recorded defaults win over live construction; a snapshot built from
    /// stale code is the operator's hazard, not silently corrected here.
    pub fn defaults_of(&self, type_name: &str) -> Result<Arc<RawMap>> {
        if let Some(defaults) = self.snapshot_defaults.read().get(type_name) {
            return Ok(defaults.clone());
        }
        if let Some(defaults) = self.defaults.read().get(type_name) {
            return Ok(defaults.clone());
        }

        let instance = self.default_instance(type_name)?;
        let defaults = Arc::new(self.to_map(&instance, false)?);
        self.defaults
            .write()
            .insert(type_name.to_string(), defaults.clone());
        Ok(defaults)
    }

    /// Make `snapshot` the live source for [`Self::defaults_of`]. Idempotent;
    /// installing an empty snapshot is equivalent to not installing one.
    pub fn install_snapshot(&self, snapshot: MetadataSnapshot) {
        let mut installed = self.snapshot_defaults.write();
        installed.clear();
        for (name, entry) in snapshot.types {
            installed.insert(name, Arc::new(entry.defaults));
        }
        tracing::debug!(types = installed.len(), "installed metadata snapshot");
    }

    /// Revert [`Self::defaults_of`] to live construction. Idempotent.
    pub fn uninstall_snapshot(&self) {
        self.snapshot_defaults.write().clear();
        tracing::debug!("uninstalled metadata snapshot");
    }

    pub fn has_snapshot(&self) -> bool {
        !self.snapshot_defaults.read().is_empty()
    }

    /// Assign a raw JSON value to a field, running it through the coercion
    /// engine exactly as hydration would.
    pub fn set_raw(&self, instance: &mut SettingsInstance, field: &str, raw: Value) -> Result<()> {
        let descriptor = instance.descriptor().clone();
        let (_, field_descriptor) =
            descriptor
                .field(field)
                .ok_or_else(|| SettingsError::UnknownField {
                    type_name: descriptor.name().to_string(),
                    field: field.to_string(),
                })?;
        let value = coerce_field(self, field_descriptor, raw)?;
        instance.set(field, value)
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
