//! The storage-column boundary: raw column text on one side, a typed
//! instance on the other.
//!
//! A [`SettingsBridge`] is what host persistence glue holds per cast column:
//! `get` decodes and hydrates what was stored, `set` dehydrates (stripping
//! defaults) and encodes. The bridge is deliberately thin; everything
//! interesting happens in the registry it wraps.

use std::sync::Arc;

use serde_json::Value;

use crate::registry::SettingsRegistry;
use crate::value::{RawMap, SettingsInstance};
use crate::{Result, SettingsError};

pub struct SettingsBridge {
    registry: Arc<SettingsRegistry>,
    type_name: String,
}

impl std::fmt::Debug for SettingsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsBridge")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl SettingsBridge {
    /// Bind a bridge to one registered settings type.
    pub fn new(registry: Arc<SettingsRegistry>, type_name: impl Into<String>) -> Result<Self> {
        let type_name = type_name.into();
        registry.resolve(&type_name)?;
        Ok(Self {
            registry,
            type_name,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Hydrate a stored column value.
    ///
    /// Empty or absent text hydrates an empty map (a full default
    /// instance). Text that is not valid JSON is `MalformedStoredData`;
    /// valid JSON that is not an object is treated as an empty map.
    pub fn get(&self, raw: Option<&str>) -> Result<SettingsInstance> {
        let text = raw.unwrap_or("").trim();
        if text.is_empty() {
            return self.registry.hydrate(&self.type_name, &RawMap::new());
        }

        let value: Value =
            serde_json::from_str(text).map_err(SettingsError::MalformedStoredData)?;
        let map = match value {
            Value::Object(map) => map,
            _ => RawMap::new(),
        };
        self.registry.hydrate(&self.type_name, &map)
    }

    /// Serialize an instance for storage, suppressing default-valued
    /// fields. `None` stays `None` (a null/absent column value).
    pub fn set(&self, instance: Option<&SettingsInstance>) -> Result<Option<String>> {
        let Some(instance) = instance else {
            return Ok(None);
        };

        if instance.type_name() != self.type_name {
            return Err(SettingsError::TypeMismatch {
                context: format!("settings column of `{}`", self.type_name),
                expected: self.type_name.clone(),
                found: instance.type_name().to_string(),
            });
        }

        let map = self.registry.to_map(instance, true)?;
        Ok(Some(serde_json::to_string(&map)?))
    }

    /// Serialize a raw map for storage by hydrating it first, so defaults,
    /// coercion, and validation all apply before anything is written.
    pub fn set_map(&self, raw: &RawMap) -> Result<Option<String>> {
        let instance = self.registry.hydrate(&self.type_name, raw)?;
        self.set(Some(&instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumDescriptor, FieldDescriptor, TypeDescriptor};
    use serde_json::json;

    fn registry() -> Arc<SettingsRegistry> {
        let registry = SettingsRegistry::new();
        registry
            .register_enum(
                EnumDescriptor::builder("Theme")
                    .case("Light", "light")
                    .case("Dark", "dark")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_type(
                TypeDescriptor::builder("ProfileSettings")
                    .field(FieldDescriptor::enumeration("theme", "Theme").default("light"))
                    .field(FieldDescriptor::bool("notifications").default(false))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register_type(
                TypeDescriptor::builder("OtherSettings")
                    .field(FieldDescriptor::int("n").default(0))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn binding_to_an_unregistered_type_fails() {
        let err = SettingsBridge::new(registry(), "Nope").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownType(_)));
    }

    #[test]
    fn empty_text_hydrates_defaults() {
        let bridge = SettingsBridge::new(registry(), "ProfileSettings").unwrap();

        for raw in [None, Some(""), Some("   ")] {
            let instance = bridge.get(raw).unwrap();
            assert_eq!(
                instance.get("theme").unwrap().as_enum().unwrap().case_name(),
                "Light"
            );
            assert_eq!(instance.get("notifications").unwrap().as_bool(), Some(false));
        }
    }

    #[test]
    fn invalid_json_is_malformed_stored_data() {
        let bridge = SettingsBridge::new(registry(), "ProfileSettings").unwrap();
        let err = bridge.get(Some("{bad:json}")).unwrap_err();
        assert!(matches!(err, SettingsError::MalformedStoredData(_)));
    }

    #[test]
    fn valid_non_object_json_is_treated_as_empty() {
        let bridge = SettingsBridge::new(registry(), "ProfileSettings").unwrap();
        let instance = bridge.get(Some("5")).unwrap();
        assert_eq!(instance.get("notifications").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn round_trips_through_stored_text() {
        let registry = registry();
        let bridge = SettingsBridge::new(registry.clone(), "ProfileSettings").unwrap();

        let mut instance = bridge.get(None).unwrap();
        registry
            .set_raw(&mut instance, "theme", json!("dark"))
            .unwrap();

        let text = bridge.set(Some(&instance)).unwrap().unwrap();
        assert_eq!(text, r#"{"theme":"dark"}"#);

        let restored = bridge.get(Some(&text)).unwrap();
        assert_eq!(restored, instance);
    }

    #[test]
    fn null_instance_stores_null() {
        let bridge = SettingsBridge::new(registry(), "ProfileSettings").unwrap();
        assert_eq!(bridge.set(None).unwrap(), None);
    }

    #[test]
    fn wrong_instance_type_is_rejected() {
        let registry = registry();
        let bridge = SettingsBridge::new(registry.clone(), "ProfileSettings").unwrap();
        let other = registry.default_instance("OtherSettings").unwrap();
        let err = bridge.set(Some(&other)).unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { .. }));
    }

    #[test]
    fn set_map_hydrates_then_serializes() {
        let bridge = SettingsBridge::new(registry(), "ProfileSettings").unwrap();
        let map = match json!({"theme": "dark", "notifications": false, "ghost": 1}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let text = bridge.set_map(&map).unwrap().unwrap();
        assert_eq!(text, r#"{"theme":"dark"}"#);
    }
}
