//! The hydration/dehydration controller.
//!
//! Hydration walks a type's field table in declaration order, picks each
//! field's raw value (stored value, declared default, or null), and hands it
//! to the coercion engine. Construction is all-or-nothing: the first error
//! aborts. Dehydration is the inverse, optionally suppressing fields whose
//! value equals the type's default so stored payloads stay lean.

use serde_json::Value;

use crate::coerce::coerce_field;
use crate::registry::SettingsRegistry;
use crate::value::{RawMap, SettingsInstance, SettingsValue};
use crate::{Result, SettingsError};

impl SettingsRegistry {
    /// Build a typed instance from a raw map.
    ///
    /// Keys with no matching field are silently ignored, so rows written by
    /// newer or older schema revisions keep hydrating. An explicit JSON null
    /// counts as "absent" for non-nullable fields with a default.
    pub fn hydrate(&self, type_name: &str, raw: &RawMap) -> Result<SettingsInstance> {
        let descriptor = self.resolve(type_name)?;

        let mut slots = Vec::with_capacity(descriptor.fields().len());
        for field in descriptor.fields() {
            let entry = raw.get(field.name());
            let slot = match entry {
                Some(value) if !value.is_null() => coerce_field(self, field, value.clone())?,
                null_or_missing => {
                    if null_or_missing.is_some() && field.is_nullable() {
                        SettingsValue::Null
                    } else if let Some(default) = field.default_value() {
                        coerce_field(self, field, default.clone())?
                    } else if field.is_nullable() {
                        SettingsValue::Null
                    } else {
                        return Err(SettingsError::MissingRequiredSetting {
                            type_name: descriptor.name().to_string(),
                            field: field.name().to_string(),
                        });
                    }
                }
            };
            slots.push(slot);
        }

        Ok(SettingsInstance::new(descriptor, slots))
    }

    /// A fresh instance with every field at its declared default.
    pub fn default_instance(&self, type_name: &str) -> Result<SettingsInstance> {
        self.hydrate(type_name, &RawMap::new())
    }

    /// Flatten an instance back to a raw map, unwrapping enum cases to
    /// their backing values and recursing into nested instances.
    ///
    /// With `strip_defaults`, fields equal to the type's default are
    /// omitted. Nested settings are omitted when their recursively stripped
    /// map is empty, not when they equal a default instance; that is what
    /// lets a default child carrying explicit content still serialize.
    pub fn to_map(&self, instance: &SettingsInstance, strip_defaults: bool) -> Result<RawMap> {
        let defaults = if strip_defaults {
            Some(self.defaults_of(instance.type_name())?)
        } else {
            None
        };

        let mut out = RawMap::new();
        for (field, slot) in instance
            .descriptor()
            .fields()
            .iter()
            .zip(instance.slots())
        {
            let raw = self.dehydrate_value(slot, strip_defaults)?;
            if let Some(defaults) = &defaults {
                if matches!(slot, SettingsValue::Nested(_)) {
                    if raw.as_object().is_some_and(|map| map.is_empty()) {
                        continue;
                    }
                } else if defaults.get(field.name()) == Some(&raw) {
                    continue;
                }
            }
            out.insert(field.name().to_string(), raw);
        }
        Ok(out)
    }

    fn dehydrate_value(&self, value: &SettingsValue, strip_defaults: bool) -> Result<Value> {
        Ok(match value {
            SettingsValue::Null => Value::Null,
            SettingsValue::Bool(b) => Value::Bool(*b),
            SettingsValue::Int(i) => Value::Number((*i).into()),
            SettingsValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SettingsValue::Str(s) => Value::String(s.clone()),
            SettingsValue::Enum(case) => case.to_raw(),
            SettingsValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.dehydrate_value(item, strip_defaults))
                    .collect::<Result<Vec<_>>>()?,
            ),
            SettingsValue::Nested(child) => Value::Object(self.to_map(child, strip_defaults)?),
            SettingsValue::Raw(raw) => raw.clone(),
        })
    }
}
