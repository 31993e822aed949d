//! The value coercion engine: raw JSON in, typed field values out.
//!
//! Pure functions of their inputs. Decision order per field, first match
//! wins: enum collection, single enum, nested settings, scalar text
//! coercion, structural passthrough.

use std::sync::Arc;

use serde_json::Value;

use crate::registry::SettingsRegistry;
use crate::schema::{EnumDescriptor, FieldDescriptor, FieldKind, ScalarKind};
use crate::value::{EnumCaseValue, SettingsValue};
use crate::{Result, SettingsError};

pub(crate) fn coerce_field(
    registry: &SettingsRegistry,
    field: &FieldDescriptor,
    raw: Value,
) -> Result<SettingsValue> {
    match field.kind() {
        FieldKind::EnumList(enum_name) => coerce_enum_list(registry, field, enum_name, raw),
        FieldKind::Enum(enum_name) => coerce_enum(registry, field, enum_name, raw),
        FieldKind::Nested(type_name) => coerce_nested(registry, field, type_name, raw),
        FieldKind::Scalar(kind) => Ok(coerce_scalar(*kind, raw)),
        FieldKind::Raw => Ok(SettingsValue::from_raw(raw)),
    }
}

fn coerce_enum_list(
    registry: &SettingsRegistry,
    field: &FieldDescriptor,
    enum_name: &str,
    raw: Value,
) -> Result<SettingsValue> {
    if raw.is_null() && field.is_nullable() {
        return Ok(SettingsValue::Null);
    }

    let descriptor = registry.resolve_enum(enum_name)?;
    match raw {
        Value::Array(items) => {
            let mut cases = Vec::with_capacity(items.len());
            for item in items {
                let case = resolve_case(&descriptor, &item).ok_or_else(|| {
                    SettingsError::InvalidCollectionElement {
                        field: field.name().to_string(),
                        value: item,
                    }
                })?;
                cases.push(SettingsValue::Enum(case));
            }
            Ok(SettingsValue::List(cases))
        }
        other => Err(SettingsError::InvalidCollectionElement {
            field: field.name().to_string(),
            value: other,
        }),
    }
}

fn coerce_enum(
    registry: &SettingsRegistry,
    field: &FieldDescriptor,
    enum_name: &str,
    raw: Value,
) -> Result<SettingsValue> {
    if raw.is_null() {
        // Non-nullable nulls never reach this point; the controller's
        // required/default logic handles them.
        return Ok(SettingsValue::Null);
    }

    let descriptor = registry.resolve_enum(enum_name)?;
    match resolve_case(&descriptor, &raw) {
        Some(case) => Ok(SettingsValue::Enum(case)),
        None => Err(SettingsError::InvalidEnumValue {
            field: field.name().to_string(),
            value: raw,
        }),
    }
}

/// Backing-value lookup: a string or integer of the enum's backing kind
/// maps to its case; anything else maps to nothing.
fn resolve_case(descriptor: &Arc<EnumDescriptor>, raw: &Value) -> Option<EnumCaseValue> {
    descriptor
        .case_for_raw(raw)
        .map(|index| EnumCaseValue::new(descriptor.clone(), index))
}

fn coerce_nested(
    registry: &SettingsRegistry,
    field: &FieldDescriptor,
    type_name: &str,
    raw: Value,
) -> Result<SettingsValue> {
    match raw {
        Value::Null => {
            if field.is_nullable() {
                Ok(SettingsValue::Null)
            } else {
                // Lenient on purpose: a newly added nested field must not
                // break rows stored before it existed.
                Ok(SettingsValue::Nested(registry.default_instance(type_name)?))
            }
        }
        Value::Object(map) => Ok(SettingsValue::Nested(registry.hydrate(type_name, &map)?)),
        other => Err(SettingsError::TypeMismatch {
            context: field.name().to_string(),
            expected: format!("null or `{type_name}` object"),
            found: describe_raw(&other),
        }),
    }
}

fn coerce_scalar(kind: ScalarKind, raw: Value) -> SettingsValue {
    let text = match raw {
        Value::String(text) => text,
        other => return SettingsValue::from_raw(other),
    };

    match kind {
        ScalarKind::Int => match text.trim().parse::<i64>() {
            Ok(i) => SettingsValue::Int(i),
            Err(_) => SettingsValue::Str(text),
        },
        ScalarKind::Float => match text.trim().parse::<f64>() {
            Ok(f) => SettingsValue::Float(f),
            Err(_) => SettingsValue::Str(text),
        },
        ScalarKind::Bool => match parse_truthiness(&text) {
            Some(b) => SettingsValue::Bool(b),
            None => SettingsValue::Str(text),
        },
        ScalarKind::String => SettingsValue::Str(text),
    }
}

/// Permissive boolean text rule: "1"/"true"/"on"/"yes" and
/// "0"/"false"/"off"/"no"/"" (case-insensitive), everything else is left
/// untouched.
fn parse_truthiness(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn describe_raw(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
    }
}
