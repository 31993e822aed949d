//! Typed runtime values: what hydration produces and dehydration consumes.

use std::sync::Arc;

use serde_json::Value;

use crate::schema::{EnumBacking, EnumDescriptor, FieldKind, TypeDescriptor};
use crate::{Result, SettingsError};

/// A loosely typed key/value map, as decoded from stored JSON.
pub type RawMap = serde_json::Map<String, Value>;

/// A reference to one case of a registered enum.
///
/// Equality is by enum name and backing value, so two references to the
/// same case compare equal regardless of where their descriptors came from.
#[derive(Debug, Clone)]
pub struct EnumCaseValue {
    descriptor: Arc<EnumDescriptor>,
    index: usize,
}

impl EnumCaseValue {
    pub(crate) fn new(descriptor: Arc<EnumDescriptor>, index: usize) -> Self {
        debug_assert!(index < descriptor.cases().len());
        Self { descriptor, index }
    }

    pub fn enum_name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn case_name(&self) -> &str {
        self.descriptor.cases()[self.index].name()
    }

    pub fn backing(&self) -> &EnumBacking {
        self.descriptor.cases()[self.index].backing()
    }

    /// Unwrap the case to its raw backing value.
    pub fn to_raw(&self) -> Value {
        self.backing().to_raw()
    }
}

impl PartialEq for EnumCaseValue {
    fn eq(&self, other: &Self) -> bool {
        self.enum_name() == other.enum_name() && self.backing() == other.backing()
    }
}

/// A fully typed field value.
///
/// Enum values are case references, not raw backings; nested values are
/// child instances. `Raw` holds values outside the declared-type system
/// untouched, mirroring what was stored.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(EnumCaseValue),
    List(Vec<SettingsValue>),
    Nested(SettingsInstance),
    Raw(Value),
}

impl SettingsValue {
    /// Structural conversion from a raw JSON value, with no schema applied.
    pub fn from_raw(value: Value) -> Self {
        match value {
            Value::Null => SettingsValue::Null,
            Value::Bool(b) => SettingsValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SettingsValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    SettingsValue::Float(f)
                } else {
                    SettingsValue::Raw(Value::Number(n))
                }
            }
            Value::String(s) => SettingsValue::Str(s),
            Value::Array(items) => {
                SettingsValue::List(items.into_iter().map(SettingsValue::from_raw).collect())
            }
            Value::Object(_) => SettingsValue::Raw(value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SettingsValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingsValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingsValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingsValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingsValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumCaseValue> {
        match self {
            SettingsValue::Enum(case) => Some(case),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SettingsValue]> {
        match self {
            SettingsValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&SettingsInstance> {
        match self {
            SettingsValue::Nested(instance) => Some(instance),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            SettingsValue::Null => "null",
            SettingsValue::Bool(_) => "bool",
            SettingsValue::Int(_) => "int",
            SettingsValue::Float(_) => "float",
            SettingsValue::Str(_) => "string",
            SettingsValue::Enum(_) => "enum case",
            SettingsValue::List(_) => "list",
            SettingsValue::Nested(_) => "nested settings",
            SettingsValue::Raw(_) => "raw value",
        }
    }
}

/// A live settings record: one typed value per declared field, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct SettingsInstance {
    descriptor: Arc<TypeDescriptor>,
    slots: Vec<SettingsValue>,
}

impl SettingsInstance {
    pub(crate) fn new(descriptor: Arc<TypeDescriptor>, slots: Vec<SettingsValue>) -> Self {
        debug_assert_eq!(descriptor.fields().len(), slots.len());
        Self { descriptor, slots }
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn get(&self, field: &str) -> Option<&SettingsValue> {
        let (index, _) = self.descriptor.field(field)?;
        Some(&self.slots[index])
    }

    pub(crate) fn slots(&self) -> &[SettingsValue] {
        &self.slots
    }

    /// Assign a typed value to a field slot.
    ///
    /// The value must already conform to the field's declared type: an enum
    /// slot only accepts a case of its own enum (assigning a case is
    /// idempotent, it is stored as-is), an enum-list slot only cases of its
    /// enum, a nested slot only an instance of the declared child type.
    /// Scalar and raw slots are permissive, like hydration's passthrough.
    /// Use [`SettingsRegistry::set_raw`](crate::SettingsRegistry::set_raw)
    /// to assign raw JSON through the coercion engine instead.
    pub fn set(&mut self, field: &str, value: SettingsValue) -> Result<()> {
        let (index, descriptor) =
            self.descriptor
                .field(field)
                .ok_or_else(|| SettingsError::UnknownField {
                    type_name: self.descriptor.name().to_string(),
                    field: field.to_string(),
                })?;

        match descriptor.kind() {
            FieldKind::Enum(enum_name) => match &value {
                SettingsValue::Enum(case) if case.enum_name() == enum_name => {}
                SettingsValue::Null if descriptor.is_nullable() => {}
                other => {
                    return Err(SettingsError::InvalidEnumValue {
                        field: field.to_string(),
                        value: serde_json::Value::String(other.describe().to_string()),
                    })
                }
            },
            FieldKind::EnumList(enum_name) => match &value {
                SettingsValue::List(items)
                    if items.iter().all(|item| {
                        matches!(item, SettingsValue::Enum(case) if case.enum_name() == enum_name)
                    }) => {}
                SettingsValue::Null if descriptor.is_nullable() => {}
                other => {
                    return Err(SettingsError::InvalidCollectionElement {
                        field: field.to_string(),
                        value: serde_json::Value::String(other.describe().to_string()),
                    })
                }
            },
            FieldKind::Nested(type_name) => match &value {
                SettingsValue::Nested(instance) if instance.type_name() == type_name => {}
                SettingsValue::Null if descriptor.is_nullable() => {}
                other => {
                    return Err(SettingsError::TypeMismatch {
                        context: format!("{}.{}", self.descriptor.name(), field),
                        expected: type_name.clone(),
                        found: other.describe().to_string(),
                    })
                }
            },
            FieldKind::Scalar(_) | FieldKind::Raw => {}
        }

        self.slots[index] = value;
        Ok(())
    }
}

impl PartialEq for SettingsInstance {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.slots == other.slots
    }
}
