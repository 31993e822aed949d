//! Schema descriptors for settings types.
//!
//! Applications declare each settings type once as an explicit field table
//! (and each enum as an explicit case table), then register the descriptors
//! with a [`SettingsRegistry`](crate::SettingsRegistry). Hydration never
//! inspects Rust types at runtime; everything it needs lives here.

use serde_json::Value;

use crate::{Result, SettingsError};

/// Primitive kind of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    String,
}

/// Backing value of one enum case.
///
/// All cases of a single enum share a backing kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumBacking {
    Str(String),
    Int(i64),
}

impl EnumBacking {
    pub fn to_raw(&self) -> Value {
        match self {
            EnumBacking::Str(s) => Value::String(s.clone()),
            EnumBacking::Int(i) => Value::Number((*i).into()),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            EnumBacking::Str(_) => "string",
            EnumBacking::Int(_) => "int",
        }
    }
}

impl From<&str> for EnumBacking {
    fn from(s: &str) -> Self {
        EnumBacking::Str(s.to_string())
    }
}

impl From<String> for EnumBacking {
    fn from(s: String) -> Self {
        EnumBacking::Str(s)
    }
}

impl From<i64> for EnumBacking {
    fn from(i: i64) -> Self {
        EnumBacking::Int(i)
    }
}

impl From<i32> for EnumBacking {
    fn from(i: i32) -> Self {
        EnumBacking::Int(i as i64)
    }
}

/// One named case of an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    name: String,
    backing: EnumBacking,
}

impl EnumCase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backing(&self) -> &EnumBacking {
        &self.backing
    }
}

/// A closed set of named cases, each backed by a string or integer value.
///
/// The case/backing mapping is exact in both directions; a backing value
/// that maps to no case is an error during hydration, never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    name: String,
    cases: Vec<EnumCase>,
}

impl EnumDescriptor {
    pub fn builder(name: impl Into<String>) -> EnumBuilder {
        EnumBuilder {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[EnumCase] {
        &self.cases
    }

    /// Look up a case by its declared name.
    pub fn case_named(&self, name: &str) -> Option<usize> {
        self.cases.iter().position(|c| c.name == name)
    }

    /// Look up a case by a raw backing value of the matching primitive kind.
    ///
    /// Returns `None` for unmapped backings and for values of the wrong
    /// kind (e.g. a bool, or a float where the enum is int-backed).
    pub fn case_for_raw(&self, raw: &Value) -> Option<usize> {
        let backing = match raw {
            Value::String(s) => EnumBacking::Str(s.clone()),
            Value::Number(n) => EnumBacking::Int(n.as_i64()?),
            _ => return None,
        };
        self.cases.iter().position(|c| c.backing == backing)
    }
}

/// Builder for [`EnumDescriptor`].
pub struct EnumBuilder {
    name: String,
    cases: Vec<EnumCase>,
}

impl EnumBuilder {
    pub fn case(mut self, name: impl Into<String>, backing: impl Into<EnumBacking>) -> Self {
        self.cases.push(EnumCase {
            name: name.into(),
            backing: backing.into(),
        });
        self
    }

    pub fn build(self) -> Result<EnumDescriptor> {
        if self.name.is_empty() {
            return Err(SettingsError::InvalidSchema("enum name is empty".into()));
        }
        if self.cases.is_empty() {
            return Err(SettingsError::InvalidSchema(format!(
                "enum `{}` has no cases",
                self.name
            )));
        }

        let kind = self.cases[0].backing.kind_name();
        for (i, case) in self.cases.iter().enumerate() {
            if case.backing.kind_name() != kind {
                return Err(SettingsError::InvalidSchema(format!(
                    "enum `{}` mixes {} and {} backings",
                    self.name,
                    kind,
                    case.backing.kind_name()
                )));
            }
            for other in &self.cases[i + 1..] {
                if other.name == case.name {
                    return Err(SettingsError::InvalidSchema(format!(
                        "enum `{}` declares case `{}` twice",
                        self.name, case.name
                    )));
                }
                if other.backing == case.backing {
                    return Err(SettingsError::InvalidSchema(format!(
                        "enum `{}` reuses backing value for `{}` and `{}`",
                        self.name, case.name, other.name
                    )));
                }
            }
        }

        Ok(EnumDescriptor {
            name: self.name,
            cases: self.cases,
        })
    }
}

/// Declared type of one field.
///
/// Enum and nested references are by name and must already be registered
/// when the owning type is; that ordering rule is what keeps settings type
/// graphs acyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// A single case of the named enum.
    Enum(String),
    /// A sequence of cases of the named enum.
    EnumList(String),
    /// A child settings object of the named type.
    Nested(String),
    /// Anything else; hydration passes the raw value through unchanged.
    Raw,
}

/// One named, typed slot within a settings type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
    nullable: bool,
}

impl FieldDescriptor {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            nullable: false,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Int))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Float))
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Bool))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::String))
    }

    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Enum(enum_name.into()))
    }

    pub fn enum_list(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::EnumList(enum_name.into()))
    }

    /// A nested settings field. Defaults to a fresh default-constructed
    /// child instance when the stored map omits it, so adding a nested
    /// field to an existing type never breaks old rows.
    pub fn nested(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::Nested(type_name.into()));
        field.default = Some(Value::Null);
        field
    }

    /// A passthrough field; the raw JSON value is kept as-is.
    pub fn raw(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Raw)
    }

    /// Declare the field's default, as a raw JSON value. Defaults flow
    /// through the same coercion pipeline as stored data, so an enum
    /// field's default is its backing value (e.g. `"daily"`).
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// A field with no default and a non-nullable type must be present in
    /// the raw map.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.nullable
    }
}

/// A named, user-declared settings record shape: an ordered field table.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn builder(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }
}

/// Builder for [`TypeDescriptor`].
pub struct TypeBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<TypeDescriptor> {
        if self.name.is_empty() {
            return Err(SettingsError::InvalidSchema("type name is empty".into()));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[i + 1..].iter().any(|f| f.name == field.name) {
                return Err(SettingsError::InvalidSchema(format!(
                    "type `{}` declares field `{}` twice",
                    self.name, field.name
                )));
            }
        }
        Ok(TypeDescriptor {
            name: self.name,
            fields: self.fields,
        })
    }
}
