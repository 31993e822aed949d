use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required setting `{field}` on `{type_name}`")]
    MissingRequiredSetting { type_name: String, field: String },

    #[error("invalid enum value for `{field}`: {value}")]
    InvalidEnumValue {
        field: String,
        value: serde_json::Value,
    },

    #[error("invalid collection element for `{field}`: {value}")]
    InvalidCollectionElement {
        field: String,
        value: serde_json::Value,
    },

    #[error("type mismatch for `{context}`: expected {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("malformed stored data: {0}")]
    MalformedStoredData(#[source] serde_json::Error),

    #[error("unknown settings type `{0}`")]
    UnknownType(String),

    #[error("no field `{field}` on settings type `{type_name}`")]
    UnknownField { type_name: String, field: String },

    #[error("unknown enum `{0}`")]
    UnknownEnum(String),

    #[error("settings type `{0}` is already registered")]
    DuplicateType(String),

    #[error("enum `{0}` is already registered")]
    DuplicateEnum(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
