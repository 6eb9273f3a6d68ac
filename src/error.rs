//! Errors raised by an extraction call.

use std::fmt;

use crate::date_format::DateFormatError;
use crate::schema::TypeKey;
use crate::transformer::TransformError;

/// Declared metadata is not enough to finish an extraction.
///
/// These are programmer errors in a type's schema. They abort the whole
/// extraction call; no partial output is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    MissingDateFormat {
        type_key: TypeKey,
        field: String,
    },
    InvalidDateFormat {
        type_key: TypeKey,
        field: String,
        source: DateFormatError,
    },
    EmptyFlatten {
        type_key: TypeKey,
        field: String,
        nested: TypeKey,
    },
    AmbiguousFlatten {
        type_key: TypeKey,
        field: String,
        candidates: usize,
    },
    FlatPickNotFound {
        type_key: TypeKey,
        field: String,
        pick: String,
    },
    NotAnObject {
        type_key: TypeKey,
        field: String,
        kind: &'static str,
    },
    NotStringable {
        type_key: TypeKey,
        field: String,
        kind: &'static str,
    },
    UnknownAccessor {
        type_key: TypeKey,
        field: String,
        accessor: String,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::MissingDateFormat { type_key, field } => write!(
                f,
                "{}.{}: could not process date value as there is no date format on the field",
                type_key, field
            ),
            ConfigurationError::InvalidDateFormat { type_key, field, source } => {
                write!(f, "{}.{}: {}", type_key, field, source)
            }
            ConfigurationError::EmptyFlatten { type_key, field, nested } => write!(
                f,
                "{}.{}: cannot flatten {} as no fields were extracted from it",
                type_key, field, nested
            ),
            ConfigurationError::AmbiguousFlatten { type_key, field, candidates } => write!(
                f,
                "{}.{}: flat_pick is required to choose between {} flattened fields",
                type_key, field, candidates
            ),
            ConfigurationError::FlatPickNotFound { type_key, field, pick } => write!(
                f,
                "{}.{}: flat_pick '{}' is not among the flattened fields",
                type_key, field, pick
            ),
            ConfigurationError::NotAnObject { type_key, field, kind } => write!(
                f,
                "{}.{}: only objects can be flattened, got {}",
                type_key, field, kind
            ),
            ConfigurationError::NotStringable { type_key, field, kind } => write!(
                f,
                "{}.{}: {} value has no string representation",
                type_key, field, kind
            ),
            ConfigurationError::UnknownAccessor { type_key, field, accessor } => write!(
                f,
                "{}.{}: item has no accessor '{}'",
                type_key, field, accessor
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigurationError::InvalidDateFormat { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error type for extraction calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    Configuration(ConfigurationError),
    Transform(TransformError),
    DepthExceeded { type_key: TypeKey, max_depth: usize },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Configuration(err) => write!(f, "Configuration error: {}", err),
            ExtractionError::Transform(err) => write!(f, "Transform error: {}", err),
            ExtractionError::DepthExceeded { type_key, max_depth } => write!(
                f,
                "Extraction of {} exceeds the maximum depth of {}",
                type_key, max_depth
            ),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Configuration(err) => Some(err),
            ExtractionError::Transform(err) => Some(err),
            ExtractionError::DepthExceeded { .. } => None,
        }
    }
}

impl From<ConfigurationError> for ExtractionError {
    fn from(err: ConfigurationError) -> Self {
        ExtractionError::Configuration(err)
    }
}

impl From<TransformError> for ExtractionError {
    fn from(err: TransformError) -> Self {
        ExtractionError::Transform(err)
    }
}

impl ExtractionError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExtractionError::Configuration(_))
    }

    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            ExtractionError::Configuration(err) => Some(err),
            _ => None,
        }
    }
}
