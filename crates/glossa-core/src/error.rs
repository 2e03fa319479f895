use std::fmt;
use thiserror::Error as ThisError;

///
/// TranslationError
///
/// Structured runtime error with a stable internal classification.
/// Backend failures pass through every decorator layer unchanged; nothing
/// in the engine retries.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct TranslationError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl TranslationError {
    /// Construct an error with an explicit classification.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a backend-origin internal error.
    pub fn backend_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Backend, message)
    }

    /// Construct a store-origin corruption error.
    pub fn store_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Store, message)
    }

    #[must_use]
    pub const fn is_locale(&self) -> bool {
        matches!(self.class, ErrorClass::Locale)
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self.class, ErrorClass::Config)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Config,
    Locale,
    NotFound,
    Conflict,
    Corruption,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Locale => "locale",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Corruption => "corruption",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Accessor,
    Backend,
    Binding,
    Composer,
    Config,
    Model,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accessor => "accessor",
            Self::Backend => "backend",
            Self::Binding => "binding",
            Self::Composer => "composer",
            Self::Config => "config",
            Self::Model => "model",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}

///
/// ConfigError
///
/// Raised at composition or attachment time. Fatal to that field-set's
/// setup only; other fields are unaffected.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("backend option required: no backend selected and no default backend configured")]
    BackendRequired,

    #[error("default locale '{tag}' is not in the available locale set")]
    DefaultLocaleUnavailable { tag: String },

    #[error("available locale set must not be empty")]
    NoAvailableLocales,
}

impl ConfigError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Config
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::BackendRequired => ErrorOrigin::Composer,
            Self::DefaultLocaleUnavailable { .. } | Self::NoAvailableLocales => ErrorOrigin::Config,
        }
    }
}

impl From<ConfigError> for TranslationError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// LocaleError
///
/// Raised at every accessor call boundary before any backend is touched.
/// Never silently coerced.
///

#[derive(Debug, ThisError)]
pub enum LocaleError {
    #[error("invalid locale tag: '{tag}'")]
    Invalid { tag: String },

    #[error("locale '{tag}' is not in the available locale set")]
    NotAvailable { tag: String },
}

impl LocaleError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::Locale
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Config
    }
}

impl From<LocaleError> for TranslationError {
    fn from(err: LocaleError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// AccessorError
///

#[derive(Debug, ThisError)]
pub enum AccessorError {
    #[error("no accessor named '{name}'")]
    Unknown { name: String },

    #[error("accessor '{name}' is write-only")]
    NotReadable { name: String },

    #[error("accessor '{name}' is read-only")]
    NotWritable { name: String },

    #[error("field '{name}' declared more than once on model '{model}'")]
    DuplicateField { model: String, name: String },
}

impl AccessorError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unknown { .. } => ErrorClass::NotFound,
            Self::NotReadable { .. } | Self::NotWritable { .. } => ErrorClass::Unsupported,
            Self::DuplicateField { .. } => ErrorClass::Conflict,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::DuplicateField { .. } => ErrorOrigin::Model,
            _ => ErrorOrigin::Accessor,
        }
    }
}

impl From<AccessorError> for TranslationError {
    fn from(err: AccessorError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// ModelError
///

#[derive(Debug, ThisError)]
pub enum ModelError {
    #[error("model '{path}' has no translations attached")]
    NotAttached { path: String },
}

impl ModelError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::NotFound
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Model
    }
}

impl From<ModelError> for TranslationError {
    fn from(err: ModelError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}

///
/// StoreError
///
/// Base-backend storage failures. Decorators never catch these.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("stored document failed to decode: {message}")]
    Corrupt { message: String },

    #[error("value failed to serialize: {message}")]
    Serialize { message: String },
}

impl StoreError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Corrupt { .. } => ErrorClass::Corruption,
            Self::Serialize { .. } => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        ErrorOrigin::Store
    }
}

impl From<StoreError> for TranslationError {
    fn from(err: StoreError) -> Self {
        Self::new(err.class(), err.origin(), err.to_string())
    }
}
