//! Core runtime for Glossa: locale-keyed field access for data models.
//!
//! A model declares "translated" fields; for each field the runtime binds a
//! storage backend wrapped by an ordered chain of decorators (cache, dirty
//! tracking, locale fallbacks, presence filtering) and exposes read/write/
//! presence accessors that validate locales before touching any backend.
#![warn(unreachable_pub)]

pub mod accessor;
pub mod backend;
pub mod binding;
pub mod config;
pub mod error;
pub mod locale;
pub mod model;
pub mod obs;
pub mod value;

///
/// CONSTANTS
///

/// Suffix under which a shadowed accessor entry remains reachable.
///
/// When a registration installs an accessor over an existing entry, the
/// prior entry is re-registered as `{name}{ALIAS_SUFFIX}`.
pub const ALIAS_SUFFIX: &str = "_untranslated";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        accessor::{AccessKind, FieldDeclaration},
        backend::{Backend, BackendClass, FieldOptions, ReadOptions, WriteOptions},
        binding::{RecordKey, Translatable},
        locale::{FallbackChains, Locale},
        value::{Value, ValuePresence},
    };
}
