//! Per-record backend binding.
//!
//! Each owning record instance holds a `BackendMap`: a lazily-filled,
//! memoized arena of composed backend instances, one per translated field.
//! The arena is private to the instance and is dropped with it, so cache
//! and dirty state are never shared across record instances.

use crate::{backend::Backend, error::TranslationError};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::{HashMap, hash_map::Entry},
    fmt,
};

///
/// RecordKey
///
/// Identity of one owning record instance, as seen by storage backends.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct RecordKey(u64);

impl RecordKey {
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordKey {
    fn from(key: u64) -> Self {
        Self(key)
    }
}

///
/// Translatable
///
/// Implemented by owning record types. Supplies the model path the record's
/// translations were attached under, the record's storage identity, and the
/// per-instance backend arena.
///

pub trait Translatable {
    /// Model path used at attachment time.
    fn model_path(&self) -> &'static str;

    /// Storage identity of this record instance.
    fn record_key(&self) -> RecordKey;

    /// The per-instance backend arena.
    fn backend_map(&self) -> &BackendMap;
}

///
/// BackendMap
///
/// Field name to backend instance, created on first access. At most one
/// instance exists per `(record instance, field)` at any time, so a field's
/// cache and dirty state survive repeated accessor calls.
///

#[derive(Default)]
pub struct BackendMap {
    backends: RefCell<HashMap<String, Box<dyn Backend>>>,
}

impl BackendMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the memoized backend for `field`, constructing it
    /// via `init` on first access. A failed `init` leaves the field unbound.
    pub fn with_backend<R>(
        &self,
        field: &str,
        init: impl FnOnce() -> Result<Box<dyn Backend>, TranslationError>,
        f: impl FnOnce(&mut dyn Backend) -> R,
    ) -> Result<R, TranslationError> {
        let mut backends = self.backends.borrow_mut();

        let backend = match backends.entry(field.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(init()?),
        };
        Ok(f(backend.as_mut()))
    }

    /// True when `field` already has a bound instance.
    #[must_use]
    pub fn is_bound(&self, field: &str) -> bool {
        self.backends.borrow().contains_key(field)
    }

    /// Number of bound fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.borrow().is_empty()
    }
}
