//! Key-value base backend: one store entry per
//! `(model, record, field, locale)`.
//!
//! In-memory, thread-local storage in the engine's store-handle idiom.
//! Tests (and embedders wanting isolation) can point a class at their own
//! thread-local store.

use crate::{
    backend::{Backend, BackendClass, BackendContext, FieldOptions, ReadOptions, WriteOptions},
    binding::RecordKey,
    error::TranslationError,
    locale::Locale,
    model::ModelSchema,
    value::Value,
};
use derive_more::{Deref, DerefMut};
use std::{cell::RefCell, collections::BTreeMap, thread::LocalKey};

thread_local! {
    static KEY_VALUE_STORE: RefCell<TranslationStore> = RefCell::new(TranslationStore::new());
}

///
/// StorageKey
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct StorageKey {
    model: Box<str>,
    record: RecordKey,
    field: Box<str>,
    locale: Locale,
}

impl StorageKey {
    #[must_use]
    pub fn new(model: &str, record: RecordKey, field: &str, locale: Locale) -> Self {
        Self {
            model: model.into(),
            record,
            field: field.into(),
            locale,
        }
    }
}

///
/// TranslationStore
///

#[derive(Default, Deref, DerefMut)]
pub struct TranslationStore(BTreeMap<StorageKey, Value>);

impl TranslationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

///
/// StoreHandle
///
/// Bound thread-local translation store for one backend class.
///

#[derive(Clone, Copy)]
pub struct StoreHandle(&'static LocalKey<RefCell<TranslationStore>>);

impl StoreHandle {
    #[must_use]
    pub const fn new(store: &'static LocalKey<RefCell<TranslationStore>>) -> Self {
        Self(store)
    }

    /// Borrow the store immutably.
    pub fn with<R>(&self, f: impl FnOnce(&TranslationStore) -> R) -> R {
        self.0.with_borrow(f)
    }

    /// Borrow the store mutably.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut TranslationStore) -> R) -> R {
        self.0.with_borrow_mut(f)
    }
}

/// The process-default key-value store.
#[must_use]
pub fn global_store() -> StoreHandle {
    StoreHandle::new(&KEY_VALUE_STORE)
}

///
/// KeyValueClass
///

pub struct KeyValueClass {
    store: StoreHandle,
}

impl KeyValueClass {
    #[must_use]
    pub const fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

impl Default for KeyValueClass {
    fn default() -> Self {
        Self::new(global_store())
    }
}

impl BackendClass for KeyValueClass {
    fn name(&self) -> &'static str {
        "key_value"
    }

    fn instantiate(&self, ctx: &BackendContext<'_>) -> Result<Box<dyn Backend>, TranslationError> {
        Ok(Box::new(KeyValueBackend {
            store: self.store,
            model: ctx.model.into(),
            record: ctx.record,
            field: ctx.field.into(),
        }))
    }

    fn setup_model(
        &self,
        model: &mut ModelSchema,
        fields: &[String],
        _options: &FieldOptions,
    ) -> Result<(), TranslationError> {
        model.add_translated(fields);
        model.add_association("translations");
        model.add_query_scope("i18n");
        Ok(())
    }
}

///
/// KeyValueBackend
///

pub struct KeyValueBackend {
    store: StoreHandle,
    model: Box<str>,
    record: RecordKey,
    field: Box<str>,
}

impl KeyValueBackend {
    fn key(&self, locale: &Locale) -> StorageKey {
        StorageKey::new(&self.model, self.record, &self.field, locale.clone())
    }
}

impl Backend for KeyValueBackend {
    fn read(
        &mut self,
        locale: &Locale,
        _options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        Ok(self.store.with(|store| store.get(&self.key(locale)).cloned()))
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        _options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let key = self.key(locale);
        self.store.with_mut(|store| match &value {
            Some(v) => {
                store.insert(key, v.clone());
            }
            None => {
                store.remove(&key);
            }
        });
        Ok(value)
    }
}
