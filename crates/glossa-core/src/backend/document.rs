//! Document base backend: one serialized JSON document per
//! `(model, record, field)` holding that field's locale-to-value map.
//!
//! Documents are stored as raw bytes and decoded on every read; a document
//! that fails to decode surfaces as store corruption. Writing absence
//! removes the locale key, and a document emptied by such a write is
//! deleted outright.

use crate::{
    backend::{Backend, BackendClass, BackendContext, FieldOptions, ReadOptions, WriteOptions},
    binding::RecordKey,
    error::{StoreError, TranslationError},
    locale::Locale,
    model::ModelSchema,
    value::Value,
};
use derive_more::{Deref, DerefMut};
use std::{cell::RefCell, collections::BTreeMap, thread::LocalKey};

thread_local! {
    static DOCUMENT_STORE: RefCell<DocumentStore> = RefCell::new(DocumentStore::new());
}

/// Max serialized bytes for a single document to keep loads bounded.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

///
/// DocumentKey
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct DocumentKey {
    model: Box<str>,
    record: RecordKey,
    field: Box<str>,
}

impl DocumentKey {
    #[must_use]
    pub fn new(model: &str, record: RecordKey, field: &str) -> Self {
        Self {
            model: model.into(),
            record,
            field: field.into(),
        }
    }
}

///
/// RawDocument
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawDocument(Vec<u8>);

impl RawDocument {
    pub fn try_new(bytes: Vec<u8>) -> Result<Self, StoreError> {
        if bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(StoreError::Serialize {
                message: format!(
                    "document exceeds max size: {} bytes (limit {MAX_DOCUMENT_BYTES})",
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn try_decode(&self) -> Result<BTreeMap<Locale, Value>, StoreError> {
        serde_json::from_slice(&self.0).map_err(|err| StoreError::Corrupt {
            message: err.to_string(),
        })
    }

    fn try_encode(doc: &BTreeMap<Locale, Value>) -> Result<Self, StoreError> {
        let bytes = serde_json::to_vec(doc).map_err(|err| StoreError::Serialize {
            message: err.to_string(),
        })?;
        Self::try_new(bytes)
    }
}

///
/// DocumentStore
///

#[derive(Default, Deref, DerefMut)]
pub struct DocumentStore(BTreeMap<DocumentKey, RawDocument>);

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

///
/// StoreHandle
///

#[derive(Clone, Copy)]
pub struct StoreHandle(&'static LocalKey<RefCell<DocumentStore>>);

impl StoreHandle {
    #[must_use]
    pub const fn new(store: &'static LocalKey<RefCell<DocumentStore>>) -> Self {
        Self(store)
    }

    pub fn with<R>(&self, f: impl FnOnce(&DocumentStore) -> R) -> R {
        self.0.with_borrow(f)
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        self.0.with_borrow_mut(f)
    }
}

/// The process-default document store.
#[must_use]
pub fn global_store() -> StoreHandle {
    StoreHandle::new(&DOCUMENT_STORE)
}

///
/// DocumentClass
///

pub struct DocumentClass {
    store: StoreHandle,
}

impl DocumentClass {
    #[must_use]
    pub const fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

impl Default for DocumentClass {
    fn default() -> Self {
        Self::new(global_store())
    }
}

impl BackendClass for DocumentClass {
    fn name(&self) -> &'static str {
        "document"
    }

    fn instantiate(&self, ctx: &BackendContext<'_>) -> Result<Box<dyn Backend>, TranslationError> {
        Ok(Box::new(DocumentBackend {
            store: self.store,
            key: DocumentKey::new(ctx.model, ctx.record, ctx.field),
        }))
    }

    fn setup_model(
        &self,
        model: &mut ModelSchema,
        fields: &[String],
        _options: &FieldOptions,
    ) -> Result<(), TranslationError> {
        model.add_translated(fields);
        model.add_query_scope("i18n");
        Ok(())
    }
}

///
/// DocumentBackend
///

pub struct DocumentBackend {
    store: StoreHandle,
    key: DocumentKey,
}

impl DocumentBackend {
    fn load(&self) -> Result<BTreeMap<Locale, Value>, TranslationError> {
        self.store.with(|store| {
            store
                .get(&self.key)
                .map_or_else(|| Ok(BTreeMap::new()), |raw| Ok(raw.try_decode()?))
        })
    }
}

impl Backend for DocumentBackend {
    fn read(
        &mut self,
        locale: &Locale,
        _options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        Ok(self.load()?.get(locale).cloned())
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        _options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let mut doc = self.load()?;
        match &value {
            Some(v) => {
                doc.insert(locale.clone(), v.clone());
            }
            None => {
                doc.remove(locale);
            }
        }

        if doc.is_empty() {
            self.store.with_mut(|store| {
                store.remove(&self.key);
            });
        } else {
            let raw = RawDocument::try_encode(&doc)?;
            self.store.with_mut(|store| {
                store.insert(self.key.clone(), raw);
            });
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    thread_local! {
        static TEST_STORE: RefCell<DocumentStore> = RefCell::new(DocumentStore::new());
    }

    fn locale(tag: &str) -> Locale {
        Locale::new(tag).expect("test locale tag should be valid")
    }

    fn backend(record: u64, field: &str) -> Box<dyn Backend> {
        DocumentClass::new(StoreHandle::new(&TEST_STORE))
            .instantiate(&BackendContext {
                model: "document_tests::Post",
                record: RecordKey::new(record),
                field,
            })
            .expect("instantiation should succeed")
    }

    #[test]
    fn locales_share_one_document_per_field() {
        let mut b = backend(1, "title");

        b.write(&locale("en"), Some(Value::text("Hello")), &WriteOptions::default())
            .expect("write should succeed");
        b.write(&locale("de"), Some(Value::text("Hallo")), &WriteOptions::default())
            .expect("write should succeed");

        assert_eq!(
            b.read(&locale("en"), &ReadOptions::default()).expect("read"),
            Some(Value::text("Hello"))
        );
        assert_eq!(
            b.read(&locale("de"), &ReadOptions::default()).expect("read"),
            Some(Value::text("Hallo"))
        );

        let rows = TEST_STORE.with_borrow(|store| store.len());
        assert_eq!(rows, 1, "both locales live in one stored document");
    }

    #[test]
    fn emptied_document_is_deleted() {
        let mut b = backend(2, "title");

        b.write(&locale("en"), Some(Value::text("Hello")), &WriteOptions::default())
            .expect("write should succeed");
        b.write(&locale("en"), None, &WriteOptions::default())
            .expect("write should succeed");

        let present = TEST_STORE.with_borrow(|store| {
            store.contains_key(&DocumentKey::new(
                "document_tests::Post",
                RecordKey::new(2),
                "title",
            ))
        });
        assert!(!present, "an emptied document must be removed from the store");
    }

    #[test]
    fn non_text_values_round_trip_through_the_document() {
        let mut b = backend(3, "count");

        b.write(&locale("en"), Some(Value::Uint(7)), &WriteOptions::default())
            .expect("write should succeed");
        assert_eq!(
            b.read(&locale("en"), &ReadOptions::default()).expect("read"),
            Some(Value::Uint(7)),
            "stored value kind must survive serialization"
        );
    }

    #[test]
    fn corrupt_document_surfaces_as_store_corruption() {
        let key = DocumentKey::new("document_tests::Post", RecordKey::new(4), "title");
        TEST_STORE.with_borrow_mut(|store| {
            store.insert(
                key,
                RawDocument::try_new(b"not json".to_vec()).expect("size is fine"),
            );
        });

        let mut b = backend(4, "title");
        let err = b
            .read(&locale("en"), &ReadOptions::default())
            .expect_err("corrupt bytes must fail the read");
        assert_eq!(err.class, ErrorClass::Corruption);
    }
}
