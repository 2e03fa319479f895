//! In-memory backend doubles for decorator tests.

use crate::{
    backend::{Backend, BackendClass, BackendContext, ReadOptions, WriteOptions},
    error::TranslationError,
    locale::Locale,
    value::Value,
};
use std::{cell::Cell, collections::BTreeMap, rc::Rc};

///
/// MapBackend
///
/// Plain map-backed backend with shared read/write counters, for asserting
/// how often a decorator reaches through to its inner layer after the
/// backend has been boxed into a chain.
///

#[derive(Default)]
pub(crate) struct MapBackend {
    pub entries: BTreeMap<Locale, Value>,
    reads: Rc<Cell<usize>>,
    writes: Rc<Cell<usize>>,
}

impl MapBackend {
    pub(crate) fn with_entry(locale: Locale, value: Value) -> Self {
        let mut backend = Self::default();
        backend.entries.insert(locale, value);
        backend
    }

    /// Handles that keep counting after the backend is boxed.
    pub(crate) fn counters(&self) -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        (Rc::clone(&self.reads), Rc::clone(&self.writes))
    }
}

impl Backend for MapBackend {
    fn read(
        &mut self,
        locale: &Locale,
        _options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.entries.get(locale).cloned())
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        _options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.writes.set(self.writes.get() + 1);
        match &value {
            Some(v) => {
                self.entries.insert(locale.clone(), v.clone());
            }
            None => {
                self.entries.remove(locale);
            }
        }
        Ok(value)
    }
}

///
/// MapBackendClass
///
/// Backend class handing out fresh `MapBackend` instances.
///

pub(crate) struct MapBackendClass;

impl BackendClass for MapBackendClass {
    fn name(&self) -> &'static str {
        "map_test"
    }

    fn instantiate(
        &self,
        _ctx: &BackendContext<'_>,
    ) -> Result<Box<dyn Backend>, TranslationError> {
        Ok(Box::new(MapBackend::default()))
    }
}

///
/// FailingBackend
///
/// Fails every operation, for asserting that errors pass through decorator
/// layers unchanged.
///

pub(crate) struct FailingBackend;

///
/// FailingBackendClass
///

pub(crate) struct FailingBackendClass;

impl BackendClass for FailingBackendClass {
    fn name(&self) -> &'static str {
        "failing_test"
    }

    fn instantiate(
        &self,
        _ctx: &BackendContext<'_>,
    ) -> Result<Box<dyn Backend>, TranslationError> {
        Ok(Box::new(FailingBackend))
    }
}

impl Backend for FailingBackend {
    fn read(
        &mut self,
        _locale: &Locale,
        _options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        Err(TranslationError::backend_internal("storage medium failed"))
    }

    fn write(
        &mut self,
        _locale: &Locale,
        _value: Option<Value>,
        _options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        Err(TranslationError::backend_internal("storage medium failed"))
    }
}
