use crate::{
    backend::{Backend, ReadOptions, WriteOptions, dirty::ChangeSet},
    error::TranslationError,
    locale::Locale,
    value::{Value, ValuePresence},
};

///
/// PresenceFilter
///
/// Stateless decorator that makes "no translation" and "blank translation"
/// indistinguishable: blank reads surface as absent, blank writes are
/// normalized to absence (delete) before reaching the inner backend.
///

pub struct PresenceFilter {
    inner: Box<dyn Backend>,
}

impl PresenceFilter {
    #[must_use]
    pub fn new(inner: Box<dyn Backend>) -> Self {
        Self { inner }
    }
}

impl Backend for PresenceFilter {
    fn read(
        &mut self,
        locale: &Locale,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        Ok(self.inner.read(locale, options)?.presence())
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.inner.write(locale, value.presence(), options)
    }

    fn changes(&self) -> Option<&ChangeSet> {
        self.inner.changes()
    }

    fn reset_changes(&mut self) {
        self.inner.reset_changes();
    }
}
