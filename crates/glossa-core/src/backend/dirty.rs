use crate::{
    backend::{Backend, ReadOptions, WriteOptions},
    error::TranslationError,
    locale::Locale,
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// ChangeSet
///
/// Per-locale change record for the current unit-of-work. The original is
/// the value a read would have returned immediately before the first write
/// to that locale; a locale counts as changed while the latest written
/// value differs from its original.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeSet {
    originals: BTreeMap<Locale, Option<Value>>,
    changed: BTreeSet<Locale>,
}

impl ChangeSet {
    /// True when any locale currently differs from its original.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    #[must_use]
    pub fn is_changed(&self, locale: &Locale) -> bool {
        self.changed.contains(locale)
    }

    /// The captured original for a locale, if a write has touched it this
    /// unit-of-work. Outer `None` = untouched; inner `None` = was absent.
    #[must_use]
    pub fn original(&self, locale: &Locale) -> Option<&Option<Value>> {
        self.originals.get(locale)
    }

    /// Locales currently marked changed, in locale order.
    pub fn changed_locales(&self) -> impl Iterator<Item = &Locale> {
        self.changed.iter()
    }

    /// Forget all recorded state. The owner's lifecycle calls this at its
    /// reset boundary, e.g. after a successful persist.
    pub fn reset(&mut self) {
        self.originals.clear();
        self.changed.clear();
    }
}

///
/// DirtyTracking
///
/// Records the pre-change value on the first write per locale in the
/// current unit-of-work and keeps the changed-set accurate as further
/// writes land. Writing a locale's original value back marks it unchanged
/// again. Reads pass through.
///

pub struct DirtyTracking {
    inner: Box<dyn Backend>,
    changes: ChangeSet,
}

impl DirtyTracking {
    #[must_use]
    pub fn new(inner: Box<dyn Backend>) -> Self {
        Self {
            inner,
            changes: ChangeSet::default(),
        }
    }
}

impl Backend for DirtyTracking {
    fn read(
        &mut self,
        locale: &Locale,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.inner.read(locale, options)
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        if !self.changes.originals.contains_key(locale) {
            let current = self.inner.read(locale, &ReadOptions::default())?;
            self.changes.originals.insert(locale.clone(), current);
        }

        let written = self.inner.write(locale, value, options)?;

        let original = self.changes.originals.get(locale);
        if original == Some(&written) {
            self.changes.changed.remove(locale);
        } else {
            self.changes.changed.insert(locale.clone());
        }

        Ok(written)
    }

    fn changes(&self) -> Option<&ChangeSet> {
        Some(&self.changes)
    }

    fn reset_changes(&mut self) {
        self.changes.reset();
    }
}
