//! Accessor generation.
//!
//! The runtime rendition of "define a method per field": a dispatch table
//! of accessor entries keyed by name, installed at attachment time and
//! consulted by generic read/present/write entry points. Fixed-locale
//! entries hard-wire their locale; fallthrough dispatch resolves a locale
//! suffix at call time for names with no entry of their own.

use crate::{
    ALIAS_SUFFIX,
    backend::{
        BackendContext, ChangeSet, ComposedBackendClass, FieldOptions, LocaleAccessorsOption,
        ReadOptions, WriteOptions,
    },
    binding::Translatable,
    config,
    error::{AccessorError, TranslationError},
    locale::Locale,
    obs::{self, MetricsEvent},
    value::{Value, ValuePresence},
};
use std::{collections::BTreeMap, rc::Rc};

///
/// AccessKind
///
/// Operation kind a field is declared with.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessKind {
    Reader,
    Writer,
    Accessor,
}

impl AccessKind {
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(self, Self::Reader | Self::Accessor)
    }

    #[must_use]
    pub const fn writable(self) -> bool {
        matches!(self, Self::Writer | Self::Accessor)
    }
}

///
/// FieldDeclaration
///
/// One field-set declaration: operation kind, field list, options.
/// Immutable once attached.
///

#[derive(Clone, Debug)]
pub struct FieldDeclaration {
    access: AccessKind,
    fields: Vec<String>,
    options: FieldOptions,
}

impl FieldDeclaration {
    #[must_use]
    pub fn new(
        access: AccessKind,
        fields: impl IntoIterator<Item = impl Into<String>>,
        options: FieldOptions,
    ) -> Self {
        Self {
            access,
            fields: fields.into_iter().map(Into::into).collect(),
            options,
        }
    }

    /// Read-write declaration.
    #[must_use]
    pub fn accessor(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(AccessKind::Accessor, fields, FieldOptions::new())
    }

    /// Read-only declaration (reader and presence predicate).
    #[must_use]
    pub fn reader(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(AccessKind::Reader, fields, FieldOptions::new())
    }

    /// Write-only declaration.
    #[must_use]
    pub fn writer(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(AccessKind::Writer, fields, FieldOptions::new())
    }

    #[must_use]
    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub const fn access(&self) -> AccessKind {
        self.access
    }

    #[must_use]
    pub const fn field_options(&self) -> &FieldOptions {
        &self.options
    }
}

///
/// AccessorEntry
///

#[derive(Clone)]
struct AccessorEntry {
    /// Canonical field name: backend binding key and storage field.
    field: String,
    access: AccessKind,
    class: Rc<ComposedBackendClass>,
    /// Hard-wired locale for fixed-locale entries.
    locale: Option<Locale>,
    /// Whether fallthrough dispatch may resolve suffixed names to this
    /// entry. Meaningful on canonical entries only.
    fallthrough: bool,
}

///
/// AccessorSet
///
/// The generated accessor table for one model.
///

#[derive(Default)]
pub struct AccessorSet {
    entries: BTreeMap<String, AccessorEntry>,
}

impl AccessorSet {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Install the entries for one declaration backed by `class`.
    ///
    /// Collision policy: an entry installed over an existing name
    /// re-registers the prior entry under `{name}{ALIAS_SUFFIX}` first, so
    /// both remain reachable.
    pub(crate) fn install(&mut self, declaration: &FieldDeclaration, class: &Rc<ComposedBackendClass>) {
        let options = class.options();
        let fallthrough = options.fallthrough_enabled();
        let accessor_locales: Vec<Locale> = match &options.locale_accessors {
            LocaleAccessorsOption::Disabled => vec![],
            LocaleAccessorsOption::Configured => config::with_config(config::Config::accessor_locales),
            LocaleAccessorsOption::Locales(locales) => locales.clone(),
        };

        for field in declaration.fields() {
            self.install_entry(
                field.clone(),
                AccessorEntry {
                    field: field.clone(),
                    access: declaration.access(),
                    class: Rc::clone(class),
                    locale: None,
                    fallthrough,
                },
            );

            for locale in &accessor_locales {
                self.install_entry(
                    format!("{field}_{}", locale.suffix()),
                    AccessorEntry {
                        field: field.clone(),
                        access: declaration.access(),
                        class: Rc::clone(class),
                        locale: Some(locale.clone()),
                        fallthrough: false,
                    },
                );
            }
        }
    }

    fn install_entry(&mut self, name: String, entry: AccessorEntry) {
        if let Some(prior) = self.entries.remove(&name) {
            self.entries.insert(format!("{name}{ALIAS_SUFFIX}"), prior);
        }
        self.entries.insert(name, entry);
    }

    /// Resolve an accessor name to its entry and effective hard-wired
    /// locale, applying fallthrough suffix dispatch for unknown names.
    fn resolve(&self, name: &str) -> Result<(&AccessorEntry, Option<Locale>), AccessorError> {
        if let Some(entry) = self.entries.get(name) {
            return Ok((entry, entry.locale.clone()));
        }

        let available = config::with_config(|c| c.available_locales().to_vec());
        for locale in &available {
            let suffix = format!("_{}", locale.suffix());
            if let Some(base) = name.strip_suffix(&suffix) {
                if let Some(entry) = self.entries.get(base) {
                    if entry.locale.is_none() && entry.fallthrough {
                        return Ok((entry, Some(locale.clone())));
                    }
                }
            }
        }

        Err(AccessorError::Unknown {
            name: name.to_string(),
        })
    }

    /// Effective locale for a call: hard-wired, else explicit, else the
    /// process-wide current locale. Validated before any backend call.
    fn effective_locale(
        bound: Option<Locale>,
        explicit: Option<&Locale>,
    ) -> Result<Locale, TranslationError> {
        let locale = bound
            .or_else(|| explicit.cloned())
            .unwrap_or_else(config::current_locale);

        if let Err(err) = config::enforce_available(&locale) {
            obs::record(MetricsEvent::LocaleRejected);
            return Err(err);
        }

        Ok(locale)
    }

    fn with_backend<T: Translatable + ?Sized, R>(
        record: &T,
        entry: &AccessorEntry,
        f: impl FnOnce(&mut dyn crate::backend::Backend) -> R,
    ) -> Result<R, TranslationError> {
        let model = record.model_path();
        let key = record.record_key();
        record.backend_map().with_backend(
            &entry.field,
            || {
                entry.class.instantiate(&BackendContext {
                    model,
                    record: key,
                    field: &entry.field,
                })
            },
            f,
        )
    }

    fn read_entry<T: Translatable + ?Sized>(
        &self,
        record: &T,
        name: &str,
        locale: Option<&Locale>,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let (entry, bound) = self.resolve(name)?;
        if !entry.access.readable() {
            return Err(AccessorError::NotReadable {
                name: name.to_string(),
            }
            .into());
        }

        let locale = Self::effective_locale(bound, locale)?;
        obs::record(MetricsEvent::AccessorRead);
        Self::with_backend(record, entry, |backend| backend.read(&locale, options))?
    }

    /// Reader entry point.
    pub fn read<T: Translatable + ?Sized>(
        &self,
        record: &T,
        name: &str,
        locale: Option<&Locale>,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.read_entry(record, name, locale, options)
    }

    /// Presence predicate: reader plus final blank-to-absence
    /// normalization.
    pub fn present<T: Translatable + ?Sized>(
        &self,
        record: &T,
        name: &str,
        locale: Option<&Locale>,
        options: &ReadOptions,
    ) -> Result<bool, TranslationError> {
        Ok(self.read_entry(record, name, locale, options)?.is_present())
    }

    /// Writer entry point. `None` deletes the entry for the locale.
    pub fn write<T: Translatable + ?Sized>(
        &self,
        record: &T,
        name: &str,
        value: Option<Value>,
        locale: Option<&Locale>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let (entry, bound) = self.resolve(name)?;
        if !entry.access.writable() {
            return Err(AccessorError::NotWritable {
                name: name.to_string(),
            }
            .into());
        }

        let locale = Self::effective_locale(bound, locale)?;
        obs::record(MetricsEvent::AccessorWrite);
        Self::with_backend(record, entry, |backend| {
            backend.write(&locale, value, options)
        })?
    }

    /// Per-locale change-set for a dirty-tracked field. `None` when the
    /// field does not track dirty state or nothing is bound yet.
    pub fn field_changes<T: Translatable + ?Sized>(
        &self,
        record: &T,
        field: &str,
    ) -> Result<Option<ChangeSet>, TranslationError> {
        let entry = self.entries.get(field).ok_or_else(|| AccessorError::Unknown {
            name: field.to_string(),
        })?;
        if !entry.class.tracks_dirty() || !record.backend_map().is_bound(&entry.field) {
            return Ok(None);
        }

        Self::with_backend(record, entry, |backend| backend.changes().cloned())
    }

    /// Reset every bound field's unit-of-work change-set. The owning
    /// lifecycle calls this at its reset boundary (e.g. after persisting).
    pub fn reset_changes<T: Translatable + ?Sized>(
        &self,
        record: &T,
    ) -> Result<(), TranslationError> {
        for entry in self.entries.values() {
            let canonical = entry.locale.is_none();
            if canonical
                && entry.class.tracks_dirty()
                && record.backend_map().is_bound(&entry.field)
            {
                Self::with_backend(record, entry, |backend| backend.reset_changes())?;
            }
        }
        Ok(())
    }

    /// Name-to-value map over all readable canonical fields at the current
    /// locale.
    pub fn translated_attributes<T: Translatable + ?Sized>(
        &self,
        record: &T,
    ) -> Result<BTreeMap<String, Option<Value>>, TranslationError> {
        let mut attributes = BTreeMap::new();
        for (name, entry) in &self.entries {
            let canonical =
                entry.locale.is_none() && entry.access.readable() && *name == entry.field;
            if canonical {
                let value = self.read_entry(record, name, None, &ReadOptions::default())?;
                attributes.insert(name.clone(), value);
            }
        }
        Ok(attributes)
    }

    /// Installed accessor names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
