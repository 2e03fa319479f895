//! Model attachment and the process-wide model registry.
//!
//! `attach` is the single entry point for giving a model translated fields:
//! it composes a backend class per declaration, installs the generated
//! accessors, and runs the backend's one-time schema hook. Record-level
//! operations then dispatch through the registry by model path.

use crate::{
    accessor::{AccessorSet, FieldDeclaration},
    backend::{ChangeSet, ComposedBackendClass, ReadOptions, WriteOptions},
    binding::Translatable,
    error::{AccessorError, ModelError, TranslationError},
    locale::Locale,
    value::Value,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
};

thread_local! {
    static MODELS: RefCell<HashMap<String, ModelTranslations>> = RefCell::new(HashMap::new());
}

///
/// ModelSchema
///
/// Schema surface a backend class may extend at attachment time: the
/// translated field list, backing associations, and query scopes.
///

#[derive(Debug)]
pub struct ModelSchema {
    path: String,
    translated: Vec<String>,
    associations: Vec<String>,
    query_scopes: Vec<String>,
}

impl ModelSchema {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            translated: Vec::new(),
            associations: Vec::new(),
            query_scopes: Vec::new(),
        }
    }

    /// Record `fields` as translated, skipping ones already recorded.
    pub fn add_translated(&mut self, fields: &[String]) {
        for field in fields {
            if !self.translated.contains(field) {
                self.translated.push(field.clone());
            }
        }
    }

    pub fn add_association(&mut self, name: &str) {
        if !self.associations.iter().any(|a| a == name) {
            self.associations.push(name.to_string());
        }
    }

    pub fn add_query_scope(&mut self, name: &str) {
        if !self.query_scopes.iter().any(|s| s == name) {
            self.query_scopes.push(name.to_string());
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn translated(&self) -> &[String] {
        &self.translated
    }

    #[must_use]
    pub fn associations(&self) -> &[String] {
        &self.associations
    }

    #[must_use]
    pub fn query_scopes(&self) -> &[String] {
        &self.query_scopes
    }
}

///
/// ModelTranslations
///
/// Everything the registry holds for one attached model: its schema surface,
/// its accessor table, and the set of canonical field names declared so far.
///

pub struct ModelTranslations {
    schema: ModelSchema,
    accessors: AccessorSet,
    declared: BTreeSet<String>,
}

impl ModelTranslations {
    fn new(path: &str) -> Self {
        Self {
            schema: ModelSchema::new(path),
            accessors: AccessorSet::new(),
            declared: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    #[must_use]
    pub const fn accessors(&self) -> &AccessorSet {
        &self.accessors
    }
}

/// Attach translated fields to the model registered under `path`.
///
/// Each declaration composes its own backend class, installs its accessor
/// entries, and runs the base backend's schema hook once. Declaring a field
/// name twice on the same model is a conflict; a failing declaration leaves
/// previously attached declarations intact.
pub fn attach(
    path: &str,
    declarations: impl IntoIterator<Item = FieldDeclaration>,
) -> Result<(), TranslationError> {
    MODELS.with_borrow_mut(|models| {
        let model = models
            .entry(path.to_string())
            .or_insert_with(|| ModelTranslations::new(path));

        for declaration in declarations {
            for field in declaration.fields() {
                if model.declared.contains(field) {
                    return Err(AccessorError::DuplicateField {
                        model: path.to_string(),
                        name: field.clone(),
                    }
                    .into());
                }
            }

            let class = Rc::new(ComposedBackendClass::compose(
                declaration.field_options().clone(),
            )?);
            class.setup_model(&mut model.schema, declaration.fields())?;
            model.accessors.install(&declaration, &class);
            model
                .declared
                .extend(declaration.fields().iter().cloned());
        }

        Ok(())
    })
}

/// Run `f` against the registered translations for `path`.
pub fn with_model<R>(
    path: &str,
    f: impl FnOnce(&ModelTranslations) -> R,
) -> Result<R, TranslationError> {
    MODELS.with_borrow(|models| {
        models.get(path).map(f).ok_or_else(|| {
            ModelError::NotAttached {
                path: path.to_string(),
            }
            .into()
        })
    })
}

/// Run `f` against the translations attached under `record`'s model path.
pub fn translations_for<T: Translatable + ?Sized, R>(
    record: &T,
    f: impl FnOnce(&ModelTranslations) -> R,
) -> Result<R, TranslationError> {
    with_model(record.model_path(), f)
}

#[must_use]
pub fn is_attached(path: &str) -> bool {
    MODELS.with_borrow(|models| models.contains_key(path))
}

/// Forget every attached model. Test plumbing.
pub fn reset() {
    MODELS.with_borrow_mut(HashMap::clear);
}

/// Read `name` on `record`, at an explicit locale or the current one.
pub fn read<T: Translatable + ?Sized>(
    record: &T,
    name: &str,
    locale: Option<&Locale>,
    options: &ReadOptions,
) -> Result<Option<Value>, TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.read(record, name, locale, options)
    })?
}

/// Presence predicate for `name` on `record`.
pub fn present<T: Translatable + ?Sized>(
    record: &T,
    name: &str,
    locale: Option<&Locale>,
    options: &ReadOptions,
) -> Result<bool, TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.present(record, name, locale, options)
    })?
}

/// Write `value` to `name` on `record`. `None` deletes the locale's entry.
pub fn write<T: Translatable + ?Sized>(
    record: &T,
    name: &str,
    value: Option<Value>,
    locale: Option<&Locale>,
    options: &WriteOptions,
) -> Result<Option<Value>, TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.write(record, name, value, locale, options)
    })?
}

/// Per-locale change-set for a dirty-tracked field on `record`.
pub fn field_changes<T: Translatable + ?Sized>(
    record: &T,
    field: &str,
) -> Result<Option<ChangeSet>, TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.field_changes(record, field)
    })?
}

/// Reset dirty state across all of `record`'s bound fields.
pub fn reset_changes<T: Translatable + ?Sized>(record: &T) -> Result<(), TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.reset_changes(record)
    })?
}

/// Name-to-value map over `record`'s readable fields at the current locale.
pub fn translated_attributes<T: Translatable + ?Sized>(
    record: &T,
) -> Result<BTreeMap<String, Option<Value>>, TranslationError> {
    with_model(record.model_path(), |model| {
        model.accessors.translated_attributes(record)
    })?
}
