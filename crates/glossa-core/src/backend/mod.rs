//! Storage backends and the decorator chain wrapped around them.
//!
//! A backend stores one field's locale-keyed values. Decorators re-implement
//! the same contract over an inner backend, adding one cross-cutting
//! behavior each; `compose` assembles them in a fixed precedence order.

pub mod cache;
pub mod compose;
pub mod dirty;
pub mod document;
pub mod fallbacks;
pub mod key_value;
pub mod presence;

#[cfg(test)]
pub(crate) mod test_support;

use crate::{
    binding::RecordKey,
    error::{ConfigError, TranslationError},
    locale::{FallbackChains, Locale},
    model::ModelSchema,
    value::Value,
};
use std::rc::Rc;

// re-exports
pub use cache::ReadCache;
pub use compose::ComposedBackendClass;
pub use dirty::{ChangeSet, DirtyTracking};
pub use fallbacks::LocaleFallbacks;
pub use presence::PresenceFilter;

///
/// Backend
///
/// Minimal capability contract for one field's locale-keyed storage.
/// Absence is `None`; a written `None` means "delete". Errors are
/// backend-specific and propagate to the caller unchanged.
///

pub trait Backend {
    /// Read the value stored under `locale`, or `None` when absent.
    fn read(
        &mut self,
        locale: &Locale,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError>;

    /// Write `value` under `locale` and return the value as written
    /// (post-normalization). `None` removes the entry.
    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError>;

    /// Per-locale change-set, when dirty tracking is in the chain.
    /// Decorators delegate; base backends report none.
    fn changes(&self) -> Option<&ChangeSet> {
        None
    }

    /// Reset the unit-of-work change-set, when dirty tracking is in the
    /// chain. Called at the owner's lifecycle boundary.
    fn reset_changes(&mut self) {}
}

///
/// FallbackDirective
///
/// Per-call fallback control carried on read options.
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum FallbackDirective {
    /// Use the chains the field was composed with.
    #[default]
    Configured,
    /// Skip fallback resolution for this call.
    Disabled,
    /// Replace the chain for this call with an explicit locale list.
    Chain(Vec<Locale>),
}

///
/// ReadOptions
///

#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReadOptions {
    pub fallback: FallbackDirective,
    /// Bypass the memoized cache for this call (the result is still stored).
    pub skip_cache: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn without_fallback() -> Self {
        Self {
            fallback: FallbackDirective::Disabled,
            skip_cache: false,
        }
    }
}

///
/// WriteOptions
///
/// Empty today; kept so the write contract mirrors the read contract and
/// future options slot in without signature churn.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WriteOptions {}

///
/// BackendContext
///
/// Constructor injection for a backend instance: the owning record and the
/// field it stores, plus the owning model's path.
///

#[derive(Clone, Copy, Debug)]
pub struct BackendContext<'a> {
    pub model: &'a str,
    pub record: RecordKey,
    pub field: &'a str,
}

///
/// BackendClass
///
/// A pluggable storage strategy, selected by the `backend` field option or
/// the configured default. Instantiated once per (record instance, field).
///

pub trait BackendClass {
    /// Stable name for diagnostics and schema reporting.
    fn name(&self) -> &'static str;

    /// Class-level hook invoked once at composition time. May adjust the
    /// field options the backend is composed with.
    fn configure(&self, options: &mut FieldOptions) -> Result<(), ConfigError> {
        let _ = options;
        Ok(())
    }

    /// Build one backend instance for `(record, field)`.
    fn instantiate(&self, ctx: &BackendContext<'_>) -> Result<Box<dyn Backend>, TranslationError>;

    /// One-time model hook: schema/association wiring and query-scope
    /// extension. Invoked exactly once per field-set registration.
    fn setup_model(
        &self,
        model: &mut ModelSchema,
        fields: &[String],
        options: &FieldOptions,
    ) -> Result<(), TranslationError> {
        let _ = (model, fields, options);
        Ok(())
    }
}

///
/// FallbacksOption
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FallbacksOption {
    /// Use the process-wide default chains.
    #[default]
    Enabled,
    Disabled,
    /// Per-field chains overriding the default.
    Chains(FallbackChains),
}

///
/// LocaleAccessorsOption
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum LocaleAccessorsOption {
    #[default]
    Disabled,
    /// Generate accessors for the configured accessor locales.
    Configured,
    /// Generate accessors for an explicit locale list.
    Locales(Vec<Locale>),
}

///
/// FieldOptions
///
/// Options record for one field declaration. Immutable after declaration;
/// `normalize` applies cross-option defaults before composition.
///

#[derive(Clone, Default)]
pub struct FieldOptions {
    pub backend: Option<Rc<dyn BackendClass>>,
    pub cache: Option<bool>,
    pub fallbacks: FallbacksOption,
    pub dirty: bool,
    pub presence: Option<bool>,
    pub locale_accessors: LocaleAccessorsOption,
    pub fallthrough_accessors: Option<bool>,
}

impl FieldOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend(mut self, backend: Rc<dyn BackendClass>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub const fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    #[must_use]
    pub fn fallbacks(mut self, enabled: bool) -> Self {
        self.fallbacks = if enabled {
            FallbacksOption::Enabled
        } else {
            FallbacksOption::Disabled
        };
        self
    }

    #[must_use]
    pub fn fallback_chains(mut self, chains: FallbackChains) -> Self {
        self.fallbacks = FallbacksOption::Chains(chains);
        self
    }

    #[must_use]
    pub const fn dirty(mut self, enabled: bool) -> Self {
        self.dirty = enabled;
        self
    }

    #[must_use]
    pub const fn presence(mut self, enabled: bool) -> Self {
        self.presence = Some(enabled);
        self
    }

    #[must_use]
    pub fn locale_accessors(mut self, enabled: bool) -> Self {
        self.locale_accessors = if enabled {
            LocaleAccessorsOption::Configured
        } else {
            LocaleAccessorsOption::Disabled
        };
        self
    }

    #[must_use]
    pub fn locale_accessors_for(mut self, locales: impl IntoIterator<Item = Locale>) -> Self {
        self.locale_accessors = LocaleAccessorsOption::Locales(locales.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn fallthrough_accessors(mut self, enabled: bool) -> Self {
        self.fallthrough_accessors = Some(enabled);
        self
    }

    /// Apply cross-option defaults: dirty tracking forces fallthrough
    /// accessors on unless they were explicitly disabled.
    pub fn normalize(&mut self) {
        if self.dirty && self.fallthrough_accessors != Some(false) {
            self.fallthrough_accessors = Some(true);
        }
    }

    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache.unwrap_or(true)
    }

    #[must_use]
    pub fn presence_enabled(&self) -> bool {
        self.presence.unwrap_or(true)
    }

    #[must_use]
    pub fn fallthrough_enabled(&self) -> bool {
        self.fallthrough_accessors.unwrap_or(false)
    }
}

impl std::fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldOptions")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("cache", &self.cache)
            .field("fallbacks", &self.fallbacks)
            .field("dirty", &self.dirty)
            .field("presence", &self.presence)
            .field("locale_accessors", &self.locale_accessors)
            .field("fallthrough_accessors", &self.fallthrough_accessors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_cache_presence_fallbacks_on() {
        let options = FieldOptions::new();

        assert!(options.cache_enabled());
        assert!(options.presence_enabled());
        assert_eq!(options.fallbacks, FallbacksOption::Enabled);
        assert!(!options.dirty);
        assert!(!options.fallthrough_enabled());
    }

    #[test]
    fn dirty_forces_fallthrough_unless_explicitly_disabled() {
        let mut options = FieldOptions::new().dirty(true);
        options.normalize();
        assert!(options.fallthrough_enabled());

        let mut options = FieldOptions::new().dirty(true).fallthrough_accessors(false);
        options.normalize();
        assert!(!options.fallthrough_enabled());

        let mut options = FieldOptions::new();
        options.normalize();
        assert!(!options.fallthrough_enabled(), "no dirty, no fallthrough default");
    }
}
