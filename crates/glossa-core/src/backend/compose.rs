use crate::{
    backend::{
        Backend, BackendClass, BackendContext, DirtyTracking, FallbacksOption, FieldOptions,
        LocaleFallbacks, PresenceFilter, ReadCache,
    },
    config,
    error::{ConfigError, TranslationError},
    locale::FallbackChains,
    model::ModelSchema,
    obs::{self, MetricsEvent},
};
use std::rc::Rc;

///
/// ComposedBackendClass
///
/// A base backend class plus the decorator selection resolved from field
/// options. Instantiating applies the enabled decorators in a fixed
/// precedence order, outermost to innermost:
///
///   Cache, Dirty, Fallbacks, Presence, Base
///
/// The order is load-bearing: the cache must memoize post-fallback,
/// post-presence values, and dirty tracking must observe writes at the
/// normalized layer so "no real change" detection is accurate.
///
/// Composition fails fast: a missing backend (no option, no configured
/// default) is a configuration error here, not at first use. Composing
/// twice with the same inputs yields behaviorally identical instances.
///

pub struct ComposedBackendClass {
    base: Rc<dyn BackendClass>,
    cache: bool,
    dirty: bool,
    presence: bool,
    fallbacks: Option<FallbackChains>,
    options: FieldOptions,
}

impl ComposedBackendClass {
    pub fn compose(options: FieldOptions) -> Result<Self, TranslationError> {
        let mut options = options;
        options.normalize();

        let base = match options.backend.clone() {
            Some(base) => base,
            None => config::with_config(config::Config::default_backend)
                .ok_or(ConfigError::BackendRequired)?,
        };

        // Class-level hook, once per composition.
        base.configure(&mut options)?;

        let fallbacks = match &options.fallbacks {
            FallbacksOption::Enabled => {
                Some(config::with_config(|c| c.default_fallbacks().clone()))
            }
            FallbacksOption::Disabled => None,
            FallbacksOption::Chains(chains) => Some(chains.clone()),
        };

        Ok(Self {
            base,
            cache: options.cache_enabled(),
            dirty: options.dirty,
            presence: options.presence_enabled(),
            fallbacks,
            options,
        })
    }

    #[must_use]
    pub fn base_name(&self) -> &'static str {
        self.base.name()
    }

    /// The normalized options this class was composed with.
    #[must_use]
    pub const fn options(&self) -> &FieldOptions {
        &self.options
    }

    #[must_use]
    pub const fn tracks_dirty(&self) -> bool {
        self.dirty
    }

    /// Build one decorated backend instance for `(record, field)`.
    pub fn instantiate(
        &self,
        ctx: &BackendContext<'_>,
    ) -> Result<Box<dyn Backend>, TranslationError> {
        let mut backend = self.base.instantiate(ctx)?;

        // Wrap innermost-first so the outermost->innermost order is
        // Cache, Dirty, Fallbacks, Presence, Base.
        if self.presence {
            backend = Box::new(PresenceFilter::new(backend));
        }
        if let Some(chains) = &self.fallbacks {
            backend = Box::new(LocaleFallbacks::new(backend, chains.clone()));
        }
        if self.dirty {
            backend = Box::new(DirtyTracking::new(backend));
        }
        if self.cache {
            backend = Box::new(ReadCache::new(backend));
        }

        obs::record(MetricsEvent::BackendInstantiated);
        Ok(backend)
    }

    /// Invoke the base backend's one-time model hook.
    pub fn setup_model(
        &self,
        model: &mut ModelSchema,
        fields: &[String],
    ) -> Result<(), TranslationError> {
        self.base.setup_model(model, fields, &self.options)
    }
}

impl std::fmt::Debug for ComposedBackendClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedBackendClass")
            .field("base", &self.base.name())
            .field("cache", &self.cache)
            .field("dirty", &self.dirty)
            .field("presence", &self.presence)
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}
