//! Process-wide configuration.
//!
//! Read-mostly global state held in a thread-local cell, expected to be set
//! once at startup before any model attaches translations. No
//! synchronization is provided for concurrent mutation.

use crate::{
    backend::BackendClass,
    error::{ConfigError, LocaleError, TranslationError},
    locale::{FallbackChains, Locale},
};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::new());
}

///
/// Config
///
/// Defaults consulted by composition (`default_backend`,
/// `default_fallbacks`), accessor generation (`default_accessor_locales`)
/// and every accessor call (`available_locales`, current locale).
///

pub struct Config {
    default_backend: Option<Rc<dyn BackendClass>>,
    available_locales: Vec<Locale>,
    default_locale: Locale,
    current_locale: Locale,
    default_fallbacks: FallbackChains,
    default_accessor_locales: Option<Vec<Locale>>,
}

impl Config {
    #[must_use]
    fn new() -> Self {
        let en = Locale::english();
        Self {
            default_backend: None,
            available_locales: vec![en.clone()],
            default_locale: en.clone(),
            current_locale: en,
            default_fallbacks: FallbackChains::new(),
            default_accessor_locales: None,
        }
    }

    /// Backend class used when a field declaration names none.
    pub fn set_default_backend(&mut self, backend: Rc<dyn BackendClass>) {
        self.default_backend = Some(backend);
    }

    /// Replace the available-locale set. The default and current locales are
    /// reset to the first entry when no longer available.
    pub fn set_available_locales(
        &mut self,
        locales: impl IntoIterator<Item = Locale>,
    ) -> Result<(), ConfigError> {
        let locales: Vec<Locale> = locales.into_iter().collect();
        if locales.is_empty() {
            return Err(ConfigError::NoAvailableLocales);
        }

        if !locales.contains(&self.default_locale) {
            self.default_locale = locales[0].clone();
        }
        if !locales.contains(&self.current_locale) {
            self.current_locale = self.default_locale.clone();
        }
        self.available_locales = locales;
        Ok(())
    }

    pub fn set_default_locale(&mut self, locale: Locale) -> Result<(), ConfigError> {
        if !self.available_locales.contains(&locale) {
            return Err(ConfigError::DefaultLocaleUnavailable {
                tag: locale.as_str().to_string(),
            });
        }

        self.default_locale = locale;
        Ok(())
    }

    /// Process-wide default fallback chains, used when a field enables
    /// fallbacks without supplying its own chains.
    pub fn set_default_fallbacks(&mut self, fallbacks: FallbackChains) {
        self.default_fallbacks = fallbacks;
    }

    /// Locales for which fixed-locale accessors are generated when a field
    /// requests `locale_accessors: true`. Defaults to the available set.
    pub fn set_default_accessor_locales(&mut self, locales: impl IntoIterator<Item = Locale>) {
        self.default_accessor_locales = Some(locales.into_iter().collect());
    }

    #[must_use]
    pub fn default_backend(&self) -> Option<Rc<dyn BackendClass>> {
        self.default_backend.clone()
    }

    #[must_use]
    pub fn available_locales(&self) -> &[Locale] {
        &self.available_locales
    }

    #[must_use]
    pub const fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    #[must_use]
    pub const fn default_fallbacks(&self) -> &FallbackChains {
        &self.default_fallbacks
    }

    #[must_use]
    pub fn accessor_locales(&self) -> Vec<Locale> {
        self.default_accessor_locales
            .clone()
            .unwrap_or_else(|| self.available_locales.clone())
    }

    #[must_use]
    pub fn is_available(&self, locale: &Locale) -> bool {
        self.available_locales.contains(locale)
    }
}

/// Mutate the process-wide configuration. Startup-only discipline.
pub fn configure<R>(f: impl FnOnce(&mut Config) -> R) -> R {
    CONFIG.with_borrow_mut(f)
}

/// Read the process-wide configuration.
pub fn with_config<R>(f: impl FnOnce(&Config) -> R) -> R {
    CONFIG.with_borrow(f)
}

/// The locale accessors default to when called without one.
#[must_use]
pub fn current_locale() -> Locale {
    CONFIG.with_borrow(|config| config.current_locale.clone())
}

/// Switch the current locale. The locale must be available.
pub fn set_current_locale(locale: Locale) -> Result<(), TranslationError> {
    enforce_available(&locale)?;
    CONFIG.with_borrow_mut(|config| config.current_locale = locale);
    Ok(())
}

/// Run `f` with the current locale temporarily overridden.
///
/// The previous locale is restored on all exits, including unwind.
pub fn with_locale<R>(locale: &Locale, f: impl FnOnce() -> R) -> Result<R, TranslationError> {
    struct Guard(Locale);

    impl Drop for Guard {
        fn drop(&mut self) {
            CONFIG.with_borrow_mut(|config| {
                config.current_locale = std::mem::replace(&mut self.0, Locale::english());
            });
        }
    }

    enforce_available(locale)?;
    let prev = CONFIG.with_borrow_mut(|config| {
        std::mem::replace(&mut config.current_locale, locale.clone())
    });
    let _guard = Guard(prev);

    Ok(f())
}

/// Reject locales outside the available set. Called at every accessor
/// boundary before any backend is touched.
pub fn enforce_available(locale: &Locale) -> Result<(), TranslationError> {
    let available = CONFIG.with_borrow(|config| config.is_available(locale));
    if available {
        Ok(())
    } else {
        Err(LocaleError::NotAvailable {
            tag: locale.as_str().to_string(),
        }
        .into())
    }
}

/// Restore the configuration to its initial state. Test plumbing.
pub fn reset() {
    CONFIG.with_borrow_mut(|config| *config = Config::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn locale(tag: &str) -> Locale {
        Locale::new(tag).expect("test locale tag should be valid")
    }

    #[test]
    fn current_locale_defaults_to_english() {
        reset();
        assert_eq!(current_locale(), locale("en"));
    }

    #[test]
    fn set_current_locale_rejects_unavailable() {
        reset();
        let err = set_current_locale(locale("xx")).expect_err("xx is not available");
        assert_eq!(err.class, ErrorClass::Locale);
        assert_eq!(current_locale(), locale("en"), "rejected switch must not apply");
    }

    #[test]
    fn with_locale_restores_previous_locale() {
        reset();
        configure(|config| config.set_available_locales([locale("en"), locale("ja")]))
            .expect("locale set is non-empty");

        let seen = with_locale(&locale("ja"), current_locale).expect("ja is available");
        assert_eq!(seen, locale("ja"));
        assert_eq!(current_locale(), locale("en"));
    }

    #[test]
    fn with_locale_restores_on_panic() {
        reset();
        configure(|config| config.set_available_locales([locale("en"), locale("de")]))
            .expect("locale set is non-empty");

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            let _ = with_locale(&locale("de"), || panic!("intentional panic for guard test"));
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(current_locale(), locale("en"));
    }

    #[test]
    fn shrinking_available_set_resets_default_and_current() {
        reset();
        configure(|config| config.set_available_locales([locale("en"), locale("fr")]))
            .expect("locale set is non-empty");
        set_current_locale(locale("fr")).expect("fr is available");

        configure(|config| config.set_available_locales([locale("de")]))
            .expect("locale set is non-empty");
        assert_eq!(current_locale(), locale("de"));
        assert!(with_config(|config| config.is_available(&locale("de"))));
        assert!(!with_config(|config| config.is_available(&locale("fr"))));
    }

    #[test]
    fn empty_available_set_is_rejected() {
        reset();
        let err = configure(|config| config.set_available_locales([])).expect_err("empty set");
        assert!(matches!(err, ConfigError::NoAvailableLocales));
    }

    #[test]
    fn accessor_locales_default_to_available_set() {
        reset();
        configure(|config| config.set_available_locales([locale("en"), locale("ja")]))
            .expect("locale set is non-empty");
        assert_eq!(
            with_config(Config::accessor_locales),
            vec![locale("en"), locale("ja")]
        );

        configure(|config| config.set_default_accessor_locales([locale("en")]));
        assert_eq!(with_config(Config::accessor_locales), vec![locale("en")]);
    }
}
