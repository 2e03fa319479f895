use crate::{
    backend::{Backend, FallbackDirective, ReadOptions, WriteOptions, dirty::ChangeSet},
    error::TranslationError,
    locale::{FallbackChains, Locale},
    obs::{self, MetricsEvent},
    value::Value,
};

///
/// LocaleFallbacks
///
/// On a read miss, consults an ordered fallback chain for the requested
/// locale; the first non-absent result wins, no scoring. Writes pass
/// through untouched — fallback applies to reads only.
///

pub struct LocaleFallbacks {
    inner: Box<dyn Backend>,
    chains: FallbackChains,
}

impl LocaleFallbacks {
    #[must_use]
    pub fn new(inner: Box<dyn Backend>, chains: FallbackChains) -> Self {
        Self { inner, chains }
    }
}

impl Backend for LocaleFallbacks {
    fn read(
        &mut self,
        locale: &Locale,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        if let Some(value) = self.inner.read(locale, options)? {
            return Ok(Some(value));
        }

        let chain: &[Locale] = match &options.fallback {
            FallbackDirective::Configured => self.chains.chain_for(locale),
            FallbackDirective::Disabled => &[],
            FallbackDirective::Chain(locales) => locales,
        };

        for fallback in chain {
            if fallback == locale {
                continue;
            }
            if let Some(value) = self.inner.read(fallback, options)? {
                obs::record(MetricsEvent::FallbackHit);
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        self.inner.write(locale, value, options)
    }

    fn changes(&self) -> Option<&ChangeSet> {
        self.inner.changes()
    }

    fn reset_changes(&mut self) {
        self.inner.reset_changes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::MapBackend;

    fn locale(tag: &str) -> Locale {
        Locale::new(tag).expect("test locale tag should be valid")
    }

    fn de_to_en() -> FallbackChains {
        FallbackChains::new().chain(locale("de"), [locale("en")])
    }

    #[test]
    fn missing_locale_falls_back_in_configured_order() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hallo"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        let value = fallbacks
            .read(&locale("de"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(value, Some(Value::text("Hallo")));
    }

    #[test]
    fn direct_hit_wins_over_fallback() {
        let mut inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        inner.entries.insert(locale("de"), Value::text("Hallo"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        let value = fallbacks
            .read(&locale("de"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(value, Some(Value::text("Hallo")));
    }

    #[test]
    fn per_call_directive_can_disable_fallback() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hallo"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        let value = fallbacks
            .read(&locale("de"), &ReadOptions::without_fallback())
            .expect("read should succeed");
        assert_eq!(value, None, "disabled fallback must not consult the chain");
    }

    #[test]
    fn per_call_directive_can_replace_the_chain() {
        let inner = MapBackend::with_entry(locale("fr"), Value::text("Bonjour"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        let options = ReadOptions {
            fallback: FallbackDirective::Chain(vec![locale("fr")]),
            skip_cache: false,
        };
        let value = fallbacks
            .read(&locale("de"), &options)
            .expect("read should succeed");
        assert_eq!(value, Some(Value::text("Bonjour")));
    }

    #[test]
    fn unconfigured_locale_reads_absent() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        let value = fallbacks
            .read(&locale("fr"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(value, None, "no chain configured for fr");
    }

    #[test]
    fn writes_store_only_under_the_written_locale() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hallo"));
        let mut fallbacks = LocaleFallbacks::new(Box::new(inner), de_to_en());

        fallbacks
            .write(
                &locale("de"),
                Some(Value::text("Servus")),
                &WriteOptions::default(),
            )
            .expect("write should succeed");

        let en = fallbacks
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(en, Some(Value::text("Hallo")), "write must not alter the fallback target");

        let de = fallbacks
            .read(&locale("de"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(de, Some(Value::text("Servus")));
    }
}
