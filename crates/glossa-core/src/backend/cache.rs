use crate::{
    backend::{Backend, FallbackDirective, ReadOptions, WriteOptions, dirty::ChangeSet},
    error::TranslationError,
    locale::Locale,
    obs::{self, MetricsEvent},
    value::Value,
};
use std::collections::HashMap;

///
/// ReadCache
///
/// Memoizes read results (absence included) per `(locale, option variant)`
/// for the lifetime of the backend instance. A write evicts every variant
/// for that locale; a non-deleting write also seeds the default variant
/// with the written value, so a read after a write never returns a stale
/// value (single-instance scope; no cross-instance coherence). Deletions
/// only evict, leaving the next read to recompute through the inner chain.
///

pub struct ReadCache {
    inner: Box<dyn Backend>,
    entries: HashMap<CacheKey, Option<Value>>,
}

///
/// CacheKey
///
/// The option variant is the result-affecting part of the read options:
/// the fallback directive.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct CacheKey {
    locale: Locale,
    fallback: FallbackDirective,
}

impl CacheKey {
    fn for_read(locale: &Locale, options: &ReadOptions) -> Self {
        Self {
            locale: locale.clone(),
            fallback: options.fallback.clone(),
        }
    }

    fn default_variant(locale: &Locale) -> Self {
        Self {
            locale: locale.clone(),
            fallback: FallbackDirective::default(),
        }
    }
}

impl ReadCache {
    #[must_use]
    pub fn new(inner: Box<dyn Backend>) -> Self {
        Self {
            inner,
            entries: HashMap::new(),
        }
    }
}

impl Backend for ReadCache {
    fn read(
        &mut self,
        locale: &Locale,
        options: &ReadOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let key = CacheKey::for_read(locale, options);

        if !options.skip_cache {
            if let Some(hit) = self.entries.get(&key) {
                obs::record(MetricsEvent::CacheHit);
                return Ok(hit.clone());
            }
        }

        obs::record(MetricsEvent::CacheMiss);
        let value = self.inner.read(locale, options)?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    fn write(
        &mut self,
        locale: &Locale,
        value: Option<Value>,
        options: &WriteOptions,
    ) -> Result<Option<Value>, TranslationError> {
        let written = self.inner.write(locale, value, options)?;

        // Evict every option variant for this locale. A written value seeds
        // the default variant; a deletion stays unseeded, since the next
        // read may resolve through the fallback layer instead of absence.
        self.entries.retain(|key, _| key.locale != *locale);
        if written.is_some() {
            self.entries
                .insert(CacheKey::default_variant(locale), written.clone());
        }

        Ok(written)
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
    use crate::backend::test_support::{FailingBackend, MapBackend};
    use crate::error::ErrorClass;

    fn locale(tag: &str) -> Locale {
        Locale::new(tag).expect("test locale tag should be valid")
    }

    #[test]
    fn repeated_reads_hit_the_inner_backend_once() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        let (reads, _) = inner.counters();
        let mut cache = ReadCache::new(Box::new(inner));

        let first = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");
        let second = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");

        assert_eq!(first, second);
        assert_eq!(first, Some(Value::text("Hello")));
        assert_eq!(reads.get(), 1, "second read must be served from cache");
    }

    #[test]
    fn absence_is_cached_too() {
        let inner = MapBackend::default();
        let (reads, _) = inner.counters();
        let mut cache = ReadCache::new(Box::new(inner));

        assert_eq!(
            cache
                .read(&locale("en"), &ReadOptions::default())
                .expect("read should succeed"),
            None
        );
        assert_eq!(
            cache
                .read(&locale("en"), &ReadOptions::default())
                .expect("read should succeed"),
            None
        );
        assert_eq!(reads.get(), 1, "cached absence must not re-reach the inner backend");
    }

    #[test]
    fn write_invalidates_and_reseeds_the_locale() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("old"));
        let mut cache = ReadCache::new(Box::new(inner));

        let before = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(before, Some(Value::text("old")));

        cache
            .write(&locale("en"), Some(Value::text("new")), &WriteOptions::default())
            .expect("write should succeed");

        let after = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(after, Some(Value::text("new")), "stale cached value must not survive a write");
    }

    #[test]
    fn deletion_evicts_without_seeding_absence() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        let (reads, _) = inner.counters();
        let mut cache = ReadCache::new(Box::new(inner));

        cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");
        cache
            .write(&locale("en"), None, &WriteOptions::default())
            .expect("delete should succeed");

        assert_eq!(
            cache
                .read(&locale("en"), &ReadOptions::default())
                .expect("read should succeed"),
            None
        );
        assert_eq!(
            reads.get(),
            2,
            "a delete must leave the locale unseeded so the next read recomputes"
        );
    }

    #[test]
    fn write_does_not_evict_other_locales() {
        let mut inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        inner.entries.insert(locale("ja"), Value::text("こんにちは"));
        let mut cache = ReadCache::new(Box::new(inner));

        let ja = cache
            .read(&locale("ja"), &ReadOptions::default())
            .expect("read should succeed");
        cache
            .write(&locale("en"), Some(Value::text("Hi")), &WriteOptions::default())
            .expect("write should succeed");

        let ja_again = cache
            .read(&locale("ja"), &ReadOptions::default())
            .expect("read should succeed");
        assert_eq!(ja, ja_again);
    }

    #[test]
    fn option_variants_are_cached_separately() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        let mut cache = ReadCache::new(Box::new(inner));

        let configured = cache
            .read(&locale("de"), &ReadOptions::default())
            .expect("read should succeed");
        let disabled = cache
            .read(&locale("de"), &ReadOptions::without_fallback())
            .expect("read should succeed");

        // Both variants are misses here; the point is they do not collide.
        assert_eq!(configured, None);
        assert_eq!(disabled, None);
    }

    #[test]
    fn skip_cache_bypasses_the_memoized_entry() {
        let inner = MapBackend::with_entry(locale("en"), Value::text("Hello"));
        let (reads, _) = inner.counters();
        let mut cache = ReadCache::new(Box::new(inner));

        cache
            .read(&locale("en"), &ReadOptions::default())
            .expect("read should succeed");

        let options = ReadOptions {
            fallback: FallbackDirective::Configured,
            skip_cache: true,
        };
        let value = cache
            .read(&locale("en"), &options)
            .expect("read should succeed");
        assert_eq!(value, Some(Value::text("Hello")));
        assert_eq!(reads.get(), 2, "skip_cache must reach the inner backend again");
    }

    #[test]
    fn backend_errors_pass_through_uncached() {
        let mut cache = ReadCache::new(Box::new(FailingBackend));

        let err = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect_err("failing backend must surface its error");
        assert_eq!(err.class, ErrorClass::Internal);

        let err = cache
            .read(&locale("en"), &ReadOptions::default())
            .expect_err("errors must not be memoized");
        assert_eq!(err.class, ErrorClass::Internal);
    }
}
