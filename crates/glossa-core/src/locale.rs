use crate::error::LocaleError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

///
/// Locale
///
/// Symbolic identifier for a language/region variant of a value.
/// Tags are validated on construction and stored lowercase, so two spellings
/// of the same tag compare equal.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Locale(Box<str>);

impl Locale {
    /// Validate and normalize a locale tag.
    ///
    /// Accepted: non-empty ASCII alphanumerics plus `-` and `_`.
    pub fn new(tag: impl AsRef<str>) -> Result<Self, LocaleError> {
        let tag = tag.as_ref();
        let valid = !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(LocaleError::Invalid {
                tag: tag.to_string(),
            });
        }

        Ok(Self(tag.to_ascii_lowercase().into_boxed_str()))
    }

    /// The engine-wide initial locale.
    pub(crate) fn english() -> Self {
        Self("en".into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accessor-name form of the tag: `-` maps to `_`, so `pt-br` yields
    /// accessors like `title_pt_br`.
    #[must_use]
    pub fn suffix(&self) -> String {
        self.0.replace('-', "_")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

///
/// FallbackChains
///
/// Ordered fallback chain per locale. A read that misses its requested
/// locale consults the chain in order; first non-absent result wins, no
/// scoring.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FallbackChains {
    chains: BTreeMap<Locale, Vec<Locale>>,
}

impl FallbackChains {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one fallback chain for `from`. Replaces any existing chain.
    #[must_use]
    pub fn chain(mut self, from: Locale, to: impl IntoIterator<Item = Locale>) -> Self {
        self.chains.insert(from, to.into_iter().collect());
        self
    }

    /// The configured chain for a locale; empty when none is configured.
    #[must_use]
    pub fn chain_for(&self, locale: &Locale) -> &[Locale] {
        self.chains.get(locale).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
