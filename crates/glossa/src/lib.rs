//! ## Crate layout
//! - `core`: the runtime engine: backends, decorators, accessor dispatch,
//!   locale handling, configuration, and observability.
//!
//! The `prelude` module mirrors the surface used by model code: declare
//! fields with `FieldDeclaration`, attach them with `model::attach`, and
//! implement `Translatable` on the owning record type.

pub use glossa_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Top-level re-exports
//

pub use core::{
    ALIAS_SUFFIX, accessor, backend, binding, config, error::TranslationError, locale, model, obs,
    value,
};

///
/// Model Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        accessor::{AccessKind, FieldDeclaration},
        backend::{
            Backend, BackendClass, FallbackDirective, FieldOptions, ReadOptions, WriteOptions,
        },
        binding::{BackendMap, RecordKey, Translatable},
        config,
        locale::{FallbackChains, Locale},
        model,
        value::{Value, ValuePresence as _},
    };
    pub use serde::{Deserialize, Serialize};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_the_workspace_package() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!VERSION.is_empty());
    }
}
