// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide drop-in directory variants.
//!
//! A variant is appended to `root[/project]/base_name` to form a drop-in
//! directory: `".d"` yields `base.d/`, `".conf.d"` yields `base.conf.d/` and
//! `"/conf.d"` yields `base/conf.d/`. Until a list is configured, the variant is
//! derived from the file suffix, so `example` with suffix `conf` looks in
//! `example.conf.d/`.

use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

static REGISTRY: Lazy<VariantRegistry> = Lazy::new(VariantRegistry::default);

/// Returns `suffix` with exactly one leading dot, or an empty string.
pub(crate) fn dotted_suffix(suffix: &str) -> String {
    let bare = suffix.trim_start_matches('.');
    if bare.is_empty() {
        String::new()
    } else {
        format!(".{}", bare)
    }
}

#[derive(Debug, Default)]
pub(crate) struct VariantRegistry {
    slot: RwLock<Option<Vec<String>>>,
}

impl VariantRegistry {
    pub(crate) fn set(&self, variants: Vec<String>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(variants);
    }

    pub(crate) fn get(&self) -> Option<Vec<String>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn effective(&self, suffix: &str) -> Vec<String> {
        self.get()
            .unwrap_or_else(|| vec![format!("{}.d", dotted_suffix(suffix))])
    }
}

/// Replaces the process-wide list of drop-in variants.
///
/// Affects every resolver that has no per-resolver or per-layer override.
///
/// # Examples
///
/// ```rust
/// use tiercfg::service::dropins;
///
/// dropins::set_default_dropin_variants([".d", ".conf.d"]);
/// assert_eq!(
///     dropins::default_dropin_variants(),
///     Some(vec![".d".to_string(), ".conf.d".to_string()])
/// );
/// dropins::reset_default_dropin_variants();
/// assert_eq!(dropins::default_dropin_variants(), None);
/// ```
pub fn set_default_dropin_variants<I, S>(variants: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let variants: Vec<String> = variants.into_iter().map(Into::into).collect();
    tracing::debug!("Default drop-in variants set to {:?}", variants);
    REGISTRY.set(variants);
}

/// The configured process-wide list, `None` if never set or reset.
pub fn default_dropin_variants() -> Option<Vec<String>> {
    REGISTRY.get()
}

/// Forgets the configured list; variants are derived from the suffix again.
pub fn reset_default_dropin_variants() {
    REGISTRY.reset();
}

/// The variants a resolver uses for `suffix` when nothing overrides them.
pub fn effective_dropin_variants(suffix: &str) -> Vec<String> {
    REGISTRY.effective(suffix)
}
