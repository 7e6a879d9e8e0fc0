// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory tiers.
//!
//! A [`LayerList`] orders root directories from lowest to highest authority.
//! Files found under later layers override files found under earlier ones.

use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// One tier: a root directory and optional drop-in variants for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryLayer {
    root: PathBuf,
    dropin_variants: Option<Vec<String>>,
}

impl DirectoryLayer {
    /// Creates a layer using the resolver's drop-in variants.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dropin_variants: None,
        }
    }

    /// Overrides the drop-in variants for this layer only.
    ///
    /// An empty list disables drop-ins for the layer.
    pub fn with_dropin_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropin_variants = Some(variants.into_iter().map(Into::into).collect());
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The per-layer variant override.
    pub fn dropin_variants(&self) -> Option<&[String]> {
        self.dropin_variants.as_deref()
    }
}

macro_rules! layer_from_path {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for DirectoryLayer {
                fn from(root: $ty) -> Self {
                    DirectoryLayer::new(root)
                }
            }
        )*
    };
}

layer_from_path!(&str, String, &Path, PathBuf);

/// Tiers in precedence order, lowest authority first.
///
/// # Examples
///
/// ```rust
/// use tiercfg::service::LayerList;
/// use std::path::Path;
///
/// let layers = LayerList::system();
/// let roots: Vec<&Path> = layers.iter().map(|l| l.root()).collect();
/// assert_eq!(roots, [Path::new("/usr/etc"), Path::new("/run"), Path::new("/etc")]);
///
/// let custom = LayerList::new().with_layer("/usr/lib").with_layer("/etc");
/// assert_eq!(custom.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerList {
    layers: Vec<DirectoryLayer>,
}

impl LayerList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The vendor, runtime and administrator tiers: `/usr/etc`, `/run`, `/etc`.
    pub fn system() -> Self {
        Self::new()
            .with_layer("/usr/etc")
            .with_layer("/run")
            .with_layer("/etc")
    }

    /// Appends a layer with higher precedence than all existing ones.
    pub fn with_layer(mut self, layer: impl Into<DirectoryLayer>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// Appends the user's configuration directory (e.g. `~/.config`) as the
    /// highest tier. Leaves the list unchanged if there is no home directory.
    pub fn with_user_config(self) -> Self {
        match BaseDirs::new() {
            Some(dirs) => self.with_layer(dirs.config_dir()),
            None => {
                tracing::debug!("No home directory, skipping the user configuration tier");
                self
            }
        }
    }

    /// Iterates from lowest to highest precedence.
    pub fn iter(&self) -> impl Iterator<Item = &DirectoryLayer> {
        self.layers.iter()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<L: Into<DirectoryLayer>> FromIterator<L> for LayerList {
    fn from_iter<T: IntoIterator<Item = L>>(iter: T) -> Self {
        Self {
            layers: iter.into_iter().map(Into::into).collect(),
        }
    }
}
