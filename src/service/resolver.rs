// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory resolver.
//!
//! Discovers the configuration files of one logical configuration across tiers
//! and drop-in directories, parses each of them independently and either folds
//! them into one handle ([`DirectoryResolver::resolve`]) or returns them unmerged
//! ([`DirectoryResolver::resolve_history`]).
//!
//! For every layer, in precedence order, the candidates are:
//!
//! 1. the main file `root[/project]/base_name.suffix`
//! 2. for each drop-in variant, every `*.suffix` file in
//!    `root[/project]/base_name<variant>/`, sorted by file name
//!
//! Later candidates override earlier ones.

use crate::adapters::{FileSource, KeyFileParser, ParseOptions};
use crate::domain::merge::fold;
use crate::domain::{ConfigError, ConfigFile, Result};
use crate::ports::FileValidator;
use crate::service::dropins::{dotted_suffix, effective_dropin_variants};
use crate::service::layers::{DirectoryLayer, LayerList};
use crate::service::loader::{load_optional, recorded};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether a candidate is a main file or a drop-in fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    /// `base_name.suffix` directly under the layer root.
    Main,
    /// A fragment from a drop-in directory.
    DropIn,
}

/// A file that takes part in resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Full path of the file.
    pub path: PathBuf,
    /// Index of the layer it was found in.
    pub layer: usize,
    /// Main file or drop-in.
    pub kind: CandidateKind,
}

/// How main files of different layers combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MainFilePolicy {
    /// Every layer's main file takes part, followed by that layer's drop-ins.
    #[default]
    Layered,
    /// Only the main file of the highest layer that has one is used. Drop-ins of
    /// all layers follow it, ordered by file name across layers.
    HighestOnly,
}

/// Resolves one logical configuration across directory tiers.
///
/// Create one through [`DirectoryResolver::builder`].
///
/// # Examples
///
/// ```rust
/// use tiercfg::service::{DirectoryResolver, LayerList};
/// use std::fs;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let vendor = tempfile::tempdir()?;
/// let admin = tempfile::tempdir()?;
/// fs::write(vendor.path().join("example.conf"), "[Group]\nBla = 1\n")?;
/// fs::write(admin.path().join("example.conf"), "[Group]\nBla = 2\nExtra = 3\n")?;
///
/// let resolver = DirectoryResolver::builder("example")
///     .with_layers(LayerList::new().with_layer(vendor.path()).with_layer(admin.path()))
///     .build()?;
///
/// let config = resolver.resolve()?;
/// assert_eq!(config.get_int(Some("Group"), "Bla")?, 2);
/// assert_eq!(config.get_int(Some("Group"), "Extra")?, 3);
///
/// let history = resolver.resolve_history()?;
/// assert_eq!(history.len(), 2);
/// assert_eq!(history[0].get_int(Some("Group"), "Bla")?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DirectoryResolver {
    layers: LayerList,
    project: Option<String>,
    base_name: String,
    suffix: String,
    dropin_variants: Option<Vec<String>>,
    options: ParseOptions,
    validator: Option<Arc<dyn FileValidator>>,
    require_source: bool,
    main_file_policy: MainFilePolicy,
    mask_shadowed_dropins: bool,
}

impl fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("layers", &self.layers)
            .field("project", &self.project)
            .field("base_name", &self.base_name)
            .field("suffix", &self.suffix)
            .field("dropin_variants", &self.dropin_variants)
            .field("options", &self.options)
            .field("validator", &self.validator.is_some())
            .field("require_source", &self.require_source)
            .field("main_file_policy", &self.main_file_policy)
            .field("mask_shadowed_dropins", &self.mask_shadowed_dropins)
            .finish()
    }
}

impl DirectoryResolver {
    /// Starts building a resolver for `base_name` (e.g. `"example"` for
    /// `example.conf`).
    pub fn builder(base_name: impl Into<String>) -> ResolverBuilder {
        ResolverBuilder::new(base_name)
    }

    /// The parse options applied to every candidate.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn layer_dir(&self, layer: &DirectoryLayer) -> PathBuf {
        match &self.project {
            Some(project) => layer.root().join(project),
            None => layer.root().to_path_buf(),
        }
    }

    fn main_file_name(&self) -> String {
        format!("{}{}", self.base_name, dotted_suffix(&self.suffix))
    }

    fn variants_for(&self, layer: &DirectoryLayer) -> Vec<String> {
        if let Some(variants) = layer.dropin_variants() {
            return variants.to_vec();
        }
        match &self.dropin_variants {
            Some(variants) => variants.clone(),
            None => effective_dropin_variants(&self.suffix),
        }
    }

    fn dropins_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let suffix = dotted_suffix(&self.suffix);
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ConfigError::from_io(dir, e))? {
            let entry = entry.map_err(|e| ConfigError::from_io(dir, e))?;
            let path = entry.path();
            let matches_suffix = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.len() > suffix.len() && name.ends_with(&suffix));
            if matches_suffix && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Lists the existing candidate files in precedence order, lowest first.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileListIsNull`] if the resolver has no layers, or an I/O
    /// error if a drop-in directory cannot be listed.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        if self.layers.is_empty() {
            return Err(ConfigError::FileListIsNull);
        }
        let main_name = self.main_file_name();
        let mut mains = Vec::new();
        let mut dropins = Vec::new();
        for (index, layer) in self.layers.iter().enumerate() {
            let dir = self.layer_dir(layer);
            let main = dir.join(&main_name);
            if main.is_file() {
                mains.push(Candidate {
                    path: main,
                    layer: index,
                    kind: CandidateKind::Main,
                });
            }
            for variant in self.variants_for(layer) {
                let dropin_dir = dir.join(format!("{}{}", self.base_name, variant));
                for path in self.dropins_in(&dropin_dir)? {
                    dropins.push(Candidate {
                        path,
                        layer: index,
                        kind: CandidateKind::DropIn,
                    });
                }
            }
        }

        if self.mask_shadowed_dropins {
            dropins = mask_shadowed(dropins);
        }

        let candidates = match self.main_file_policy {
            MainFilePolicy::Layered => {
                let mut all: Vec<Candidate> = mains.into_iter().chain(dropins).collect();
                // stable: main before drop-ins within a layer
                all.sort_by_key(|c| (c.layer, c.kind == CandidateKind::DropIn));
                all
            }
            MainFilePolicy::HighestOnly => {
                dropins.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
                mains.pop().into_iter().chain(dropins).collect()
            }
        };
        tracing::debug!(
            "Found {} candidate(s) for '{}'",
            candidates.len(),
            main_name
        );
        Ok(candidates)
    }

    fn missing(&self) -> ConfigError {
        let path = self
            .layers
            .iter()
            .last()
            .map(|layer| self.layer_dir(layer).join(self.main_file_name()))
            .unwrap_or_else(|| PathBuf::from(self.main_file_name()));
        ConfigError::FileNotFound { path }
    }

    /// Validates, reads and parses every candidate, in precedence order.
    fn load_candidates(&self) -> Result<Vec<ConfigFile>> {
        let candidates = self.candidates()?;

        if let Some(validator) = &self.validator {
            for candidate in &candidates {
                if let Err(e) = validator.validate(&candidate.path) {
                    tracing::warn!(
                        "Rejected configuration file '{}': {}",
                        candidate.path.display(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        let parser = KeyFileParser::with_options(self.options);
        let load = |candidate: &Candidate| {
            load_optional(&FileSource::new(&candidate.path), &parser, None)
        };

        #[cfg(feature = "parallel")]
        let loaded: Vec<Result<Option<ConfigFile>>> = {
            use rayon::prelude::*;
            candidates.par_iter().map(load).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let loaded: Vec<Result<Option<ConfigFile>>> = candidates.iter().map(load).collect();

        let mut files = Vec::with_capacity(loaded.len());
        for (candidate, result) in candidates.iter().zip(loaded) {
            match result {
                Ok(Some(file)) => files.push(file),
                Ok(None) => {
                    tracing::debug!(
                        "Skipping vanished candidate '{}'",
                        candidate.path.display()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load configuration file '{}': {}",
                        candidate.path.display(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        if files.is_empty() && self.require_source {
            return Err(self.missing());
        }
        Ok(files)
    }

    /// Resolves and folds all candidates into one handle.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::FileListIsNull`] - the resolver has no layers
    /// * [`ConfigError::FileNotFound`] - no candidate exists and a source is
    ///   required
    /// * the first validator or parse error, in precedence order
    pub fn resolve(&self) -> Result<ConfigFile> {
        let result = self.load_candidates().map(|files| {
            tracing::debug!("Folding {} configuration file(s)", files.len());
            if files.is_empty() {
                ConfigFile::with_tags_unchecked(self.options.delimiter(), self.options.comment())
            } else {
                fold(&files)
            }
        });
        recorded(result, None)
    }

    /// Resolves all candidates without folding them.
    ///
    /// The handles are in precedence order, lowest first, each carrying its own
    /// path.
    pub fn resolve_history(&self) -> Result<Vec<ConfigFile>> {
        recorded(self.load_candidates(), None)
    }
}

/// Drops every drop-in for which a higher layer has one with the same file name.
fn mask_shadowed(dropins: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<OsString> = HashSet::new();
    let mut kept: Vec<Candidate> = dropins
        .into_iter()
        .rev()
        .filter(|candidate| match candidate.path.file_name() {
            Some(name) => {
                let fresh = seen.insert(name.to_os_string());
                if !fresh {
                    tracing::debug!("Drop-in '{}' is shadowed", candidate.path.display());
                }
                fresh
            }
            None => true,
        })
        .collect();
    kept.reverse();
    kept
}

/// Builder for constructing a [`DirectoryResolver`].
///
/// # Examples
///
/// ```rust
/// use tiercfg::adapters::ParseOptions;
/// use tiercfg::service::{DirectoryResolver, MainFilePolicy};
///
/// # fn main() -> tiercfg::domain::Result<()> {
/// let resolver = DirectoryResolver::builder("example")
///     .with_project("myapp")
///     .with_suffix("conf")
///     .with_parse_options(ParseOptions::new('=', '#')?)
///     .with_main_file_policy(MainFilePolicy::HighestOnly)
///     .require_source(false)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ResolverBuilder {
    base_name: String,
    layers: Option<LayerList>,
    project: Option<String>,
    suffix: String,
    dropin_variants: Option<Vec<String>>,
    options: ParseOptions,
    validator: Option<Arc<dyn FileValidator>>,
    require_source: bool,
    main_file_policy: MainFilePolicy,
    mask_shadowed_dropins: bool,
}

impl ResolverBuilder {
    /// Creates a builder with the system layers, suffix `conf` and default parse
    /// options.
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            layers: None,
            project: None,
            suffix: "conf".to_string(),
            dropin_variants: None,
            options: ParseOptions::default(),
            validator: None,
            require_source: true,
            main_file_policy: MainFilePolicy::default(),
            mask_shadowed_dropins: false,
        }
    }

    /// Replaces the layer list. Defaults to [`LayerList::system`].
    pub fn with_layers(mut self, layers: LayerList) -> Self {
        self.layers = Some(layers);
        self
    }

    /// Appends a layer with higher precedence than all existing ones.
    ///
    /// The first call starts from an empty list rather than the system layers.
    pub fn with_layer(mut self, layer: impl Into<DirectoryLayer>) -> Self {
        let layers = self.layers.take().unwrap_or_default();
        self.layers = Some(layers.with_layer(layer));
        self
    }

    /// Looks for files under `root/project/` instead of `root/`.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Sets the file suffix, with or without the leading dot. An empty suffix
    /// means `base_name` has no extension and drop-ins may have any name.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Overrides the process-wide drop-in variants for this resolver.
    pub fn with_dropin_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropin_variants = Some(variants.into_iter().map(Into::into).collect());
        self
    }

    /// Sets delimiter, comment character and duplicate key policy.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Vets every candidate before anything is read.
    pub fn with_validator(mut self, validator: impl FileValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Whether finding no file at all is an error. Defaults to `true`.
    pub fn require_source(mut self, required: bool) -> Self {
        self.require_source = required;
        self
    }

    /// Sets how main files of different layers combine.
    pub fn with_main_file_policy(mut self, policy: MainFilePolicy) -> Self {
        self.main_file_policy = policy;
        self
    }

    /// Skips drop-ins shadowed by a same-named drop-in of a higher layer.
    /// Defaults to `false`.
    pub fn mask_shadowed_dropins(mut self, mask: bool) -> Self {
        self.mask_shadowed_dropins = mask;
        self
    }

    /// Builds the resolver.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidArgument`] if the base name is empty or contains a
    /// path separator.
    pub fn build(self) -> Result<DirectoryResolver> {
        if self.base_name.is_empty() || self.base_name.contains(std::path::MAIN_SEPARATOR) {
            return Err(ConfigError::invalid_argument(format!(
                "invalid configuration base name '{}'",
                self.base_name
            )));
        }
        Ok(DirectoryResolver {
            layers: self.layers.unwrap_or_else(LayerList::system),
            project: self.project,
            base_name: self.base_name,
            suffix: self.suffix,
            dropin_variants: self.dropin_variants,
            options: self.options,
            validator: self.validator,
            require_source: self.require_source,
            main_file_policy: self.main_file_policy,
            mask_shadowed_dropins: self.mask_shadowed_dropins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn resolver(tiers: &[&TempDir]) -> ResolverBuilder {
        let layers: LayerList = tiers.iter().map(|t| t.path()).collect();
        DirectoryResolver::builder("example")
            .with_layers(layers)
            .with_dropin_variants([".conf.d"])
    }

    fn names(candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| {
                format!(
                    "{}:{}",
                    c.layer,
                    c.path.file_name().unwrap().to_string_lossy()
                )
            })
            .collect()
    }

    #[test]
    fn test_layered_candidate_order() {
        let vendor = tempfile::tempdir().unwrap();
        let admin = tempfile::tempdir().unwrap();
        write(vendor.path(), "example.conf", "a=1\n");
        write(vendor.path(), "example.conf.d/20-b.conf", "b=1\n");
        write(vendor.path(), "example.conf.d/10-a.conf", "a=2\n");
        write(vendor.path(), "example.conf.d/ignored.txt", "x\n");
        write(admin.path(), "example.conf", "a=3\n");

        let candidates = resolver(&[&vendor, &admin]).build().unwrap().candidates().unwrap();
        assert_eq!(
            names(&candidates),
            vec![
                "0:example.conf",
                "0:10-a.conf",
                "0:20-b.conf",
                "1:example.conf"
            ]
        );
        assert_eq!(candidates[0].kind, CandidateKind::Main);
        assert_eq!(candidates[1].kind, CandidateKind::DropIn);
    }

    #[test]
    fn test_highest_only_policy() {
        let vendor = tempfile::tempdir().unwrap();
        let admin = tempfile::tempdir().unwrap();
        write(vendor.path(), "example.conf", "a=1\n");
        write(vendor.path(), "example.conf.d/30-c.conf", "c=1\n");
        write(admin.path(), "example.conf", "a=2\n");
        write(admin.path(), "example.conf.d/10-a.conf", "a=3\n");

        let candidates = resolver(&[&vendor, &admin])
            .with_main_file_policy(MainFilePolicy::HighestOnly)
            .build()
            .unwrap()
            .candidates()
            .unwrap();
        assert_eq!(
            names(&candidates),
            vec!["1:example.conf", "1:10-a.conf", "0:30-c.conf"]
        );
    }

    #[test]
    fn test_masking_shadowed_dropins() {
        let vendor = tempfile::tempdir().unwrap();
        let admin = tempfile::tempdir().unwrap();
        write(vendor.path(), "example.conf.d/10-a.conf", "a=1\n");
        write(vendor.path(), "example.conf.d/20-b.conf", "b=1\n");
        write(admin.path(), "example.conf.d/10-a.conf", "a=2\n");

        let unmasked = resolver(&[&vendor, &admin]).build().unwrap();
        assert_eq!(unmasked.candidates().unwrap().len(), 3);

        let masked = resolver(&[&vendor, &admin])
            .mask_shadowed_dropins(true)
            .build()
            .unwrap();
        assert_eq!(
            names(&masked.candidates().unwrap()),
            vec!["0:20-b.conf", "1:10-a.conf"]
        );
    }

    #[test]
    fn test_project_subdirectory() {
        let tier = tempfile::tempdir().unwrap();
        write(tier.path(), "myapp/example.conf", "k=v\n");
        let config = resolver(&[&tier])
            .with_project("myapp")
            .build()
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(config.get_string(None, "k").unwrap(), "v");
    }

    #[test]
    fn test_per_layer_variants() {
        let tier = tempfile::tempdir().unwrap();
        write(tier.path(), "example.d/a.conf", "k=d\n");
        write(tier.path(), "example.conf.d/a.conf", "k=conf.d\n");
        let layers = LayerList::new()
            .with_layer(DirectoryLayer::new(tier.path()).with_dropin_variants([".d"]));
        let config = DirectoryResolver::builder("example")
            .with_layers(layers)
            .with_dropin_variants([".conf.d"])
            .build()
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(config.get_string(None, "k").unwrap(), "d");
    }

    #[test]
    fn test_empty_layers() {
        let resolver = DirectoryResolver::builder("example")
            .with_layers(LayerList::new())
            .build()
            .unwrap();
        assert_eq!(resolver.resolve().unwrap_err().code(), ErrorCode::FileListIsNull);
        assert_eq!(
            resolver.resolve_history().unwrap_err().code(),
            ErrorCode::FileListIsNull
        );
    }

    #[test]
    fn test_no_candidates() {
        let tier = tempfile::tempdir().unwrap();
        let err = resolver(&[&tier]).build().unwrap().resolve().unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoFile);

        let optional = resolver(&[&tier]).require_source(false).build().unwrap();
        assert!(optional.resolve().unwrap().is_empty());
        assert!(optional.resolve_history().unwrap().is_empty());
    }

    #[test]
    fn test_validator_runs_before_reading() {
        let tier = tempfile::tempdir().unwrap();
        write(tier.path(), "example.conf", "[broken\n");
        let err = resolver(&[&tier])
            .with_validator(|path: &Path| !path.ends_with("example.conf"))
            .build()
            .unwrap()
            .resolve()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParsingCallbackFailed);
    }

    #[test]
    fn test_first_error_in_precedence_order_wins() {
        let vendor = tempfile::tempdir().unwrap();
        let admin = tempfile::tempdir().unwrap();
        write(vendor.path(), "example.conf", "[]\n");
        write(admin.path(), "example.conf", "[G\n");
        let err = resolver(&[&vendor, &admin]).build().unwrap().resolve().unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptySectionName);
    }

    #[test]
    fn test_empty_suffix() {
        let tier = tempfile::tempdir().unwrap();
        write(tier.path(), "example", "k=1\n");
        write(tier.path(), "example.d/override", "k=2\n");
        let config = DirectoryResolver::builder("example")
            .with_layers(LayerList::new().with_layer(tier.path()))
            .with_suffix("")
            .with_dropin_variants([".d"])
            .build()
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(config.get_int(None, "k").unwrap(), 2);
    }

    #[test]
    fn test_build_rejects_bad_base_name() {
        assert!(DirectoryResolver::builder("").build().is_err());
        assert!(DirectoryResolver::builder("a/b").build().is_err());
    }

    #[test]
    fn test_with_layer_starts_empty() {
        let tier = tempfile::tempdir().unwrap();
        write(tier.path(), "example.conf", "k=1\n");
        let resolver = DirectoryResolver::builder("example")
            .with_layer(tier.path())
            .build()
            .unwrap();
        assert_eq!(resolver.candidates().unwrap().len(), 1);
    }
}
