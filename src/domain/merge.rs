// SPDX-License-Identifier: MIT OR Apache-2.0

//! Right-biased merging of configuration handles.
//!
//! Merging never touches its inputs. For every group in the overlay, its keys
//! replace same-named keys of the base; keys and groups only present on one side
//! are kept. The operation is not commutative.

use crate::domain::config_file::ConfigFile;

/// Merges `overlay` on top of `base`.
///
/// The result keeps the base's delimiter and comment character and has no path.
/// Each entry keeps its own [`source`](crate::domain::config_file::Entry::source).
///
/// # Examples
///
/// ```
/// use tiercfg::domain::{merge::merge, ConfigFile};
///
/// let mut vendor = ConfigFile::ini();
/// vendor.set(Some("G"), "k", 1)?;
/// let mut admin = ConfigFile::ini();
/// admin.set(Some("G"), "k", 2)?;
/// admin.set(Some("G"), "e", 3)?;
///
/// let merged = merge(&vendor, &admin);
/// assert_eq!(merged.get_int(Some("G"), "k")?, 2);
/// assert_eq!(merged.get_int(Some("G"), "e")?, 3);
/// assert_eq!(vendor.get_int(Some("G"), "k")?, 1);
/// # Ok::<(), tiercfg::domain::ConfigError>(())
/// ```
pub fn merge(base: &ConfigFile, overlay: &ConfigFile) -> ConfigFile {
    let mut result = base.clone();
    result.set_path(None);
    merge_into(&mut result, overlay);
    result
}

/// Folds handles in precedence order, lowest first.
///
/// The result takes the tags of the first handle; an empty input yields an
/// empty `=`/`#` handle.
pub fn fold<'a, I>(files: I) -> ConfigFile
where
    I: IntoIterator<Item = &'a ConfigFile>,
{
    let mut files = files.into_iter();
    let mut result = match files.next() {
        Some(first) => {
            let mut first = first.clone();
            first.set_path(None);
            first
        }
        None => return ConfigFile::default(),
    };
    for file in files {
        merge_into(&mut result, file);
    }
    result
}

/// In-place variant of [`merge`] used by folds.
pub(crate) fn merge_into(target: &mut ConfigFile, overlay: &ConfigFile) {
    for (name, group) in overlay.groups() {
        let merged = target.group_mut(name);
        for (key, entry) in group.iter() {
            merged.insert(key.to_string(), entry.clone());
        }
    }
}
