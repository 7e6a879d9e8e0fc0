// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-error-location slot.
//!
//! Errors carry their location inline (see [`ConfigError::location`]). This module
//! additionally keeps the location of the most recent fatal load failure for
//! callers that want to query it after the fact. The slot is thread-local: parses
//! running on other threads never overwrite it.

use crate::domain::errors::{ConfigError, ErrorLocation};
use std::cell::RefCell;
use std::path::Path;

thread_local! {
    static LAST_ERROR_LOCATION: RefCell<Option<ErrorLocation>> = const { RefCell::new(None) };
}

/// Returns the location recorded by the last failed load on this thread.
///
/// # Examples
///
/// ```
/// use tiercfg::{last_error_location, parse_bytes};
///
/// let result = parse_bytes(b"a=1\n[Group\n", '=', '#');
/// assert!(result.is_err());
/// assert_eq!(last_error_location().unwrap().line, 2);
/// ```
pub fn last_error_location() -> Option<ErrorLocation> {
    LAST_ERROR_LOCATION.with(|slot| slot.borrow().clone())
}

/// Clears the slot for this thread.
pub fn clear_error_location() {
    LAST_ERROR_LOCATION.with(|slot| slot.borrow_mut().take());
}

/// Records the location of `error`, falling back to `origin` with line 0.
pub(crate) fn record_error(error: &ConfigError, origin: Option<&Path>) {
    let location = error
        .location()
        .unwrap_or_else(|| ErrorLocation::new(origin, 0));
    LAST_ERROR_LOCATION.with(|slot| *slot.borrow_mut() = Some(location));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SyntaxErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_record_and_clear() {
        clear_error_location();
        assert!(last_error_location().is_none());

        let error = ConfigError::syntax(
            SyntaxErrorKind::MissingDelimiter,
            Some(Path::new("/etc/a.conf")),
            3,
            "novalue",
        );
        record_error(&error, None);
        let location = last_error_location().unwrap();
        assert_eq!(location.path, Some(PathBuf::from("/etc/a.conf")));
        assert_eq!(location.line, 3);

        clear_error_location();
        assert!(last_error_location().is_none());
    }

    #[test]
    fn test_record_falls_back_to_origin() {
        record_error(&ConfigError::EmptyKey, Some(Path::new("/run/x.conf")));
        let location = last_error_location().unwrap();
        assert_eq!(location.path, Some(PathBuf::from("/run/x.conf")));
        assert_eq!(location.line, 0);
    }

    #[test]
    fn test_slot_is_thread_local() {
        record_error(&ConfigError::EmptyKey, Some(Path::new("/main")));
        std::thread::spawn(|| {
            assert!(last_error_location().is_none());
            record_error(&ConfigError::EmptyKey, Some(Path::new("/other")));
        })
        .join()
        .unwrap();
        assert_eq!(
            last_error_location().unwrap().path,
            Some(PathBuf::from("/main"))
        );
    }
}
