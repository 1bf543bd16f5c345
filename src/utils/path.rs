use std::borrow::Cow;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::trace;
use once_cell::sync::Lazy;

static PROGRAM_NAME: Lazy<String> = Lazy::new(|| {
    env::args()
        .next()
        .map(|arg0| basename(&arg0).into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
});

/// Name this interpreter was invoked as, used to prefix every reported error.
pub fn program_name() -> &'static str {
    PROGRAM_NAME.as_str()
}

pub fn basename(path: &str) -> Cow<'_, str> {
    let mut pieces = path.rsplit('/');
    match pieces.next() {
        Some(p) => p.into(),
        None => path.into(),
    }
}

/// Joins `path` onto `base` unless it is already absolute.
pub fn resolve(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// A regular file with at least one execute bit set.
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(e) => {
            trace!("{}: {}", path.display(), e);
            false
        }
    }
}
