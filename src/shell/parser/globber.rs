use std::path::Path;

use log::{debug, warn};

use super::lexer::Word;

/// Replaces every glob word with its sorted matches, in place. A word that
/// matches nothing disappears; a malformed pattern is kept as written.
/// Inserted matches are never expanded again.
pub fn expand(words: Vec<Word>, cwd: &Path) -> Vec<String> {
    let mut args = Vec::with_capacity(words.len());
    for word in words {
        if !word.glob {
            args.push(word.text);
            continue;
        }
        match matches(&word.pattern, cwd) {
            Ok(found) => {
                debug!("glob {} matched {} entries", word.pattern, found.len());
                args.extend(found);
            }
            Err(e) => {
                warn!("bad glob pattern {}: {}", word.pattern, e);
                args.push(word.text);
            }
        }
    }
    args
}

/// Matches `pattern` relative to `cwd`. Relative patterns give relative
/// paths back, absolute patterns absolute ones.
pub fn matches(pattern: &str, cwd: &Path) -> Result<Vec<String>, glob::PatternError> {
    let absolute = Path::new(pattern).is_absolute();
    let full = if absolute {
        pattern.to_string()
    } else {
        let base = glob::Pattern::escape(&cwd.to_string_lossy());
        if base.ends_with('/') {
            format!("{}{}", base, pattern)
        } else {
            format!("{}/{}", base, pattern)
        }
    };

    let mut found = Vec::new();
    for entry in glob::glob(&full)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                debug!("skipping unreadable glob entry: {}", e);
                continue;
            }
        };
        let shown = if absolute {
            path.as_path()
        } else {
            path.strip_prefix(cwd).unwrap_or(path.as_path())
        };
        found.push(shown.to_string_lossy().into_owned());
    }
    found.sort();
    Ok(found)
}
