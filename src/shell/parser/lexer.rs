use std::path::Path;

use super::globber;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub text: String,
    // quoted or escaped metacharacters arrive here escaped
    pub pattern: String,
    pub glob: bool,
}

impl Word {
    fn push_literal(&mut self, c: char) {
        self.text.push(c);
        if matches!(c, '*' | '?' | '[' | ']') {
            self.pattern.push_str(&glob::Pattern::escape(c.encode_utf8(&mut [0; 4])));
        } else {
            self.pattern.push(c);
        }
    }

    fn push_bare(&mut self, c: char) {
        self.text.push(c);
        self.pattern.push(c);
        if matches!(c, '*' | '?') {
            self.glob = true;
        }
    }
}

/// Splits `s` into words. Single quotes group, a backslash outside quotes
/// escapes the next character, whitespace separates.
pub fn split_words(s: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut word = Word::default();
    let mut started = false;
    let mut quoted = false;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            word.push_literal(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => word.push_literal(c),
            '\\' => {
                escaped = true;
                started = true;
            }
            '\'' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut word));
                    started = false;
                }
            }
            c if quoted => word.push_literal(c),
            c => {
                word.push_bare(c);
                started = true;
            }
        }
    }
    if escaped {
        // nothing left to escape, keep the backslash itself
        word.push_literal('\\');
    }
    if started {
        words.push(word);
    }
    words
}

pub fn fields(s: &str, cwd: &Path) -> Vec<String> {
    let words = split_words(s);
    if words.iter().any(|word| word.glob) {
        globber::expand(words, cwd)
    } else {
        words.into_iter().map(|word| word.text).collect()
    }
}

/// Byte offset and character of the first unquoted, unescaped character of
/// `line` accepted by `hit`.
pub fn peek_where(line: &str, mut hit: impl FnMut(char) -> bool) -> Option<(usize, char)> {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !quoted => escaped = true,
            '\'' => quoted = !quoted,
            c if !quoted && hit(c) => return Some((i, c)),
            _ => {}
        }
    }
    None
}

pub fn peek(line: &str, ch: char) -> Option<usize> {
    peek_where(line, |c| c == ch).map(|(i, _)| i)
}

/// Tries each of `chars` in order and returns the first one found anywhere in
/// `line`, so earlier candidates win over earlier positions.
pub fn peekany(line: &str, chars: &str) -> Option<(usize, char)> {
    chars
        .chars()
        .find_map(|ch| peek(line, ch).map(|i| (i, ch)))
}

pub fn peek_first(line: &str, chars: &str) -> Option<(usize, char)> {
    peek_where(line, |c| chars.contains(c))
}

// an odd trailing backslash joins the next physical line
pub fn continues(line: &str) -> bool {
    let mut quoted = false;
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !quoted => escaped = true,
            '\'' => quoted = !quoted,
            _ => {}
        }
    }
    escaped
}
