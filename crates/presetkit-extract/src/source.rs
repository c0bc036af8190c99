//! Source text preparation and low-level scanning.
//!
//! Declarations are scanned after comments are blanked out. Blanking keeps
//! every newline and byte offset in place, so positions found in the prepared
//! text map straight back to line numbers in the original file.

/// Source text with comments replaced by spaces.
#[derive(Debug, Clone)]
pub struct PreparedSource {
    text: String,
}

impl PreparedSource {
    /// Blank `//` and `/* */` comments outside string and char literals.
    pub fn new(source: &str) -> Self {
        Self {
            text: strip_comments(source),
        }
    }

    /// Comment-free text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line number of byte offset `pos`.
    pub fn line_of(&self, pos: usize) -> usize {
        let end = pos.min(self.text.len());
        self.text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
    }
}

fn strip_comments(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Line,
        Block,
        Str(u8),
    }

    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'/')) => {
                    state = State::Line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = State::Block;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'"', _) => {
                    state = State::Str(b);
                    out.push(b);
                }
                (b'\'', _) if !is_digit_separator(bytes, i) => {
                    state = State::Str(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Line => {
                if b == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(blank(b));
                }
            }
            State::Block => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { blank(b) });
            }
            State::Str(quote) => {
                out.push(b);
                if b == b'\\' {
                    if let Some(escaped) = next {
                        out.push(escaped);
                        i += 2;
                        continue;
                    }
                } else if b == quote || b == b'\n' {
                    state = State::Code;
                }
            }
        }
        i += 1;
    }

    // Only ASCII bytes were replaced; continuation bytes of multi-byte
    // characters inside comments became spaces, so the result is valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// `'` directly after an alphanumeric byte, as in `1'000`.
fn is_digit_separator(bytes: &[u8], i: usize) -> bool {
    i > 0 && bytes[i - 1].is_ascii_alphanumeric()
}

fn blank(b: u8) -> u8 {
    if b == b'\t' { b'\t' } else { b' ' }
}

/// Plugin name from the `This file is part of <Name>.` license header.
pub fn plugin_name(source: &str) -> Option<&str> {
    const MARKER: &str = "This file is part of ";
    let start = source.find(MARKER)? + MARKER.len();
    let line = source[start..].lines().next()?.trim();
    let name = line.strip_suffix('.').unwrap_or(line).trim();
    if name.is_empty() { None } else { Some(name) }
}

/// True for bytes that may appear in a C++ identifier.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// True when `s` is a valid C++ identifier.
pub fn is_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty()
        && !bytes[0].is_ascii_digit()
        && bytes.iter().all(|&b| is_ident_byte(b))
}

/// Forward scanner over prepared source.
///
/// Single byte lookahead; every structural character the extractor cares
/// about is ASCII.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Scanner positioned at `pos`.
    pub fn at(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Peek the current byte.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Move past the current byte.
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Skip ASCII whitespace.
    pub fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// True if the remaining input starts with `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s.as_bytes())
    }

    /// Consume `s` if the remaining input starts with it.
    pub fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume an identifier, returning it.
    pub fn identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        let ident = &self.input[start..self.pos];
        if is_identifier(ident) {
            Some(ident)
        } else {
            self.pos = start;
            None
        }
    }

    /// With the scanner on `open`, consume through the matching `close` and
    /// return the text in between. Nested `open`/`close` pairs are balanced.
    ///
    /// Returns `None` if the input ends first; the position is left unchanged.
    pub fn balanced(&mut self, open: u8, close: u8) -> Option<&'a str> {
        if self.peek() != Some(open) {
            return None;
        }
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut p = self.pos;
        let bytes = self.input.as_bytes();
        while p < bytes.len() {
            let b = bytes[p];
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    self.pos = p + 1;
                    return Some(&self.input[start..p]);
                }
            }
            p += 1;
        }
        None
    }
}

/// Find `word` at or after `from` with identifier boundaries on both sides.
pub fn find_word(text: &str, word: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(rel) = text.get(search..)?.find(word) {
        let at = search + rel;
        let end = at + word.len();
        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return Some(at);
        }
        search = at + word.len();
    }
    None
}

/// Split `text` at commas that are not nested in `()`, `[]` or `{}`.
pub fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q || b == b'\n' {
                quote = None;
            }
        } else {
            match b {
                b'"' => quote = Some(b),
                b'\'' if !is_digit_separator(bytes, i) => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth -= 1,
                b',' if depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

/// Replace whole-word occurrences of `word` in `text`.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut from = 0;
    while let Some(at) = find_word(text, word, from) {
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + word.len();
        from = last;
    }
    out.push_str(&text[last..]);
    out
}
