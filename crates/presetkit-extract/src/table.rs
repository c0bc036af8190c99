//! First pass: the parameter identifier table.
//!
//! The `enum` block in the parameter namespace fixes the wire order of every
//! parameter. Each entry gets an index (sequential, or an explicit `= expr`
//! override after which counting resumes) and a range: the number of
//! parameter slots it owns before the next entry begins.

use std::collections::HashMap;

use crate::error::{ExtractError, Result};
use crate::source::{PreparedSource, Scanner, find_word, is_identifier, split_top_level};

/// One entry of the identifier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Enum identifier.
    pub name: String,
    /// Position of the entry in the enum.
    pub index: u32,
    /// Slots owned by this entry: the index delta to the next entry.
    /// `None` for the last entry of an enum without a sentinel.
    pub range: Option<u32>,
}

/// Enum identifiers in declaration order, with ranges resolved.
#[derive(Debug, Clone, Default)]
pub struct IdentifierTable {
    entries: Vec<EnumEntry>,
    by_name: HashMap<String, usize>,
    sentinel_index: Option<u32>,
}

/// Where to find the enum and what terminates it.
#[derive(Debug, Clone, Copy)]
pub struct EnumLocation<'a> {
    /// Enclosing namespace, or `None` to search the whole file.
    pub namespace: Option<&'a str>,
    /// Enum type name.
    pub enum_name: &'a str,
    /// Terminal entry that counts the parameters and is not one itself.
    pub sentinel: &'a str,
}

impl IdentifierTable {
    /// Locate and parse the enum block in `source`.
    ///
    /// `constants` resolves names in override expressions that are not enum
    /// entries. `constexpr` integers declared in the source are added to it,
    /// but never replace a caller-supplied value.
    pub fn parse(
        source: &PreparedSource,
        location: EnumLocation<'_>,
        constants: &HashMap<String, i64>,
    ) -> Result<Self> {
        let text = source.text();
        let body = find_enum_body(text, location).ok_or_else(|| ExtractError::SchemaNotFound {
            namespace: location.namespace.unwrap_or_default().to_string(),
            enum_name: location.enum_name.to_string(),
        })?;

        let mut known = source_constants(text);
        known.extend(constants.iter().map(|(k, v)| (k.clone(), *v)));

        let mut table = IdentifierTable::default();
        let mut next: i64 = 0;

        for raw in split_top_level(body) {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }

            let (name, override_expr) = match entry.split_once('=') {
                Some((name, expr)) => (name.trim(), Some(expr.trim())),
                None => (entry, None),
            };
            if !is_identifier(name) {
                return Err(ExtractError::MalformedEnumEntry {
                    entry: entry.to_string(),
                });
            }

            let value = match override_expr {
                Some(expr) => evaluate(expr, |term| {
                    table
                        .get(term)
                        .map(|e| i64::from(e.index))
                        .or_else(|| known.get(term).copied())
                })
                .map_err(|term| ExtractError::UnresolvedConstant {
                    entry: name.to_string(),
                    term,
                    expr: expr.to_string(),
                })?,
                None => next,
            };
            let index = u32::try_from(value).map_err(|_| ExtractError::EnumValueOutOfRange {
                entry: name.to_string(),
                value,
            })?;

            if name == location.sentinel {
                table.close_last(index);
                table.sentinel_index = Some(index);
                break;
            }

            table.close_last(index);
            table.push(name, index);
            next = value + 1;
        }

        if table.sentinel_index.is_none() {
            tracing::debug!(
                sentinel = location.sentinel,
                "enum has no sentinel, last entry range unknown"
            );
        }
        Ok(table)
    }

    fn push(&mut self, name: &str, index: u32) {
        if self.by_name.contains_key(name) {
            tracing::warn!(name, "duplicate enum entry ignored");
            return;
        }
        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push(EnumEntry {
            name: name.to_string(),
            index,
            range: None,
        });
    }

    /// Set the range of the most recent entry now that the next index is known.
    fn close_last(&mut self, next_index: u32) {
        if let Some(last) = self.entries.last_mut() {
            last.range = Some(next_index.saturating_sub(last.index));
        }
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[EnumEntry] {
        &self.entries
    }

    /// Look up an entry by identifier.
    pub fn get(&self, name: &str) -> Option<&EnumEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Declaration position of `name`, used to order constructions.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Index of the sentinel entry, if the enum has one.
    pub fn sentinel_index(&self) -> Option<u32> {
        self.sentinel_index
    }

    /// Number of entries, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the enum declares no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text between the braces of the parameter enum.
fn find_enum_body<'a>(text: &'a str, location: EnumLocation<'_>) -> Option<&'a str> {
    let scope = match location.namespace {
        Some(namespace) => namespace_body(text, namespace)?,
        None => text,
    };

    let mut from = 0;
    while let Some(at) = find_word(scope, "enum", from) {
        let mut s = Scanner::at(scope, at + "enum".len());
        from = at + "enum".len();
        s.skip_ws();
        if s.eat("class") || s.eat("struct") {
            s.skip_ws();
        }
        if s.identifier() != Some(location.enum_name) {
            continue;
        }
        s.skip_ws();
        if s.peek() == Some(b':') {
            // Underlying type.
            while s.peek().is_some_and(|b| b != b'{' && b != b';') {
                s.advance();
            }
        }
        if let Some(body) = s.balanced(b'{', b'}') {
            return Some(body);
        }
    }
    None
}

fn namespace_body<'a>(text: &'a str, namespace: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(at) = find_word(text, "namespace", from) {
        let mut s = Scanner::at(text, at + "namespace".len());
        from = at + "namespace".len();
        s.skip_ws();
        if s.identifier() != Some(namespace) {
            continue;
        }
        s.skip_ws();
        if let Some(body) = s.balanced(b'{', b'}') {
            return Some(body);
        }
    }
    None
}

/// Integer `constexpr` declarations, in source order. Declarations that do
/// not evaluate to an integer (floating point, calls) are skipped.
fn source_constants(text: &str) -> HashMap<String, i64> {
    let mut constants = HashMap::new();
    let mut from = 0;
    while let Some(at) = find_word(text, "constexpr", from) {
        let start = at + "constexpr".len();
        from = start;
        let Some(len) = text[start..].find(';') else {
            break;
        };
        let decl = &text[start..start + len];
        let Some((lhs, rhs)) = decl.split_once('=') else {
            continue;
        };
        let Some(name) = lhs.split_whitespace().last().filter(|n| is_identifier(n)) else {
            continue;
        };
        if let Ok(value) = evaluate(rhs.trim(), |term| constants.get(term).copied()) {
            constants.insert(name.to_string(), value);
        }
    }
    constants
}

/// Evaluate an integer expression with `+`, `-`, `*` and parentheses.
///
/// Identifiers may be qualified (`ParameterID::ID::foo`); only the last
/// segment is looked up. On failure returns the term that could not be
/// resolved, or the remaining text when the expression does not parse.
pub fn evaluate(expr: &str, lookup: impl Fn(&str) -> Option<i64>) -> std::result::Result<i64, String> {
    let mut eval = Evaluator {
        s: Scanner::at(expr, 0),
        input: expr,
        lookup: &lookup,
    };
    let value = eval.sum()?;
    eval.s.skip_ws();
    if eval.s.peek().is_some() {
        return Err(eval.rest());
    }
    Ok(value)
}

struct Evaluator<'a, F> {
    s: Scanner<'a>,
    input: &'a str,
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<i64>> Evaluator<'_, F> {
    fn rest(&self) -> String {
        self.input[self.s.pos()..].trim().to_string()
    }

    fn sum(&mut self) -> std::result::Result<i64, String> {
        let mut value = self.product()?;
        loop {
            self.s.skip_ws();
            if self.s.eat("+") {
                value = value.checked_add(self.product()?).ok_or_else(|| self.rest())?;
            } else if self.s.eat("-") {
                value = value.checked_sub(self.product()?).ok_or_else(|| self.rest())?;
            } else {
                return Ok(value);
            }
        }
    }

    fn product(&mut self) -> std::result::Result<i64, String> {
        let mut value = self.factor()?;
        loop {
            self.s.skip_ws();
            if self.s.eat("*") {
                value = value.checked_mul(self.factor()?).ok_or_else(|| self.rest())?;
            } else {
                return Ok(value);
            }
        }
    }

    fn factor(&mut self) -> std::result::Result<i64, String> {
        self.s.skip_ws();
        match self.s.peek() {
            Some(b'-') => {
                self.s.advance();
                self.factor()?.checked_neg().ok_or_else(|| self.rest())
            }
            Some(b'(') => {
                self.s.advance();
                let value = self.sum()?;
                self.s.skip_ws();
                if self.s.eat(")") {
                    Ok(value)
                } else {
                    Err(self.rest())
                }
            }
            Some(b) if b.is_ascii_digit() => self.number(),
            Some(_) => {
                let mut last = self.s.identifier().ok_or_else(|| self.rest())?;
                while self.s.eat("::") {
                    last = self.s.identifier().ok_or_else(|| self.rest())?;
                }
                (self.lookup)(last).ok_or_else(|| last.to_string())
            }
            None => Err(String::new()),
        }
    }

    fn number(&mut self) -> std::result::Result<i64, String> {
        let start = self.s.pos();
        while self.s.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'\'') {
            self.s.advance();
        }
        let literal: String = self.input[start..self.s.pos()]
            .chars()
            .filter(|&c| c != '\'')
            .collect();
        let digits = literal.trim_end_matches(['u', 'U', 'l', 'L']);
        let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            Some(hex) => i64::from_str_radix(hex, 16),
            None => digits.parse::<i64>(),
        };
        parsed.map_err(|_| literal.clone())
    }
}
