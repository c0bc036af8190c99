//! Second pass: parameter construction statements.
//!
//! Recognized form:
//!
//! ```cpp
//! value[ID::gain] = std::make_unique<DecibelValue>(default, scale, "gain", flags);
//! ```

use crate::error::{ExtractError, Result};
use crate::source::{PreparedSource, Scanner, find_word, split_top_level};

/// One `value[ID::x] = std::make_unique<Kind>(...)` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construction {
    /// Subscript with the `ID::` qualifier removed (`gain`, `osc0 + idx`).
    pub subscript: String,
    /// Value kind without template arguments (`UIntValue`, `DecibelValue`).
    pub kind: String,
    /// Default value expression.
    pub default: String,
    /// Scale expression.
    pub scale: String,
    /// Display name argument as written.
    pub label: String,
    /// Flags: every argument after the name, comma separated.
    pub flags: String,
    /// 1-based line of the statement.
    pub line: usize,
}

/// Scan `source` for constructions into the array named `target`.
///
/// Subscripts without an `ID::` qualifier (`value[id]`) and assignments from
/// anything other than `std::make_unique` are not constructions and are
/// skipped.
pub fn scan(source: &PreparedSource, target: &str) -> Result<Vec<Construction>> {
    let text = source.text();
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(at) = find_word(text, target, from) {
        from = at + target.len();
        let line = source.line_of(at);
        let mut s = Scanner::at(text, from);
        s.skip_ws();
        let Some(subscript) = s.balanced(b'[', b']') else {
            continue;
        };
        let Some(subscript) = strip_id_qualifier(subscript) else {
            continue;
        };
        s.skip_ws();
        if !s.eat("=") || s.peek() == Some(b'=') {
            continue;
        }
        s.skip_ws();
        if !s.eat("std::make_unique") {
            tracing::debug!(line, subscript, "assignment is not a construction, skipped");
            continue;
        }
        s.skip_ws();

        let malformed = |reason: &str| ExtractError::MalformedConstruction {
            name: subscript.to_string(),
            line,
            reason: reason.to_string(),
        };

        let kind = s
            .balanced(b'<', b'>')
            .ok_or_else(|| malformed("unterminated template argument"))?;
        s.skip_ws();
        let args = s
            .balanced(b'(', b')')
            .ok_or_else(|| malformed("unterminated argument list"))?;

        let args: Vec<String> = split_top_level(args).into_iter().map(normalize).collect();
        if args.len() < 4 {
            return Err(malformed(&format!(
                "expected default, scale, name and flags, found {} argument(s)",
                args.len()
            )));
        }

        found.push(Construction {
            subscript: normalize(subscript),
            kind: kind_name(kind).to_string(),
            default: args[0].clone(),
            scale: args[1].clone(),
            label: args[2].clone(),
            flags: args[3..].join(", "),
            line,
        });
        from = s.pos();
    }

    tracing::debug!(count = found.len(), target, "scanned constructions");
    Ok(found)
}

/// `ID::gain` → `gain`; `ParameterID::ID::osc0 + idx` → `osc0 + idx`.
fn strip_id_qualifier(subscript: &str) -> Option<&str> {
    let subscript = subscript.trim();
    let (_, rest) = subscript.rsplit_once("ID::")?;
    Some(rest)
}

/// `DoubleValue<SomeDSP::LinearScale<double>>` → `DoubleValue`;
/// `Steinberg::UIntValue` → `UIntValue`.
fn kind_name(kind: &str) -> &str {
    let outer = kind.split('<').next().unwrap_or(kind).trim();
    outer.rsplit("::").next().unwrap_or(outer).trim()
}

/// Collapse whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
