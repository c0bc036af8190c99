//! Extraction errors.

use presetkit_core::SchemaError;

/// Errors from schema extraction.
///
/// Every variant names the identifier or source line it refers to so a batch
/// run can report the failure without re-reading the file.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No `enum` block was found in the expected namespace.
    #[error("parameter enum '{namespace}::{enum_name}' not found")]
    SchemaNotFound {
        /// Namespace searched (empty when searching the whole file).
        namespace: String,
        /// Enum name searched for.
        enum_name: String,
    },

    /// The license header does not name the plugin.
    #[error("plugin name not found (expected 'This file is part of <Name>.')")]
    PluginNameNotFound,

    /// An enum entry is not of the form `name` or `name = expr`.
    #[error("malformed enum entry '{entry}'")]
    MalformedEnumEntry {
        /// Entry text.
        entry: String,
    },

    /// An enum override refers to a name that is neither a prior enum entry
    /// nor a known constant.
    #[error("enum entry '{entry}': cannot resolve '{term}' in '{expr}'")]
    UnresolvedConstant {
        /// Enum entry being assigned.
        entry: String,
        /// Offending term.
        term: String,
        /// Whole override expression.
        expr: String,
    },

    /// An enum entry's index does not fit a 32-bit parameter id.
    #[error("enum entry '{entry}' has out-of-range index {value}")]
    EnumValueOutOfRange {
        /// Enum entry.
        entry: String,
        /// Evaluated index.
        value: i64,
    },

    /// A construction refers to an identifier missing from the enum.
    #[error("line {line}: construction refers to unknown parameter '{name}'")]
    UnresolvedParameterReference {
        /// Identifier expression inside the subscript.
        name: String,
        /// 1-based source line.
        line: usize,
    },

    /// Two constructions target the same enum entry.
    #[error("line {line}: parameter '{name}' constructed twice (first on line {first_line})")]
    DuplicateConstruction {
        /// Enum identifier.
        name: String,
        /// Line of the first construction.
        first_line: usize,
        /// Line of the second construction.
        line: usize,
    },

    /// A construction statement could not be parsed.
    #[error("line {line}: malformed construction for '{name}': {reason}")]
    MalformedConstruction {
        /// Subscript text.
        name: String,
        /// 1-based source line.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// A group construction targets the last enum entry and no sentinel
    /// bounds it.
    #[error("group '{name}' has no known size (enum has no '{sentinel}' sentinel)")]
    UnboundedGroup {
        /// Group identifier.
        name: String,
        /// Sentinel that was expected.
        sentinel: String,
    },

    /// The source declares no parameters.
    #[error("no parameter constructions found for '{plugin}'")]
    EmptySchema {
        /// Plugin name.
        plugin: String,
    },

    /// The assembled schema is inconsistent.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Convenience result type for extraction.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_identifier_and_line() {
        let err = ExtractError::UnresolvedParameterReference {
            name: "gian".into(),
            line: 42,
        };
        assert_eq!(
            err.to_string(),
            "line 42: construction refers to unknown parameter 'gian'"
        );

        let err = ExtractError::UnresolvedConstant {
            entry: "d3Feed0".into(),
            term: "nDepth1".into(),
            expr: "3 * nDepth1".into(),
        };
        assert!(err.to_string().contains("'nDepth1'"));
    }

    #[test]
    fn schema_error_is_transparent() {
        let inner = SchemaError::NonSequentialId {
            plugin: "P".into(),
            expected: 1,
            found: 3,
        };
        let msg = inner.to_string();
        let err: ExtractError = inner.into();
        assert_eq!(err.to_string(), msg);
    }
}
