//! Group expansion conventions.
//!
//! A group construction declares many runtime parameters at once, usually in
//! a loop:
//!
//! ```cpp
//! for (size_t idx = 0; idx < nOsc; ++idx) {
//!   value[ID::oscGain0 + idx] = std::make_unique<DecibelValue>(
//!     Scales::gain.invmap(1.0 / (idx + 1)), Scales::gain, "oscGain", Info::kCanAutomate);
//! }
//! ```
//!
//! How a group is recognized and how its members are named is a source
//! convention, so it lives behind [`GroupConvention`].

use crate::source::{is_identifier, replace_word};

/// A construction subscript recognized as a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRef<'a> {
    /// Enum identifier of the first member (`oscGain0`).
    pub identifier: &'a str,
    /// Loop variable added to it (`idx`).
    pub index_var: &'a str,
}

/// Recognizes group constructions and names their members.
pub trait GroupConvention {
    /// Classify a subscript (the text after `ID::`). Returns `None` for a
    /// single-parameter construction.
    fn match_group<'a>(&self, subscript: &'a str) -> Option<GroupRef<'a>>;

    /// Name of member `member` of the group whose first identifier is
    /// `identifier`.
    fn member_name(&self, identifier: &str, member: u32) -> String;

    /// Default expression of member `member`, with the loop variable
    /// replaced by the member index.
    fn member_default(&self, group: GroupRef<'_>, default_expr: &str, member: u32) -> String {
        replace_word(default_expr, group.index_var, &member.to_string())
    }
}

/// `<base>0 + <var>` subscripts, members named `<base>0`, `<base>1`, ...
#[derive(Debug, Clone)]
pub struct OffsetIndexConvention {
    index_vars: Vec<String>,
}

impl OffsetIndexConvention {
    /// Convention accepting the given loop variable names.
    pub fn new<I, S>(index_vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index_vars: index_vars.into_iter().map(Into::into).collect(),
        }
    }

    /// Accepted loop variable names.
    pub fn index_vars(&self) -> &[String] {
        &self.index_vars
    }
}

impl Default for OffsetIndexConvention {
    fn default() -> Self {
        Self::new(["idx", "i"])
    }
}

impl GroupConvention for OffsetIndexConvention {
    fn match_group<'a>(&self, subscript: &'a str) -> Option<GroupRef<'a>> {
        let (identifier, var) = subscript.split_once('+')?;
        let identifier = identifier.trim();
        let var = var.trim();
        if !is_identifier(identifier) || !self.index_vars.iter().any(|v| v == var) {
            return None;
        }
        Some(GroupRef {
            identifier,
            index_var: var,
        })
    }

    fn member_name(&self, identifier: &str, member: u32) -> String {
        let base = identifier.strip_suffix('0').unwrap_or(identifier);
        format!("{base}{member}")
    }
}
