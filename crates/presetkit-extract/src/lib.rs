//! Parameter schema extraction for presetkit.
//!
//! Reads a plugin's C++ parameter declaration header and produces the ordered
//! [`ParameterSchema`] used to decode its presets. Extraction runs in two
//! passes:
//!
//! 1. **Identifier table**: the `enum ID { ... }` block inside
//!    `namespace ParameterID` fixes each parameter's wire position and how many
//!    slots it owns ([`IdentifierTable`]).
//! 2. **Constructions**: each `value[ID::x] = std::make_unique<Kind>(...)`
//!    statement is resolved against the table by direct lookup. Anything that
//!    does not resolve is an error; nothing is guessed.
//!
//! Group constructions (one statement declaring several indexed parameters)
//! are expanded through a [`GroupConvention`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use presetkit_extract::SchemaExtractor;
//!
//! let source = std::fs::read_to_string("source/parameter.hpp")?;
//! let schema = SchemaExtractor::new().extract(&source)?;
//! println!("{}: {} parameters", schema.plugin(), schema.len());
//! ```

mod construction;
mod convention;
mod error;
mod fuid;
mod source;
mod table;

pub use construction::Construction;
pub use convention::{GroupConvention, GroupRef, OffsetIndexConvention};
pub use error::{ExtractError, Result};
pub use fuid::extract_processor_uid;
pub use source::plugin_name;
pub use table::{EnumEntry, EnumLocation, IdentifierTable};

use std::collections::HashMap;

use presetkit_core::{DefaultValue, ParameterDescriptor, ParameterSchema, WireType};

use source::PreparedSource;

/// Where the extractor looks and what it accepts.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Namespace enclosing the enum; `None` searches the whole file.
    pub namespace: Option<String>,
    /// Enum type name.
    pub enum_name: String,
    /// Terminal enum entry that is not a parameter.
    pub sentinel: String,
    /// Array the constructions assign into.
    pub target: String,
    /// Plugin name to use instead of the license header.
    pub plugin_name: Option<String>,
    /// Integer constants declared outside the parsed source.
    pub constants: HashMap<String, i64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            namespace: Some("ParameterID".to_string()),
            enum_name: "ID".to_string(),
            sentinel: "ID_ENUM_LENGTH".to_string(),
            target: "value".to_string(),
            plugin_name: None,
            constants: HashMap::new(),
        }
    }
}

impl ExtractorConfig {
    fn location(&self) -> EnumLocation<'_> {
        EnumLocation {
            namespace: self.namespace.as_deref(),
            enum_name: &self.enum_name,
            sentinel: &self.sentinel,
        }
    }
}

/// Builds a [`ParameterSchema`] from parameter declaration source.
pub struct SchemaExtractor {
    config: ExtractorConfig,
    convention: Box<dyn GroupConvention + Send + Sync>,
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaExtractor {
    /// Extractor with the default layout and [`OffsetIndexConvention`].
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Extractor with a custom configuration.
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            config,
            convention: Box::new(OffsetIndexConvention::default()),
        }
    }

    /// Replace the group convention.
    pub fn with_convention(
        mut self,
        convention: impl GroupConvention + Send + Sync + 'static,
    ) -> Self {
        self.convention = Box::new(convention);
        self
    }

    /// Add an integer constant for enum override expressions.
    pub fn with_constant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.config.constants.insert(name.into(), value);
        self
    }

    /// Use `name` instead of reading it from the license header.
    pub fn with_plugin_name(mut self, name: impl Into<String>) -> Self {
        self.config.plugin_name = Some(name.into());
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run the first pass only.
    pub fn identifier_table(&self, source: &str) -> Result<IdentifierTable> {
        let prepared = PreparedSource::new(source);
        IdentifierTable::parse(&prepared, self.config.location(), &self.config.constants)
    }

    /// Extract the full schema.
    pub fn extract(&self, source: &str) -> Result<ParameterSchema> {
        let plugin = match &self.config.plugin_name {
            Some(name) => name.clone(),
            None => plugin_name(source)
                .ok_or(ExtractError::PluginNameNotFound)?
                .to_string(),
        };

        let prepared = PreparedSource::new(source);
        let table =
            IdentifierTable::parse(&prepared, self.config.location(), &self.config.constants)?;
        let constructions = construction::scan(&prepared, &self.config.target)?;

        let resolved = self.resolve(&table, &constructions)?;
        let descriptors = self.expand(&table, resolved)?;

        if descriptors.is_empty() {
            return Err(ExtractError::EmptySchema { plugin });
        }

        let schema = ParameterSchema::new(plugin, descriptors)?;
        tracing::info!(
            plugin = schema.plugin(),
            parameters = schema.len(),
            width = schema.total_width(),
            "extracted parameter schema"
        );
        Ok(schema)
    }

    /// Match constructions to table entries, ordered by enum position.
    fn resolve<'c>(
        &self,
        table: &IdentifierTable,
        constructions: &'c [Construction],
    ) -> Result<Vec<Resolved<'c>>> {
        let mut first_line: HashMap<usize, usize> = HashMap::new();
        let mut resolved = Vec::with_capacity(constructions.len());

        for construction in constructions {
            let group = self.convention.match_group(&construction.subscript);
            let identifier = group.map_or(construction.subscript.as_str(), |g| g.identifier);

            let position = table.position(identifier).ok_or_else(|| {
                ExtractError::UnresolvedParameterReference {
                    name: construction.subscript.clone(),
                    line: construction.line,
                }
            })?;

            if let Some(&first) = first_line.get(&position) {
                return Err(ExtractError::DuplicateConstruction {
                    name: identifier.to_string(),
                    first_line: first,
                    line: construction.line,
                });
            }
            first_line.insert(position, construction.line);

            resolved.push(Resolved {
                position,
                construction,
                group,
            });
        }

        resolved.sort_by_key(|r| r.position);
        Ok(resolved)
    }

    /// Emit descriptors with dense ids, expanding groups.
    fn expand(
        &self,
        table: &IdentifierTable,
        resolved: Vec<Resolved<'_>>,
    ) -> Result<Vec<ParameterDescriptor>> {
        let mut descriptors = Vec::new();

        for Resolved {
            position,
            construction,
            group,
        } in resolved
        {
            let entry = &table.entries()[position];
            let wire_type = WireType::from_value_kind(&construction.kind);

            let Some(group) = group else {
                descriptors.push(
                    describe(descriptors.len(), &entry.name, wire_type, construction)
                        .with_default(DefaultValue::parse(&construction.default)),
                );
                continue;
            };

            let size = entry.range.ok_or_else(|| ExtractError::UnboundedGroup {
                name: entry.name.clone(),
                sentinel: self.config.sentinel.clone(),
            })?;
            if size == 0 {
                tracing::warn!(
                    group = %entry.name,
                    line = construction.line,
                    "group owns no slots, skipped"
                );
            }
            for member in 0..size {
                let default =
                    self.convention
                        .member_default(group, &construction.default, member);
                let name = self.convention.member_name(&entry.name, member);
                descriptors.push(
                    describe(descriptors.len(), &name, wire_type, construction)
                        .with_default(DefaultValue::parse(&default)),
                );
            }
            tracing::debug!(group = %entry.name, size, "expanded group");
        }

        Ok(descriptors)
    }
}

struct Resolved<'c> {
    position: usize,
    construction: &'c Construction,
    group: Option<GroupRef<'c>>,
}

fn describe(
    id: usize,
    name: &str,
    wire_type: WireType,
    construction: &Construction,
) -> ParameterDescriptor {
    ParameterDescriptor::new(id as u32, name, wire_type)
        .with_scale(construction.scale.clone())
        .with_flags(construction.flags.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "// This file is part of TestSynth.\n";

    fn source(enum_body: &str, constructions: &str) -> String {
        format!(
            "{HEADER}\nnamespace ParameterID {{\nenum ID {{\n{enum_body}\n}};\n}} // namespace ParameterID\n\n\
             struct GlobalParameter {{\n  GlobalParameter() {{\n{constructions}\n  }}\n}};\n"
        )
    }

    #[test]
    fn skipped_enum_entry_produces_no_descriptor() {
        let src = source(
            "A,\nB = 5,\nC,",
            "value[ID::A] = std::make_unique<LinearValue>(0.5, Scales::a, \"A\", Info::kCanAutomate);\n\
             value[ID::C] = std::make_unique<UIntValue>(1, Scales::c, \"C\", Info::kCanAutomate);",
        );
        let extractor = SchemaExtractor::new();

        let table = extractor.identifier_table(&src).unwrap();
        assert_eq!(table.get("A").unwrap().range, Some(5));
        assert_eq!(table.get("C").unwrap().index, 6);
        assert_eq!(table.get("C").unwrap().range, None);

        let schema = extractor.extract(&src).unwrap();
        let names: Vec<_> = schema.iter().map(|d| (d.id, d.name.as_str())).collect();
        assert_eq!(names, vec![(0, "A"), (1, "C")]);
        assert_eq!(schema.get(1).unwrap().wire_type, WireType::UInt32);
        assert_eq!(schema.get(1).unwrap().default, DefaultValue::Integer(1));
    }

    #[test]
    fn constructions_follow_enum_order() {
        let src = source(
            "first,\nsecond,\nID_ENUM_LENGTH,",
            "value[ID::second] = std::make_unique<UIntValue>(0, s, \"second\", f);\n\
             value[ID::first] = std::make_unique<LinearValue>(0.0, s, \"first\", f);",
        );
        let schema = SchemaExtractor::new().extract(&src).unwrap();
        assert_eq!(schema.get(0).unwrap().name, "first");
        assert_eq!(schema.get(1).unwrap().name, "second");
    }

    #[test]
    fn group_expands_by_range() {
        let src = source(
            "bypass,\nosc0,\nmix = 4,\nID_ENUM_LENGTH,",
            "value[ID::bypass] = std::make_unique<UIntValue>(0, s, \"bypass\", f);\n\
             for (size_t idx = 0; idx < 3; ++idx) {\n\
               value[ID::osc0 + idx] = std::make_unique<DecibelValue>(\n\
                 Scales::gain.invmap(1.0 / (idx + 1)), Scales::gain, (\"osc\" + std::to_string(idx)).c_str(), f);\n\
             }\n\
             value[ID::mix] = std::make_unique<LinearValue>(0.5, s, \"mix\", f);",
        );
        let schema = SchemaExtractor::new().extract(&src).unwrap();
        let names: Vec<_> = schema.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["bypass", "osc0", "osc1", "osc2", "mix"]);
        assert_eq!(
            schema.find("osc2").unwrap().default,
            DefaultValue::Expression("Scales::gain.invmap(1.0 / (2 + 1))".into())
        );
        assert_eq!(schema.total_width(), 4 + 3 * 8 + 8);
    }

    #[test]
    fn unknown_identifier_fails_closed() {
        let src = source(
            "gain,\nID_ENUM_LENGTH,",
            "value[ID::gian] = std::make_unique<LinearValue>(0.5, s, \"gain\", f);",
        );
        let err = SchemaExtractor::new().extract(&src).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnresolvedParameterReference { ref name, .. } if name == "gian"
        ));
    }

    #[test]
    fn duplicate_construction() {
        let src = source(
            "gain,\nID_ENUM_LENGTH,",
            "value[ID::gain] = std::make_unique<LinearValue>(0.5, s, \"gain\", f);\n\
             value[ID::gain] = std::make_unique<LinearValue>(0.7, s, \"gain\", f);",
        );
        let err = SchemaExtractor::new().extract(&src).unwrap_err();
        assert!(matches!(err, ExtractError::DuplicateConstruction { .. }));
    }

    #[test]
    fn group_at_end_without_sentinel_is_unbounded() {
        let src = source(
            "gain,\nosc0,",
            "value[ID::osc0 + idx] = std::make_unique<LinearValue>(0.5, s, \"osc\", f);",
        );
        let err = SchemaExtractor::new().extract(&src).unwrap_err();
        assert!(matches!(err, ExtractError::UnboundedGroup { ref name, .. } if name == "osc0"));
    }

    #[test]
    fn no_constructions_is_empty_schema() {
        let src = source("gain,\nID_ENUM_LENGTH,", "");
        let err = SchemaExtractor::new().extract(&src).unwrap_err();
        assert!(matches!(err, ExtractError::EmptySchema { ref plugin } if plugin == "TestSynth"));
    }

    #[test]
    fn plugin_name_required_unless_given() {
        let src = source(
            "gain,\nID_ENUM_LENGTH,",
            "value[ID::gain] = std::make_unique<LinearValue>(0.5, s, \"gain\", f);",
        )
        .replacen(HEADER, "", 1);
        let err = SchemaExtractor::new().extract(&src).unwrap_err();
        assert!(matches!(err, ExtractError::PluginNameNotFound));

        let schema = SchemaExtractor::new().with_plugin_name("Named").extract(&src).unwrap();
        assert_eq!(schema.plugin(), "Named");
    }

    #[test]
    fn external_constant_and_custom_sentinel() {
        let config = ExtractorConfig {
            sentinel: "COUNT".to_string(),
            ..ExtractorConfig::default()
        };
        let src = source(
            "voice0,\nmaster = voice0 + nVoice,\nCOUNT,",
            "value[ID::voice0 + i] = std::make_unique<UIntValue>(i, s, \"voice\", f);\n\
             value[ID::master] = std::make_unique<LinearValue>(1.0, s, \"master\", f);",
        );
        let schema = SchemaExtractor::with_config(config)
            .with_constant("nVoice", 2)
            .extract(&src)
            .unwrap();
        let names: Vec<_> = schema.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["voice0", "voice1", "master"]);
        assert_eq!(schema.get(1).unwrap().default, DefaultValue::Integer(1));
        assert_eq!(schema.get(2).unwrap().default, DefaultValue::Float(1.0));
    }
}
