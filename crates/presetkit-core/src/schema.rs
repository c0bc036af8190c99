//! Parameter schema model.
//!
//! A [`ParameterSchema`] is the ordered list of [`ParameterDescriptor`]s that a
//! plugin writes into its component state. The component state carries no
//! field names, so descriptor order is the only addressing mechanism: ids must
//! form the dense sequence `0, 1, 2, ...` and decoding walks them in that order.
//! [`ParameterSchema::new`] enforces this, so any schema value that exists is
//! safe to decode against.

use serde::{Deserialize, Serialize};

/// Fixed-width binary encoding of one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    /// Unsigned 32-bit integer (4 bytes).
    UInt32,
    /// IEEE-754 double precision float (8 bytes).
    Float64,
}

impl WireType {
    /// Number of bytes one value occupies in the component state.
    pub const fn width(self) -> usize {
        match self {
            WireType::UInt32 => 4,
            WireType::Float64 => 8,
        }
    }

    /// Resolve the wire type from a declared value kind (e.g. `UIntValue`).
    ///
    /// Only the unsigned integer kind is stored as `UInt32`; every scale-backed
    /// kind is stored as a double.
    pub fn from_value_kind(kind: &str) -> Self {
        if kind.trim() == "UIntValue" {
            WireType::UInt32
        } else {
            WireType::Float64
        }
    }

    /// Stable name used in artifacts and CLI output.
    pub const fn as_str(self) -> &'static str {
        match self {
            WireType::UInt32 => "UInt32",
            WireType::Float64 => "Float64",
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value of a parameter as written in its declaration.
///
/// Literals are typed; anything else (e.g. `Scales::gain.invmapDB(0.0)`) is
/// kept as the unevaluated expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
    /// `true` / `false`.
    Bool(bool),
    /// Expression that is not a literal.
    Expression(String),
}

impl DefaultValue {
    /// Classify default expression text.
    ///
    /// Tries integer, then float, then boolean; falls back to the trimmed text.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(value) = text.parse::<i64>() {
            return DefaultValue::Integer(value);
        }
        if let Ok(value) = text.parse::<f64>() {
            return DefaultValue::Float(value);
        }
        match text {
            "true" => DefaultValue::Bool(true),
            "false" => DefaultValue::Bool(false),
            _ => DefaultValue::Expression(text.to_string()),
        }
    }
}

impl Default for DefaultValue {
    fn default() -> Self {
        DefaultValue::Integer(0)
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Integer(v) => write!(f, "{v}"),
            DefaultValue::Float(v) => write!(f, "{v}"),
            DefaultValue::Bool(v) => write!(f, "{v}"),
            DefaultValue::Expression(e) => f.write_str(e),
        }
    }
}

/// One wire-level parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Position in the component state (dense from 0).
    pub id: u32,
    /// Parameter name. Group members carry their instance index as a suffix.
    pub name: String,
    /// Binary encoding of the value.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Declared default, used only when a tolerant descriptor is missing.
    pub default: DefaultValue,
    /// Host scale expression, carried through unevaluated.
    #[serde(default)]
    pub scale: String,
    /// Host flag expression, carried through unevaluated.
    #[serde(default)]
    pub flags: String,
    /// May fall back to `default` when the component state is truncated.
    ///
    /// Only ever set from an explicit allow-list, never read from or written
    /// to an artifact.
    #[serde(skip)]
    pub default_tolerant: bool,
}

impl ParameterDescriptor {
    /// Create a descriptor with a zero default and empty scale/flags.
    pub fn new(id: u32, name: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            id,
            name: name.into(),
            wire_type,
            default: DefaultValue::default(),
            scale: String::new(),
            flags: String::new(),
            default_tolerant: false,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    /// Set the scale expression.
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Set the flags expression.
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }

    /// Mark the descriptor as default-tolerant.
    pub fn with_default_tolerance(mut self, tolerant: bool) -> Self {
        self.default_tolerant = tolerant;
        self
    }

    /// Byte width of this parameter on the wire.
    pub fn width(&self) -> usize {
        self.wire_type.width()
    }
}

/// Schema invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Descriptor ids are not the dense sequence `0..n`.
    #[error("schema '{plugin}': expected parameter id {expected}, found {found}")]
    NonSequentialId {
        /// Plugin the schema belongs to.
        plugin: String,
        /// Id required at this position.
        expected: u32,
        /// Id actually present.
        found: u32,
    },
}

/// Ordered parameter descriptors of one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    plugin: String,
    descriptors: Vec<ParameterDescriptor>,
}

impl ParameterSchema {
    /// Build a schema, checking that ids run `0, 1, 2, ...` in order.
    pub fn new(
        plugin: impl Into<String>,
        descriptors: Vec<ParameterDescriptor>,
    ) -> Result<Self, SchemaError> {
        let plugin = plugin.into();
        for (expected, descriptor) in descriptors.iter().enumerate() {
            let expected = expected as u32;
            if descriptor.id != expected {
                return Err(SchemaError::NonSequentialId {
                    plugin,
                    expected,
                    found: descriptor.id,
                });
            }
        }
        Ok(Self {
            plugin,
            descriptors,
        })
    }

    /// Plugin name the schema was extracted for.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Descriptors in id order.
    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    /// Consume the schema, returning its descriptors.
    pub fn into_descriptors(self) -> Vec<ParameterDescriptor> {
        self.descriptors
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when the schema has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor by id.
    pub fn get(&self, id: u32) -> Option<&ParameterDescriptor> {
        self.descriptors.get(id as usize)
    }

    /// Descriptor by name.
    pub fn find(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Iterate descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.descriptors.iter()
    }

    /// Bytes a complete component state occupies.
    pub fn total_width(&self) -> usize {
        self.descriptors.iter().map(ParameterDescriptor::width).sum()
    }

    /// Flag the given ids as default-tolerant.
    ///
    /// Returns the ids that do not exist in this schema.
    pub fn mark_default_tolerant(&mut self, ids: impl IntoIterator<Item = u32>) -> Vec<u32> {
        let mut missing = Vec::new();
        for id in ids {
            match self.descriptors.get_mut(id as usize) {
                Some(descriptor) => descriptor.default_tolerant = true,
                None => missing.push(id),
            }
        }
        missing
    }
}

impl<'a> IntoIterator for &'a ParameterSchema {
    type Item = &'a ParameterDescriptor;
    type IntoIter = std::slice::Iter<'a, ParameterDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: u32, name: &str, wire_type: WireType) -> ParameterDescriptor {
        ParameterDescriptor::new(id, name, wire_type)
    }

    #[test]
    fn wire_type_widths() {
        assert_eq!(WireType::UInt32.width(), 4);
        assert_eq!(WireType::Float64.width(), 8);
    }

    #[test]
    fn only_uint_kind_maps_to_uint32() {
        assert_eq!(WireType::from_value_kind("UIntValue"), WireType::UInt32);
        assert_eq!(WireType::from_value_kind("DecibelValue"), WireType::Float64);
        assert_eq!(WireType::from_value_kind("LinearValue"), WireType::Float64);
        assert_eq!(
            WireType::from_value_kind("DoubleValue<SomeDSP::LogScale<double>>"),
            WireType::Float64
        );
    }

    #[test]
    fn default_value_classification() {
        assert_eq!(DefaultValue::parse("3"), DefaultValue::Integer(3));
        assert_eq!(DefaultValue::parse(" -12 "), DefaultValue::Integer(-12));
        assert_eq!(DefaultValue::parse("0.25"), DefaultValue::Float(0.25));
        assert_eq!(DefaultValue::parse("true"), DefaultValue::Bool(true));
        assert_eq!(DefaultValue::parse("false"), DefaultValue::Bool(false));
        assert_eq!(
            DefaultValue::parse("Scales::gain.invmap(0.5)"),
            DefaultValue::Expression("Scales::gain.invmap(0.5)".to_string())
        );
    }

    #[test]
    fn new_accepts_dense_ids() {
        let schema = ParameterSchema::new(
            "Test",
            vec![
                descriptor(0, "gain", WireType::Float64),
                descriptor(1, "mute", WireType::UInt32),
            ],
        )
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.total_width(), 12);
        assert_eq!(schema.plugin(), "Test");
        assert_eq!(schema.find("mute").map(|d| d.id), Some(1));
        assert_eq!(schema.get(0).map(|d| d.name.as_str()), Some("gain"));
    }

    #[test]
    fn new_rejects_gap() {
        let err = ParameterSchema::new(
            "Test",
            vec![
                descriptor(0, "a", WireType::Float64),
                descriptor(2, "b", WireType::Float64),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::NonSequentialId {
                plugin: "Test".to_string(),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn new_rejects_nonzero_start() {
        let err = ParameterSchema::new("P", vec![descriptor(1, "a", WireType::UInt32)]).unwrap_err();
        assert!(err.to_string().contains("expected parameter id 0"));
    }

    #[test]
    fn mark_default_tolerant_reports_missing_ids() {
        let mut schema = ParameterSchema::new(
            "P",
            vec![
                descriptor(0, "a", WireType::Float64),
                descriptor(1, "b", WireType::Float64),
            ],
        )
        .unwrap();

        let missing = schema.mark_default_tolerant([1, 7]);
        assert_eq!(missing, vec![7]);
        assert!(!schema.descriptors()[0].default_tolerant);
        assert!(schema.descriptors()[1].default_tolerant);
    }

    #[test]
    fn tolerance_flag_is_never_serialized() {
        let plain = descriptor(0, "a", WireType::UInt32);
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("default_tolerant"));
        assert!(json.contains("\"type\":\"UInt32\""));

        let tolerant = plain.with_default_tolerance(true);
        let json = serde_json::to_string(&tolerant).unwrap();
        assert!(!json.contains("default_tolerant"));
    }

    #[test]
    fn tolerance_flag_is_ignored_on_load() {
        let json = r#"{"id": 0, "name": "a", "type": "Float64", "default": 0.5, "default_tolerant": true}"#;
        let d: ParameterDescriptor = serde_json::from_str(json).unwrap();
        assert!(!d.default_tolerant);
    }

    #[test]
    fn default_value_serializes_untagged() {
        let d = descriptor(0, "a", WireType::Float64).with_default(DefaultValue::Float(0.5));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["default"], serde_json::json!(0.5));

        let back: ParameterDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back.default, DefaultValue::Float(0.5));

        let expr: DefaultValue = serde_json::from_str("\"Scales::x.invmap(1.0)\"").unwrap();
        assert_eq!(expr, DefaultValue::Expression("Scales::x.invmap(1.0)".to_string()));
        let int: DefaultValue = serde_json::from_str("4").unwrap();
        assert_eq!(int, DefaultValue::Integer(4));
        let flag: DefaultValue = serde_json::from_str("false").unwrap();
        assert_eq!(flag, DefaultValue::Bool(false));
    }
}
