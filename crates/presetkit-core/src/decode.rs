//! Positional decoding of component-state bytes.
//!
//! The decoder walks a [`ParameterSchema`] in id order with a single byte
//! cursor. Each descriptor consumes exactly [`WireType::width`] bytes; nothing
//! is ever re-read and no field depends on another field's value, so decoding
//! is one linear pass over the schema.
//!
//! When the chunk runs out before the schema does, the remaining descriptors
//! fail with [`DecodeError::TruncatedParameterData`] unless they are flagged
//! [`ParameterDescriptor::default_tolerant`]. Tolerant descriptors take their
//! declared default and leave the cursor where it is.

use serde::{Deserialize, Serialize};

use crate::endian::Endianness;
use crate::schema::{DefaultValue, ParameterDescriptor, ParameterSchema, WireType};

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Value of a `UInt32` parameter.
    UInt(u32),
    /// Value of a `Float64` parameter.
    Float(f64),
    /// Unevaluated default expression substituted for a missing parameter.
    Expression(String),
}

impl ParameterValue {
    /// Convert a declared default into a value of the given wire type.
    ///
    /// Literals are coerced to the wire type where lossless; expressions are
    /// passed through as text.
    pub fn from_default(default: &DefaultValue, wire_type: WireType) -> Self {
        match (default, wire_type) {
            (DefaultValue::Bool(b), WireType::UInt32) => ParameterValue::UInt(u32::from(*b)),
            (DefaultValue::Bool(b), WireType::Float64) => {
                ParameterValue::Float(if *b { 1.0 } else { 0.0 })
            }
            (DefaultValue::Integer(v), WireType::UInt32) => match u32::try_from(*v) {
                Ok(v) => ParameterValue::UInt(v),
                Err(_) => ParameterValue::Float(*v as f64),
            },
            (DefaultValue::Integer(v), WireType::Float64) => ParameterValue::Float(*v as f64),
            (DefaultValue::Float(v), _) => ParameterValue::Float(*v),
            (DefaultValue::Expression(e), _) => ParameterValue::Expression(e.clone()),
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::UInt(v) => Some(f64::from(*v)),
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Expression(_) => None,
        }
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::UInt(v) => write!(f, "{v}"),
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Expression(e) => f.write_str(e),
        }
    }
}

/// One decoded record, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedParameter {
    /// Parameter name from the schema.
    pub name: String,
    /// Wire type the value was read as.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Decoded value.
    pub value: ParameterValue,
    /// The value is the declared default because the preset was truncated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub defaulted: bool,
}

/// Result of decoding one component-state chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    /// Decoded records in schema order.
    pub parameters: Vec<DecodedParameter>,
    /// Bytes consumed by the cursor.
    pub consumed: usize,
    /// Total length of the chunk.
    pub chunk_len: usize,
}

impl DecodedState {
    /// Bytes left in the chunk after the last descriptor.
    pub fn trailing(&self) -> usize {
        self.chunk_len.saturating_sub(self.consumed)
    }

    /// Number of records that fell back to their default.
    pub fn defaulted_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.defaulted).count()
    }
}

/// Errors from decoding a component-state chunk.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The chunk ended before a non-tolerant parameter could be read.
    #[error(
        "truncated parameter data for '{plugin}': parameter {id} '{name}' needs {needed} bytes at offset {offset}, chunk has {available}"
    )]
    TruncatedParameterData {
        /// Plugin the schema belongs to.
        plugin: String,
        /// Descriptor id.
        id: u32,
        /// Descriptor name.
        name: String,
        /// Cursor position when the read was attempted.
        offset: usize,
        /// Width of the value.
        needed: usize,
        /// Total chunk length.
        available: usize,
    },
}

/// Decodes component-state bytes against a [`ParameterSchema`].
///
/// # Example
///
/// ```rust
/// use presetkit_core::{Endianness, ParameterDescriptor, ParameterSchema, PresetDecoder, WireType};
///
/// let schema = ParameterSchema::new("Demo", vec![
///     ParameterDescriptor::new(0, "gain", WireType::Float64),
///     ParameterDescriptor::new(1, "mute", WireType::UInt32),
/// ]).unwrap();
///
/// let mut chunk = 0.5f64.to_le_bytes().to_vec();
/// chunk.extend_from_slice(&1u32.to_le_bytes());
///
/// let state = PresetDecoder::new(Endianness::Little).decode(&schema, &chunk).unwrap();
/// assert_eq!(state.parameters.len(), 2);
/// assert_eq!(state.consumed, chunk.len());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetDecoder {
    endianness: Endianness,
}

impl PresetDecoder {
    /// Create a decoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        Self { endianness }
    }

    /// Byte order used for values.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Decode `chunk` positionally according to `schema`.
    pub fn decode(
        &self,
        schema: &ParameterSchema,
        chunk: &[u8],
    ) -> Result<DecodedState, DecodeError> {
        let mut cursor = 0usize;
        let mut parameters = Vec::with_capacity(schema.len());

        for descriptor in schema {
            let width = descriptor.width();
            match self.read_value(descriptor.wire_type, chunk, cursor) {
                Some(value) => {
                    parameters.push(DecodedParameter {
                        name: descriptor.name.clone(),
                        wire_type: descriptor.wire_type,
                        value,
                        defaulted: false,
                    });
                    cursor += width;
                }
                None if descriptor.default_tolerant => {
                    tracing::warn!(
                        plugin = schema.plugin(),
                        id = descriptor.id,
                        name = %descriptor.name,
                        "component state truncated, using declared default"
                    );
                    parameters.push(substitute_default(descriptor));
                }
                None => {
                    return Err(DecodeError::TruncatedParameterData {
                        plugin: schema.plugin().to_string(),
                        id: descriptor.id,
                        name: descriptor.name.clone(),
                        offset: cursor,
                        needed: width,
                        available: chunk.len(),
                    });
                }
            }
        }

        tracing::debug!(
            plugin = schema.plugin(),
            parameters = parameters.len(),
            consumed = cursor,
            chunk_len = chunk.len(),
            "decoded component state"
        );

        Ok(DecodedState {
            parameters,
            consumed: cursor,
            chunk_len: chunk.len(),
        })
    }

    fn read_value(&self, wire_type: WireType, chunk: &[u8], cursor: usize) -> Option<ParameterValue> {
        match wire_type {
            WireType::UInt32 => take::<4>(chunk, cursor)
                .map(|bytes| ParameterValue::UInt(self.endianness.read_u32(bytes))),
            WireType::Float64 => take::<8>(chunk, cursor)
                .map(|bytes| ParameterValue::Float(self.endianness.read_f64(bytes))),
        }
    }
}

fn take<const N: usize>(chunk: &[u8], cursor: usize) -> Option<[u8; N]> {
    chunk.get(cursor..)?.get(..N)?.try_into().ok()
}

fn substitute_default(descriptor: &ParameterDescriptor) -> DecodedParameter {
    DecodedParameter {
        name: descriptor.name.clone(),
        wire_type: descriptor.wire_type,
        value: ParameterValue::from_default(&descriptor.default, descriptor.wire_type),
        defaulted: true,
    }
}
