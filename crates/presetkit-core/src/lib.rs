//! presetkit core - parameter schema model and preset decoder.
//!
//! This crate holds the pieces of the pipeline that do no I/O:
//!
//! - [`ParameterSchema`] / [`ParameterDescriptor`] - the ordered list of
//!   parameters a plugin writes into its component state
//! - [`WireType`] - fixed-width encoding of a single value
//! - [`PresetDecoder`] - positional decoder that turns component-state bytes
//!   into [`DecodedParameter`] records
//! - [`Endianness`] - byte order, fixed per invocation
//!
//! Schemas are produced by `presetkit-extract`, component-state bytes by
//! `presetkit-io`.
//!
//! # Example
//!
//! ```rust
//! use presetkit_core::{
//!     DefaultValue, Endianness, ParameterDescriptor, ParameterSchema, ParameterValue,
//!     PresetDecoder, WireType,
//! };
//!
//! let schema = ParameterSchema::new("Demo", vec![
//!     ParameterDescriptor::new(0, "bypass", WireType::UInt32)
//!         .with_default(DefaultValue::Bool(false)),
//!     ParameterDescriptor::new(1, "gain", WireType::Float64)
//!         .with_default(DefaultValue::Float(0.5)),
//! ]).unwrap();
//!
//! let mut chunk = 0u32.to_le_bytes().to_vec();
//! chunk.extend_from_slice(&0.75f64.to_le_bytes());
//!
//! let state = PresetDecoder::new(Endianness::Little).decode(&schema, &chunk).unwrap();
//! assert_eq!(state.parameters[1].value, ParameterValue::Float(0.75));
//! ```

mod decode;
mod endian;
mod schema;

pub use decode::{DecodeError, DecodedParameter, DecodedState, ParameterValue, PresetDecoder};
pub use endian::Endianness;
pub use schema::{DefaultValue, ParameterDescriptor, ParameterSchema, SchemaError, WireType};
