//! Byte order selection for container integers and parameter values.
//!
//! The preset container does not declare its own byte order, so the caller
//! picks one per invocation. Every multi-byte read in the workspace goes
//! through [`Endianness`] so a single flag switches the whole pipeline.

use serde::{Deserialize, Serialize};

/// Byte order used to interpret fixed-width integers and floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Least significant byte first. Presets written on x86 and ARM hosts.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Interpret 4 bytes as an unsigned 32-bit integer.
    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Interpret 8 bytes as an unsigned 64-bit integer.
    pub fn read_u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endianness::Little => u64::from_le_bytes(bytes),
            Endianness::Big => u64::from_be_bytes(bytes),
        }
    }

    /// Interpret 8 bytes as an IEEE-754 double.
    pub fn read_f64(self, bytes: [u8; 8]) -> f64 {
        f64::from_bits(self.read_u64(bytes))
    }

    /// Encode an unsigned 32-bit integer in this byte order.
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }

    /// Encode an unsigned 64-bit integer in this byte order.
    pub fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }

    /// Encode an IEEE-754 double in this byte order.
    pub fn f64_bytes(self, value: f64) -> [u8; 8] {
        self.u64_bytes(value.to_bits())
    }
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Little => write!(f, "little"),
            Endianness::Big => write!(f, "big"),
        }
    }
}
