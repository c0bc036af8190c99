//! VST3 preset container I/O for presetkit.
//!
//! This crate provides:
//!
//! - **Container parsing**: [`PresetReader`] validates the fixed header and the
//!   whole chunk directory up front
//! - **Chunk access**: [`PresetReader::chunk`] and the `Comp` / `Cont` / `Info`
//!   helpers read validated byte ranges
//! - **File helper**: [`open_preset`] opens a buffered `.vstpreset` file
//!
//! Byte order is chosen by the caller through
//! [`Endianness`](presetkit_core::Endianness); the format does not declare it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use presetkit_core::{Endianness, PresetDecoder};
//! use presetkit_io::open_preset;
//!
//! let mut preset = open_preset("Init.vstpreset", Endianness::Little)?;
//! let state = preset.component_state()?;
//! let decoded = PresetDecoder::new(Endianness::Little).decode(&schema, &state)?;
//! ```

mod chunk;
mod reader;

pub use chunk::{ChunkEntry, ChunkId};
pub use reader::{
    DIRECTORY_ENTRY_SIZE, HEADER_MAGIC, HEADER_SIZE, PresetContainer, PresetReader, open_preset,
};

/// Error types for preset container operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file does not start with `VST3`.
    #[error("bad magic {}: not a VST3 preset", ChunkId(*found))]
    BadMagic {
        /// The first four bytes of the file.
        found: [u8; 4],
    },

    /// The file ends before a required field.
    #[error("truncated file: {what} needs {needed} bytes, file has {len}")]
    TruncatedFile {
        /// Field being read.
        what: &'static str,
        /// File length required to read it.
        needed: u64,
        /// Actual file length.
        len: u64,
    },

    /// A chunk directory entry is out of bounds or duplicated.
    #[error("invalid chunk directory entry '{id}': {reason}")]
    InvalidChunkDirectory {
        /// Offending chunk id.
        id: ChunkId,
        /// Description of the problem.
        reason: String,
    },

    /// The requested chunk is not listed in the directory.
    #[error("chunk '{0}' not found")]
    ChunkNotFound(ChunkId),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;
