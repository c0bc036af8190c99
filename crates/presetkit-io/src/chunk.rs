//! Chunk identifiers and directory entries.

use std::fmt;

/// Four-character chunk identifier (e.g. `Comp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// Component state: the raw, schema-decodable parameter bytes.
    pub const COMPONENT_STATE: ChunkId = ChunkId(*b"Comp");
    /// Controller (edit controller) state.
    pub const CONTROLLER_STATE: ChunkId = ChunkId(*b"Cont");
    /// UTF-8 XML metadata.
    pub const METADATA: ChunkId = ChunkId(*b"Info");
    /// Tag expected at the start of the chunk directory.
    pub const LIST: ChunkId = ChunkId(*b"List");

    /// Raw bytes of the identifier.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl From<[u8; 4]> for ChunkId {
    fn from(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }
}

impl TryFrom<&str> for ChunkId {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("chunk id must be exactly 4 bytes, got '{s}'"))?;
        if !bytes.is_ascii() {
            return Err(format!("chunk id must be ASCII, got '{s}'"));
        }
        Ok(ChunkId(bytes))
    }
}

/// One entry of the chunk directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Absolute byte offset from the start of the file.
    pub offset: u64,
    /// Size of the chunk in bytes.
    pub size: u64,
}

impl ChunkEntry {
    /// First byte past the chunk, or `None` if `offset + size` overflows.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}
