//! VST3 preset container parsing.
//!
//! ```text
//! offset 0    "VST3"                 4 bytes
//!        4    format version         u32
//!        8    class id               32 bytes (ASCII hex FUID)
//!        40   chunk list offset      u64
//!        ...  chunk data
//! list:       "List"                 4 bytes
//!             entry count            u32
//!             { id[4] offset:u64 size:u64 } * count
//! ```
//!
//! Offsets are absolute from the start of the file. The whole directory is
//! validated against the file length before any chunk is handed out, so
//! [`PresetReader::chunk`] never reads outside the file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use presetkit_core::Endianness;

use crate::chunk::{ChunkEntry, ChunkId};
use crate::{Error, Result};

/// Magic tag at the start of every preset file.
pub const HEADER_MAGIC: [u8; 4] = *b"VST3";

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: u64 = 48;

/// Size of one chunk directory entry in bytes.
pub const DIRECTORY_ENTRY_SIZE: u64 = 20;

/// Parsed header and chunk directory of one preset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetContainer {
    /// Container format version.
    pub format_version: u32,
    /// Processor class identifier, opaque.
    pub class_id: [u8; 32],
    /// Absolute offset of the chunk directory.
    pub chunk_list_offset: u64,
    /// Tag at the start of the directory (normally `List`).
    pub list_tag: ChunkId,
    /// Directory entries in file order.
    pub chunks: Vec<ChunkEntry>,
    /// Total file length in bytes.
    pub file_len: u64,
}

impl PresetContainer {
    /// Class id as text, if it is printable ASCII.
    pub fn class_id_str(&self) -> Option<&str> {
        if self.class_id.iter().all(|b| b.is_ascii_graphic()) {
            std::str::from_utf8(&self.class_id).ok()
        } else {
            None
        }
    }

    /// Directory entry for `id`.
    pub fn entry(&self, id: ChunkId) -> Option<&ChunkEntry> {
        self.chunks.iter().find(|entry| entry.id == id)
    }

    /// True when the directory lists `id`.
    pub fn has_chunk(&self, id: ChunkId) -> bool {
        self.entry(id).is_some()
    }
}

/// Reader over a validated preset container.
///
/// # Example
///
/// ```rust,no_run
/// use presetkit_core::Endianness;
/// use presetkit_io::open_preset;
///
/// let mut preset = open_preset("Init.vstpreset", Endianness::Little)?;
/// println!("class id: {:?}", preset.container().class_id_str());
/// let state = preset.component_state()?;
/// println!("{} bytes of component state", state.len());
/// # Ok::<(), presetkit_io::Error>(())
/// ```
#[derive(Debug)]
pub struct PresetReader<R> {
    inner: R,
    container: PresetContainer,
}

impl<R: Read + Seek> PresetReader<R> {
    /// Parse the header and chunk directory from `inner`.
    pub fn new(mut inner: R, endianness: Endianness) -> Result<Self> {
        let file_len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        // A file shorter than the magic is not a preset either.
        let mut head = Vec::with_capacity(HEADER_MAGIC.len());
        (&mut inner).take(HEADER_MAGIC.len() as u64).read_to_end(&mut head)?;
        let mut magic = [0u8; 4];
        magic[..head.len()].copy_from_slice(&head);
        if head.len() < HEADER_MAGIC.len() || magic != HEADER_MAGIC {
            return Err(Error::BadMagic { found: magic });
        }

        let format_version = endianness.read_u32(read_array(&mut inner, "format version", 4, file_len)?);
        let class_id: [u8; 32] = read_array(&mut inner, "class id", 8, file_len)?;
        let chunk_list_offset =
            endianness.read_u64(read_array(&mut inner, "chunk list offset", 40, file_len)?);

        tracing::debug!(format_version, chunk_list_offset, file_len, "read preset header");

        if chunk_list_offset > file_len {
            return Err(Error::TruncatedFile {
                what: "chunk list offset",
                needed: chunk_list_offset,
                len: file_len,
            });
        }
        inner.seek(SeekFrom::Start(chunk_list_offset))?;

        let list_tag = ChunkId(read_array(&mut inner, "chunk list tag", chunk_list_offset, file_len)?);
        if list_tag != ChunkId::LIST {
            tracing::warn!(tag = %list_tag, "unexpected chunk list tag");
        }
        let count = endianness.read_u32(read_array(
            &mut inner,
            "chunk count",
            chunk_list_offset + 4,
            file_len,
        )?);

        let entries_start = chunk_list_offset + 8;
        let entries_end = entries_start + u64::from(count) * DIRECTORY_ENTRY_SIZE;
        if entries_end > file_len {
            return Err(Error::TruncatedFile {
                what: "chunk directory",
                needed: entries_end,
                len: file_len,
            });
        }

        let mut chunks = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        for index in 0..u64::from(count) {
            let at = entries_start + index * DIRECTORY_ENTRY_SIZE;
            let id = ChunkId(read_array(&mut inner, "chunk id", at, file_len)?);
            let offset = endianness.read_u64(read_array(&mut inner, "chunk offset", at + 4, file_len)?);
            let size = endianness.read_u64(read_array(&mut inner, "chunk size", at + 12, file_len)?);
            let entry = ChunkEntry { id, offset, size };

            match entry.end() {
                Some(end) if end <= file_len => {}
                _ => {
                    return Err(Error::InvalidChunkDirectory {
                        id,
                        reason: format!(
                            "offset {offset} + size {size} exceeds file length {file_len}"
                        ),
                    });
                }
            }
            if !seen.insert(id) {
                return Err(Error::InvalidChunkDirectory {
                    id,
                    reason: "duplicate chunk id".to_string(),
                });
            }

            tracing::trace!(id = %id, offset, size, "chunk directory entry");
            chunks.push(entry);
        }

        Ok(Self {
            inner,
            container: PresetContainer {
                format_version,
                class_id,
                chunk_list_offset,
                list_tag,
                chunks,
                file_len,
            },
        })
    }

    /// Parsed header and directory.
    pub fn container(&self) -> &PresetContainer {
        &self.container
    }

    /// Read the bytes of chunk `id`.
    pub fn chunk(&mut self, id: ChunkId) -> Result<Vec<u8>> {
        let entry = *self.container.entry(id).ok_or(Error::ChunkNotFound(id))?;
        self.inner.seek(SeekFrom::Start(entry.offset))?;
        let mut bytes = vec![0u8; entry.size as usize];
        self.inner.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Read the component-state (`Comp`) chunk.
    pub fn component_state(&mut self) -> Result<Vec<u8>> {
        self.chunk(ChunkId::COMPONENT_STATE)
    }

    /// Read the controller-state (`Cont`) chunk.
    pub fn controller_state(&mut self) -> Result<Vec<u8>> {
        self.chunk(ChunkId::CONTROLLER_STATE)
    }

    /// Read the metadata (`Info`) chunk as text.
    pub fn info_text(&mut self) -> Result<String> {
        let bytes = self.chunk(ChunkId::METADATA)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Open and validate a preset file.
pub fn open_preset(
    path: impl AsRef<Path>,
    endianness: Endianness,
) -> Result<PresetReader<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    PresetReader::new(BufReader::new(file), endianness)
}

fn read_array<const N: usize, R: Read>(
    reader: &mut R,
    what: &'static str,
    at: u64,
    len: u64,
) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::TruncatedFile {
                what,
                needed: at + N as u64,
                len,
            }
        } else {
            Error::Io(e)
        }
    })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Builder {
        endian: Endianness,
        chunks: Vec<([u8; 4], Vec<u8>)>,
    }

    impl Builder {
        fn new(endian: Endianness) -> Self {
            Self {
                endian,
                chunks: Vec::new(),
            }
        }

        fn chunk(mut self, id: &[u8; 4], data: &[u8]) -> Self {
            self.chunks.push((*id, data.to_vec()));
            self
        }

        fn build(self) -> Vec<u8> {
            let e = self.endian;
            let mut out = Vec::new();
            out.extend_from_slice(b"VST3");
            out.extend_from_slice(&e.u32_bytes(1));
            out.extend_from_slice(b"0123456789ABCDEF0123456789ABCDEF");
            out.extend_from_slice(&[0u8; 8]);

            let mut entries = Vec::new();
            for (id, data) in &self.chunks {
                entries.push((*id, out.len() as u64, data.len() as u64));
                out.extend_from_slice(data);
            }

            let list_offset = out.len() as u64;
            out[40..48].copy_from_slice(&e.u64_bytes(list_offset));
            out.extend_from_slice(b"List");
            out.extend_from_slice(&e.u32_bytes(entries.len() as u32));
            for (id, offset, size) in entries {
                out.extend_from_slice(&id);
                out.extend_from_slice(&e.u64_bytes(offset));
                out.extend_from_slice(&e.u64_bytes(size));
            }
            out
        }
    }

    #[test]
    fn parses_header_and_chunks() {
        let bytes = Builder::new(Endianness::Little)
            .chunk(b"Comp", &[1, 2, 3, 4])
            .chunk(b"Info", b"<xml/>")
            .build();

        let mut reader = PresetReader::new(Cursor::new(bytes), Endianness::Little).unwrap();
        let container = reader.container().clone();
        assert_eq!(container.format_version, 1);
        assert_eq!(container.chunk_list_offset, 58);
        assert_eq!(container.list_tag, ChunkId::LIST);
        assert_eq!(
            container.class_id_str(),
            Some("0123456789ABCDEF0123456789ABCDEF")
        );
        assert_eq!(container.chunks.len(), 2);
        assert_eq!(container.chunks[0].offset, HEADER_SIZE);

        assert_eq!(reader.component_state().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(reader.info_text().unwrap(), "<xml/>");
    }

    #[test]
    fn big_endian_container() {
        let bytes = Builder::new(Endianness::Big).chunk(b"Comp", &[9; 12]).build();
        let mut reader = PresetReader::new(Cursor::new(bytes), Endianness::Big).unwrap();
        assert_eq!(reader.container().format_version, 1);
        assert_eq!(reader.component_state().unwrap(), vec![9; 12]);
    }

    #[test]
    fn missing_chunk() {
        let bytes = Builder::new(Endianness::Little).chunk(b"Comp", &[0; 4]).build();
        let mut reader = PresetReader::new(Cursor::new(bytes), Endianness::Little).unwrap();
        let err = reader.controller_state().unwrap_err();
        assert!(matches!(err, Error::ChunkNotFound(id) if id == ChunkId::CONTROLLER_STATE));
    }

    #[test]
    fn non_ascii_class_id_has_no_str() {
        let mut bytes = Builder::new(Endianness::Little).build();
        bytes[8] = 0;
        let reader = PresetReader::new(Cursor::new(bytes), Endianness::Little).unwrap();
        assert_eq!(reader.container().class_id_str(), None);
    }

    #[test]
    fn header_shorter_than_48_bytes() {
        let bytes = b"VST3\x01\x00\x00\x00ABCDEF".to_vec();
        let err = PresetReader::new(Cursor::new(bytes), Endianness::Little).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedFile { what: "class id", needed: 40, len: 14 }
        ));
    }

    #[test]
    fn files_shorter_than_magic_are_bad_magic() {
        let err = PresetReader::new(Cursor::new(Vec::new()), Endianness::Little).unwrap_err();
        assert!(matches!(err, Error::BadMagic { found: [0, 0, 0, 0] }));

        let err = PresetReader::new(Cursor::new(b"PK".to_vec()), Endianness::Little).unwrap_err();
        assert!(matches!(err, Error::BadMagic { found: [b'P', b'K', 0, 0] }));

        let err = PresetReader::new(Cursor::new(b"VST".to_vec()), Endianness::Little).unwrap_err();
        assert!(matches!(err, Error::BadMagic { .. }));
    }
}
