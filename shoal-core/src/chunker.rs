//! Content-defined chunking
//!
//! Splits a byte stream into variable-sized chunks at boundaries chosen by a
//! rolling hash over the content, so that a small edit shifts at most the
//! surrounding chunk boundaries instead of re-cutting the whole file.
//! Each chunk is content-addressed by the SHA-256 of its bytes.

use crate::crypto::ContentHash;
use crate::error::Result;
use crate::{BOUNDARY_MASK, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use bytes::Bytes;
use std::io::Read;

/// A single content-defined chunk
#[derive(Debug, Clone)]
pub struct Chunk {
    /// SHA-256 of the chunk bytes, lowercase hex
    pub hash: String,

    /// The chunk payload
    pub data: Bytes,

    /// Byte offset of this chunk in the original stream
    pub offset: u64,
}

impl Chunk {
    /// Size of the chunk in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Streaming content-defined chunker
///
/// Reads up to [`MAX_CHUNK_SIZE`] bytes at a time and scans for a boundary
/// from [`MIN_CHUNK_SIZE`] onward. Bytes read past the chosen boundary are
/// carried over into the next chunk, so the stream behaves as if exactly one
/// chunk had been consumed per call.
pub struct ChunkScanner<R> {
    reader: R,
    buffer: Vec<u8>,
    carry: Vec<u8>,
    offset: u64,
}

impl<R: Read> ChunkScanner<R> {
    /// Create a new scanner over a byte stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![0u8; MAX_CHUNK_SIZE],
            carry: Vec::new(),
            offset: 0,
        }
    }

    /// Read the next content-defined chunk, or `None` at end of stream
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let n = self.fill()?;
        if n == 0 {
            return Ok(None);
        }

        let cut = find_boundary(&self.buffer[..n]);

        let data = Bytes::copy_from_slice(&self.buffer[..cut]);
        let hash = ContentHash::compute(&data).to_hex();

        // Leftover bytes belong to the next chunk
        self.carry.clear();
        self.carry.extend_from_slice(&self.buffer[cut..n]);

        let chunk = Chunk {
            hash,
            data,
            offset: self.offset,
        };
        self.offset += cut as u64;

        Ok(Some(chunk))
    }

    /// Fill the scan buffer from carried-over bytes, then the reader.
    /// Returns the number of valid bytes (short at end of stream).
    fn fill(&mut self) -> Result<usize> {
        let mut filled = self.carry.len();
        self.buffer[..filled].copy_from_slice(&self.carry);
        self.carry.clear();

        while filled < self.buffer.len() {
            let n = self.reader.read(&mut self.buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }
}

impl<R: Read> Iterator for ChunkScanner<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Find the cut position for a filled scan buffer
///
/// Scans from `MIN_CHUNK_SIZE`, folding each byte into a rolling hash
/// `h = (h << 1) + byte`; a cut happens where the low bits of `h` are all
/// zero under [`BOUNDARY_MASK`], which yields ~4 MiB chunks on average.
/// A buffer shorter than the minimum is the tail of the stream and is
/// emitted whole.
fn find_boundary(data: &[u8]) -> usize {
    if data.len() < MIN_CHUNK_SIZE {
        return data.len();
    }

    let mut hash: u64 = 0;
    for (i, &byte) in data.iter().enumerate().skip(MIN_CHUNK_SIZE) {
        hash = (hash << 1).wrapping_add(byte as u64);
        if hash & BOUNDARY_MASK == 0 {
            return i;
        }
    }

    data.len()
}

/// Chunk an entire stream, collecting all chunks in order
pub fn chunk_all<R: Read>(reader: R) -> Result<Vec<Chunk>> {
    let mut scanner = ChunkScanner::new(reader);
    let mut chunks = Vec::new();

    while let Some(chunk) = scanner.next_chunk()? {
        chunks.push(chunk);
    }

    Ok(chunks)
}
