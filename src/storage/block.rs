//! Fixed-size block format: layout computation and the binary codec

use crate::error::{Error, Result};
use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

/// Serialized header size: id (8) + index bounds (2 x 4) + time bounds (2 x 8)
pub const HEADER_SIZE: usize = 32;

/// Shape flag byte values
const FLAG_COMMON: u8 = 1;
const FLAG_REMAINDER: u8 = 0;

/// One fixed-dimension vector with its timestamp. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    components: Vec<f32>,
    timestamp: i64,
}

impl Vector {
    pub fn new(timestamp: i64, components: Vec<f32>) -> Self {
        Self {
            components,
            timestamp,
        }
    }

    pub fn components(&self) -> &[f32] {
        &self.components
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Index and time bounds of the vectors one block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub id: u64,
    pub index_begin: i32,
    pub index_end: i32,
    pub time_begin: i64,
    pub time_end: i64,
}

impl BlockHeader {
    pub fn new(id: u64, index_begin: i32, index_end: i32, time_begin: i64, time_end: i64) -> Self {
        Self {
            id,
            index_begin,
            index_end,
            time_begin,
            time_end,
        }
    }
}

/// The two capacity shapes coexisting in one storage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// `P` vectors of `L` components each
    Common,
    /// `P_S` vectors of `L_S` components each
    Remainder,
}

/// Block-shape parameters and the fixed on-disk block size derived from
/// `(N, P, L)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    /// Vectors per common block
    pub p: usize,
    /// Series length per common vector slot
    pub l: usize,
    /// Vectors per remainder block
    pub p_s: usize,
    /// Series length per remainder vector slot
    pub l_s: usize,
    /// Fixed size of every serialized block
    pub block_size: usize,
}

impl BlockLayout {
    /// Derive the layout from the total expected vector count `n` and the
    /// solver-provided shape `(p, l)`. The remainder shape absorbs the tail
    /// that does not fill a common block evenly.
    pub fn new(n: usize, p: usize, l: usize) -> Result<Self> {
        if p == 0 || l == 0 {
            return Err(Error::Config(format!(
                "degenerate block shape: P={}, L={}",
                p, l
            )));
        }
        let l_s = n % l;
        let p_s = if l_s != 0 { p * l / l_s } else { 0 };
        let payload = usize::max(
            p * l * std::mem::size_of::<f32>() + p * std::mem::size_of::<i64>(),
            p_s * l_s * std::mem::size_of::<f32>() + p_s * std::mem::size_of::<i64>(),
        );
        // Shape flag byte + header + capacity-padded payload.
        let block_size = 1 + HEADER_SIZE + payload;
        Ok(Self {
            p,
            l,
            p_s,
            l_s,
            block_size,
        })
    }

    /// Capacity (vector count) of the given shape.
    pub fn capacity(&self, shape: BlockShape) -> usize {
        match shape {
            BlockShape::Common => self.p,
            BlockShape::Remainder => self.p_s,
        }
    }

    /// Components per vector for the given shape.
    pub fn series_length(&self, shape: BlockShape) -> usize {
        match shape {
            BlockShape::Common => self.l,
            BlockShape::Remainder => self.l_s,
        }
    }

    /// Serialize `block` into `buf`: flag byte, header fields in fixed order,
    /// then each vector's components followed by its timestamp. The buffer is
    /// zero-padded to the full block size so block `id`'s byte offset is
    /// always `id * block_size`.
    pub fn encode_into(&self, block: &Block, buf: &mut BytesMut) {
        buf.clear();
        buf.reserve(self.block_size);
        buf.put_u8(match block.shape() {
            BlockShape::Common => FLAG_COMMON,
            BlockShape::Remainder => FLAG_REMAINDER,
        });
        let header = block.header();
        buf.put_u64(header.id);
        buf.put_i32(header.index_begin);
        buf.put_i32(header.index_end);
        buf.put_i64(header.time_begin);
        buf.put_i64(header.time_end);
        for vector in block.vectors() {
            for &component in vector.components() {
                buf.put_f32(component);
            }
            buf.put_i64(vector.timestamp());
        }
        buf.resize(self.block_size, 0);
        trace!(
            id = header.id,
            bytes = buf.len(),
            "block serialized"
        );
    }

    /// Deserialize one block from a `block_size`-byte record. The flag byte
    /// selects which capacity shape interprets the payload.
    pub fn decode(&self, mut buf: &[u8]) -> Result<Block> {
        if buf.len() < self.block_size {
            return Err(Error::Serialization(format!(
                "short block record: {} of {} bytes",
                buf.len(),
                self.block_size
            )));
        }
        let shape = match buf.get_u8() {
            FLAG_COMMON => BlockShape::Common,
            FLAG_REMAINDER => BlockShape::Remainder,
            other => {
                return Err(Error::Serialization(format!(
                    "invalid shape flag: {}",
                    other
                )))
            }
        };
        let header = BlockHeader {
            id: buf.get_u64(),
            index_begin: buf.get_i32(),
            index_end: buf.get_i32(),
            time_begin: buf.get_i64(),
            time_end: buf.get_i64(),
        };
        let count = self.capacity(shape);
        let length = self.series_length(shape);
        let mut block = Block::new(header, shape, self);
        for _ in 0..count {
            let mut components = Vec::with_capacity(length);
            for _ in 0..length {
                components.push(buf.get_f32());
            }
            let timestamp = buf.get_i64();
            block.try_add(Vector::new(timestamp, components))?;
        }
        Ok(block)
    }
}

/// A header plus a capacity-bounded ordered collection of vectors in one of
/// the two shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    header: BlockHeader,
    shape: BlockShape,
    capacity: usize,
    series_length: usize,
    vectors: Vec<Vector>,
}

impl Block {
    pub fn new(header: BlockHeader, shape: BlockShape, layout: &BlockLayout) -> Self {
        Self {
            header,
            shape,
            capacity: layout.capacity(shape),
            series_length: layout.series_length(shape),
            vectors: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn shape(&self) -> BlockShape {
        self.shape
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.vectors.len() == self.capacity
    }

    /// Append one vector. Fails when the block is at capacity or the vector
    /// does not match the block's declared series length.
    pub fn try_add(&mut self, vector: Vector) -> Result<()> {
        if self.is_full() {
            return Err(Error::Config(format!(
                "block {} is full ({} vectors)",
                self.header.id, self.capacity
            )));
        }
        if vector.len() != self.series_length {
            return Err(Error::Config(format!(
                "vector length {} does not match block series length {}",
                vector.len(),
                self.series_length
            )));
        }
        self.vectors.push(vector);
        Ok(())
    }
}
