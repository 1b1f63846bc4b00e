//! Error types for decoding and exporting.

use crate::types::Encode;
use thiserror::Error;

/// Everything that can go wrong while decoding a PMX buffer.
///
/// Every variant is terminal: a buffer that produced one of these never yields a [`Model`](crate::Model).
/// `position` fields are byte offsets into the input buffer where the offending read started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("read of {requested} bytes at 0x{position:X} exceeds buffer ({available} bytes left)")]
    OutOfBounds {
        position: usize,
        requested: usize,
        available: usize,
    },
    #[error("invalid signature {found:02X?}, expected \"PMX \"")]
    InvalidSignature { found: [u8; 4] },
    #[error("header declares {length} config bytes, at least 8 are required")]
    InvalidHeaderLength { length: u8 },
    #[error("unsupported text encoding {value} at 0x{position:X}")]
    UnsupportedEncoding { position: usize, value: u8 },
    #[error("unsupported {field} width {value} at 0x{position:X}, expected 1, 2 or 4")]
    UnsupportedIndexWidth {
        field: &'static str,
        position: usize,
        value: u8,
    },
    #[error("unknown vertex weight type {value} at 0x{position:X}")]
    InvalidWeightType { position: usize, value: u8 },
    #[error("malformed {encoding:?} text at 0x{position:X}")]
    InvalidEncoding { position: usize, encoding: Encode },
    #[error("unknown {field} value {value} at 0x{position:X}")]
    InvalidDiscriminator {
        field: &'static str,
        position: usize,
        value: u8,
    },
    #[error("face index count {index_count} is not a multiple of 3")]
    IncompleteTriangle { index_count: usize },
    #[error("face index #{face} refers to vertex {index} but only {vertex_count} vertices exist")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("material #{material} has surface count {count}, expected a non-negative multiple of 3")]
    InvalidSurfaceCount { material: usize, count: i32 },
    #[error("materials cover {surface_total} face indices but {index_count} were decoded")]
    SurfaceCountMismatch {
        surface_total: i64,
        index_count: usize,
    },
}

/// Errors raised while writing OBJ/MTL text.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("material {material:?} refers to texture {index} but only {texture_count} textures exist")]
    TextureOutOfRange {
        material: String,
        index: i32,
        texture_count: usize,
    },
}
