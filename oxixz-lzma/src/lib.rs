//! # OxiXZ LZMA
//!
//! Streaming XZ/LZMA compression and decompression over liblzma.
//!
//! All entropy coding is done by the native library; this crate provides
//! the buffering and orchestration around it:
//!
//! - [`Decompressor`]: a [`Read`](std::io::Read) adapter that decodes one or
//!   more concatenated XZ (or legacy `.lzma`) streams from any source
//! - [`Compressor`]: a [`Write`](std::io::Write) adapter producing a single
//!   XZ stream
//! - [`CompressorMt`]: a [`Write`](std::io::Write) adapter that compresses
//!   on all cores, emitting one independent XZ stream per worker and part
//!
//! ## Usage
//!
//! ```rust
//! use oxixz_lzma::{CompressorMt, Decompressor, Preset};
//! use std::io::{Read, Write};
//!
//! let data = b"Hello, World! ".repeat(1000);
//!
//! let mut enc = CompressorMt::new(Vec::new(), Preset::FAST).unwrap();
//! enc.write_all(&data).unwrap();
//! let compressed = enc.into_inner();
//!
//! let mut dec = Decompressor::new(&compressed[..]).unwrap();
//! let mut out = Vec::new();
//! dec.read_to_end(&mut out).unwrap();
//! assert_eq!(out, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod reader;
pub mod writer;
pub mod writer_mt;

// Re-exports
pub use config::{DEFAULT_BUFSIZE, DEFAULT_PART_SIZE, MtOptions, WriterOptions};
pub use engine::{LzmaCoder, LzmaEngine};
pub use oxixz_core::{Action, Check, CodeStep, Coder, Engine, Preset, Status, XzError};
pub use reader::Decompressor;
pub use writer::Compressor;
pub use writer_mt::CompressorMt;

use oxixz_core::error::Result;
use std::io::{Read, Write};

/// Compress data to a single XZ stream.
pub fn compress(data: &[u8], preset: Preset) -> Result<Vec<u8>> {
    let mut enc = Compressor::new(Vec::new(), preset)?;
    enc.compress(data)?;
    enc.into_inner()
}

/// Compress data on all cores.
///
/// The result is a sequence of concatenated XZ streams. Empty input yields
/// empty output.
pub fn compress_mt(data: &[u8], preset: Preset) -> Result<Vec<u8>> {
    let mut enc = CompressorMt::new(Vec::new(), preset)?;
    enc.write_all(data)?;
    Ok(enc.into_inner())
}

/// Decompress XZ data to a Vec.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut dec = Decompressor::new(data)?;
    let mut out = Vec::new();
    dec.read_to_end(&mut out)?;
    Ok(out)
}
