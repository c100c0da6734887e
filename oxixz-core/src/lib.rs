//! # OxiXZ Core
//!
//! Core components for the OxiXZ streaming library.
//!
//! This crate provides the vocabulary shared by every reader and writer:
//!
//! - [`traits`]: Actions, status codes, presets, check kinds, and the
//!   [`Engine`]/[`Coder`] contract of the native stream engine
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Streams                                             │
//! │     Decompressor (Read), Compressor / CompressorMt      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Engine binding                                      │
//! │     liblzma coder handles behind Engine/Coder           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Vocabulary (this crate)                             │
//! │     Action, Status, Preset, Check, XzError              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxixz_core::{Preset, Status};
//!
//! let preset = Preset::new(3).extreme();
//! assert_eq!(preset.level(), 3);
//!
//! assert!(Status::DataError.is_error());
//! assert!(!Status::StreamEnd.is_error());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![forbid(unsafe_code)]

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{Result, XzError};
pub use traits::{Action, Check, CodeStep, Coder, Engine, Preset, Status};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, XzError};
    pub use crate::traits::{Action, Check, Coder, Engine, Preset, Status};
}
