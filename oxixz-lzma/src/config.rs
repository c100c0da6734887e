//! Writer configuration.

use oxixz_core::error::{Result, XzError};
use oxixz_core::traits::{Check, Preset};

/// Default size of staging and scratch buffers (64 KB).
pub const DEFAULT_BUFSIZE: usize = 64 * 1024;

/// Default number of input bytes compressed together as one part (8 MB).
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// Options for the single-stream [`Compressor`](crate::Compressor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Compression preset.
    pub preset: Preset,
    /// Integrity check embedded in the stream.
    pub check: Check,
    /// Size of the output scratch buffer.
    pub buffer_size: usize,
}

impl WriterOptions {
    /// Options with the given preset and defaults elsewhere.
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            check: Check::default(),
            buffer_size: DEFAULT_BUFSIZE,
        }
    }

    /// Set the integrity check.
    pub fn with_check(mut self, check: Check) -> Self {
        self.check = check;
        self
    }

    /// Set the scratch buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(XzError::invalid_options("buffer size must be positive"));
        }
        Ok(())
    }
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new(Preset::DEFAULT)
    }
}

/// Options for the multi-threaded [`CompressorMt`](crate::CompressorMt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtOptions {
    /// Compression preset.
    pub preset: Preset,
    /// Integrity check embedded in every sub-stream.
    pub check: Check,
    /// Requested worker count; 0 uses the available parallelism.
    pub workers: usize,
    /// Size of each worker's output scratch buffer.
    pub scratch_size: usize,
    /// Maximum input bytes compressed and flushed as one part.
    pub part_size: usize,
}

impl MtOptions {
    /// Options with the given preset and defaults elsewhere.
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            check: Check::default(),
            workers: 0,
            scratch_size: DEFAULT_BUFSIZE,
            part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Set the integrity check.
    pub fn with_check(mut self, check: Check) -> Self {
        self.check = check;
        self
    }

    /// Request a worker count (0 = automatic).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-worker scratch buffer size.
    pub fn with_scratch_size(mut self, size: usize) -> Self {
        self.scratch_size = size;
        self
    }

    /// Set the part size.
    pub fn with_part_size(mut self, size: usize) -> Self {
        self.part_size = size;
        self
    }

    /// Resolve the worker count against the given available parallelism.
    ///
    /// An override is honored when it is positive and does not exceed what
    /// is available; the result is never below 1.
    pub fn resolve_workers(&self, available: usize) -> usize {
        let available = available.max(1);
        if self.workers > 0 && self.workers <= available {
            self.workers
        } else {
            available
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.scratch_size == 0 {
            return Err(XzError::invalid_options("scratch size must be positive"));
        }
        if self.part_size == 0 {
            return Err(XzError::invalid_options("part size must be positive"));
        }
        Ok(())
    }
}

impl Default for MtOptions {
    fn default() -> Self {
        Self::new(Preset::DEFAULT)
    }
}

/// Number of hardware threads available to this process.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
