//! Core traits and vocabulary shared by the reader and the writers.
//!
//! A coder is driven through one fixed call contract: hand it an input
//! slice, an output slice and an [`Action`], and it reports how much it
//! consumed, how much it produced, and a [`Status`]. Every component in
//! this workspace speaks to the native library only through [`Engine`] and
//! [`Coder`].

use thiserror::Error;

/// Instruction given to a coder on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum Action {
    /// Keep accepting input.
    #[default]
    Run = 0,
    /// Emit all pending output, keep stream state.
    SyncFlush = 1,
    /// Emit all pending output and reset the encoder state.
    FullFlush = 2,
    /// No more input; drain remaining output and close the stream.
    Finish = 3,
}

/// Result code of a coder call.
///
/// `Ok` and `StreamEnd` are progress reports; every other value is a
/// failure class of the native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u32)]
pub enum Status {
    /// Operation completed successfully.
    #[error("Operation completed successfully")]
    Ok = 0,
    /// End of stream was reached.
    #[error("End of stream was reached")]
    StreamEnd = 1,
    /// Input stream has no integrity check.
    #[error("Input stream has no integrity check")]
    NoCheck = 2,
    /// Cannot calculate the integrity check.
    #[error("Cannot calculate the integrity check")]
    UnsupportedCheck = 3,
    /// Integrity check type is now available.
    #[error("Integrity check type is now available")]
    GetCheck = 4,
    /// Cannot allocate memory.
    #[error("Cannot allocate memory")]
    MemError = 5,
    /// Memory usage limit was reached.
    #[error("Memory usage limit was reached")]
    MemlimitError = 6,
    /// File format not recognized.
    #[error("File format not recognized")]
    FormatError = 7,
    /// Invalid or unsupported options.
    #[error("Invalid or unsupported options")]
    OptionsError = 8,
    /// Data is corrupt.
    #[error("Data is corrupt")]
    DataError = 9,
    /// No progress is possible.
    #[error("No progress is possible")]
    BufError = 10,
    /// Programming error.
    #[error("Programming error")]
    ProgError = 11,
}

impl Status {
    /// Look up a status by its numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Ok,
            1 => Self::StreamEnd,
            2 => Self::NoCheck,
            3 => Self::UnsupportedCheck,
            4 => Self::GetCheck,
            5 => Self::MemError,
            6 => Self::MemlimitError,
            7 => Self::FormatError,
            8 => Self::OptionsError,
            9 => Self::DataError,
            10 => Self::BufError,
            11 => Self::ProgError,
            _ => return None,
        })
    }

    /// Numeric code of this status.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// True for every status other than `Ok` and `StreamEnd`.
    pub fn is_error(self) -> bool {
        !matches!(self, Self::Ok | Self::StreamEnd)
    }
}

/// Outcome of a single [`Coder::code`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeStep {
    /// Bytes taken from the input slice.
    pub consumed: usize,
    /// Bytes written to the output slice.
    pub produced: usize,
    /// Status reported by the coder.
    pub status: Status,
}

impl CodeStep {
    /// A step that moved no data.
    pub fn stalled(status: Status) -> Self {
        Self {
            consumed: 0,
            produced: 0,
            status,
        }
    }
}

/// Compression preset: a level in `0..=9` plus the "extreme" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Preset(u32);

impl Preset {
    /// Flag bit that selects the slower "extreme" variant of a level.
    pub const EXTREME_FLAG: u32 = 0x8000_0000;

    /// Fastest useful compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a preset for the given level (clamped to 0-9).
    pub fn new(level: u32) -> Self {
        Self(level.min(9))
    }

    /// The same level with the extreme flag set.
    pub fn extreme(self) -> Self {
        Self(self.0 | Self::EXTREME_FLAG)
    }

    /// Get the level value.
    pub fn level(self) -> u32 {
        self.0 & !Self::EXTREME_FLAG
    }

    /// Whether the extreme flag is set.
    pub fn is_extreme(self) -> bool {
        self.0 & Self::EXTREME_FLAG != 0
    }

    /// Raw preset word as understood by liblzma.
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for Preset {
    fn from(level: u32) -> Self {
        Self::new(level)
    }
}

/// Integrity check embedded in each compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Check {
    /// No check.
    None = 0x00,
    /// CRC-32.
    Crc32 = 0x01,
    /// CRC-64.
    #[default]
    Crc64 = 0x04,
    /// SHA-256.
    Sha256 = 0x0A,
}

impl Check {
    /// Create from check ID.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::None),
            0x01 => Some(Self::Crc32),
            0x04 => Some(Self::Crc64),
            0x0A => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// One native encode/decode context.
///
/// A coder owns its native state and releases it when dropped, so every
/// handle is released exactly once on every exit path.
pub trait Coder: Send {
    /// Run one step of the coder.
    ///
    /// # Arguments
    ///
    /// * `input` - Bytes offered to the coder (may be empty)
    /// * `output` - Space the coder may fill
    /// * `action` - What the caller wants from this step
    fn code(&mut self, input: &[u8], output: &mut [u8], action: Action) -> CodeStep;
}

/// Factory for coders: the stream engine contract.
///
/// Implementations must be shareable across worker threads; each coder they
/// hand out is owned by exactly one caller.
pub trait Engine: Send + Sync {
    /// The coder handle type.
    type Coder: Coder;

    /// Create a decoder that detects the container format itself.
    fn decoder(&self) -> std::result::Result<Self::Coder, Status>;

    /// Create an encoder for the given preset and integrity check.
    fn encoder(&self, preset: Preset, check: Check) -> std::result::Result<Self::Coder, Status>;
}
