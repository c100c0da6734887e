//! liblzma binding.
//!
//! [`LzmaEngine`] hands out [`LzmaCoder`]s backed by `xz2::stream::Stream`.
//! Native results are folded into the shared [`Status`] vocabulary so that
//! the reader and writers never see library-specific types.

use oxixz_core::traits::{Action, Check, CodeStep, Coder, Engine, Preset, Status};
use xz2::stream::{self, Stream};

/// The stream engine backed by the system liblzma.
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaEngine;

impl Engine for LzmaEngine {
    type Coder = LzmaCoder;

    fn decoder(&self) -> Result<LzmaCoder, Status> {
        // No memory ceiling; concatenated streams decode as one.
        Stream::new_auto_decoder(u64::MAX, stream::CONCATENATED)
            .map(LzmaCoder::new)
            .map_err(status_from_error)
    }

    fn encoder(&self, preset: Preset, check: Check) -> Result<LzmaCoder, Status> {
        Stream::new_easy_encoder(preset.bits(), native_check(check))
            .map(LzmaCoder::new)
            .map_err(status_from_error)
    }
}

/// A single liblzma stream handle.
///
/// The native context is released when the coder is dropped.
pub struct LzmaCoder {
    stream: Stream,
}

impl LzmaCoder {
    fn new(stream: Stream) -> Self {
        Self { stream }
    }
}

impl std::fmt::Debug for LzmaCoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaCoder")
            .field("total_in", &self.stream.total_in())
            .field("total_out", &self.stream.total_out())
            .finish()
    }
}

impl Coder for LzmaCoder {
    fn code(&mut self, input: &[u8], output: &mut [u8], action: Action) -> CodeStep {
        let before_in = self.stream.total_in();
        let before_out = self.stream.total_out();

        let status = match self.stream.process(input, output, native_action(action)) {
            Ok(status) => status_from_native(status),
            Err(e) => status_from_error(e),
        };

        CodeStep {
            consumed: (self.stream.total_in() - before_in) as usize,
            produced: (self.stream.total_out() - before_out) as usize,
            status,
        }
    }
}

fn native_action(action: Action) -> stream::Action {
    match action {
        Action::Run => stream::Action::Run,
        Action::SyncFlush => stream::Action::SyncFlush,
        Action::FullFlush => stream::Action::FullFlush,
        Action::Finish => stream::Action::Finish,
    }
}

fn native_check(check: Check) -> stream::Check {
    match check {
        Check::None => stream::Check::None,
        Check::Crc32 => stream::Check::Crc32,
        Check::Crc64 => stream::Check::Crc64,
        Check::Sha256 => stream::Check::Sha256,
    }
}

fn status_from_native(status: stream::Status) -> Status {
    match status {
        stream::Status::Ok => Status::Ok,
        stream::Status::StreamEnd => Status::StreamEnd,
        stream::Status::GetCheck => Status::GetCheck,
        // xz2 reports LZMA_BUF_ERROR as "memory needed".
        stream::Status::MemNeeded => Status::BufError,
    }
}

fn status_from_error(err: stream::Error) -> Status {
    match err {
        stream::Error::Data => Status::DataError,
        stream::Error::Options => Status::OptionsError,
        stream::Error::Format => Status::FormatError,
        stream::Error::MemLimit => Status::MemlimitError,
        stream::Error::Mem => Status::MemError,
        stream::Error::Program => Status::ProgError,
        stream::Error::NoCheck => Status::NoCheck,
        stream::Error::UnsupportedCheck => Status::UnsupportedCheck,
    }
}
