//! Single-stream XZ compression.

use crate::config::WriterOptions;
use crate::engine::{LzmaCoder, LzmaEngine};
use oxixz_core::error::{Result, XzError};
use oxixz_core::traits::{Action, Coder, Engine, Preset, Status};
use std::io::{self, Write};

/// Streaming XZ encoder writing one compressed stream to a sink.
///
/// The stream is terminated by [`finish`](Self::finish) or
/// [`close`](Self::close). Dropping an unfinished compressor finishes it on a
/// best-effort basis, ignoring errors.
pub struct Compressor<W: Write, C: Coder = LzmaCoder> {
    sink: Option<W>,
    coder: Option<C>,
    scratch: Vec<u8>,
    finished: bool,
    total_in: u64,
}

impl<W: Write> Compressor<W> {
    /// Create a compressor with the given preset.
    pub fn new(sink: W, preset: Preset) -> Result<Self> {
        Self::with_options(sink, WriterOptions::new(preset))
    }

    /// Create a compressor with explicit options.
    pub fn with_options(sink: W, options: WriterOptions) -> Result<Self> {
        Self::with_engine(sink, options, &LzmaEngine)
    }
}

impl<W: Write, C: Coder> Compressor<W, C> {
    /// Create a compressor whose coder comes from `engine`.
    pub fn with_engine<E>(sink: W, options: WriterOptions, engine: &E) -> Result<Self>
    where
        E: Engine<Coder = C>,
    {
        options.validate()?;
        let coder = engine
            .encoder(options.preset, options.check)
            .map_err(XzError::init)?;

        Ok(Self {
            sink: Some(sink),
            coder: Some(coder),
            scratch: vec![0u8; options.buffer_size],
            finished: false,
            total_in: 0,
        })
    }

    /// Uncompressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Get a reference to the underlying sink.
    pub fn get_ref(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    /// Get a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> Option<&mut W> {
        self.sink.as_mut()
    }

    /// Compress `input`, writing produced output to the sink.
    pub fn compress(&mut self, input: &[u8]) -> Result<usize> {
        if self.finished {
            return Err(XzError::Closed);
        }
        let (Some(coder), Some(sink)) = (self.coder.as_mut(), self.sink.as_mut()) else {
            return Err(XzError::Closed);
        };

        let consumed = encode_input(coder, input, &mut self.scratch, |out| {
            sink.write_all(out)?;
            Ok(())
        })?;

        self.total_in += consumed as u64;
        Ok(consumed)
    }

    /// Terminate the compressed stream. Later calls are no-ops.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let (Some(coder), Some(sink)) = (self.coder.as_mut(), self.sink.as_mut()) else {
            return Err(XzError::Closed);
        };

        encode_finish(coder, &mut self.scratch, |out| {
            sink.write_all(out)?;
            Ok(())
        })?;

        self.finished = true;
        sink.flush()?;
        Ok(())
    }

    /// Finish the stream and release the coder. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if self.coder.is_none() {
            return Ok(());
        }
        let result = self.finish();
        self.coder = None;
        self.scratch = Vec::new();
        result
    }

    /// Finish the stream and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        self.sink.take().ok_or(XzError::Closed)
    }
}

/// Feed all of `input` to `coder` with [`Action::Run`].
///
/// Every scratch-buffer worth of output is handed to `emit`. Returns the
/// number of input bytes the coder accepted.
pub(crate) fn encode_input<C, F>(
    coder: &mut C,
    input: &[u8],
    scratch: &mut [u8],
    mut emit: F,
) -> Result<usize>
where
    C: Coder + ?Sized,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut consumed = 0;
    while consumed < input.len() {
        let step = coder.code(&input[consumed..], scratch, Action::Run);
        if step.status != Status::Ok {
            return Err(XzError::codec(step.status));
        }
        emit(&scratch[..step.produced])?;
        consumed += step.consumed;
    }
    Ok(consumed)
}

/// Drive `coder` with [`Action::Finish`] until it reports stream end.
pub(crate) fn encode_finish<C, F>(coder: &mut C, scratch: &mut [u8], mut emit: F) -> Result<()>
where
    C: Coder + ?Sized,
    F: FnMut(&[u8]) -> Result<()>,
{
    loop {
        let step = coder.code(&[], scratch, Action::Finish);
        if step.status.is_error() {
            return Err(XzError::codec(step.status));
        }
        emit(&scratch[..step.produced])?;
        if step.status == Status::StreamEnd {
            return Ok(());
        }
    }
}

impl<W: Write, C: Coder> Write for Compressor<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.compress(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write, C: Coder> Drop for Compressor<W, C> {
    fn drop(&mut self) {
        if self.coder.is_some() && self.sink.is_some() {
            let _ = self.finish();
        }
    }
}
