//! Streaming XZ decompression.
//!
//! [`Decompressor`] pulls compressed bytes from any [`Read`] source into a
//! fixed staging buffer and feeds them to a single format-detecting coder.
//! Back-to-back compressed streams in the same source decode as one
//! continuous output.

use crate::config::DEFAULT_BUFSIZE;
use crate::engine::{LzmaCoder, LzmaEngine};
use oxixz_core::error::{Result, XzError};
use oxixz_core::traits::{Action, Coder, Engine, Status};
use std::io::{self, Read};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Truncated,
    Codec(Status),
}

impl Failure {
    fn to_error(self) -> XzError {
        match self {
            Failure::Truncated => XzError::Truncated,
            Failure::Codec(status) => XzError::codec(status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Source may still have data.
    Reading,
    /// Source is exhausted; the coder is being finished.
    Draining,
    /// The last stream ended cleanly.
    Done,
    /// A fatal error was reported; it is repeated on every call.
    Failed(Failure),
}

/// Pull-based XZ decoder over a byte source.
///
/// Not safe for concurrent reads; each call may block on the source.
pub struct Decompressor<R, C = LzmaCoder> {
    source: R,
    buffer: Box<[u8]>,
    /// Length of the chunk currently staged in `buffer`.
    filled: usize,
    /// How much of the staged chunk the coder has consumed.
    offset: usize,
    coder: Option<C>,
    state: State,
    total_in: u64,
    total_out: u64,
}

impl<R: Read> Decompressor<R> {
    /// Create a decompressor with the default staging buffer size.
    pub fn new(source: R) -> Result<Self> {
        Self::with_capacity(source, DEFAULT_BUFSIZE)
    }

    /// Create a decompressor with a staging buffer of `capacity` bytes.
    pub fn with_capacity(source: R, capacity: usize) -> Result<Self> {
        Self::with_engine(source, capacity, &LzmaEngine)
    }
}

impl<R: Read, C: Coder> Decompressor<R, C> {
    /// Create a decompressor whose coder comes from `engine`.
    pub fn with_engine<E>(source: R, capacity: usize, engine: &E) -> Result<Self>
    where
        E: Engine<Coder = C>,
    {
        if capacity == 0 {
            return Err(XzError::invalid_options(
                "staging buffer capacity must be positive",
            ));
        }
        let coder = engine.decoder().map_err(XzError::init)?;

        Ok(Self {
            source,
            buffer: vec![0u8; capacity].into_boxed_slice(),
            // Empty staging area forces a refill on the first read.
            filled: 0,
            offset: 0,
            coder: Some(coder),
            state: State::Reading,
            total_in: 0,
            total_out: 0,
        })
    }

    /// Capacity of the staging buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Compressed bytes pulled from the source so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Decompressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Get a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Consume the decompressor and return the underlying source.
    ///
    /// Staged but unconsumed bytes are lost.
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Release the coder. Safe to call more than once.
    pub fn close(&mut self) {
        self.coder = None;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.coder.is_none()
    }

    fn fail(&mut self, failure: Failure) -> XzError {
        self.state = State::Failed(failure);
        failure.to_error()
    }

    /// Pull the next chunk from the source into the staging buffer.
    fn refill(&mut self) -> io::Result<()> {
        let n = loop {
            match self.source.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            if self.total_in == 0 {
                // Nothing was ever compressed into this source.
                debug!("decompressor source empty");
                self.state = State::Done;
            } else {
                self.state = State::Draining;
            }
        } else {
            self.offset = 0;
            self.filled = n;
            self.total_in += n as u64;
        }
        Ok(())
    }

    fn decode(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.state {
                State::Done => return Ok(0),
                State::Failed(failure) => return Err(failure.to_error().into()),
                State::Reading if self.offset == self.filled => {
                    self.refill()?;
                    continue;
                }
                State::Reading | State::Draining => {}
            }

            let action = if self.state == State::Draining {
                Action::Finish
            } else {
                Action::Run
            };
            let coder = match self.coder.as_mut() {
                Some(coder) => coder,
                None => return Err(XzError::Closed.into()),
            };
            let step = coder.code(&self.buffer[self.offset..self.filled], out, action);

            // The coder may stop short of the staged input at a format
            // boundary; the rest stays staged for the next call.
            self.offset += step.consumed;
            self.total_out += step.produced as u64;

            match step.status {
                Status::Ok => {}
                Status::StreamEnd => {
                    debug!(
                        total_in = self.total_in,
                        total_out = self.total_out,
                        "decompressor reached end of stream"
                    );
                    self.state = State::Done;
                    return Ok(step.produced);
                }
                Status::BufError if self.state == State::Draining => {
                    let err = self.fail(Failure::Truncated);
                    return Err(err.into());
                }
                status => {
                    let err = self.fail(Failure::Codec(status));
                    // Bytes decoded before the failure are still handed out;
                    // the error is reported on the next call.
                    if step.produced > 0 {
                        return Ok(step.produced);
                    }
                    return Err(err.into());
                }
            }

            if step.produced > 0 {
                return Ok(step.produced);
            }
        }
    }
}

impl<R: Read, C: Coder> Read for Decompressor<R, C> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.coder.is_none() {
            return Err(XzError::Closed.into());
        }
        if out.is_empty() {
            return Ok(0);
        }
        self.decode(out)
    }
}

impl<R, C> std::fmt::Debug for Decompressor<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decompressor")
            .field("capacity", &self.buffer.len())
            .field("filled", &self.filled)
            .field("offset", &self.offset)
            .field("state", &self.state)
            .field("closed", &self.coder.is_none())
            .finish()
    }
}
