//! Multi-threaded XZ compression.
//!
//! [`CompressorMt`] splits every write into parts of at most
//! [`MtOptions::part_size`] bytes and each part into one even sub-part per
//! worker. Every sub-part is compressed by its own coder into an
//! independently finished XZ stream; the streams are written to the sink in
//! input order, so the sink holds a valid concatenated XZ file.
//!
//! ```text
//!  write(input)
//!   ├── part 0 ──┬── sub-part 0 ── worker 0 ──┐
//!   │            ├── sub-part 1 ── worker 1 ──┼── flush in worker order ──> sink
//!   │            └── sub-part 2 ── worker 2 ──┘
//!   └── part 1 ── ... (starts after part 0 is flushed)
//! ```
//!
//! Parts are processed strictly one after another, which bounds memory to
//! one scratch buffer and one output buffer per worker.

use crate::config::{DEFAULT_PART_SIZE, MtOptions, available_parallelism};
use crate::engine::LzmaEngine;
use crate::writer::{encode_finish, encode_input};
use oxixz_core::error::{Result, XzError};
use oxixz_core::traits::{Coder, Engine, Preset};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io::{self, Write};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// No output pending.
    Idle,
    /// A sub-part is being compressed, or its compression failed.
    Encoding,
    /// `output` holds one finished stream waiting to be flushed.
    Finished,
}

/// One worker's coder handle and buffers.
///
/// A slot is only ever touched by one task at a time, so the handle needs no
/// locking. The handle is re-armed at the start of every sub-part and kept
/// until the next re-arm or until the compressor is closed.
struct WorkerSlot<C> {
    state: SlotState,
    coder: Option<C>,
    scratch: Vec<u8>,
    output: Vec<u8>,
}

impl<C: Coder> WorkerSlot<C> {
    fn new(scratch_size: usize, output_capacity: usize) -> Self {
        Self {
            state: SlotState::Idle,
            coder: None,
            scratch: vec![0u8; scratch_size],
            output: Vec::with_capacity(output_capacity),
        }
    }

    /// Compress `input` as one finished stream appended to `self.output`.
    fn compress<E>(
        &mut self,
        engine: &E,
        options: &MtOptions,
        input: &[u8],
        consumed: &AtomicU64,
    ) -> Result<()>
    where
        E: Engine<Coder = C>,
    {
        self.reset();
        // Trailing workers get nothing when a part is smaller than the pool.
        if input.is_empty() {
            return Ok(());
        }

        // Release the previous handle before arming a new one.
        self.coder = None;
        self.state = SlotState::Encoding;
        let mut coder = engine
            .encoder(options.preset, options.check)
            .map_err(XzError::init)?;

        let output = &mut self.output;
        let count = encode_input(&mut coder, input, &mut self.scratch, |out| {
            output.extend_from_slice(out);
            Ok(())
        })?;
        encode_finish(&mut coder, &mut self.scratch, |out| {
            output.extend_from_slice(out);
            Ok(())
        })?;

        consumed.fetch_add(count as u64, Ordering::Relaxed);
        self.coder = Some(coder);
        self.state = SlotState::Finished;
        Ok(())
    }

    /// Drop pending output and return to idle.
    fn reset(&mut self) {
        self.output.clear();
        self.state = SlotState::Idle;
    }
}

/// Parallel XZ encoder over a byte sink.
///
/// Each [`write`](Write::write) call compresses and flushes all of its input
/// before returning. The sink receives one XZ stream per non-empty sub-part;
/// any XZ decoder that handles concatenated streams (such as
/// [`Decompressor`](crate::Decompressor)) restores the original bytes.
///
/// If a part fails, the sink keeps every part flushed before it and nothing
/// of the failing part.
pub struct CompressorMt<W: Write, E: Engine = LzmaEngine> {
    sink: W,
    engine: E,
    options: MtOptions,
    workers: usize,
    slots: Vec<WorkerSlot<E::Coder>>,
    pool: Option<ThreadPool>,
    total_in: u64,
}

impl<W: Write> CompressorMt<W> {
    /// Create a compressor using all available cores.
    pub fn new(sink: W, preset: Preset) -> Result<Self> {
        Self::with_options(sink, MtOptions::new(preset))
    }

    /// Create a compressor with explicit tuning.
    pub fn with_options(sink: W, options: MtOptions) -> Result<Self> {
        Self::with_engine(sink, options, LzmaEngine)
    }
}

impl<W: Write, E: Engine> CompressorMt<W, E> {
    /// Create a compressor whose coders come from `engine`.
    pub fn with_engine(sink: W, options: MtOptions, engine: E) -> Result<Self> {
        options.validate()?;
        let workers = options.resolve_workers(available_parallelism());
        Self::build(sink, options, engine, workers)
    }

    fn build(sink: W, options: MtOptions, engine: E, workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("oxixz-worker-{i}"))
            .build()
            .map_err(|e| XzError::thread_pool(e.to_string()))?;

        let output_capacity = options.part_size.min(DEFAULT_PART_SIZE) / workers;
        let slots = (0..workers)
            .map(|_| WorkerSlot::new(options.scratch_size, output_capacity))
            .collect();

        debug!(
            workers,
            part_size = options.part_size,
            scratch_size = options.scratch_size,
            preset = options.preset.bits(),
            "multi-threaded compressor ready"
        );

        Ok(Self {
            sink,
            engine,
            options,
            workers,
            slots,
            pool: Some(pool),
            total_in: 0,
        })
    }

    /// Number of worker slots.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The options this compressor was built with.
    pub fn options(&self) -> &MtOptions {
        &self.options
    }

    /// Uncompressed bytes whose compressed form has been written to the sink.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Get a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Get a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consume the compressor and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Release every coder handle and buffer. Safe to call more than once.
    pub fn close(&mut self) {
        self.slots.clear();
        self.pool = None;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_none()
    }

    /// Compress and flush all of `input`.
    ///
    /// Returns the number of input bytes consumed, which equals
    /// `input.len()` on success.
    pub fn compress(&mut self, input: &[u8]) -> Result<usize> {
        if self.pool.is_none() {
            return Err(XzError::Closed);
        }
        if input.is_empty() {
            return Ok(0);
        }

        let consumed = AtomicU64::new(0);
        // Input bytes whose output already reached the sink.
        let mut flushed = 0;
        for (index, part) in input.chunks(self.options.part_size).enumerate() {
            trace!(part = index, len = part.len(), "compressing part");
            let result = self
                .compress_part(part, &consumed)
                .and_then(|()| self.flush_part());
            if let Err(e) = result {
                warn!(part = index, error = %e, "part failed");
                // Nothing of the failed part may reach a later write.
                self.slots.iter_mut().for_each(WorkerSlot::reset);
                self.total_in += flushed;
                return Err(e);
            }
            flushed = consumed.load(Ordering::Relaxed);
        }

        self.total_in += flushed;
        Ok(flushed as usize)
    }

    /// Compress one part: sub-part `i` goes to worker `i`.
    fn compress_part(&mut self, part: &[u8], consumed: &AtomicU64) -> Result<()> {
        let pool = self.pool.as_ref().ok_or(XzError::Closed)?;
        let engine = &self.engine;
        let options = &self.options;
        let slots = &mut self.slots;
        let workers = slots.len();

        // All tasks are joined before this returns, failed or not.
        pool.install(|| {
            slots
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(index, slot)| {
                    let range = sub_part(part.len(), workers, index);
                    slot.compress(engine, options, &part[range], consumed)
                })
        })
    }

    /// Write every worker's output to the sink in worker order.
    fn flush_part(&mut self) -> Result<()> {
        let mut flushed = 0;
        for slot in &mut self.slots {
            if slot.state == SlotState::Finished {
                self.sink.write_all(&slot.output)?;
                flushed += slot.output.len();
            }
            slot.reset();
        }
        trace!(bytes = flushed, "flushed part");
        Ok(())
    }
}

/// Byte range of sub-part `index` when `len` bytes are split over `workers`.
///
/// Every worker gets `len / workers` bytes; the division remainder goes to
/// the last worker. Trailing ranges are empty when `len < workers`.
fn sub_part(len: usize, workers: usize, index: usize) -> Range<usize> {
    let step = len / workers;
    let start = step * index;
    if index + 1 == workers {
        start..len
    } else {
        start..start + step
    }
}

impl<W: Write, E: Engine> Write for CompressorMt<W, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.compress(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl<W: Write, E: Engine> std::fmt::Debug for CompressorMt<W, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressorMt")
            .field("workers", &self.workers)
            .field("options", &self.options)
            .field("total_in", &self.total_in)
            .field("closed", &self.pool.is_none())
            .finish()
    }
}
