//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use oxixz_lzma::{Action, Check, CodeStep, Coder, Engine, LzmaCoder, LzmaEngine, Preset, Status};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// `"0\n1\n...\n{n-1}\n"`
pub fn counter_lines(n: u64) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..n {
        data.extend_from_slice(format!("{i}\n").as_bytes());
    }
    data
}

/// Deterministic pseudo-random bytes.
pub fn noise(size: usize, mut seed: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

/// A source that hands out at most `chunk` bytes per read.
pub struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl<'a> ChunkedReader<'a> {
    pub fn new(data: &'a [u8], chunk: usize) -> Self {
        Self { data, chunk }
    }
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

/// A source that is interrupted before every successful read.
pub struct InterruptingReader<'a> {
    data: &'a [u8],
    interrupt: bool,
}

impl<'a> InterruptingReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            interrupt: true,
        }
    }
}

impl Read for InterruptingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if !self.interrupt {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.data.read(buf)
    }
}

/// Read everything with an output buffer of `out_size` bytes per call.
pub fn read_all<R: Read>(mut reader: R, out_size: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; out_size];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// liblzma coders that sleep a varying amount before every step, so worker
/// completion order differs from sub-part order.
#[derive(Debug, Default)]
pub struct JitterEngine {
    issued: AtomicUsize,
}

pub struct JitterCoder {
    inner: LzmaCoder,
    seed: usize,
}

impl Coder for JitterCoder {
    fn code(&mut self, input: &[u8], output: &mut [u8], action: Action) -> CodeStep {
        self.seed = self.seed.wrapping_mul(31).wrapping_add(7);
        thread::sleep(Duration::from_micros((self.seed % 500) as u64));
        self.inner.code(input, output, action)
    }
}

impl Engine for JitterEngine {
    type Coder = JitterCoder;

    fn decoder(&self) -> Result<JitterCoder, Status> {
        let inner = LzmaEngine.decoder()?;
        Ok(JitterCoder { inner, seed: 1 })
    }

    fn encoder(&self, preset: Preset, check: Check) -> Result<JitterCoder, Status> {
        let issued = self.issued.fetch_add(1, Ordering::Relaxed);
        let inner = LzmaEngine.encoder(preset, check)?;
        // Later coders start with longer pauses.
        Ok(JitterCoder {
            inner,
            seed: 997usize.wrapping_sub(issued * 131),
        })
    }
}

/// How a [`FailingEngine`] misbehaves once its budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Encoder creation fails.
    Init(Status),
    /// The coder is created but fails when asked to finish.
    Finish(Status),
}

/// liblzma engine whose first `healthy` encoders behave; later ones fail.
#[derive(Debug)]
pub struct FailingEngine {
    healthy: usize,
    mode: FailureMode,
    issued: AtomicUsize,
}

impl FailingEngine {
    pub fn new(healthy: usize, mode: FailureMode) -> Self {
        Self {
            healthy,
            mode,
            issued: AtomicUsize::new(0),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::Relaxed)
    }
}

pub struct FailingCoder {
    inner: LzmaCoder,
    fail_on_finish: Option<Status>,
}

impl Coder for FailingCoder {
    fn code(&mut self, input: &[u8], output: &mut [u8], action: Action) -> CodeStep {
        match (action, self.fail_on_finish) {
            (Action::Finish, Some(status)) => CodeStep::stalled(status),
            _ => self.inner.code(input, output, action),
        }
    }
}

impl Engine for FailingEngine {
    type Coder = FailingCoder;

    fn decoder(&self) -> Result<FailingCoder, Status> {
        let inner = LzmaEngine.decoder()?;
        Ok(FailingCoder {
            inner,
            fail_on_finish: None,
        })
    }

    fn encoder(&self, preset: Preset, check: Check) -> Result<FailingCoder, Status> {
        let issued = self.issued.fetch_add(1, Ordering::Relaxed);
        let broken = issued >= self.healthy;
        if let (true, FailureMode::Init(status)) = (broken, self.mode) {
            return Err(status);
        }
        let inner = LzmaEngine.encoder(preset, check)?;
        let fail_on_finish = match self.mode {
            FailureMode::Finish(status) if broken => Some(status),
            _ => None,
        };
        Ok(FailingCoder {
            inner,
            fail_on_finish,
        })
    }
}
