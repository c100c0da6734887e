//! Integration tests for multi-threaded XZ compression.
//!
//! Output order, byte accounting, error propagation, and teardown of
//! [`CompressorMt`], checked by decoding its output with [`Decompressor`].

mod common;

use common::{
    ChunkedReader, FailingEngine, FailureMode, JitterEngine, counter_lines, noise, read_all,
};
use oxixz_lzma::{
    Compressor, CompressorMt, Decompressor, MtOptions, Preset, Status, WriterOptions, XzError,
    decompress,
};
use std::io::{self, Write};

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_million_lines_both_writers() {
    let original = counter_lines(1_000_000);

    let mut single = Compressor::new(Vec::new(), Preset::DEFAULT).unwrap();
    single.write_all(&original).unwrap();
    let single = single.into_inner().unwrap();

    let opts = MtOptions::new(Preset::DEFAULT).with_workers(4);
    let mut parallel = CompressorMt::with_options(Vec::new(), opts).unwrap();
    assert_eq!(parallel.compress(&original).unwrap(), original.len());
    assert_eq!(parallel.total_in(), original.len() as u64);
    let parallel = parallel.into_inner();

    for compressed in [single, parallel] {
        let dec = Decompressor::new(&compressed[..]).unwrap();
        assert_eq!(read_all(dec, 64 * 1024).unwrap(), original);
    }
}

#[test]
fn test_tiny_scratch_and_parts() {
    let original = counter_lines(20_000);

    let opts = WriterOptions::new(Preset::FAST).with_buffer_size(5);
    let mut single = Compressor::with_options(Vec::new(), opts).unwrap();
    single.write_all(&original).unwrap();
    assert_eq!(decompress(&single.into_inner().unwrap()).unwrap(), original);

    let opts = MtOptions::new(Preset::FAST)
        .with_workers(4)
        .with_scratch_size(5)
        .with_part_size(4096);
    let mut parallel = CompressorMt::with_options(Vec::new(), opts).unwrap();
    parallel.write_all(&original).unwrap();
    let compressed = parallel.into_inner();

    let dec = Decompressor::with_capacity(ChunkedReader::new(&compressed, 13), 7).unwrap();
    assert_eq!(read_all(dec, 5).unwrap(), original);
}

#[test]
fn test_fewer_bytes_than_workers() {
    let opts = MtOptions::new(Preset::FAST).with_workers(4);
    let mut enc = CompressorMt::with_options(Vec::new(), opts).unwrap();

    let data = b"ab";
    assert_eq!(enc.compress(data).unwrap(), data.len());
    assert_eq!(decompress(&enc.into_inner()).unwrap(), data);
}

#[test]
fn test_many_small_writes() {
    let opts = MtOptions::new(Preset::FAST).with_workers(3).with_part_size(700);
    let mut enc = CompressorMt::with_options(Vec::new(), opts).unwrap();

    let mut expected = Vec::new();
    for size in [0, 1, 2, 699, 700, 701, 2100, 5] {
        let chunk = noise(size, size as u64);
        assert_eq!(enc.compress(&chunk).unwrap(), size);
        expected.extend_from_slice(&chunk);
    }
    assert_eq!(enc.total_in(), expected.len() as u64);
    assert_eq!(decompress(&enc.into_inner()).unwrap(), expected);
}

#[test]
fn test_single_worker_matches_input() {
    let original = counter_lines(30_000);
    let opts = MtOptions::new(Preset::FAST).with_workers(1);
    let mut enc = CompressorMt::with_options(Vec::new(), opts).unwrap();
    assert_eq!(enc.workers(), 1);

    enc.write_all(&original).unwrap();
    assert_eq!(decompress(&enc.into_inner()).unwrap(), original);
}

// ============================================================================
// Ordering Tests
// ============================================================================

#[test]
fn test_order_preserved_under_jitter() {
    let mut original = counter_lines(5_000);
    original.extend_from_slice(&noise(20_000, 99));

    for round in 0..3 {
        let opts = MtOptions::new(Preset::FAST)
            .with_workers(4)
            .with_scratch_size(256)
            .with_part_size(10_000);
        let mut enc =
            CompressorMt::with_engine(Vec::new(), opts, JitterEngine::default()).unwrap();
        if enc.workers() == 1 {
            eprintln!("round {round}: single worker, parts are not split");
        }
        assert_eq!(enc.compress(&original).unwrap(), original.len());

        let out = decompress(&enc.into_inner()).unwrap();
        assert!(out == original, "round {round}: output out of order");
    }
}

#[test]
fn test_jitter_decoder_reads_concatenation() {
    let original = counter_lines(3_000);
    let opts = MtOptions::new(Preset::FAST).with_workers(4).with_part_size(2_000);
    let mut enc = CompressorMt::with_engine(Vec::new(), opts, JitterEngine::default()).unwrap();
    enc.write_all(&original).unwrap();
    let compressed = enc.into_inner();

    let dec = Decompressor::with_engine(&compressed[..], 64, &JitterEngine::default()).unwrap();
    assert_eq!(read_all(dec, 100).unwrap(), original);
}

// ============================================================================
// Error Propagation Tests
// ============================================================================

fn failing_compressor(mode: FailureMode) -> CompressorMt<Vec<u8>, FailingEngine> {
    let probe = MtOptions::new(Preset::FAST).with_workers(2).with_part_size(1000);
    let workers = CompressorMt::with_options(Vec::new(), probe).unwrap().workers();

    // Two full parts succeed; the third part's coders fail.
    let engine = FailingEngine::new(2 * workers, mode);
    CompressorMt::with_engine(Vec::new(), probe, engine).unwrap()
}

#[test]
fn test_init_failure_keeps_earlier_parts() {
    let mut enc = failing_compressor(FailureMode::Init(Status::MemError));
    let original = counter_lines(2_000);

    let err = enc.compress(&original[..5000]).unwrap_err();
    assert!(matches!(
        err,
        XzError::Init {
            status: Status::MemError
        }
    ));

    // Exactly the first two parts reached the sink.
    assert_eq!(enc.total_in(), 2000);
    assert_eq!(decompress(enc.get_ref()).unwrap(), &original[..2000]);
}

#[test]
fn test_codec_failure_mid_part() {
    let mut enc = failing_compressor(FailureMode::Finish(Status::ProgError));
    let original = noise(4_500, 3);

    let err = enc.compress(&original).unwrap_err();
    assert_eq!(err.status(), Some(Status::ProgError));
    assert!(matches!(err, XzError::Codec { .. }));
    assert_eq!(decompress(enc.get_ref()).unwrap(), &original[..2000]);
}

#[test]
fn test_failure_through_write_trait() {
    let mut enc = failing_compressor(FailureMode::Init(Status::MemError));
    let err = enc.write_all(&[7u8; 3000]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
}

#[test]
fn test_sink_error_propagates() {
    struct FullDisk;
    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut enc = CompressorMt::new(FullDisk, Preset::FAST).unwrap();
    let err = enc.compress(b"payload").unwrap_err();
    let XzError::Io(io_err) = err else {
        panic!("expected an I/O error, got {err}");
    };
    assert_eq!(io_err.kind(), io::ErrorKind::StorageFull);
}

/// Sink that rejects writes while `down` is set.
struct OutageSink {
    down: bool,
    data: Vec<u8>,
}

impl Write for OutageSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.down {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "sink offline"));
        }
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_write_after_sink_recovers() {
    let sink = OutageSink {
        down: false,
        data: Vec::new(),
    };
    let opts = MtOptions::new(Preset::FAST).with_workers(2).with_part_size(1000);
    let mut enc = CompressorMt::with_options(sink, opts).unwrap();

    let first = counter_lines(500);
    enc.write_all(&first).unwrap();
    let kept = enc.get_ref().data.len();

    enc.get_mut().down = true;
    let lost = noise(3000, 11);
    let err = enc.compress(&lost).unwrap_err();
    assert!(matches!(err, XzError::Io(_)));
    assert_eq!(enc.get_ref().data.len(), kept);
    assert_eq!(enc.total_in(), first.len() as u64);

    enc.get_mut().down = false;
    let second = b"after the outage".repeat(10);
    assert_eq!(enc.compress(&second).unwrap(), second.len());
    assert_eq!(enc.total_in(), (first.len() + second.len()) as u64);

    let mut expected = first.clone();
    expected.extend_from_slice(&second);
    assert_eq!(decompress(&enc.get_ref().data).unwrap(), expected);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_close_is_idempotent() {
    let mut enc = CompressorMt::new(Vec::new(), Preset::FAST).unwrap();
    enc.write_all(b"before close").unwrap();
    enc.close();
    enc.close();
    assert!(enc.is_closed());

    let err = enc.write(b"after close").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(decompress(enc.get_ref()).unwrap(), b"before close");
}

#[test]
fn test_invalid_options_rejected() {
    for opts in [
        MtOptions::new(Preset::FAST).with_part_size(0),
        MtOptions::new(Preset::FAST).with_scratch_size(0),
    ] {
        let result = CompressorMt::with_options(Vec::new(), opts);
        assert!(matches!(result, Err(XzError::InvalidOptions { .. })));
    }
}
