// Integration tests for packets, builders and the chunk pool
// Tests cover: boundary-agnostic reads, copies, pool accounting, pull/push adapters
// Requires the `verify` feature

use std::io::{self, BufRead, Read};
use std::sync::Arc;

use bytes::Buf;
use proptest::prelude::*;
use packetrs::{
    Builder, ByteOrder, ChunkPool, Input, ObjectPool, Output, Packet, PacketError, PoolConfig,
    ReaderSource, Sink, Source, VerifyingChunkPool, WriterSink,
};

fn verifying(chunk_size: usize) -> Arc<VerifyingChunkPool> {
    Arc::new(VerifyingChunkPool::chunks(
        PoolConfig::new(chunk_size, 4, 8).unwrap(),
    ))
}

/// Runs `body` against a verifying pool of 16-byte chunks, then checks for leaks.
fn with_pool(body: impl FnOnce(ChunkPool)) {
    let pool = verifying(16);
    body(pool.clone());
    pool.assert_empty();
}

/// A source that hands out one byte per fill.
struct Trickle {
    data: Vec<u8>,
    at: usize,
    closes: usize,
}

impl Trickle {
    fn new(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            at: 0,
            closes: 0,
        }
    }
}

impl Source for Trickle {
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize> {
        if self.at == self.data.len() || destination.is_empty() {
            return Ok(0);
        }
        destination[0] = self.data[self.at];
        self.at += 1;
        Ok(1)
    }

    fn close_source(&mut self) -> io::Result<()> {
        self.closes += 1;
        Ok(())
    }
}

// ============================================================================
// Boundary-agnostic reads
// ============================================================================

#[test]
fn test_u32_split_over_two_chunks() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool);
        builder.write_fully(&[0; 6]);
        builder.write_fully(&[0x11, 0x22, 0x33, 0x44]);
        let mut packet = builder.build();
        assert_eq!(packet.chunk_count(), 2);

        packet.discard_exact(6).unwrap();
        assert_eq!(packet.read_u32(ByteOrder::BigEndian).unwrap(), 0x1122_3344);
        assert!(packet.is_empty());
    });
}

#[test]
fn test_every_primitive_at_every_offset() {
    with_pool(|pool| {
        for offset in 0..8 {
            let mut builder = Builder::new(pool.clone());
            builder.write_fully(&vec![0xEE; offset]);
            let bytes: Vec<u8> = (1..=30).collect();
            builder.write_fully(&bytes);
            let mut packet = builder.build();

            packet.discard_exact(offset).unwrap();
            assert_eq!(packet.read_u8().unwrap(), 0x01);
            assert_eq!(packet.read_u16(ByteOrder::BigEndian).unwrap(), 0x0203);
            assert_eq!(packet.read_u32(ByteOrder::LittleEndian).unwrap(), 0x0706_0504);
            assert_eq!(
                packet.read_u64(ByteOrder::BigEndian).unwrap(),
                0x0809_0a0b_0c0d_0e0f
            );
            assert_eq!(
                packet.read_f32(ByteOrder::BigEndian).unwrap(),
                f32::from_bits(0x1011_1213)
            );
            assert_eq!(
                packet.read_f64(ByteOrder::LittleEndian).unwrap(),
                f64::from_bits(0x1b1a_1918_1716_1514)
            );
            assert_eq!(packet.remaining(), 3);
        }
    });
}

#[test]
fn test_read_past_end_is_recoverable() {
    with_pool(|pool| {
        let mut packet = Packet::copy_from_slice_in(&[1, 2, 3], pool);
        match packet.read_u64(ByteOrder::BigEndian) {
            Err(PacketError::EndOfData {
                required: 8,
                available: 3,
            }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(packet.read_bytes(3).unwrap().as_ref(), &[1, 2, 3]);
    });
}

#[test]
fn test_byte_at_a_time_source() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool.clone());
        builder.write_i64(-5, ByteOrder::BigEndian);
        builder.write_text("Ɔk\n");
        let encoded = builder.build().read_remaining_bytes().unwrap();

        let mut input = Input::new(Trickle::new(&encoded), pool);
        assert_eq!(input.read_i64(ByteOrder::BigEndian).unwrap(), -5);
        assert_eq!(input.read_utf8_line(8).unwrap().as_deref(), Some("Ɔk"));
        assert!(input.end_of_input().unwrap());
        input.close().unwrap();
        assert_eq!(input.source().closes, 1);
    });
}

/// A source that hands out `step` bytes per fill.
struct Stepped {
    data: Vec<u8>,
    at: usize,
    step: usize,
}

impl Source for Stepped {
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize> {
        let n = self
            .step
            .min(destination.len())
            .min(self.data.len() - self.at);
        destination[..n].copy_from_slice(&self.data[self.at..self.at + n]);
        self.at += n;
        Ok(n)
    }

    fn close_source(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Sample {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

fn any_value() -> impl Strategy<Value = Sample> {
    prop_oneof![
        any::<u8>().prop_map(Sample::U8),
        any::<i8>().prop_map(Sample::I8),
        any::<u16>().prop_map(Sample::U16),
        any::<i16>().prop_map(Sample::I16),
        any::<u32>().prop_map(Sample::U32),
        any::<i32>().prop_map(Sample::I32),
        any::<u64>().prop_map(Sample::U64),
        any::<i64>().prop_map(Sample::I64),
        any::<f32>().prop_map(Sample::F32),
        any::<f64>().prop_map(Sample::F64),
    ]
}

fn any_order() -> impl Strategy<Value = ByteOrder> {
    prop_oneof![Just(ByteOrder::BigEndian), Just(ByteOrder::LittleEndian)]
}

fn write_value(builder: &mut Builder, value: Sample, order: ByteOrder) {
    match value {
        Sample::U8(v) => builder.write_u8(v),
        Sample::I8(v) => builder.write_i8(v),
        Sample::U16(v) => builder.write_u16(v, order),
        Sample::I16(v) => builder.write_i16(v, order),
        Sample::U32(v) => builder.write_u32(v, order),
        Sample::I32(v) => builder.write_i32(v, order),
        Sample::U64(v) => builder.write_u64(v, order),
        Sample::I64(v) => builder.write_i64(v, order),
        Sample::F32(v) => builder.write_f32(v, order),
        Sample::F64(v) => builder.write_f64(v, order),
    }
}

/// Reads back a value of the same type as `like`. Floats compare by bits.
fn read_matches<S: Source>(input: &mut Input<S>, like: Sample, order: ByteOrder) -> bool {
    match like {
        Sample::U8(v) => input.read_u8().unwrap() == v,
        Sample::I8(v) => input.read_i8().unwrap() == v,
        Sample::U16(v) => input.read_u16(order).unwrap() == v,
        Sample::I16(v) => input.read_i16(order).unwrap() == v,
        Sample::U32(v) => input.read_u32(order).unwrap() == v,
        Sample::I32(v) => input.read_i32(order).unwrap() == v,
        Sample::U64(v) => input.read_u64(order).unwrap() == v,
        Sample::I64(v) => input.read_i64(order).unwrap() == v,
        Sample::F32(v) => input.read_f32(order).unwrap().to_bits() == v.to_bits(),
        Sample::F64(v) => input.read_f64(order).unwrap().to_bits() == v.to_bits(),
    }
}

proptest! {
    #[test]
    fn prop_primitives_read_back_at_any_split(
        offset in 0usize..16,
        step in 1usize..12,
        values in prop::collection::vec((any_value(), any_order()), 1..24),
    ) {
        let pool = verifying(16);
        let mut builder = Builder::new(pool.clone());
        builder.write_fully(&vec![0xEE; offset]);
        for &(value, order) in &values {
            write_value(&mut builder, value, order);
        }
        let encoded = builder.build().read_remaining_bytes().unwrap().to_vec();

        let mut input = Input::new(Stepped { data: encoded, at: 0, step }, pool.clone());
        input.discard_exact(offset).unwrap();
        for &(value, order) in &values {
            prop_assert!(read_matches(&mut input, value, order), "{value:?} {order:?}");
        }
        prop_assert!(input.end_of_input().unwrap());

        drop(input);
        drop(builder);
        pool.assert_empty();
    }
}

#[test]
fn test_primitive_array_straddles_chunks() {
    with_pool(|pool| {
        let values: Vec<i64> = (0..9).map(|i| i * -1_000_003).collect();
        let mut builder = Builder::new(pool.clone());
        builder.write_u8(7);
        builder.write_primitives(&values, ByteOrder::LittleEndian);
        let encoded = builder.build().read_remaining_bytes().unwrap();

        let mut input = Input::new(Stepped { data: encoded.to_vec(), at: 0, step: 5 }, pool);
        assert_eq!(input.read_u8().unwrap(), 7);
        let mut decoded = [0i64; 9];
        input
            .read_fully_primitives(&mut decoded, ByteOrder::LittleEndian)
            .unwrap();
        assert_eq!(decoded.to_vec(), values);
        assert!(input.end_of_input().unwrap());
    });
}

// ============================================================================
// Empty packets
// ============================================================================

#[test]
fn test_empty_packet_stays_empty() {
    with_pool(|pool| {
        let mut packet = Packet::empty_in(pool);
        for _ in 0..3 {
            assert!(matches!(
                packet.read_u8(),
                Err(PacketError::EndOfData {
                    required: 1,
                    available: 0
                })
            ));
            assert_eq!(packet.try_peek().unwrap(), None);
            assert_eq!(packet.discard(4).unwrap(), 0);
            assert!(packet.end_of_input().unwrap());
        }
        assert_eq!(packet.read_utf8_line(8).unwrap(), None);
    });
}

// ============================================================================
// Copies
// ============================================================================

#[test]
fn test_copy_reads_independently() {
    with_pool(|pool| {
        let mut original = Packet::copy_from_slice_in(b"0123456789abcdefghij", pool);
        original.discard_exact(2).unwrap();
        let mut copy = original.copy();

        assert_eq!(original.read_bytes(18).unwrap().as_ref(), b"23456789abcdefghij");
        assert_eq!(copy.remaining(), 18);
        assert_eq!(copy.read_text(0, 4).unwrap(), "2345");
        drop(original);
        assert_eq!(copy.read_text(0, usize::MAX).unwrap(), "6789abcdefghij");
    });
}

#[test]
fn test_copy_dropped_first_still_returns_chunks() {
    with_pool(|pool| {
        let original = Packet::copy_from_slice_in(&[9; 40], pool);
        let copy = original.copy();
        drop(copy);
        drop(original);
    });
}

#[test]
fn test_stitching_a_copied_packet_leaves_the_copy_intact() {
    with_pool(|pool| {
        let mut original = Packet::copy_from_slice_in("1234567€".as_bytes(), pool);
        let mut copy = original.copy();
        assert_eq!(original.read_text(0, usize::MAX).unwrap(), "1234567€");
        assert_eq!(copy.read_text(0, usize::MAX).unwrap(), "1234567€");
    });
}

#[test]
fn test_copies_read_on_separate_threads() {
    with_pool(|pool| {
        let data: Vec<u8> = (0..200).map(|i| (i % 251) as u8).collect();
        let packet = Packet::copy_from_slice_in(&data, pool);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut copy = packet.copy();
                std::thread::spawn(move || copy.read_remaining_bytes().unwrap().to_vec())
            })
            .collect();
        drop(packet);

        for handle in handles {
            assert_eq!(handle.join().unwrap(), data);
        }
    });
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_build_releases_nothing_early() {
    let pool = verifying(16);
    let mut builder = Builder::new(pool.clone());
    builder.write_fully(&[1; 20]);
    assert_eq!(pool.borrowed_count(), 3);

    let packet = builder.build();
    assert_eq!(pool.borrowed_count(), 3);
    drop(packet);
    drop(builder);
    pool.assert_empty();
}

#[test]
fn test_unfinished_builder_releases_on_drop() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool);
        builder.write_text("never built");
    });
}

#[test]
fn test_explicit_release() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool.clone());
        builder.write_fully(&[0; 30]);
        builder.release();

        let mut packet = Packet::copy_from_slice_in(&[0; 30], pool);
        packet.release();
        assert!(packet.is_empty());
    });
}

#[test]
fn test_write_packet_concatenates() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool.clone());
        builder.write_text("head:");
        builder.write_packet(Packet::copy_from_slice_in(b"0123456789", pool.clone()));
        builder.write_packet(Packet::copy_from_slice_in(b"!", pool));
        assert_eq!(builder.size(), 16);
        assert_eq!(
            builder.build().read_text(0, usize::MAX).unwrap(),
            "head:0123456789!"
        );
    });
}

#[test]
fn test_write_packet_from_foreign_pool() {
    let foreign = verifying(32);
    with_pool(|pool| {
        let mut builder = Builder::new(pool);
        builder.write_packet(Packet::copy_from_slice_in(&[4; 50], foreign.clone()));
        assert_eq!(builder.build().read_remaining_bytes().unwrap().as_ref(), &[4; 50]);
    });
    foreign.assert_empty();
}

#[test]
fn test_size_is_bytes_written() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool);
        builder.write_u8(1);
        builder.write_u64(2, ByteOrder::LittleEndian);
        builder.write_text("abc");
        builder.append_char('é');
        assert_eq!(builder.size(), 1 + 8 + 3 + 2);
        assert_eq!(builder.build().remaining(), 14);
    });
}

// ============================================================================
// Pool accounting
// ============================================================================

#[test]
#[should_panic(expected = "never recycled")]
fn test_leaked_chunk_is_reported() {
    let pool = verifying(16);
    let leaked = pool.borrow();
    std::mem::forget(leaked);
    pool.assert_empty();
}

#[test]
#[should_panic(expected = "not currently borrowed")]
fn test_release_to_wrong_pool_is_reported() {
    let first = verifying(16);
    let second = verifying(16);
    let chunk = first.borrow();
    chunk.release(&*second);
}

// ============================================================================
// std adapters
// ============================================================================

#[test]
fn test_std_read_and_buf() {
    with_pool(|pool| {
        let mut input = Input::new(ReaderSource::new(&b"alpha\nbeta\n"[..]), pool.clone());
        let mut first = String::new();
        input.read_line(&mut first).unwrap();
        assert_eq!(first, "alpha\n");
        let mut rest = Vec::new();
        input.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"beta\n");

        let mut packet = Packet::copy_from_slice_in(&[0, 0, 0, 7, 1], pool);
        assert_eq!(packet.get_u32(), 7);
        assert_eq!(Buf::remaining(&packet), 1);
    });
}

#[derive(Default)]
struct Collect(Vec<u8>, usize);

impl Sink for Collect {
    fn flush(&mut self, source: &[u8]) -> io::Result<()> {
        self.0.extend_from_slice(source);
        Ok(())
    }

    fn close_destination(&mut self) -> io::Result<()> {
        self.1 += 1;
        Ok(())
    }
}

#[test]
fn test_output_round_trip() {
    with_pool(|pool| {
        let mut output = Output::new(Collect::default(), pool.clone());
        output.buffer_mut().write_u16(0xABCD, ByteOrder::LittleEndian);
        output.flush().unwrap();
        output
            .send(Packet::copy_from_slice_in(&[1; 20], pool))
            .unwrap();
        io::Write::write_all(&mut output, b"end").unwrap();
        output.close().unwrap();

        let mut expected = vec![0xCD, 0xAB];
        expected.extend_from_slice(&[1; 20]);
        expected.extend_from_slice(b"end");
        assert_eq!(output.sink().0, expected);
        assert_eq!(output.sink().1, 1);
    });
}

#[test]
fn test_writer_sink() {
    with_pool(|pool| {
        let mut output = Output::new(WriterSink::new(Vec::new()), pool);
        output.buffer_mut().write_text("payload");
        output.close().unwrap();
        assert_eq!(output.sink().get_ref(), b"payload");
    });
}
