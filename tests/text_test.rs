// Integration tests for UTF-8 text and line decoding
// Chunk boundaries are forced at every possible position to show decoding
// never depends on where they fall
// Requires the `verify` feature

use std::io;
use std::sync::Arc;

use packetrs::{Builder, ChunkPool, Input, Packet, PacketError, PoolConfig, Source, VerifyingChunkPool};
use proptest::prelude::*;

fn with_pool(body: impl FnOnce(ChunkPool)) {
    let pool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::new(16, 4, 8).unwrap()));
    body(pool.clone());
    pool.assert_empty();
}

/// A source that splits its data at fixed offsets.
struct Split {
    parts: Vec<Vec<u8>>,
}

impl Split {
    fn at(data: &[u8], cuts: &[usize]) -> Self {
        let mut parts = Vec::new();
        let mut start = 0;
        for &cut in cuts {
            let cut = cut.clamp(start, data.len());
            parts.push(data[start..cut].to_vec());
            start = cut;
        }
        parts.push(data[start..].to_vec());
        parts.retain(|part| !part.is_empty());
        parts.reverse();
        Self { parts }
    }
}

impl Source for Split {
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize> {
        let Some(mut part) = self.parts.pop() else {
            return Ok(0);
        };
        let n = part.len().min(destination.len());
        destination[..n].copy_from_slice(&part[..n]);
        if n < part.len() {
            part.drain(..n);
            self.parts.push(part);
        }
        Ok(n)
    }

    fn close_source(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Multi-byte characters across boundaries
// ============================================================================

#[test]
fn test_two_byte_char_split_in_half() {
    with_pool(|pool| {
        let mut input = Input::new(Split::at(&[0xC6, 0x86], &[1]), pool);
        assert_eq!(input.read_text(1, 1).unwrap(), "\u{0186}");
        assert!(input.end_of_input().unwrap());
    });
}

#[test]
fn test_four_byte_char_at_every_split() {
    let text = "ab😀cd";
    for cut in 0..=text.len() {
        with_pool(|pool| {
            let mut input = Input::new(Split::at(text.as_bytes(), &[cut]), pool);
            assert_eq!(input.read_text(0, usize::MAX).unwrap(), text, "cut at {cut}");
        });
    }
}

#[test]
fn test_char_limit_counts_characters() {
    with_pool(|pool| {
        let mut packet = Packet::copy_from_slice_in("ÀÉÎÕÜ".as_bytes(), pool);
        assert_eq!(packet.read_text(2, 2).unwrap(), "ÀÉ");
        assert_eq!(packet.remaining(), 6);
        assert_eq!(packet.read_text(0, usize::MAX).unwrap(), "ÎÕÜ");
    });
}

#[test]
fn test_truncated_char_at_end_is_malformed() {
    with_pool(|pool| {
        let mut input = Input::new(Split::at(&[b'x', 0xF0, 0x9F, 0x98], &[2]), pool);
        match input.read_text(0, 10) {
            Err(PacketError::MalformedInput { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(input.remaining(), 3);
    });
}

#[test]
fn test_invalid_continuation_is_malformed() {
    with_pool(|pool| {
        let mut packet = Packet::copy_from_slice_in(&[0xC6, b'a'], pool);
        assert!(matches!(
            packet.read_text(0, 10),
            Err(PacketError::MalformedInput { .. })
        ));
    });
}

// ============================================================================
// Lines
// ============================================================================

#[test]
fn test_lines_with_mixed_terminators() {
    with_pool(|pool| {
        let mut builder = Builder::new(pool);
        builder.write_text("GET / HTTP/1.1\r\nHost: example\r\n\r\nbody\rtail");
        let mut packet = builder.build();

        let mut lines = Vec::new();
        while let Some(line) = packet.read_utf8_line(64).unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, ["GET / HTTP/1.1", "Host: example", "", "body", "tail"]);
    });
}

#[test]
fn test_crlf_split_across_fills() {
    with_pool(|pool| {
        let mut input = Input::new(Split::at(b"one\r\ntwo", &[4]), pool);
        assert_eq!(input.read_utf8_line(10).unwrap().as_deref(), Some("one"));
        assert_eq!(input.read_utf8_line(10).unwrap().as_deref(), Some("two"));
        assert_eq!(input.read_utf8_line(10).unwrap(), None);
    });
}

#[test]
fn test_line_limit() {
    with_pool(|pool| {
        let mut packet = Packet::copy_from_slice_in("ëëëëë\nok\n".as_bytes(), pool);
        assert!(matches!(
            packet.read_utf8_line(4),
            Err(PacketError::LimitExceeded { limit: 4 })
        ));
    });
}

#[test]
fn test_text_until_delimiter() {
    with_pool(|pool| {
        let mut packet = Packet::copy_from_slice_in("clé=valeur;".as_bytes(), pool);
        assert_eq!(packet.read_utf8_until_delimiter(b"=;", 16).unwrap(), "clé");
        packet.discard_exact(1).unwrap();
        assert_eq!(packet.read_utf8_until_delimiter(b"=;", 16).unwrap(), "valeur");
        assert_eq!(packet.remaining(), 1);
    });
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn prop_text_survives_any_split(text in "\\PC{0,40}", cuts in prop::collection::vec(0usize..200, 0..6)) {
        let mut cuts = cuts;
        cuts.sort_unstable();
        let pool: ChunkPool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::new(16, 4, 8).unwrap()));
        let mut input = Input::new(Split::at(text.as_bytes(), &cuts), pool);
        prop_assert_eq!(input.read_text(0, usize::MAX).unwrap(), text);
    }

    #[test]
    fn prop_builder_text_reads_back(text in "\\PC{0,60}") {
        let pool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::new(16, 4, 8).unwrap()));
        let mut builder = Builder::new(pool.clone());
        builder.write_text(&text);
        prop_assert_eq!(builder.size(), text.len());
        let mut packet = builder.build();
        prop_assert_eq!(packet.read_text(0, usize::MAX).unwrap(), text);
        drop(packet);
        drop(builder);
        pool.assert_empty();
    }
}
