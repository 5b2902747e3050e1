#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use packetrs::{ChunkPool, Packet, PacketError, PoolConfig, VerifyingChunkPool};

fuzz_target!(|data: Vec<u8>| {
    let pool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::new(16, 4, 8).unwrap()));

    {
        let mut packet = Packet::copy_from_slice_in(&data, pool.clone() as ChunkPool);
        let result = packet.read_text(0, usize::MAX);

        // Verify: decoding agrees with std on whether the bytes are valid UTF-8
        match (std::str::from_utf8(&data), result) {
            (Ok(expected), Ok(text)) => {
                assert_eq!(text, expected);
                assert!(packet.is_empty());
            }
            (Err(_), Err(PacketError::MalformedInput { .. })) => {}
            (expected, actual) => panic!("mismatch: {expected:?} vs {actual:?}"),
        }

        // Verify: line reads always terminate and never leak
        let mut lines = Packet::copy_from_slice_in(&data, pool.clone() as ChunkPool);
        while let Ok(Some(_)) = lines.read_utf8_line(32) {}
    }

    pool.assert_empty();
});
