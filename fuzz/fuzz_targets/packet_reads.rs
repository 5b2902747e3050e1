#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use packetrs::{Builder, ByteOrder, ChunkPool, PacketError, PoolConfig, VerifyingChunkPool};

fuzz_target!(|data: Vec<u8>| {
    let pool = Arc::new(VerifyingChunkPool::chunks(PoolConfig::new(16, 4, 8).unwrap()));

    {
        let mut builder = Builder::new(pool.clone() as ChunkPool);
        builder.write_fully(&data);
        let mut packet = builder.build();
        let mut copy = packet.copy();

        // Drive reads with the input itself as the opcode stream
        let mut consumed = 0usize;
        for &op in &data {
            let before = packet.remaining();
            let result = match op % 7 {
                0 => packet.read_u8().map(|_| 1),
                1 => packet.read_u16(ByteOrder::BigEndian).map(|_| 2),
                2 => packet.read_u32(ByteOrder::LittleEndian).map(|_| 4),
                3 => packet.read_u64(ByteOrder::BigEndian).map(|_| 8),
                4 => packet.discard((op / 7) as usize),
                5 => {
                    let mut values = [0u16; 3];
                    packet
                        .read_fully_primitives(&mut values, ByteOrder::LittleEndian)
                        .map(|_| 6)
                }
                _ => packet.read_until_delimiter(op, &mut [0u8; 5]),
            };
            match result {
                Ok(n) => {
                    // Verify: the cursor moved by exactly what was consumed
                    assert_eq!(packet.remaining(), before - n);
                    consumed += n;
                }
                Err(PacketError::EndOfData { .. }) => assert_eq!(packet.remaining(), before),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // Verify: the copy still sees every byte
        assert_eq!(copy.read_remaining_bytes().unwrap().as_ref(), &data[..]);
        assert_eq!(consumed + packet.remaining(), data.len());
    }

    pool.assert_empty();
});
