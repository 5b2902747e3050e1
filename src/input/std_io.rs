//! Standard trait implementations for inputs and packets.

use std::io;

use bytes::Buf;

use super::{Input, Packet, Source};
use crate::chunk::Chunk;

impl<S: Source> io::Read for Input<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 && !self.fill_next()? {
            return Ok(0);
        }
        Ok(self.copy_out(buf))
    }
}

impl<S: Source> io::BufRead for Input<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.remaining == 0 {
            self.fill_next()?;
        }
        Ok(self.chain.front().map_or(&[][..], Chunk::readable))
    }

    fn consume(&mut self, amt: usize) {
        let Some(head) = self.chain.front_mut() else {
            return;
        };
        let n = amt.min(head.read_remaining());
        head.advance(n);
        self.after_head_read(n);
    }
}

impl Buf for Packet {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        self.chain.front().map_or(&[][..], Chunk::readable)
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining,
            "cannot advance past the end of the packet: {cnt} > {}",
            self.remaining
        );
        self.skip_buffered(cnt);
    }
}
