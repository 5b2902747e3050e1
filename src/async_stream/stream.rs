//! Async reader to packet stream adapter.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_io::AsyncRead;
use pin_project_lite::pin_project;

use crate::chunk::Chunk;
use crate::error::{PacketError, Result};
use crate::input::Packet;
use crate::pool::ChunkPool;

pin_project! {
    /// A stream of packets read from an async reader.
    ///
    /// Every successful read becomes one single-chunk [`Packet`], so packet
    /// sizes follow whatever the reader delivers, up to the pool's usable
    /// chunk size. The chunk being filled is kept across `Poll::Pending` and
    /// returned to the pool when the stream ends or is dropped.
    pub struct PacketStream<R> {
        #[pin]
        reader: R,
        pool: ChunkPool,
        pending: Option<Chunk>,
        finished: bool,
    }

    impl<R> PinnedDrop for PacketStream<R> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(chunk) = this.pending.take() {
                chunk.release(&**this.pool);
            }
        }
    }
}

impl<R: AsyncRead> Stream for PacketStream<R> {
    type Item = Result<Packet>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            let chunk = this.pending.get_or_insert_with(|| this.pool.borrow());
            let read = match this.reader.as_mut().poll_read(cx, chunk.writable_mut()) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(read) => read,
            };
            match read {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    *this.finished = true;
                    if let Some(chunk) = this.pending.take() {
                        chunk.release(&**this.pool);
                    }
                    return Poll::Ready(Some(Err(PacketError::Io(e))));
                }
                Ok(0) => {
                    *this.finished = true;
                    if let Some(chunk) = this.pending.take() {
                        chunk.release(&**this.pool);
                    }
                    tracing::debug!("packet stream reached end of reader");
                    return Poll::Ready(None);
                }
                Ok(n) => {
                    let Some(mut chunk) = this.pending.take() else {
                        continue;
                    };
                    chunk.commit_written(n);
                    let packet = Packet::from_chain(VecDeque::from([chunk]), this.pool.clone());
                    return Poll::Ready(Some(Ok(packet)));
                }
            }
        }
    }
}

/// Creates a packet stream from an async reader.
///
/// Uses `futures_io::AsyncRead`; tokio readers can be adapted with
/// `tokio_util::compat`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use packetrs::{packet_stream, default_pool};
///
/// let file = tokio::fs::File::open("data.bin").await?;
/// let stream = packet_stream(file.compat(), default_pool());
/// ```
///
/// # Example
///
/// ```ignore
/// use futures_util::StreamExt;
/// use futures_io::AsyncRead;
/// use packetrs::{packet_stream, default_pool};
///
/// async fn total<R: AsyncRead + Unpin>(reader: R) -> Result<usize, packetrs::PacketError> {
///     let mut stream = packet_stream(reader, default_pool());
///     let mut total = 0;
///     while let Some(packet) = stream.next().await {
///         total += packet?.remaining();
///     }
///     Ok(total)
/// }
/// ```
pub fn packet_stream<R: AsyncRead>(reader: R, pool: ChunkPool) -> PacketStream<R> {
    PacketStream {
        reader,
        pool,
        pending: None,
        finished: false,
    }
}
