//! Chunk sources.
//!
//! The parser pulls bytes from a [`ChunkSource`] only when the frame it is
//! reading needs more. Chunk boundaries carry no meaning; a source may split
//! the stream anywhere, including inside a code or a payload.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::error::Result;

/// A pull-based source of byte chunks.
#[async_trait]
pub trait ChunkSource: Send {
    /// The next chunk, or `None` once the source is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

#[async_trait]
impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        (**self).next_chunk().await
    }
}

/// An in-memory list of chunks.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: VecDeque<Bytes>,
}

impl MemorySource {
    /// A source yielding the given chunks in order.
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// A source yielding `data` as a single chunk.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new([data.into()])
    }

    /// A source yielding `data` in chunks of at most `size` bytes.
    pub fn chunked(data: impl Into<Bytes>, size: usize) -> Self {
        let mut data: Bytes = data.into();
        let size = size.max(1);
        let mut chunks = VecDeque::new();
        while !data.is_empty() {
            let n = size.min(data.len());
            chunks.push_back(data.split_to(n));
        }
        Self { chunks }
    }

    /// Number of chunks not yet pulled.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl ChunkSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.chunks.pop_front())
    }
}

/// Reads chunks from any async reader.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R> ReaderSource<R> {
    pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, Self::DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ChunkSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let mut buf = BytesMut::with_capacity(self.chunk_size);
        let n = self.reader.read_buf(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(buf.freeze()))
    }
}

/// Receives chunks from a channel; ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }

    /// A bounded channel and the source reading from it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl ChunkSource for ChannelSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.rx.recv().await)
    }
}

/// Adapts any stream of byte chunks.
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> ChunkSource for StreamSource<S>
where
    S: Stream<Item = Bytes> + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.inner.next().await)
    }
}
