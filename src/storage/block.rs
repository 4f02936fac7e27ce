//! Splitting a byte source into upload blocks.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use futures::stream::{self, Stream};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::models::ByteSource;

/// Reads up to `size` bytes, returning `None` once the source is exhausted.
///
/// A block shorter than `size` means the source hit EOF while filling it.
pub async fn read_block<R>(reader: &mut R, size: usize) -> io::Result<Option<Bytes>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        return Ok(None);
    }
    buf.truncate(filled);
    Ok(Some(Bytes::from(buf)))
}

/// Stream of successive blocks read from `source`.
pub fn block_stream(source: ByteSource, size: usize) -> impl Stream<Item = io::Result<Bytes>> + Send {
    stream::try_unfold(source, move |mut source| async move {
        let block = read_block(&mut source, size).await?;
        Ok::<_, io::Error>(block.map(|block| (block, source)))
    })
}

/// Block id for the block at `index`; ids within a blob share one length.
pub fn block_id(index: usize) -> String {
    BASE64.encode(format!("{index:08}"))
}
