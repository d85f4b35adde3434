//! Length-prefixed packet framing over a byte stream.
//!
//! ```text
//! +-------------------+----------------------------+
//! | length (4 bytes)  |   bincode-encoded Packet   |
//! | u32 little-endian |   (length bytes)           |
//! +-------------------+----------------------------+
//! ```

use crate::Packet;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const MAX_FRAME_PAYLOAD: u32 = 1_048_576;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: u32, max: u32 },

    /// The peer closed the stream, cleanly or mid-frame.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("malformed packet: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the stream can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::Malformed(_))
    }
}

pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FrameError::ConnectionClosed);
        }
        Err(e) => return Err(FrameError::Io(e)),
    }

    let payload_len = u32::from_le_bytes(len_buf);
    if payload_len > MAX_FRAME_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: MAX_FRAME_PAYLOAD,
        });
    }

    let mut payload = vec![0u8; payload_len as usize];
    if payload_len > 0 {
        reader.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FrameError::ConnectionClosed
            } else {
                FrameError::Io(e)
            }
        })?;
    }

    Ok(payload)
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), FrameError> {
    let len = payload.len() as u32;
    if len > MAX_FRAME_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_FRAME_PAYLOAD,
        });
    }

    writer.write_all(&len.to_le_bytes()).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;

    Ok(())
}

/// Reads one frame and decodes it.
///
/// A frame that arrives intact but does not decode yields
/// [`FrameError::Malformed`]; the stream stays aligned and may be read again.
pub async fn read_packet<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Packet, FrameError> {
    let payload = read_frame(reader).await?;
    Ok(Packet::decode(&payload)?)
}

pub async fn write_packet<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    packet: &Packet,
) -> Result<(), FrameError> {
    let payload = packet.encode()?;
    write_frame(writer, &payload).await
}
