//! Wire framing: `[command][payload...][crc_lo][crc_hi]`.
//!
//! The checksum covers the command byte and the payload and is appended
//! little-endian. A frame that fails validation is discarded in full;
//! nothing in it is trusted.

use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::crc16;
use crate::constants::CHECKSUM_SIZE;
use crate::error::CarmenError;

/// Build an outgoing frame from a command byte and its payload.
pub fn encode(command: u8, payload: &[u8]) -> Bytes {
    let mut frame = BytesMut::with_capacity(1 + payload.len() + CHECKSUM_SIZE);
    frame.put_u8(command);
    frame.put_slice(payload);
    let crc = crc16(&frame);
    frame.put_u16_le(crc);
    frame.freeze()
}

/// Validate the trailing checksum of an incoming frame.
///
/// On success the frame is returned unchanged, checksum intact, so callers
/// can still do checksum-included length checks before stripping it.
pub fn decode(raw: &[u8]) -> Result<&[u8], CarmenError> {
    if raw.len() < CHECKSUM_SIZE {
        return Err(CarmenError::FrameTooShort(raw.len()));
    }
    let (body, trailer) = raw.split_at(raw.len() - CHECKSUM_SIZE);
    let computed = crc16(body);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    if computed != received {
        return Err(CarmenError::ChecksumMismatch { computed, received });
    }
    Ok(raw)
}
