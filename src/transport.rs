//! Length-prefixed packet framing (spec.md §4.3).
//!
//! A frame is `<VarInt total_length> <VarInt packet_id> <payload bytes>`,
//! `total_length` counting the ID plus payload.

use crate::error::{Result, ServerError};
use crate::wire::{read_varint, varint_len, write_varint};
use std::io::{Read, Write};

const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

/// One fully-read frame: its packet ID and raw payload bytes.
pub struct Frame {
    pub id: i32,
    pub payload: Vec<u8>,
}

/// Reads one frame. Fails with `FrameTooLarge` if length exceeds 2 MiB,
/// `ShortFrame` on EOF mid-frame.
pub fn read_frame(src: &mut impl Read) -> Result<Frame> {
    let total_len = match read_varint(src) {
        Ok(n) => n,
        Err(ServerError::IoCanceled) => return Err(ServerError::IoCanceled),
        Err(e) => return Err(e),
    };
    if total_len < 0 || total_len as usize > MAX_FRAME_LEN {
        return Err(ServerError::FrameTooLarge(total_len.max(0) as usize));
    }
    let mut body = vec![0u8; total_len as usize];
    src.read_exact(&mut body).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ServerError::ShortFrame
        } else {
            ServerError::from(e)
        }
    })?;
    let mut cursor = std::io::Cursor::new(body);
    let id = read_varint(&mut cursor)?;
    let mut payload = Vec::new();
    cursor.read_to_end(&mut payload)?;
    Ok(Frame { id, payload })
}

/// Writes `id` and `payload` as one frame in a single call, so the write is
/// never torn under the connection's write lock.
pub fn write_frame(id: i32, payload: &[u8], dst: &mut impl Write) -> Result<()> {
    let total_len = varint_len(id) + payload.len();
    let mut buf = Vec::with_capacity(varint_len(total_len as i32) + total_len);
    write_varint(total_len as i32, &mut buf)?;
    write_varint(id, &mut buf)?;
    buf.extend_from_slice(payload);
    dst.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_frame() {
        let mut w = Vec::new();
        write_frame(0x42, b"hello", &mut w).unwrap();
        let mut r = Cursor::new(w);
        let frame = read_frame(&mut r).unwrap();
        assert_eq!(frame.id, 0x42);
        assert_eq!(frame.payload, b"hello");
    }

    #[test]
    fn rejects_oversized_frame() {
        let mut w = Vec::new();
        write_varint((MAX_FRAME_LEN as i32) + 10, &mut w).unwrap();
        let mut r = Cursor::new(w);
        assert!(matches!(read_frame(&mut r), Err(ServerError::FrameTooLarge(_))));
    }

    #[test]
    fn reports_short_frame_on_truncated_payload() {
        let mut w = Vec::new();
        write_varint(10, &mut w).unwrap();
        w.extend_from_slice(b"ab");
        let mut r = Cursor::new(w);
        assert!(matches!(read_frame(&mut r), Err(ServerError::ShortFrame)));
    }
}
