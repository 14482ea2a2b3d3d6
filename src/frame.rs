//! Length-prefixed framing of PDUs on a byte stream.
//!
//! The first four octets of every PDU carry its total length, so a frame is
//! complete once that many octets are buffered.

use crate::codec::{self, CodecError};
use crate::pdu::Pdu;
use bytes::Buf;
use std::io::Cursor;

/// Checks whether a whole PDU is buffered, returning its length.
///
/// `Incomplete` means more data is needed. A length outside 16..=4096 is an
/// error as soon as the four length octets are visible.
pub fn check(buf: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    let start = buf.position();
    let command_length = buf.get_u32();
    buf.set_position(start);

    codec::check_length(command_length)?;
    if buf.remaining() < command_length as usize {
        return Err(CodecError::Incomplete);
    }
    Ok(command_length as usize)
}

/// Decodes the frame `check` found at the front of `buf`.
pub fn parse(buf: &[u8], len: usize) -> Result<Pdu, CodecError> {
    Pdu::decode(&buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_waits_for_whole_frame() {
        let raw: &[u8] = &[0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x15, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(check(&mut Cursor::new(&raw[..3])), Err(CodecError::Incomplete)));
        assert!(matches!(check(&mut Cursor::new(&raw[..12])), Err(CodecError::Incomplete)));
        assert_eq!(check(&mut Cursor::new(raw)).unwrap(), 16);

        let pdu = parse(raw, 16).unwrap();
        assert_eq!(pdu.sequence(), 1);
    }

    #[test]
    fn check_rejects_bad_lengths_early() {
        assert!(matches!(
            check(&mut Cursor::new(&[0x00, 0x00, 0x00, 0x08][..])),
            Err(CodecError::MalformedHeader(_))
        ));
        assert!(matches!(
            check(&mut Cursor::new(&[0x00, 0x01, 0x00, 0x00][..])),
            Err(CodecError::OversizedPdu(0x10000))
        ));
    }
}
