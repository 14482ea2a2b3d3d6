// SMPP v3.4 Codec - wire level primitives shared by every PDU
//
// The header, the error type and the octet/C-string helpers live here. The
// command specific layout is described by the schemas in `pdu`, which drive
// these helpers rather than each command carrying its own parser.

use crate::datatypes::{CommandId, CommandStatus};
use crate::pdutext::TextError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Largest PDU accepted or produced, header included.
pub const MAX_PDU_SIZE: u32 = 4096;

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    ///
    /// Status codes outside the v3.4 table and zero sequence numbers are
    /// accepted; peers in the wild send both.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::MalformedHeader(format!(
                "header needs {} octets, got {}",
                Self::SIZE,
                buf.remaining()
            )));
        }

        let command_length = buf.get_u32();
        check_length(command_length)?;

        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::UnsupportedCommand(command_id_raw))?;
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id.into());
        buf.put_u32(self.command_status.into());
        buf.put_u32(self.sequence_number);
    }
}

/// Validate a command_length against the 16..=4096 window.
pub fn check_length(command_length: u32) -> Result<(), CodecError> {
    if command_length < PduHeader::SIZE as u32 {
        return Err(CodecError::MalformedHeader(format!(
            "command_length {command_length} is shorter than the header"
        )));
    }
    if command_length > MAX_PDU_SIZE {
        return Err(CodecError::OversizedPdu(command_length));
    }
    Ok(())
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode into the buffer
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without actually encoding
    fn encoded_size(&self) -> usize;

    /// Encode into a fresh buffer and freeze it.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("PDU of {0} octets exceeds the {MAX_PDU_SIZE} octet limit")]
    OversizedPdu(u32),

    #[error("Field '{field}' is malformed: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("Malformed TLV: {0}")]
    MalformedTlv(String),

    #[error("Unsupported command_id: {0:#010x}")]
    UnsupportedCommand(u32),

    #[error("Field '{field}' cannot hold {given}")]
    FieldType { field: &'static str, given: &'static str },

    #[error("{command} has no field '{field}'")]
    UnknownField { field: &'static str, command: CommandId },

    #[error("{0} has no response PDU")]
    NoResponse(CommandId),

    #[error("Text encoding error: {0}")]
    Text(#[from] TextError),
}

/// Convert codec errors to appropriate SMPP command_status codes
impl CodecError {
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::Incomplete
            | CodecError::MalformedHeader(_)
            | CodecError::OversizedPdu(_) => CommandStatus::InvalidCommandLength,
            CodecError::UnsupportedCommand(_) => CommandStatus::InvalidCommandId,
            CodecError::MalformedField { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" | "sm_length" => CommandStatus::InvalidMsgLength,
                "dest_address" | "number_of_dests" => CommandStatus::InvalidNumberOfDestinations,
                _ => CommandStatus::SystemError,
            },
            CodecError::MalformedTlv(_) => CommandStatus::ErrorInOptionalPartOfPduBody,
            _ => CommandStatus::SystemError,
        }
    }
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Decode a NUL terminated C-Octet String, returning the content without
/// the terminator. `Incomplete` when the buffer ends before a NUL.
pub fn decode_cstring(buf: &mut Cursor<&[u8]>) -> Result<Bytes, CodecError> {
    let nul = buf
        .chunk()
        .iter()
        .position(|&b| b == 0)
        .ok_or(CodecError::Incomplete)?;
    let value = buf.copy_to_bytes(nul);
    buf.advance(1);
    Ok(value)
}

/// Decode exactly `len` octets
pub fn decode_octets(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.copy_to_bytes(len))
}

/// Encode a C-Octet String with its NUL terminator
pub fn encode_cstring(buf: &mut BytesMut, value: &[u8]) {
    buf.put_slice(value);
    buf.put_u8(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let raw: [u8; 16] = [
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // enquire_link
            0x00, 0x00, 0x00, 0x00, // status
            0x00, 0x00, 0x00, 0x07, // sequence
        ];
        let header = PduHeader::decode(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(header.command_id, CommandId::EnquireLink);
        assert_eq!(header.sequence_number, 7);

        let mut out = BytesMut::new();
        header.encode(&mut out);
        assert_eq!(&out[..], &raw[..]);
    }

    #[test]
    fn header_length_bounds() {
        let mut too_short = [0u8; 16];
        too_short[3] = 0x0F;
        too_short[7] = 0x15;
        assert!(matches!(
            PduHeader::decode(&mut Cursor::new(&too_short[..])),
            Err(CodecError::MalformedHeader(_))
        ));

        let mut too_long = [0u8; 16];
        too_long[2] = 0x10;
        too_long[3] = 0x01;
        too_long[7] = 0x15;
        assert!(matches!(
            PduHeader::decode(&mut Cursor::new(&too_long[..])),
            Err(CodecError::OversizedPdu(4097))
        ));

        assert!(matches!(
            PduHeader::decode(&mut Cursor::new(&[0u8, 0, 0][..])),
            Err(CodecError::MalformedHeader(_))
        ));
    }

    #[test]
    fn unknown_command_and_status() {
        let mut raw = [0u8; 16];
        raw[3] = 0x10;
        raw[7] = 0x0A;
        assert!(matches!(
            PduHeader::decode(&mut Cursor::new(&raw[..])),
            Err(CodecError::UnsupportedCommand(0x0A))
        ));

        raw[4] = 0x80;
        raw[7] = 0x04;
        raw[10] = 0x04;
        let header = PduHeader::decode(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(header.command_status, CommandStatus::Unknown(0x400));
    }

    #[test]
    fn cstring_helpers() {
        let raw: &[u8] = b"abc\0de";
        let mut cursor = Cursor::new(raw);
        assert_eq!(&decode_cstring(&mut cursor).unwrap()[..], b"abc");
        assert!(matches!(decode_cstring(&mut cursor), Err(CodecError::Incomplete)));

        let mut out = BytesMut::new();
        encode_cstring(&mut out, b"xy");
        assert_eq!(&out[..], b"xy\0");
    }

    #[test]
    fn codec_errors_map_to_status() {
        assert_eq!(
            CodecError::OversizedPdu(5000).to_command_status(),
            CommandStatus::InvalidCommandLength
        );
        assert_eq!(
            CodecError::UnsupportedCommand(0x0A).to_command_status(),
            CommandStatus::InvalidCommandId
        );
        assert_eq!(
            CodecError::MalformedTlv(String::new()).to_command_status(),
            CommandStatus::ErrorInOptionalPartOfPduBody
        );
    }
}
