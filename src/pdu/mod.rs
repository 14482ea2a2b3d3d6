//! SMPP v3.4 PDUs.
//!
//! A [`Pdu`] is a header, a [`FieldMap`] of mandatory fields laid out by the
//! command's schema, and a [`TlvMap`] of optional parameters. There is one
//! type for every command; the schema decides which fields exist.
//!
//! ```
//! use smpp_session::codec::Encodable;
//! use smpp_session::datatypes::CommandId;
//! use smpp_session::pdu::{FieldName, Pdu};
//! use smpp_session::pdutext::Text;
//!
//! let mut pdu = Pdu::new(CommandId::SubmitSm);
//! pdu.set(FieldName::DestinationAddr, "447700900123").unwrap();
//! pdu.set(FieldName::ShortMessage, Text::latin1("¡hola!")).unwrap();
//! pdu.set_sequence(7);
//!
//! let bytes = pdu.to_bytes().unwrap();
//! let decoded = Pdu::decode(&bytes).unwrap();
//! assert_eq!(decoded, pdu);
//! ```

mod field;
pub mod schema;

pub use field::{Body, DestAddress, FieldKind, FieldMap, FieldName, FieldValue, UnsuccessSme};

use crate::codec::{CodecError, Encodable, MAX_PDU_SIZE, PduHeader};
use crate::datatypes::{CommandId, CommandStatus, DataCoding, Tlv, TlvMap, TlvTag};
use crate::pdutext::{Coding, TextError};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pdu {
    command_id: CommandId,
    command_status: CommandStatus,
    sequence_number: u32,
    fields: FieldMap,
    tlvs: TlvMap,
}

impl Pdu {
    /// A PDU with every mandatory field at its default, status Ok and
    /// sequence 0.
    pub fn new(command_id: CommandId) -> Self {
        Pdu {
            command_id,
            command_status: CommandStatus::Ok,
            sequence_number: 0,
            fields: FieldMap::with_defaults(command_id),
            tlvs: TlvMap::new(),
        }
    }

    pub fn generic_nack(sequence_number: u32, status: CommandStatus) -> Self {
        let mut pdu = Pdu::new(CommandId::GenericNack);
        pdu.sequence_number = sequence_number;
        pdu.command_status = status;
        pdu
    }

    /// The response to this request, carrying the same sequence number.
    pub fn response(&self) -> Result<Pdu, CodecError> {
        let id = self
            .command_id
            .response_id()
            .ok_or(CodecError::NoResponse(self.command_id))?;
        let mut resp = Pdu::new(id);
        resp.sequence_number = self.sequence_number;
        Ok(resp)
    }

    /// Decode one complete PDU. The buffer must hold exactly
    /// command_length octets.
    pub fn decode(buf: &[u8]) -> Result<Pdu, CodecError> {
        let mut cursor = Cursor::new(buf);
        let header = PduHeader::decode(&mut cursor)?;
        if header.command_length as usize != buf.len() {
            return Err(CodecError::MalformedHeader(format!(
                "command_length {} but frame holds {} octets",
                header.command_length,
                buf.len()
            )));
        }

        let fields = FieldMap::decode(header.command_id, &mut cursor)?;
        let tlvs = if cursor.has_remaining() {
            TlvMap::decode(&mut cursor)?
        } else {
            TlvMap::new()
        };

        Ok(Pdu {
            command_id: header.command_id,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            fields,
            tlvs,
        })
    }

    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    pub fn status(&self) -> CommandStatus {
        self.command_status
    }

    pub fn set_status(&mut self, status: CommandStatus) {
        self.command_status = status;
    }

    pub fn sequence(&self) -> u32 {
        self.sequence_number
    }

    pub fn set_sequence(&mut self, sequence_number: u32) {
        self.sequence_number = sequence_number;
    }

    pub fn is_response(&self) -> bool {
        self.command_id.is_response()
    }

    pub fn header(&self) -> PduHeader {
        PduHeader {
            command_length: self.encoded_size() as u32,
            command_id: self.command_id,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    pub fn tlvs(&self) -> &TlvMap {
        &self.tlvs
    }

    pub fn tlvs_mut(&mut self) -> &mut TlvMap {
        &mut self.tlvs
    }

    /// Shorthand for `fields_mut().set(..)`.
    pub fn set(&mut self, name: FieldName, value: impl Into<FieldValue>) -> Result<(), CodecError> {
        self.fields.set(name, value)
    }

    pub fn set_tlv(&mut self, tlv: Tlv) {
        self.tlvs.set(tlv);
    }

    pub fn string(&self, name: FieldName) -> Option<String> {
        self.fields.string(name)
    }

    pub fn octet(&self, name: FieldName) -> Option<u8> {
        self.fields.octet(name)
    }

    pub fn message_id(&self) -> Option<String> {
        self.fields.string(FieldName::MessageId)
    }

    pub fn data_coding(&self) -> DataCoding {
        DataCoding::from_byte(self.fields.octet(FieldName::DataCoding).unwrap_or(0))
    }

    /// The message octets: short_message, or the message_payload TLV when
    /// short_message is empty.
    pub fn payload(&self) -> &[u8] {
        match self.fields.bytes(FieldName::ShortMessage) {
            Some(sm) if !sm.is_empty() => sm,
            _ => self
                .tlvs
                .get(TlvTag::MessagePayload)
                .map(|tlv| tlv.value.as_ref())
                .unwrap_or_default(),
        }
    }

    /// The message decoded with the coding its data_coding announces.
    pub fn text(&self) -> Result<String, TextError> {
        let coding = Coding::for_data_coding(self.data_coding().to_byte());
        coding.decode(self.payload())
    }
}

impl Encodable for Pdu {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = self.encoded_size();
        if length > MAX_PDU_SIZE as usize {
            return Err(CodecError::OversizedPdu(length as u32));
        }
        buf.reserve(length);
        buf.put_u32(length as u32);
        buf.put_u32(self.command_id.into());
        buf.put_u32(self.command_status.into());
        buf.put_u32(self.sequence_number);
        self.fields.encode(buf);
        self.tlvs.encode(buf)
    }

    fn encoded_size(&self) -> usize {
        PduHeader::SIZE + self.fields.encoded_size() + self.tlvs.encoded_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_transmitter_bytes() {
        let mut pdu = Pdu::new(CommandId::BindTransmitter);
        pdu.set(FieldName::SystemId, "smppclient1").unwrap();
        pdu.set(FieldName::Password, "password").unwrap();
        pdu.set(FieldName::InterfaceVersion, 0x34u8).unwrap();
        pdu.set_sequence(1);

        let expected: &[u8] = &[
            0x00, 0x00, 0x00, 0x2A, // command_length
            0x00, 0x00, 0x00, 0x02, // bind_transmitter
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
            0x73, 0x6D, 0x70, 0x70, 0x63, 0x6C, 0x69, 0x65, 0x6E, 0x74, 0x31, 0x00, // system_id
            0x70, 0x61, 0x73, 0x73, 0x77, 0x6F, 0x72, 0x64, 0x00, // password
            0x00, // system_type
            0x34, // interface_version
            0x00, // addr_ton
            0x00, // addr_npi
            0x00, // address_range
        ];
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(&bytes[..], expected);

        let decoded = Pdu::decode(expected).unwrap();
        assert_eq!(decoded.command_id(), CommandId::BindTransmitter);
        assert_eq!(decoded.sequence(), 1);
        assert_eq!(decoded.string(FieldName::SystemId).as_deref(), Some("smppclient1"));
        assert_eq!(decoded.string(FieldName::Password).as_deref(), Some("password"));
        assert_eq!(decoded.octet(FieldName::InterfaceVersion), Some(0x34));
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn submit_sm_mutation() {
        let original: &[u8] = &[
            0x00, 0x00, 0x00, 0x2D, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x02, // header
            0x00, // service_type
            0x00, 0x00, 0x74, 0x65, 0x73, 0x74, 0x00, // source "test"
            0x00, 0x00, 0x74, 0x65, 0x73, 0x74, 0x32, 0x00, // destination "test2"
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // esm_class..sm_default_msg_id
            0x03, 0x6D, 0x73, 0x67, // sm_length, "msg"
        ];
        let mut pdu = Pdu::decode(original).unwrap();
        assert_eq!(pdu.to_bytes().unwrap(), original);
        assert_eq!(pdu.string(FieldName::DestinationAddr).as_deref(), Some("test2"));

        pdu.set(FieldName::ShortMessage, "test1").unwrap();
        let bytes = pdu.to_bytes().unwrap();

        assert_eq!(bytes.len(), 0x2F);
        assert_eq!(&bytes[..4], &[0x00, 0x00, 0x00, 0x2F]);
        assert_eq!(&bytes[4..41], &original[4..41]);
        assert_eq!(&bytes[41..], &[0x05, 0x74, 0x65, 0x73, 0x74, 0x31]);
    }

    #[test]
    fn tlvs_follow_mandatory_fields() {
        let mut resp = Pdu::new(CommandId::BindTransceiverResp);
        resp.set(FieldName::SystemId, "smsc").unwrap();
        resp.set_tlv(Tlv::from_u8(TlvTag::ScInterfaceVersion, 0x34));
        resp.set_sequence(9);

        let bytes = resp.to_bytes().unwrap();
        assert_eq!(&bytes[16..], &[b's', b'm', b's', b'c', 0, 0x02, 0x10, 0x00, 0x01, 0x34]);
        assert_eq!(resp.header().command_length as usize, bytes.len());

        let decoded = Pdu::decode(&bytes).unwrap();
        assert_eq!(
            decoded.tlvs().get(TlvTag::ScInterfaceVersion).and_then(Tlv::as_u8),
            Some(0x34)
        );
    }

    #[test]
    fn response_echoes_sequence() {
        let mut req = Pdu::new(CommandId::QuerySm);
        req.set_sequence(77);
        let resp = req.response().unwrap();
        assert_eq!(resp.command_id(), CommandId::QuerySmResp);
        assert_eq!(resp.sequence(), 77);
        assert_eq!(u32::from(resp.command_id()), u32::from(req.command_id()) | 0x8000_0000);

        assert!(matches!(
            Pdu::new(CommandId::Outbind).response(),
            Err(CodecError::NoResponse(CommandId::Outbind))
        ));
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let mut bytes = Pdu::new(CommandId::EnquireLink).to_bytes().unwrap().to_vec();
        bytes.push(0);
        assert!(matches!(Pdu::decode(&bytes), Err(CodecError::MalformedHeader(_))));
        assert!(matches!(Pdu::decode(&bytes[..15]), Err(CodecError::MalformedHeader(_))));
    }

    #[test]
    fn oversized_pdu_is_rejected_on_encode() {
        let mut pdu = Pdu::new(CommandId::DataSm);
        pdu.set_tlv(Tlv::new(TlvTag::MessagePayload, vec![b'x'; 4096]));
        assert!(matches!(pdu.to_bytes(), Err(CodecError::OversizedPdu(_))));
    }

    #[test]
    fn text_uses_data_coding() {
        let mut pdu = Pdu::new(CommandId::DeliverSm);
        pdu.set(FieldName::ShortMessage, crate::pdutext::Text::ucs2("Привет")).unwrap();
        let decoded = Pdu::decode(&pdu.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.data_coding(), DataCoding::Ucs2);
        assert_eq!(decoded.text().unwrap(), "Привет");

        let mut payload = Pdu::new(CommandId::DeliverSm);
        payload.set_tlv(Tlv::new(TlvTag::MessagePayload, b"long body".to_vec()));
        assert_eq!(payload.text().unwrap(), "long body");
    }

    #[test]
    fn every_command_round_trips_with_defaults() {
        for raw in [
            0x8000_0000u32, 1, 0x8000_0001, 2, 0x8000_0002, 3, 0x8000_0003, 4, 0x8000_0004, 5,
            0x8000_0005, 6, 0x8000_0006, 7, 0x8000_0007, 8, 0x8000_0008, 9, 0x8000_0009, 0x0B,
            0x15, 0x8000_0015, 0x21, 0x8000_0021, 0x102, 0x103, 0x8000_0103,
        ] {
            let id = CommandId::try_from(raw).unwrap();
            let pdu = Pdu::new(id);
            let bytes = pdu.to_bytes().unwrap();
            assert_eq!(Pdu::decode(&bytes).unwrap(), pdu, "{id}");
        }
    }
}
