// ABOUTME: Optional parameters (TLVs) of SMPP v3.4 Section 5.3
// ABOUTME: A tag-keyed map that keeps arrival order so decoded PDUs re-encode byte for byte

use crate::codec::{CodecError, Encodable};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::io::Cursor;

/// Optional parameter tags (SMPP v3.4 Section 5.3.2).
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TlvTag {
    DestAddrSubunit = 0x0005,
    DestNetworkType = 0x0006,
    DestBearerType = 0x0007,
    DestTelematicsId = 0x0008,
    SourceAddrSubunit = 0x000D,
    SourceNetworkType = 0x000E,
    SourceBearerType = 0x000F,
    SourceTelematicsId = 0x0010,
    QosTimeToLive = 0x0017,
    PayloadType = 0x0019,
    AdditionalStatusInfoText = 0x001D,
    ReceiptedMessageId = 0x001E,
    MsMsgWaitFacilities = 0x0030,
    PrivacyIndicator = 0x0201,
    SourceSubaddress = 0x0202,
    DestSubaddress = 0x0203,
    UserMessageReference = 0x0204,
    UserResponseCode = 0x0205,
    SourcePort = 0x020A,
    DestinationPort = 0x020B,
    SarMsgRefNum = 0x020C,
    LanguageIndicator = 0x020D,
    SarTotalSegments = 0x020E,
    SarSegmentSeqnum = 0x020F,
    ScInterfaceVersion = 0x0210,
    CallbackNumPresInd = 0x0302,
    CallbackNumAtag = 0x0303,
    NumberOfMessages = 0x0304,
    CallbackNum = 0x0381,
    DpfResult = 0x0420,
    SetDpf = 0x0421,
    MsAvailabilityStatus = 0x0422,
    NetworkErrorCode = 0x0423,
    MessagePayload = 0x0424,
    DeliveryFailureReason = 0x0425,
    MoreMessagesToSend = 0x0426,
    MessageState = 0x0427,
    UssdServiceOp = 0x0501,
    DisplayTime = 0x1201,
    SmsSignal = 0x1203,
    MsValidity = 0x1204,
    AlertOnMessageDelivery = 0x130C,
    ItsReplyType = 0x1380,
    ItsSessionInfo = 0x1383,
    /// Vendor specific or reserved tag
    #[num_enum(catch_all)]
    Other(u16),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: TlvTag,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written on the wire ahead of it.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: TlvTag, value: impl Into<Bytes>) -> Self {
        Tlv {
            tag,
            value: value.into(),
        }
    }

    pub fn from_u8(tag: TlvTag, value: u8) -> Self {
        Tlv::new(tag, vec![value])
    }

    pub fn from_u16(tag: TlvTag, value: u16) -> Self {
        Tlv::new(tag, value.to_be_bytes().to_vec())
    }

    pub fn from_u32(tag: TlvTag, value: u32) -> Self {
        Tlv::new(tag, value.to_be_bytes().to_vec())
    }

    /// A C-Octet String value, NUL terminated on the wire.
    pub fn from_cstring(tag: TlvTag, value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        Tlv::new(tag, bytes)
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self.value.as_ref() {
            [b] => Some(*b),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        let bytes: [u8; 2] = self.value.as_ref().try_into().ok()?;
        Some(u16::from_be_bytes(bytes))
    }

    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.value.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// The value as text, without a trailing NUL.
    pub fn as_str(&self) -> Option<&str> {
        let raw = self.value.as_ref();
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        std::str::from_utf8(raw).ok()
    }
}

impl Encodable for Tlv {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len()).map_err(|_| {
            CodecError::MalformedTlv(format!(
                "value of tag {:#06x} is {} octets",
                u16::from(self.tag),
                self.value.len()
            ))
        })?;
        buf.put_u16(self.tag.into());
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }
}

/// Optional parameters of one PDU, keyed by tag.
///
/// Entries keep the order they were inserted or decoded in. Setting a tag
/// that is already present replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlvMap {
    entries: Vec<Tlv>,
}

impl TlvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: TlvTag) -> Option<&Tlv> {
        self.entries.iter().find(|tlv| tlv.tag == tag)
    }

    pub fn contains(&self, tag: TlvTag) -> bool {
        self.get(tag).is_some()
    }

    pub fn set(&mut self, tlv: Tlv) {
        match self.entries.iter_mut().find(|t| t.tag == tlv.tag) {
            Some(existing) => existing.value = tlv.value,
            None => self.entries.push(tlv),
        }
    }

    pub fn remove(&mut self, tag: TlvTag) -> Option<Tlv> {
        let index = self.entries.iter().position(|tlv| tlv.tag == tag)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tlv> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode TLV triples until the buffer is exhausted.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let mut map = TlvMap::new();
        while buf.has_remaining() {
            if buf.remaining() < 4 {
                return Err(CodecError::MalformedTlv(format!(
                    "{} trailing octets cannot hold a TLV header",
                    buf.remaining()
                )));
            }
            let tag = TlvTag::from(buf.get_u16());
            let length = buf.get_u16() as usize;
            if buf.remaining() < length {
                return Err(CodecError::MalformedTlv(format!(
                    "tag {:#06x} declares {} octets, {} remain",
                    u16::from(tag),
                    length,
                    buf.remaining()
                )));
            }
            let value = buf.copy_to_bytes(length);
            map.set(Tlv { tag, value });
        }
        Ok(map)
    }
}

impl Encodable for TlvMap {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        for tlv in &self.entries {
            tlv.encode(buf)?;
        }
        Ok(())
    }

    fn encoded_size(&self) -> usize {
        self.entries.iter().map(Encodable::encoded_size).sum()
    }
}

impl FromIterator<Tlv> for TlvMap {
    fn from_iter<I: IntoIterator<Item = Tlv>>(iter: I) -> Self {
        let mut map = TlvMap::new();
        for tlv in iter {
            map.set(tlv);
        }
        map
    }
}
