// ABOUTME: Mandatory PDU fields: names, wire shapes and the typed map that holds them
// ABOUTME: Setting a field checks its shape and keeps dependent length/count fields in step

use crate::codec::{self, CodecError};
use crate::datatypes::{CommandId, CommandStatus};
use crate::pdutext::Text;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;

/// Wire shape of a mandatory field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// One octet.
    Fixed,
    /// NUL terminated C-Octet String.
    Variable,
    /// `sm_length` octets, no terminator.
    ShortMessage,
    /// submit_multi dest_address entries, counted by number_of_dests.
    DestinationList,
    /// submit_multi_resp unsuccess_sme entries, counted by no_unsuccess.
    UnsuccessSme,
}

macro_rules! field_names {
    ($($variant:ident => $name:literal: $kind:ident),* $(,)?) => {
        /// Every mandatory field name used by the SMPP v3.4 command set.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum FieldName {
            $($variant),*
        }

        impl FieldName {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(FieldName::$variant => $name),*
                }
            }

            pub fn kind(&self) -> FieldKind {
                match self {
                    $(FieldName::$variant => FieldKind::$kind),*
                }
            }
        }
    };
}

field_names! {
    SystemId => "system_id": Variable,
    Password => "password": Variable,
    SystemType => "system_type": Variable,
    InterfaceVersion => "interface_version": Fixed,
    AddrTon => "addr_ton": Fixed,
    AddrNpi => "addr_npi": Fixed,
    AddressRange => "address_range": Variable,
    ServiceType => "service_type": Variable,
    SourceAddrTon => "source_addr_ton": Fixed,
    SourceAddrNpi => "source_addr_npi": Fixed,
    SourceAddr => "source_addr": Variable,
    DestAddrTon => "dest_addr_ton": Fixed,
    DestAddrNpi => "dest_addr_npi": Fixed,
    DestinationAddr => "destination_addr": Variable,
    NumberOfDests => "number_of_dests": Fixed,
    DestAddresses => "dest_address": DestinationList,
    EsmClass => "esm_class": Fixed,
    ProtocolId => "protocol_id": Fixed,
    PriorityFlag => "priority_flag": Fixed,
    ScheduleDeliveryTime => "schedule_delivery_time": Variable,
    ValidityPeriod => "validity_period": Variable,
    RegisteredDelivery => "registered_delivery": Fixed,
    ReplaceIfPresentFlag => "replace_if_present_flag": Fixed,
    DataCoding => "data_coding": Fixed,
    SmDefaultMsgId => "sm_default_msg_id": Fixed,
    SmLength => "sm_length": Fixed,
    ShortMessage => "short_message": ShortMessage,
    MessageId => "message_id": Variable,
    NoUnsuccess => "no_unsuccess": Fixed,
    UnsuccessSmes => "unsuccess_sme": UnsuccessSme,
    FinalDate => "final_date": Variable,
    MessageState => "message_state": Fixed,
    ErrorCode => "error_code": Fixed,
    EsmeAddrTon => "esme_addr_ton": Fixed,
    EsmeAddrNpi => "esme_addr_npi": Fixed,
    EsmeAddr => "esme_addr": Variable,
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submit_multi destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestAddress {
    /// dest_flag 1
    Sme { ton: u8, npi: u8, addr: String },
    /// dest_flag 2
    DistributionList(String),
}

impl DestAddress {
    pub fn sme(ton: u8, npi: u8, addr: impl Into<String>) -> Self {
        DestAddress::Sme {
            ton,
            npi,
            addr: addr.into(),
        }
    }

    fn encoded_size(&self) -> usize {
        match self {
            DestAddress::Sme { addr, .. } => 1 + 2 + addr.len() + 1,
            DestAddress::DistributionList(name) => 1 + name.len() + 1,
        }
    }
}

/// A destination the SMSC refused in a submit_multi_resp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsuccessSme {
    pub ton: u8,
    pub npi: u8,
    pub addr: String,
    pub error_status: CommandStatus,
}

/// A decoded mandatory field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Fixed(u8),
    /// C-string content without the terminator.
    Variable(Bytes),
    ShortMessage(Bytes),
    DestinationList(Vec<DestAddress>),
    UnsuccessSme(Vec<UnsuccessSme>),
}

impl Body {
    fn default_for(name: FieldName) -> Body {
        match name.kind() {
            FieldKind::Fixed if name == FieldName::InterfaceVersion => Body::Fixed(0x34),
            FieldKind::Fixed => Body::Fixed(0),
            FieldKind::Variable => Body::Variable(Bytes::new()),
            FieldKind::ShortMessage => Body::ShortMessage(Bytes::new()),
            FieldKind::DestinationList => Body::DestinationList(Vec::new()),
            FieldKind::UnsuccessSme => Body::UnsuccessSme(Vec::new()),
        }
    }

    fn encoded_size(&self) -> usize {
        match self {
            Body::Fixed(_) => 1,
            Body::Variable(b) => b.len() + 1,
            Body::ShortMessage(b) => b.len(),
            Body::DestinationList(list) => list.iter().map(DestAddress::encoded_size).sum(),
            Body::UnsuccessSme(list) => list.iter().map(|u| 2 + u.addr.len() + 1 + 4).sum(),
        }
    }
}

/// A value offered to [`FieldMap::set`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Octet(u8),
    Integer(i64),
    Str(String),
    Bytes(Bytes),
    Text(Text),
    Destinations(Vec<DestAddress>),
    Unsuccess(Vec<UnsuccessSme>),
}

impl FieldValue {
    fn describe(&self) -> &'static str {
        match self {
            FieldValue::Octet(_) => "an octet",
            FieldValue::Integer(_) => "an integer",
            FieldValue::Str(_) => "a string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Text(_) => "text",
            FieldValue::Destinations(_) => "a destination list",
            FieldValue::Unsuccess(_) => "an unsuccess_sme list",
        }
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::Octet(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v.into())
    }
}

impl From<&[u8]> for FieldValue {
    fn from(v: &[u8]) -> Self {
        FieldValue::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Text> for FieldValue {
    fn from(v: Text) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Vec<DestAddress>> for FieldValue {
    fn from(v: Vec<DestAddress>) -> Self {
        FieldValue::Destinations(v)
    }
}

impl From<Vec<UnsuccessSme>> for FieldValue {
    fn from(v: Vec<UnsuccessSme>) -> Self {
        FieldValue::Unsuccess(v)
    }
}

/// Mandatory fields of one PDU, laid out by its command's schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMap {
    command: CommandId,
    schema: &'static [FieldName],
    values: HashMap<FieldName, Body>,
}

impl FieldMap {
    /// An empty map for `command`; no field is present yet.
    pub fn empty(command: CommandId) -> Self {
        FieldMap {
            command,
            schema: super::schema::fields(command),
            values: HashMap::new(),
        }
    }

    /// A map with every schema field present at its default.
    pub fn with_defaults(command: CommandId) -> Self {
        let mut map = FieldMap::empty(command);
        for &name in map.schema {
            map.values.insert(name, Body::default_for(name));
        }
        map
    }

    pub fn schema(&self) -> &'static [FieldName] {
        self.schema
    }

    pub fn get(&self, name: FieldName) -> Option<&Body> {
        self.values.get(&name)
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.values.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &Body)> {
        self.schema
            .iter()
            .filter_map(|name| self.values.get(name).map(|body| (*name, body)))
    }

    pub fn octet(&self, name: FieldName) -> Option<u8> {
        match self.values.get(&name)? {
            Body::Fixed(v) => Some(*v),
            _ => None,
        }
    }

    /// A Variable field as text; invalid UTF-8 is replaced.
    pub fn string(&self, name: FieldName) -> Option<String> {
        match self.values.get(&name)? {
            Body::Variable(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }

    pub fn bytes(&self, name: FieldName) -> Option<&Bytes> {
        match self.values.get(&name)? {
            Body::Variable(b) | Body::ShortMessage(b) => Some(b),
            _ => None,
        }
    }

    pub fn destinations(&self) -> Option<&[DestAddress]> {
        match self.values.get(&FieldName::DestAddresses)? {
            Body::DestinationList(list) => Some(list),
            _ => None,
        }
    }

    pub fn unsuccess(&self) -> Option<&[UnsuccessSme]> {
        match self.values.get(&FieldName::UnsuccessSmes)? {
            Body::UnsuccessSme(list) => Some(list),
            _ => None,
        }
    }

    /// Set a field, checking the value fits its wire shape.
    ///
    /// short_message also sets sm_length, and data_coding when given
    /// [`Text`]. The destination and unsuccess lists set their counts.
    pub fn set(&mut self, name: FieldName, value: impl Into<FieldValue>) -> Result<(), CodecError> {
        if !self.schema.contains(&name) {
            return Err(CodecError::UnknownField {
                field: name.as_str(),
                command: self.command,
            });
        }
        let value = value.into();
        let mismatch = CodecError::FieldType {
            field: name.as_str(),
            given: value.describe(),
        };

        match (name.kind(), value) {
            (FieldKind::Fixed, FieldValue::Octet(v)) => {
                self.values.insert(name, Body::Fixed(v));
            }
            (FieldKind::Fixed, FieldValue::Integer(v)) => {
                let v = u8::try_from(v).map_err(|_| CodecError::MalformedField {
                    field: name.as_str(),
                    reason: format!("{v} does not fit in one octet"),
                })?;
                self.values.insert(name, Body::Fixed(v));
            }
            (FieldKind::Variable, FieldValue::Str(s)) => self.set_variable(name, Bytes::from(s))?,
            (FieldKind::Variable, FieldValue::Bytes(b)) => self.set_variable(name, b)?,
            (FieldKind::ShortMessage, FieldValue::Str(s)) => self.set_short_message(Bytes::from(s))?,
            (FieldKind::ShortMessage, FieldValue::Bytes(b)) => self.set_short_message(b)?,
            (FieldKind::ShortMessage, FieldValue::Text(text)) => {
                let encoded = text.encode()?;
                self.set_short_message(Bytes::from(encoded))?;
                if self.schema.contains(&FieldName::DataCoding) {
                    self.values
                        .insert(FieldName::DataCoding, Body::Fixed(text.data_coding()));
                }
            }
            (FieldKind::DestinationList, FieldValue::Destinations(list)) => {
                let count = count_octet(name, list.len())?;
                self.values.insert(FieldName::NumberOfDests, Body::Fixed(count));
                self.values.insert(name, Body::DestinationList(list));
            }
            (FieldKind::UnsuccessSme, FieldValue::Unsuccess(list)) => {
                let count = count_octet(name, list.len())?;
                self.values.insert(FieldName::NoUnsuccess, Body::Fixed(count));
                self.values.insert(name, Body::UnsuccessSme(list));
            }
            _ => return Err(mismatch),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: FieldName) -> Option<Body> {
        self.values.remove(&name)
    }

    fn set_variable(&mut self, name: FieldName, value: Bytes) -> Result<(), CodecError> {
        if value.contains(&0) {
            return Err(CodecError::MalformedField {
                field: name.as_str(),
                reason: "C-Octet String contains NUL".into(),
            });
        }
        self.values.insert(name, Body::Variable(value));
        Ok(())
    }

    fn set_short_message(&mut self, value: Bytes) -> Result<(), CodecError> {
        let len = u8::try_from(value.len()).map_err(|_| CodecError::MalformedField {
            field: "short_message",
            reason: format!("{} octets exceeds 255, use message_payload", value.len()),
        })?;
        self.values.insert(FieldName::SmLength, Body::Fixed(len));
        self.values.insert(FieldName::ShortMessage, Body::ShortMessage(value));
        Ok(())
    }

    pub(crate) fn encoded_size(&self) -> usize {
        self.iter().map(|(_, body)| body.encoded_size()).sum()
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        for (name, body) in self.iter() {
            match body {
                // sm_length always tracks the message actually written.
                Body::Fixed(v) if name == FieldName::SmLength => {
                    let len = match self.values.get(&FieldName::ShortMessage) {
                        Some(Body::ShortMessage(sm)) => sm.len() as u8,
                        _ => *v,
                    };
                    buf.put_u8(len);
                }
                Body::Fixed(v) => buf.put_u8(*v),
                Body::Variable(b) => codec::encode_cstring(buf, b),
                Body::ShortMessage(b) => buf.put_slice(b),
                Body::DestinationList(list) => {
                    for dest in list {
                        match dest {
                            DestAddress::Sme { ton, npi, addr } => {
                                buf.put_u8(1);
                                buf.put_u8(*ton);
                                buf.put_u8(*npi);
                                codec::encode_cstring(buf, addr.as_bytes());
                            }
                            DestAddress::DistributionList(name) => {
                                buf.put_u8(2);
                                codec::encode_cstring(buf, name.as_bytes());
                            }
                        }
                    }
                }
                Body::UnsuccessSme(list) => {
                    for sme in list {
                        buf.put_u8(sme.ton);
                        buf.put_u8(sme.npi);
                        codec::encode_cstring(buf, sme.addr.as_bytes());
                        buf.put_u32(sme.error_status.into());
                    }
                }
            }
        }
    }

    /// Decode mandatory fields in schema order.
    ///
    /// Running out of input at a field boundary, or inside a C-string, ends
    /// the list; later fields are left absent. Whatever follows the last
    /// field is left in `buf` for the TLV decoder.
    pub(crate) fn decode(command: CommandId, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let mut map = FieldMap::empty(command);
        for &name in map.schema {
            let kind = name.kind();
            // Counted fields still run at EOF so a non-zero count is caught.
            if !buf.has_remaining() && matches!(kind, FieldKind::Fixed | FieldKind::Variable) {
                break;
            }
            let body = match kind {
                FieldKind::Fixed => Body::Fixed(codec::decode_u8(buf)?),
                FieldKind::Variable => match codec::decode_cstring(buf) {
                    Ok(value) => Body::Variable(value),
                    Err(CodecError::Incomplete) => {
                        buf.advance(buf.remaining());
                        break;
                    }
                    Err(e) => return Err(e),
                },
                FieldKind::ShortMessage => {
                    let len = map.octet(FieldName::SmLength).unwrap_or(0) as usize;
                    let sm = codec::decode_octets(buf, len).map_err(|_| CodecError::MalformedField {
                        field: "short_message",
                        reason: format!("sm_length {} but {} octets remain", len, buf.remaining()),
                    })?;
                    Body::ShortMessage(sm)
                }
                FieldKind::DestinationList => {
                    let count = map.octet(FieldName::NumberOfDests).unwrap_or(0);
                    Body::DestinationList(decode_destinations(buf, count)?)
                }
                FieldKind::UnsuccessSme => {
                    let count = map.octet(FieldName::NoUnsuccess).unwrap_or(0);
                    Body::UnsuccessSme(decode_unsuccess(buf, count)?)
                }
            };
            map.values.insert(name, body);
        }
        Ok(map)
    }
}

fn count_octet(name: FieldName, len: usize) -> Result<u8, CodecError> {
    u8::try_from(len).map_err(|_| CodecError::MalformedField {
        field: name.as_str(),
        reason: format!("{len} entries exceeds 255"),
    })
}

fn list_string(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<String, CodecError> {
    let raw = codec::decode_cstring(buf).map_err(|_| truncated(field))?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

fn truncated(field: &'static str) -> CodecError {
    CodecError::MalformedField {
        field,
        reason: "truncated list entry".into(),
    }
}

fn decode_destinations(buf: &mut Cursor<&[u8]>, count: u8) -> Result<Vec<DestAddress>, CodecError> {
    const FIELD: &str = "dest_address";
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let flag = codec::decode_u8(buf).map_err(|_| truncated(FIELD))?;
        let dest = match flag {
            1 => {
                let ton = codec::decode_u8(buf).map_err(|_| truncated(FIELD))?;
                let npi = codec::decode_u8(buf).map_err(|_| truncated(FIELD))?;
                let addr = list_string(buf, FIELD)?;
                DestAddress::Sme { ton, npi, addr }
            }
            2 => DestAddress::DistributionList(list_string(buf, FIELD)?),
            other => {
                return Err(CodecError::MalformedField {
                    field: FIELD,
                    reason: format!("unknown dest_flag {other}"),
                });
            }
        };
        list.push(dest);
    }
    Ok(list)
}

fn decode_unsuccess(buf: &mut Cursor<&[u8]>, count: u8) -> Result<Vec<UnsuccessSme>, CodecError> {
    const FIELD: &str = "unsuccess_sme";
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let ton = codec::decode_u8(buf).map_err(|_| truncated(FIELD))?;
        let npi = codec::decode_u8(buf).map_err(|_| truncated(FIELD))?;
        let addr = list_string(buf, FIELD)?;
        let error_status = CommandStatus::from(codec::decode_u32(buf).map_err(|_| truncated(FIELD))?);
        list.push(UnsuccessSme {
            ton,
            npi,
            addr,
            error_status,
        });
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_checks_shapes() {
        let mut map = FieldMap::with_defaults(CommandId::SubmitSm);

        map.set(FieldName::EsmClass, 0x40u8).unwrap();
        map.set(FieldName::ProtocolId, 3i32).unwrap();
        assert_eq!(map.octet(FieldName::ProtocolId), Some(3));

        assert!(matches!(
            map.set(FieldName::EsmClass, 256i32),
            Err(CodecError::MalformedField { .. })
        ));
        assert!(matches!(
            map.set(FieldName::SourceAddr, 7u8),
            Err(CodecError::FieldType { field: "source_addr", .. })
        ));
        assert!(matches!(
            map.set(FieldName::SourceAddr, "bad\0addr"),
            Err(CodecError::MalformedField { .. })
        ));
        assert!(matches!(
            map.set(FieldName::SystemId, "x"),
            Err(CodecError::UnknownField { .. })
        ));
    }

    #[test]
    fn short_message_updates_length_and_coding() {
        let mut map = FieldMap::with_defaults(CommandId::SubmitSm);
        map.set(FieldName::ShortMessage, Text::ucs2("hi")).unwrap();

        assert_eq!(map.octet(FieldName::SmLength), Some(4));
        assert_eq!(map.octet(FieldName::DataCoding), Some(0x08));
        assert_eq!(
            map.bytes(FieldName::ShortMessage).map(|b| b.to_vec()),
            Some(vec![0x00, 0x68, 0x00, 0x69])
        );

        map.set(FieldName::ShortMessage, "plain").unwrap();
        assert_eq!(map.octet(FieldName::SmLength), Some(5));
        // Plain strings leave data_coding alone.
        assert_eq!(map.octet(FieldName::DataCoding), Some(0x08));
    }

    #[test]
    fn destination_list_sets_count() {
        let mut map = FieldMap::with_defaults(CommandId::SubmitMulti);
        map.set(
            FieldName::DestAddresses,
            vec![
                DestAddress::sme(1, 1, "4479"),
                DestAddress::DistributionList("ops".into()),
            ],
        )
        .unwrap();
        assert_eq!(map.octet(FieldName::NumberOfDests), Some(2));

        let mut buf = BytesMut::new();
        map.encode(&mut buf);
        let decoded = FieldMap::decode(CommandId::SubmitMulti, &mut Cursor::new(&buf[..])).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn decode_stops_at_field_boundary() {
        // submit_sm_resp with no message_id at all
        let decoded = FieldMap::decode(CommandId::SubmitSmResp, &mut Cursor::new(&[][..])).unwrap();
        assert!(decoded.is_empty());

        // bind_transmitter_resp whose system_id is cut short
        let raw: &[u8] = b"smsc";
        let decoded = FieldMap::decode(CommandId::BindTransmitterResp, &mut Cursor::new(raw)).unwrap();
        assert!(!decoded.contains(FieldName::SystemId));
    }

    #[test]
    fn short_message_overrun_is_malformed() {
        let mut map = FieldMap::with_defaults(CommandId::DeliverSm);
        map.set(FieldName::ShortMessage, "abc").unwrap();
        let mut buf = BytesMut::new();
        map.encode(&mut buf);
        let cut = &buf[..buf.len() - 1];

        assert!(matches!(
            FieldMap::decode(CommandId::DeliverSm, &mut Cursor::new(cut)),
            Err(CodecError::MalformedField { field: "short_message", .. })
        ));
    }
}
