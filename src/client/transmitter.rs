// ABOUTME: Application requests on a bound session: submit, long message split, query and cancel
// ABOUTME: Builds request PDUs from ShortMessage values and unpacks their responses

use crate::client::error::{SmppError, SmppResult};
use crate::client::session::Session;
use crate::client::types::{
    Destination, QueryResponse, ShortMessage, SubmitMultiResponse, SubmitResponse,
};
use crate::datatypes::{CommandId, MessageState, Tlv, TlvTag};
use crate::pdu::{DestAddress, FieldName, Pdu};
use crate::pdutext::{Coding, Text, TextError, gsm7};
use tracing::debug;

/// esm_class bit announcing a user data header.
pub const ESM_CLASS_UDHI: u8 = 0x40;

const SINGLE_OCTETS: usize = 140;
const SINGLE_SEPTETS: usize = 160;
/// 140 octets less the six octet concatenation header.
const SEGMENT_OCTETS: usize = 134;
/// Packed septets fitting beside the header, after one fill bit.
const SEGMENT_SEPTETS_PACKED: usize = 153;

/// Split `text` into concatenation segments when it does not fit one
/// message. Each segment is the encoded payload that follows the header.
///
/// Escaped GSM characters and UCS-2 surrogate pairs never straddle two
/// segments. Returns `None` when no split is needed.
pub fn split_segments(text: &Text) -> Result<Option<Vec<Vec<u8>>>, TextError> {
    let coding = text.coding;
    let fits = if coding.is_gsm7() {
        gsm7::septet_count(&text.content)? <= SINGLE_SEPTETS
    } else {
        text.encode()?.len() <= SINGLE_OCTETS
    };
    if fits {
        return Ok(None);
    }

    let limit = match coding {
        Coding::Gsm7Packed => SEGMENT_SEPTETS_PACKED,
        _ => SEGMENT_OCTETS,
    };
    let mut segments = Vec::new();
    let mut current: Vec<u8> = Vec::with_capacity(limit);
    let mut utf8 = [0u8; 4];
    for ch in text.content.chars() {
        let ch = ch.encode_utf8(&mut utf8);
        let unit = if coding.is_gsm7() {
            gsm7::to_septets(ch)?
        } else {
            coding.encode(ch)?
        };
        if !current.is_empty() && current.len() + unit.len() > limit {
            segments.push(std::mem::replace(&mut current, Vec::with_capacity(limit)));
        }
        current.extend_from_slice(&unit);
    }
    if !current.is_empty() {
        segments.push(current);
    }

    if coding == Coding::Gsm7Packed {
        // Six header octets are 48 bits; one fill bit reaches a septet boundary.
        segments = segments.iter().map(|septets| gsm7::pack(septets, 1)).collect();
    }
    Ok(Some(segments))
}

/// Concatenation header: IEI 0x00 with an 8-bit reference.
fn concat_header(reference: u8, total: u8, seq: u8) -> [u8; 6] {
    [0x05, 0x00, 0x03, reference, total, seq]
}

/// Fill the fields submit_sm and submit_multi share.
fn apply_message(pdu: &mut Pdu, sm: &ShortMessage, payload: Vec<u8>, esm_class: u8) -> SmppResult<()> {
    pdu.set(FieldName::ServiceType, sm.service_type.as_str())?;
    pdu.set(FieldName::SourceAddrTon, u8::from(sm.src_ton))?;
    pdu.set(FieldName::SourceAddrNpi, u8::from(sm.src_npi))?;
    pdu.set(FieldName::SourceAddr, sm.src.as_str())?;
    pdu.set(FieldName::EsmClass, esm_class)?;
    pdu.set(FieldName::ProtocolId, sm.protocol_id)?;
    pdu.set(FieldName::PriorityFlag, u8::from(sm.priority_flag))?;
    pdu.set(FieldName::ScheduleDeliveryTime, sm.schedule_delivery_time.as_str())?;
    pdu.set(FieldName::ValidityPeriod, sm.validity_period.as_str())?;
    pdu.set(FieldName::RegisteredDelivery, u8::from(sm.registered_delivery))?;
    pdu.set(FieldName::DataCoding, sm.text.data_coding())?;

    // short_message holds at most 255 octets; beyond that use message_payload.
    if payload.len() > usize::from(u8::MAX) {
        pdu.set(FieldName::ShortMessage, Vec::<u8>::new())?;
        pdu.set_tlv(Tlv::new(TlvTag::MessagePayload, payload));
    } else {
        pdu.set(FieldName::ShortMessage, payload)?;
    }
    for tlv in &sm.tlvs {
        pdu.set_tlv(tlv.clone());
    }
    Ok(())
}

pub(crate) fn submit_sm_pdu(sm: &ShortMessage, payload: Vec<u8>, esm_class: u8) -> SmppResult<Pdu> {
    let mut pdu = Pdu::new(CommandId::SubmitSm);
    pdu.set(FieldName::DestAddrTon, u8::from(sm.dst_ton))?;
    pdu.set(FieldName::DestAddrNpi, u8::from(sm.dst_npi))?;
    pdu.set(FieldName::DestinationAddr, sm.dst.as_str())?;
    apply_message(&mut pdu, sm, payload, esm_class)?;
    Ok(pdu)
}

fn submit_response(pdu: Pdu) -> SubmitResponse {
    SubmitResponse {
        message_id: pdu.message_id().unwrap_or_default(),
        pdu,
    }
}

impl Session {
    fn ensure_transmitter(&self) -> SmppResult<()> {
        if self.config().credentials.bind_type.can_transmit() {
            Ok(())
        } else {
            Err(SmppError::InvalidData(
                "receiver sessions cannot submit messages".into(),
            ))
        }
    }

    /// Submit one short message and wait for submit_sm_resp.
    pub async fn submit(&self, sm: &ShortMessage) -> SmppResult<SubmitResponse> {
        self.ensure_transmitter()?;
        let payload = sm.text.encode()?;
        let pdu = submit_sm_pdu(sm, payload, sm.esm_class)?;
        let resp = self.request(pdu).await?;
        Ok(submit_response(resp))
    }

    /// Submit a message of any length, splitting it into concatenated
    /// segments when it does not fit one.
    ///
    /// Segments go out in order. The first segment's response is returned;
    /// any failing segment fails the whole call.
    pub async fn submit_long_msg(&self, sm: &ShortMessage) -> SmppResult<SubmitResponse> {
        self.ensure_transmitter()?;
        let Some(segments) = split_segments(&sm.text)? else {
            return self.submit(sm).await;
        };
        let total = u8::try_from(segments.len()).map_err(|_| {
            SmppError::InvalidData(format!("{} segments exceeds 255", segments.len()))
        })?;
        let reference: u8 = rand::random();
        debug!(segments = total, reference, "submitting concatenated message");

        let mut first = None;
        for (seq, segment) in (1..=total).zip(segments) {
            let mut payload = concat_header(reference, total, seq).to_vec();
            payload.extend_from_slice(&segment);
            let pdu = submit_sm_pdu(sm, payload, sm.esm_class | ESM_CLASS_UDHI)?;
            let resp = self.request(pdu).await?;
            first.get_or_insert(resp);
        }
        first
            .map(submit_response)
            .ok_or_else(|| SmppError::InvalidData("message produced no segments".into()))
    }

    /// Submit one message to several destinations.
    pub async fn submit_multi(
        &self,
        sm: &ShortMessage,
        destinations: &[Destination],
    ) -> SmppResult<SubmitMultiResponse> {
        self.ensure_transmitter()?;
        if destinations.is_empty() {
            return Err(SmppError::InvalidData("submit_multi needs a destination".into()));
        }
        let mut pdu = Pdu::new(CommandId::SubmitMulti);
        let dests: Vec<DestAddress> = destinations.iter().map(DestAddress::from).collect();
        pdu.set(FieldName::DestAddresses, dests)?;
        apply_message(&mut pdu, sm, sm.text.encode()?, sm.esm_class)?;

        let resp = self.request(pdu).await?;
        Ok(SubmitMultiResponse {
            message_id: resp.message_id().unwrap_or_default(),
            unsuccess: resp.fields().unsuccess().map(<[_]>::to_vec).unwrap_or_default(),
            pdu: resp,
        })
    }

    /// Ask the SMSC for the state of a submitted message.
    pub async fn query_sm(&self, message_id: &str, source: &str) -> SmppResult<QueryResponse> {
        let mut pdu = Pdu::new(CommandId::QuerySm);
        pdu.set(FieldName::MessageId, message_id)?;
        pdu.set(FieldName::SourceAddr, source)?;

        let resp = self.request(pdu).await?;
        Ok(QueryResponse {
            message_id: resp.message_id().unwrap_or_default(),
            final_date: resp.string(FieldName::FinalDate).unwrap_or_default(),
            message_state: MessageState::from(resp.octet(FieldName::MessageState).unwrap_or(0)),
            error_code: resp.octet(FieldName::ErrorCode).unwrap_or(0),
            pdu: resp,
        })
    }

    /// Cancel a message that has not been delivered yet.
    pub async fn cancel_sm(&self, message_id: &str, source: &str, destination: &str) -> SmppResult<()> {
        let mut pdu = Pdu::new(CommandId::CancelSm);
        pdu.set(FieldName::MessageId, message_id)?;
        pdu.set(FieldName::SourceAddr, source)?;
        pdu.set(FieldName::DestinationAddr, destination)?;
        self.request(pdu).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::RegisteredDelivery;

    #[test]
    fn short_text_is_not_split() {
        assert!(split_segments(&Text::gsm7_packed("a".repeat(160))).unwrap().is_none());
        assert!(split_segments(&Text::latin1("a".repeat(140))).unwrap().is_none());
        assert!(split_segments(&Text::ucs2("Ж".repeat(70))).unwrap().is_none());
    }

    #[test]
    fn packed_gsm_splits_at_153_septets() {
        let segments = split_segments(&Text::gsm7_packed("a".repeat(161))).unwrap().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 134);
        assert_eq!(gsm7::unpack(&segments[0], 1).len(), 153);
        assert_eq!(gsm7::unpack(&segments[1], 1)[..8], [0x61; 8]);
    }

    #[test]
    fn unpacked_gsm_splits_at_134_septets() {
        let segments = split_segments(&Text::gsm7("b".repeat(200))).unwrap().unwrap();
        assert_eq!(segments.iter().map(Vec::len).collect::<Vec<_>>(), vec![134, 66]);
    }

    #[test]
    fn escape_is_never_split() {
        let text = format!("{}€{}", "a".repeat(152), "a".repeat(10));
        let segments = split_segments(&Text::gsm7(text)).unwrap().unwrap();
        // 152 + 2 would pass the 134 limit, so the split falls earlier
        assert_eq!(segments[0].len(), 134);

        let text = format!("{}€{}", "a".repeat(133), "a".repeat(40));
        let segments = split_segments(&Text::gsm7(text)).unwrap().unwrap();
        assert_eq!(segments[0].len(), 133);
        assert_eq!(&segments[1][..2], &[0x1B, 0x65]);
    }

    #[test]
    fn ucs2_segments_hold_whole_characters() {
        let segments = split_segments(&Text::ucs2("Ж".repeat(71))).unwrap().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 134);
        assert_eq!(segments[1].len(), 8);

        let emoji = "😀".repeat(40);
        let segments = split_segments(&Text::new(Coding::Ucs2Lenient, emoji)).unwrap().unwrap();
        assert!(segments.iter().all(|s| s.len() % 4 == 0));
        assert_eq!(segments[0].len(), 132);
    }

    #[test]
    fn raw_segments_keep_utf8_intact() {
        let segments = split_segments(&Text::raw("é".repeat(80))).unwrap().unwrap();
        for segment in &segments {
            assert!(std::str::from_utf8(segment).is_ok());
        }
    }

    #[test]
    fn submit_pdu_carries_message_fields() {
        let sm = ShortMessage::new("src", "dst", Text::latin1("hello"))
            .registered_delivery(RegisteredDelivery::FinalDeliveryReceipt)
            .validity_period("000001000000000R".into());
        let pdu = submit_sm_pdu(&sm, sm.text.encode().unwrap(), sm.esm_class).unwrap();
        assert_eq!(pdu.string(FieldName::SourceAddr).as_deref(), Some("src"));
        assert_eq!(pdu.string(FieldName::DestinationAddr).as_deref(), Some("dst"));
        assert_eq!(pdu.octet(FieldName::RegisteredDelivery), Some(1));
        assert_eq!(pdu.octet(FieldName::DataCoding), Some(0x03));
        assert_eq!(pdu.octet(FieldName::SmLength), Some(5));
        assert_eq!(pdu.text().unwrap(), "hello");
    }

    #[test]
    fn oversized_payload_moves_to_message_payload() {
        let sm = ShortMessage::new("src", "dst", Text::raw("x".repeat(300)));
        let pdu = submit_sm_pdu(&sm, sm.text.encode().unwrap(), 0).unwrap();
        assert_eq!(pdu.octet(FieldName::SmLength), Some(0));
        assert_eq!(pdu.tlvs().get(TlvTag::MessagePayload).unwrap().value.len(), 300);
        assert_eq!(pdu.payload().len(), 300);
    }

    #[test]
    fn concat_header_layout() {
        assert_eq!(concat_header(0xAB, 3, 2), [0x05, 0x00, 0x03, 0xAB, 0x03, 0x02]);
    }
}
