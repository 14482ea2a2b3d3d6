// ABOUTME: Request handlers for the test server: echo, a stub SMSC and closures
// ABOUTME: A handler maps one inbound PDU to the PDUs written back, in order

use crate::datatypes::{CommandId, CommandStatus, MessageState, RegisteredDelivery};
use crate::pdu::{FieldName, Pdu};
use crate::pdutext::Text;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Decides what the server writes back for each PDU a bound client sends.
///
/// Returned requests with sequence number 0 are given one by the server.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, pdu: &Pdu) -> Vec<Pdu>;
}

impl<F> RequestHandler for F
where
    F: Fn(&Pdu) -> Vec<Pdu> + Send + Sync + 'static,
{
    fn handle(&self, pdu: &Pdu) -> Vec<Pdu> {
        self(pdu)
    }
}

/// Writes every PDU back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl RequestHandler for EchoHandler {
    fn handle(&self, pdu: &Pdu) -> Vec<Pdu> {
        vec![pdu.clone()]
    }
}

/// Answers like a well behaved SMSC without delivering anything.
///
/// submit_sm gets a numbered message id, and a delivery receipt follows
/// when registered_delivery asks for one.
#[derive(Debug, Default)]
pub struct StubHandler {
    next_id: AtomicU64,
}

impl StubHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn message_id(&self) -> String {
        format!("{:010}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn respond(&self, pdu: &Pdu) -> Result<Vec<Pdu>, crate::codec::CodecError> {
        let mut resp = pdu.response()?;
        let mut out = Vec::with_capacity(2);
        match pdu.command_id() {
            CommandId::SubmitSm => {
                let id = self.message_id();
                resp.set(FieldName::MessageId, id.as_str())?;
                out.push(resp);
                let flags = pdu.octet(FieldName::RegisteredDelivery).unwrap_or(0);
                if RegisteredDelivery::requests_receipt(flags) {
                    out.push(delivery_receipt(pdu, &id)?);
                }
                return Ok(out);
            }
            CommandId::SubmitMulti | CommandId::DataSm => {
                resp.set(FieldName::MessageId, self.message_id())?;
            }
            CommandId::QuerySm => {
                resp.set(FieldName::MessageId, pdu.message_id().unwrap_or_default())?;
                resp.set(FieldName::MessageState, u8::from(MessageState::Delivered))?;
            }
            _ => {}
        }
        out.push(resp);
        Ok(out)
    }
}

impl RequestHandler for StubHandler {
    fn handle(&self, pdu: &Pdu) -> Vec<Pdu> {
        if pdu.is_response() || pdu.command_id() == CommandId::GenericNack {
            return Vec::new();
        }
        match self.respond(pdu) {
            Ok(out) => out,
            Err(e) => {
                debug!(command = %pdu.command_id(), error = %e, "cannot answer request");
                vec![Pdu::generic_nack(pdu.sequence(), e.to_command_status())]
            }
        }
    }
}

/// A deliver_sm receipt for `submit`, sent back to its originator.
fn delivery_receipt(submit: &Pdu, message_id: &str) -> Result<Pdu, crate::codec::CodecError> {
    let text = submit.text().unwrap_or_default();
    let excerpt: String = text.chars().take(20).collect();
    let now = receipt_date(Utc::now());
    let body = format!(
        "id:{message_id} sub:001 dlvrd:001 submit date:{now} done date:{now} stat:DELIVRD err:000 text:{excerpt}"
    );

    let mut receipt = Pdu::new(CommandId::DeliverSm);
    receipt.set(FieldName::SourceAddr, submit.string(FieldName::DestinationAddr).unwrap_or_default())?;
    receipt.set(FieldName::DestinationAddr, submit.string(FieldName::SourceAddr).unwrap_or_default())?;
    receipt.set(FieldName::EsmClass, 0x04u8)?;
    receipt.set(FieldName::ShortMessage, Text::raw(body))?;
    Ok(receipt)
}

/// YYMMDDhhmm in UTC.
fn receipt_date(time: DateTime<Utc>) -> String {
    time.format("%y%m%d%H%M").to_string()
}

/// A handler answering every request with `status`.
pub fn reject_all(status: CommandStatus) -> impl RequestHandler {
    move |pdu: &Pdu| match pdu.response() {
        Ok(mut resp) => {
            resp.set_status(status);
            vec![resp]
        }
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DeliveryReceipt;
    use chrono::TimeZone;

    fn submit(registered: u8) -> Pdu {
        let mut pdu = Pdu::new(CommandId::SubmitSm);
        pdu.set(FieldName::SourceAddr, "alice").unwrap();
        pdu.set(FieldName::DestinationAddr, "bob").unwrap();
        pdu.set(FieldName::RegisteredDelivery, registered).unwrap();
        pdu.set(FieldName::ShortMessage, Text::raw("hi bob")).unwrap();
        pdu.set_sequence(12);
        pdu
    }

    #[test]
    fn echo_returns_input() {
        let pdu = submit(0);
        assert_eq!(EchoHandler.handle(&pdu), vec![pdu]);
    }

    #[test]
    fn stub_numbers_messages() {
        let stub = StubHandler::new();
        let first = stub.handle(&submit(0));
        let second = stub.handle(&submit(0));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].command_id(), CommandId::SubmitSmResp);
        assert_eq!(first[0].sequence(), 12);
        assert_eq!(first[0].message_id().as_deref(), Some("0000000001"));
        assert_eq!(second[0].message_id().as_deref(), Some("0000000002"));
    }

    #[test]
    fn stub_sends_receipt_when_asked() {
        let out = StubHandler::new().handle(&submit(1));
        assert_eq!(out.len(), 2);
        let receipt = &out[1];
        assert_eq!(receipt.command_id(), CommandId::DeliverSm);
        assert_eq!(receipt.sequence(), 0);
        assert_eq!(receipt.string(FieldName::SourceAddr).as_deref(), Some("bob"));
        assert_eq!(receipt.string(FieldName::DestinationAddr).as_deref(), Some("alice"));

        let parsed = DeliveryReceipt::parse(&receipt.text().unwrap()).unwrap();
        assert_eq!(parsed.id, "0000000001");
        assert_eq!(parsed.text, "hi bob");
        assert!(parsed.is_delivered());
    }

    #[test]
    fn stub_ignores_responses_and_answers_enquire_link() {
        let stub = StubHandler::new();
        let mut resp = Pdu::new(CommandId::DeliverSmResp);
        resp.set_sequence(3);
        assert!(stub.handle(&resp).is_empty());

        let mut ping = Pdu::new(CommandId::EnquireLink);
        ping.set_sequence(4);
        let out = stub.handle(&ping);
        assert_eq!(out[0].command_id(), CommandId::EnquireLinkResp);
        assert_eq!(out[0].sequence(), 4);
    }

    #[test]
    fn stub_nacks_requests_without_response() {
        let out = StubHandler::new().handle(&Pdu::new(CommandId::AlertNotification));
        assert_eq!(out[0].command_id(), CommandId::GenericNack);
    }

    #[test]
    fn receipt_date_format() {
        let time = Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 59).unwrap();
        assert_eq!(receipt_date(time), "2402291345");
    }

    #[test]
    fn reject_all_sets_status() {
        let handler = reject_all(CommandStatus::ThrottlingError);
        let out = handler.handle(&submit(0));
        assert_eq!(out[0].status(), CommandStatus::ThrottlingError);
    }
}
