// ABOUTME: Broadcast of inbound deliver_sm messages to any number of subscribers
// ABOUTME: Also parses the de facto delivery receipt text format carried in receipts

use crate::client::traits::Handler;
use crate::datatypes::CommandId;
use crate::pdu::{FieldName, Pdu};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

/// Messages a slow subscriber may fall behind before it misses deliveries.
pub const SUBSCRIBER_CAPACITY: usize = 10;

/// esm_class message type bits marking an SMSC delivery receipt.
const ESM_DELIVERY_RECEIPT: u8 = 0x04;

/// One deliver_sm as seen by subscribers.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub src: String,
    pub dst: String,
    /// Message text decoded with the announced data_coding.
    pub text: String,
    /// Set when esm_class marks the message as a delivery receipt.
    pub receipt: Option<DeliveryReceipt>,
    pub pdu: Pdu,
}

impl DeliveryEvent {
    fn from_pdu(pdu: Pdu) -> Self {
        let text = match pdu.text() {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "deliver_sm text did not decode, using lossy UTF-8");
                String::from_utf8_lossy(pdu.payload()).into_owned()
            }
        };
        let esm_class = pdu.octet(FieldName::EsmClass).unwrap_or(0);
        let receipt = if esm_class & 0x3C == ESM_DELIVERY_RECEIPT {
            DeliveryReceipt::parse(&text)
        } else {
            None
        };
        DeliveryEvent {
            src: pdu.string(FieldName::SourceAddr).unwrap_or_default(),
            dst: pdu.string(FieldName::DestinationAddr).unwrap_or_default(),
            text,
            receipt,
            pdu,
        }
    }
}

/// Fields of a delivery receipt's text.
///
/// The layout is `id:I sub:S dlvrd:D submit date:T done date:T stat:S err:E
/// text:...`. Keys are matched case-insensitively; missing ones stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub id: String,
    pub sub: String,
    pub dlvrd: String,
    pub submit_date: String,
    pub done_date: String,
    pub stat: String,
    pub err: String,
    pub text: String,
}

impl DeliveryReceipt {
    const KEYS: [&'static str; 8] = [
        "id:",
        "sub:",
        "dlvrd:",
        "submit date:",
        "done date:",
        "stat:",
        "err:",
        "text:",
    ];

    /// Parse receipt text. Returns `None` without at least `id:` and `stat:`.
    pub fn parse(text: &str) -> Option<DeliveryReceipt> {
        let lower = text.to_ascii_lowercase();

        // (key index, key start, value start), ordered by position
        let mut found: Vec<(usize, usize, usize)> = Vec::new();
        let mut from = 0;
        for (i, key) in Self::KEYS.iter().enumerate() {
            if let Some(pos) = lower[from..].find(key) {
                let start = from + pos;
                found.push((i, start, start + key.len()));
                from = start + key.len();
            }
        }
        let has = |i: usize| found.iter().any(|&(k, _, _)| k == i);
        if !has(0) || !has(5) {
            return None;
        }

        let mut values: [String; 8] = Default::default();
        for (n, &(key, _, value_start)) in found.iter().enumerate() {
            let value_end = found.get(n + 1).map_or(text.len(), |&(_, next, _)| next);
            values[key] = text[value_start..value_end].trim().to_owned();
        }

        let [id, sub, dlvrd, submit_date, done_date, stat, err, text] = values;
        Some(DeliveryReceipt {
            id,
            sub,
            dlvrd,
            submit_date,
            done_date,
            stat,
            err,
            text,
        })
    }

    pub fn is_delivered(&self) -> bool {
        self.stat.eq_ignore_ascii_case("DELIVRD")
    }
}

/// A subscriber's end of a [`DeliveryFanout`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<DeliveryEvent>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next delivery, or `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<DeliveryEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<DeliveryEvent> {
        self.rx.try_recv().ok()
    }
}

/// Handler broadcasting every deliver_sm to all current subscribers.
///
/// Clones share one subscriber set; install a clone as the session handler
/// and subscribe through another.
#[derive(Debug, Clone, Default)]
pub struct DeliveryFanout {
    inner: Arc<Subscribers>,
}

#[derive(Debug, Default)]
struct Subscribers {
    next_id: AtomicU64,
    senders: Mutex<Vec<(u64, mpsc::Sender<DeliveryEvent>)>>,
}

impl DeliveryFanout {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> MutexGuard<'_, Vec<(u64, mpsc::Sender<DeliveryEvent>)>> {
        self.inner.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.senders().push((id, tx));
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, subscription: &Subscription) {
        self.senders().retain(|(id, _)| *id != subscription.id);
    }

    pub fn subscribers(&self) -> usize {
        self.senders().len()
    }

    /// Send `event` to every subscriber without waiting on any of them.
    pub fn broadcast(&self, event: DeliveryEvent) {
        self.senders().retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(subscriber = id, "subscriber full, delivery dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

impl Handler for DeliveryFanout {
    fn handle(&self, pdu: Pdu) {
        if pdu.command_id() == CommandId::DeliverSm {
            self.broadcast(DeliveryEvent::from_pdu(pdu));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdutext::Text;

    fn deliver(text: &str) -> Pdu {
        let mut pdu = Pdu::new(CommandId::DeliverSm);
        pdu.set(FieldName::SourceAddr, "root").unwrap();
        pdu.set(FieldName::DestinationAddr, "client").unwrap();
        pdu.set(FieldName::ShortMessage, Text::latin1(text)).unwrap();
        pdu
    }

    #[test]
    fn parses_standard_receipt() {
        let receipt = DeliveryReceipt::parse(
            "id:0000000042 sub:001 dlvrd:001 submit date:2410191200 done date:2410191201 stat:DELIVRD err:000 text:Hello there",
        )
        .unwrap();
        assert_eq!(receipt.id, "0000000042");
        assert_eq!(receipt.submit_date, "2410191200");
        assert_eq!(receipt.done_date, "2410191201");
        assert_eq!(receipt.err, "000");
        assert_eq!(receipt.text, "Hello there");
        assert!(receipt.is_delivered());
    }

    #[test]
    fn receipt_needs_id_and_stat() {
        assert!(DeliveryReceipt::parse("delivery receipt here").is_none());
        let partial = DeliveryReceipt::parse("ID:7 STAT:UNDELIV").unwrap();
        assert_eq!(partial.id, "7");
        assert_eq!(partial.stat, "UNDELIV");
        assert!(partial.sub.is_empty());
    }

    #[test]
    fn every_subscriber_sees_a_delivery() {
        let fanout = DeliveryFanout::new();
        let mut subs: Vec<_> = (0..3).map(|_| fanout.subscribe()).collect();
        fanout.handle(deliver("hi"));
        for sub in &mut subs {
            let event = sub.try_recv().unwrap();
            assert_eq!(event.text, "hi");
            assert_eq!(event.src, "root");
            assert_eq!(event.dst, "client");
            assert!(event.receipt.is_none());
        }
    }

    #[test]
    fn full_subscriber_only_loses_the_overflow() {
        let fanout = DeliveryFanout::new();
        let mut slow = fanout.subscribe();
        let mut fast = fanout.subscribe();
        for i in 0..SUBSCRIBER_CAPACITY + 2 {
            fanout.handle(deliver(&i.to_string()));
            assert_eq!(fast.try_recv().unwrap().text, i.to_string());
        }
        let mut received = 0;
        while slow.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_CAPACITY);
    }

    #[test]
    fn unsubscribed_receivers_are_dropped() {
        let fanout = DeliveryFanout::new();
        let sub = fanout.subscribe();
        let other = fanout.subscribe();
        fanout.unsubscribe(&sub);
        assert_eq!(fanout.subscribers(), 1);
        drop(other);
        fanout.handle(deliver("x"));
        assert_eq!(fanout.subscribers(), 0);
    }

    #[test]
    fn receipt_is_parsed_from_flagged_deliveries() {
        let mut pdu = deliver("id:abc sub:001 dlvrd:001 submit date:2401010000 done date:2401010001 stat:DELIVRD err:000 text:");
        pdu.set(FieldName::EsmClass, ESM_DELIVERY_RECEIPT).unwrap();
        let event = DeliveryEvent::from_pdu(pdu);
        assert_eq!(event.receipt.unwrap().id, "abc");
    }
}
