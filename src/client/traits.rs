// ABOUTME: Extension point for PDUs a session receives without having asked for them
// ABOUTME: Handlers run on a dedicated task, fed by a bounded queue from the reader

use crate::pdu::Pdu;

/// Receives unsolicited PDUs from a bound session.
///
/// deliver_sm, data_sm, alert_notification and any response nobody waits
/// for end up here. deliver_sm has already been acknowledged by the time the
/// handler sees it.
///
/// Closures taking a [`Pdu`] are handlers:
///
/// ```
/// use smpp_session::client::Handler;
/// use smpp_session::pdu::Pdu;
///
/// fn accepts(_: impl Handler) {}
/// accepts(|pdu: Pdu| println!("{}", pdu.command_id()));
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, pdu: Pdu);
}

impl<F> Handler for F
where
    F: Fn(Pdu) + Send + Sync + 'static,
{
    fn handle(&self, pdu: Pdu) {
        self(pdu)
    }
}
