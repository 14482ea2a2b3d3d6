//! Requests waiting for their responses, keyed by sequence number.

use crate::client::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Waiter = oneshot::Sender<SmppResult<Pdu>>;

/// A registered request. Dropping it frees the window slot, whether the
/// response arrived, the wait timed out or the caller gave up.
#[derive(Debug)]
pub(crate) struct Pending<'a> {
    table: &'a InFlight,
    seq: u32,
    rx: oneshot::Receiver<SmppResult<Pdu>>,
}

impl Pending<'_> {
    /// Wait for the response. An error means the table was torn down.
    pub(crate) async fn response(&mut self) -> Result<SmppResult<Pdu>, oneshot::error::RecvError> {
        (&mut self.rx).await
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.table.remove(self.seq);
    }
}

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    waiters: Mutex<HashMap<u32, Waiter>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Register a waiter for `seq`. A `window` of zero is unlimited.
    pub(crate) fn register(&self, seq: u32, window: usize) -> SmppResult<Pending<'_>> {
        let mut waiters = self.lock();
        if window > 0 && waiters.len() >= window {
            return Err(SmppError::MaxWindowSize);
        }
        let (tx, rx) = oneshot::channel();
        waiters.insert(seq, tx);
        Ok(Pending { table: self, seq, rx })
    }

    pub(crate) fn remove(&self, seq: u32) {
        self.lock().remove(&seq);
    }

    /// Hand `pdu` to whoever waits on its sequence number.
    ///
    /// Gives the PDU back when nobody does.
    pub(crate) fn complete(&self, pdu: Pdu) -> Option<Pdu> {
        let waiter = self.lock().remove(&pdu.sequence());
        match waiter {
            Some(tx) => {
                // The caller may have timed out in the meantime.
                let _ = tx.send(Ok(pdu));
                None
            }
            None => Some(pdu),
        }
    }

    /// Fail every waiter with `NotConnected`.
    pub(crate) fn fail_all(&self) {
        let waiters: Vec<Waiter> = self.lock().drain().map(|(_, tx)| tx).collect();
        for tx in waiters {
            let _ = tx.send(Err(SmppError::NotConnected));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::CommandId;

    fn response(seq: u32) -> Pdu {
        let mut pdu = Pdu::new(CommandId::SubmitSmResp);
        pdu.set_sequence(seq);
        pdu
    }

    #[tokio::test]
    async fn response_reaches_its_waiter() {
        let inflight = InFlight::default();
        let mut pending = inflight.register(5, 0).unwrap();
        assert!(inflight.complete(response(6)).is_some());
        assert!(inflight.complete(response(5)).is_none());
        assert_eq!(pending.response().await.unwrap().unwrap().sequence(), 5);
        assert_eq!(inflight.len(), 0);
    }

    #[test]
    fn window_limits_registrations() {
        let inflight = InFlight::default();
        let a = inflight.register(1, 2).unwrap();
        let _b = inflight.register(2, 2).unwrap();
        assert!(matches!(inflight.register(3, 2), Err(SmppError::MaxWindowSize)));
        drop(a);
        assert_eq!(inflight.len(), 1);
        assert!(inflight.register(3, 2).is_ok());
    }

    #[tokio::test]
    async fn abandoned_wait_frees_its_slot() {
        let inflight = InFlight::default();
        let mut pending = inflight.register(7, 1).unwrap();
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending.response()).await;
        assert!(waited.is_err());
        assert_eq!(inflight.len(), 1);
        drop(pending);
        assert_eq!(inflight.len(), 0);
        assert!(inflight.complete(response(7)).is_some());
    }

    #[tokio::test]
    async fn teardown_fails_waiters() {
        let inflight = InFlight::default();
        let mut pending = inflight.register(9, 0).unwrap();
        inflight.fail_all();
        assert!(matches!(pending.response().await.unwrap(), Err(SmppError::NotConnected)));
        assert_eq!(inflight.len(), 0);
    }
}
