// ABOUTME: Bound SMPP session: connect, bind, dispatch inbound PDUs and reconnect with backoff
// ABOUTME: One background task owns the reader; callers share the writer through a swappable slot

use crate::client::builder::SessionConfig;
use crate::client::error::{SmppError, SmppResult};
use crate::client::inflight::InFlight;
use crate::client::keepalive::{self, KeepAliveStats, KeepAliveStatus};
use crate::client::traits::Handler;
use crate::client::types::{ConnStatus, ConnStatusKind, check_status};
use crate::connection::{Connection, ConnectionReader, ConnectionWriter};
use crate::datatypes::CommandId;
use crate::pdu::{FieldName, Pdu};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Largest sequence number handed out before wrapping back to 1.
pub const MAX_SEQUENCE: u32 = 0x7FFF_FFFF;

/// Longest pause between reconnect attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// How long `close` waits for unbind_resp.
const UNBIND_TIMEOUT: Duration = Duration::from_secs(1);

/// Sequence numbers for outbound requests: 1, 2, ... 0x7FFFFFFF, 1, ...
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last: AtomicU32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start so that the next number handed out follows `last`.
    pub fn starting_after(last: u32) -> Self {
        Self {
            last: AtomicU32::new(last),
        }
    }

    pub fn next(&self) -> u32 {
        let advance = |seq: u32| if seq >= MAX_SEQUENCE { 1 } else { seq + 1 };
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |seq| Some(advance(seq)))
            .unwrap_or_else(|seq| seq);
        advance(previous)
    }
}

/// Exponential reconnect delay: 1s, then times e per attempt, capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    pub const INITIAL: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self {
            next: Self::INITIAL,
        }
    }

    /// The delay to wait now; the following one grows by e.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.mul_f64(std::f64::consts::E).min(MAX_BACKOFF);
        delay
    }

    pub fn reset(&mut self) {
        self.next = Self::INITIAL;
    }
}

/// State shared by every clone of a session and its background tasks.
pub(crate) struct Shared {
    pub(crate) config: SessionConfig,
    /// Writer of the bound connection, if any.
    conn: RwLock<Option<Arc<ConnectionWriter>>>,
    bound: AtomicBool,
    closing: AtomicBool,
    pub(crate) sequence: Arc<SequenceCounter>,
    pub(crate) inflight: InFlight,
    status_tx: mpsc::Sender<ConnStatus>,
    status_rx: Mutex<Option<mpsc::Receiver<ConnStatus>>>,
    shutdown: watch::Sender<bool>,
    keepalive: Arc<KeepAliveStats>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// A client session that binds and stays bound until closed.
///
/// `Session` is a cheap handle; clones share the same connection. The bind
/// runs in the background, so requests made before the first bind completes
/// fail with [`SmppError::NotBound`]. Watch [`Session::status_events`] for
/// [`ConnStatusKind::Connected`].
#[derive(Clone)]
pub struct Session {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.shared.config.address)
            .field("bound", &self.is_bound())
            .field("inflight", &self.shared.inflight.len())
            .finish()
    }
}

/// Why a bound connection ended.
enum Exit {
    Closing,
    Lost(SmppError),
}

impl Session {
    /// Start connecting and binding in the background.
    ///
    /// Failed connects and binds are retried with backoff until
    /// [`Session::close`] is called. Must run inside a Tokio runtime.
    pub fn bind(config: SessionConfig) -> Session {
        let (status_tx, status_rx) = mpsc::channel(config.status_capacity.max(1));
        let (shutdown, _) = watch::channel(false);

        let handler_tx = config.handler.clone().map(|handler| {
            let (tx, rx) = mpsc::channel(config.handler_queue.max(1));
            tokio::spawn(run_handler(handler, rx));
            tx
        });

        let shared = Arc::new(Shared {
            config,
            conn: RwLock::new(None),
            bound: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            sequence: Arc::new(SequenceCounter::new()),
            inflight: InFlight::default(),
            status_tx,
            status_rx: Mutex::new(Some(status_rx)),
            shutdown,
            keepalive: Arc::new(KeepAliveStats::default()),
            task: Mutex::new(None),
        });

        let task = tokio::spawn(Arc::clone(&shared).run(handler_tx));
        *shared.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        Session { shared }
    }

    /// Connectivity events, in order. Only the first call gets the stream.
    pub fn status_events(&self) -> Option<mpsc::Receiver<ConnStatus>> {
        self.shared
            .status_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_bound(&self) -> bool {
        self.shared.bound.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Requests currently waiting for a response.
    pub fn inflight(&self) -> usize {
        self.shared.inflight.len()
    }

    pub fn keepalive_status(&self) -> KeepAliveStatus {
        self.shared.keepalive.snapshot()
    }

    /// Send any request and wait for its response.
    ///
    /// The sequence number is assigned here. A generic_nack or a non-zero
    /// command_status comes back as [`SmppError::Status`].
    pub async fn request(&self, pdu: Pdu) -> SmppResult<Pdu> {
        let expected = pdu.command_id().response_id().ok_or_else(|| {
            SmppError::InvalidData(format!("{} has no response", pdu.command_id()))
        })?;
        let resp = self
            .exchange(pdu, self.shared.config.response_timeout)
            .await?;

        if let Some(limiter) = &self.shared.config.rate_limiter {
            limiter.on_response(resp.status()).await;
        }
        match resp.command_id() {
            CommandId::GenericNack => Err(SmppError::Status(resp.status())),
            actual if actual != expected => Err(SmppError::UnexpectedPdu { expected, actual }),
            _ => check_status(resp),
        }
    }

    /// Write a PDU that needs no answer, such as a response built by a
    /// handler. The sequence number is left as is.
    pub async fn respond(&self, pdu: Pdu) -> SmppResult<()> {
        let writer = self.writer().await?;
        writer.write_pdu(&pdu).await
    }

    /// Unbind and stop reconnecting.
    ///
    /// Waits up to a second for unbind_resp, then drops the connection and
    /// fails outstanding requests with [`SmppError::NotConnected`]. Calling it
    /// again does nothing.
    pub async fn close(&self) -> SmppResult<()> {
        if self.shared.closing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if self.is_bound() {
            let unbind = Pdu::new(CommandId::Unbind);
            match self.exchange(unbind, UNBIND_TIMEOUT).await {
                Ok(resp) => debug!(status = %resp.status(), "unbind acknowledged"),
                Err(e) => debug!(error = %e, "unbind not acknowledged"),
            }
        }

        self.shared.shutdown.send_replace(true);
        let task = self
            .shared
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "session task failed");
            }
        }
        Ok(())
    }

    async fn writer(&self) -> SmppResult<Arc<ConnectionWriter>> {
        if !self.is_bound() {
            return Err(SmppError::NotBound);
        }
        self.shared.conn.read().await.clone().ok_or(SmppError::NotBound)
    }

    /// Correlate one request with its response by sequence number.
    async fn exchange(&self, mut pdu: Pdu, wait: Duration) -> SmppResult<Pdu> {
        let writer = self.writer().await?;
        let window = self.shared.config.window;
        if window > 0 && self.shared.inflight.len() >= window {
            return Err(SmppError::MaxWindowSize);
        }
        if let Some(limiter) = &self.shared.config.rate_limiter {
            limiter.acquire().await;
        }

        let seq = self.shared.sequence.next();
        pdu.set_sequence(seq);
        // The entry leaves the table when `pending` drops, even if this
        // future is cancelled.
        let mut pending = self.shared.inflight.register(seq, window)?;
        writer.write_pdu(&pdu).await?;

        match tokio::time::timeout(wait, pending.response()).await {
            Ok(Ok(result)) => result,
            // Dropped without an answer: the table was torn down.
            Ok(Err(_)) => Err(SmppError::NotConnected),
            Err(_) => Err(SmppError::Timeout),
        }
    }
}

impl Shared {
    fn emit(&self, kind: ConnStatusKind, cause: Option<String>) {
        let status = ConnStatus::new(kind, cause);
        if let Err(e) = self.status_tx.try_send(status) {
            debug!(error = %e, "status event dropped");
        }
    }

    fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire) || *self.shutdown.borrow()
    }

    /// Connect, bind, serve, repeat until closed.
    async fn run(self: Arc<Self>, handler_tx: Option<mpsc::Sender<Pdu>>) {
        let mut shutdown = self.shutdown.subscribe();
        let mut backoff = Backoff::new();
        let address = self.config.address.clone();

        while !self.is_closing() {
            let attempt = tokio::select! {
                res = self.connect_and_bind() => res,
                _ = shutdown.changed() => break,
            };
            match attempt {
                Ok((reader, writer)) => {
                    backoff.reset();
                    info!(address = %address, system_id = %self.config.credentials.system_id, "bound");
                    self.emit(ConnStatusKind::Connected, None);

                    let exit = self
                        .serve(reader, Arc::clone(&writer), handler_tx.as_ref(), &mut shutdown)
                        .await;
                    self.teardown(&writer).await;

                    match exit {
                        Exit::Closing => {
                            self.emit(ConnStatusKind::Disconnected, None);
                            break;
                        }
                        Exit::Lost(e) => {
                            warn!(address = %address, error = %e, "connection lost");
                            self.emit(ConnStatusKind::Disconnected, Some(e.to_string()));
                        }
                    }
                }
                Err((kind, e)) => {
                    warn!(address = %address, error = %e, "{}", kind);
                    self.emit(kind, Some(e.to_string()));
                }
            }

            if self.is_closing() {
                break;
            }
            let delay = backoff.next_delay();
            info!(delay_ms = delay.as_millis() as u64, "reconnecting");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }
        debug!(address = %address, "session stopped");
    }

    /// Dial and bind, returning the split connection on success.
    async fn connect_and_bind(
        &self,
    ) -> Result<(ConnectionReader, Arc<ConnectionWriter>), (ConnStatusKind, SmppError)> {
        let config = &self.config;
        let mut conn = Connection::connect(&config.address, config.tls.as_ref(), config.connect_timeout)
            .await
            .map_err(|e| (ConnStatusKind::ConnectionFailed, e))?;

        self.bind_connection(&mut conn)
            .await
            .map_err(|e| (ConnStatusKind::BindFailed, e))?;

        let (reader, writer) = conn.split();
        let writer = Arc::new(writer);
        *self.conn.write().await = Some(Arc::clone(&writer));
        self.bound.store(true, Ordering::Release);
        Ok((reader, writer))
    }

    async fn bind_connection(&self, conn: &mut Connection) -> SmppResult<()> {
        let creds = &self.config.credentials;
        let mut bind = Pdu::new(creds.bind_type.command_id());
        bind.set(FieldName::SystemId, creds.system_id.as_str())?;
        bind.set(FieldName::Password, creds.password.as_str())?;
        bind.set(
            FieldName::SystemType,
            creds.system_type.as_deref().unwrap_or_default(),
        )?;
        bind.set(FieldName::InterfaceVersion, u8::from(creds.interface_version))?;
        bind.set_sequence(self.sequence.next());
        conn.write_pdu(&bind).await?;

        let resp = tokio::time::timeout(self.config.bind_timeout, conn.read_pdu())
            .await
            .map_err(|_| SmppError::Timeout)??
            .ok_or(SmppError::ConnectionClosed)?;

        let expected = creds.bind_type.response_id();
        if resp.command_id() != expected {
            return Err(match resp.command_id() {
                CommandId::GenericNack if !resp.status().is_ok() => SmppError::Status(resp.status()),
                actual => SmppError::BindWrongResponse(actual),
            });
        }
        check_status(resp)?;
        Ok(())
    }

    /// Read and dispatch until the connection ends or the session closes.
    async fn serve(
        &self,
        mut reader: ConnectionReader,
        writer: Arc<ConnectionWriter>,
        handler_tx: Option<&mpsc::Sender<Pdu>>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Exit {
        let (pong_tx, pong_rx) = watch::channel(0u64);
        let mut keepalive = tokio::spawn(keepalive::run(
            self.config.keepalive.clone(),
            Arc::clone(&writer),
            Arc::clone(&self.sequence),
            Arc::clone(&self.keepalive),
            pong_rx,
        ));

        let exit = loop {
            tokio::select! {
                _ = shutdown.changed() => break Exit::Closing,
                res = &mut keepalive => {
                    break Exit::Lost(res.unwrap_or(SmppError::ConnectionClosed));
                }
                read = reader.read_pdu() => match read {
                    Ok(Some(pdu)) => {
                        if let Err(e) = self.dispatch(&writer, pdu, &pong_tx, handler_tx).await {
                            break Exit::Lost(e);
                        }
                    }
                    Ok(None) => break Exit::Lost(SmppError::ConnectionClosed),
                    Err(e) => {
                        warn!(error = %e, "undecodable input, dropping connection");
                        break Exit::Lost(e);
                    }
                },
            }
        };
        keepalive.abort();

        if self.is_closing() {
            Exit::Closing
        } else {
            exit
        }
    }

    async fn dispatch(
        &self,
        writer: &ConnectionWriter,
        pdu: Pdu,
        pongs: &watch::Sender<u64>,
        handler_tx: Option<&mpsc::Sender<Pdu>>,
    ) -> SmppResult<()> {
        match pdu.command_id() {
            CommandId::EnquireLink => {
                debug!(seq = pdu.sequence(), "Enquire_link received");
                writer.write_pdu(&pdu.response()?).await?;
                return Ok(());
            }
            CommandId::EnquireLinkResp => {
                self.keepalive.record_pong();
                pongs.send_modify(|n| *n += 1);
                // Answers an explicit `request` too; keepalive pings have no waiter.
                let _ = self.inflight.complete(pdu);
                return Ok(());
            }
            CommandId::Unbind => {
                info!("peer unbound");
                writer.write_pdu(&pdu.response()?).await?;
                return Err(SmppError::ConnectionClosed);
            }
            CommandId::DeliverSm => writer.write_pdu(&pdu.response()?).await?,
            _ => {}
        }

        let pdu = if pdu.is_response() || pdu.command_id() == CommandId::GenericNack {
            match self.inflight.complete(pdu) {
                Some(unclaimed) => {
                    debug!(command = %unclaimed.command_id(), seq = unclaimed.sequence(), "no request waiting");
                    unclaimed
                }
                None => return Ok(()),
            }
        } else {
            pdu
        };

        match handler_tx {
            Some(tx) => {
                if let Err(e) = tx.try_send(pdu) {
                    warn!(error = %e, "handler queue full, PDU dropped");
                }
            }
            None => debug!(command = %pdu.command_id(), "no handler, PDU dropped"),
        }
        Ok(())
    }

    async fn teardown(&self, writer: &ConnectionWriter) {
        self.bound.store(false, Ordering::Release);
        self.conn.write().await.take();
        if let Err(e) = writer.shutdown().await {
            debug!(error = %e, "shutdown after disconnect");
        }
        self.inflight.fail_all();
    }
}

async fn run_handler(handler: Arc<dyn Handler>, mut rx: mpsc::Receiver<Pdu>) {
    while let Some(pdu) = rx.recv().await {
        handler.handle(pdu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_wraps() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);

        let counter = SequenceCounter::starting_after(MAX_SEQUENCE - 1);
        assert_eq!(counter.next(), MAX_SEQUENCE);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn sequence_is_unique_across_threads() {
        let counter = Arc::new(SequenceCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || (0..1000).map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 4000);
        assert_eq!(all[0], 1);
        assert_eq!(all[3999], 4000);
    }

    #[test]
    fn backoff_grows_by_e_and_caps() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        let second = backoff.next_delay().as_secs_f64();
        assert!((second - std::f64::consts::E).abs() < 1e-6);
        let third = backoff.next_delay().as_secs_f64();
        assert!((third - std::f64::consts::E.powi(2)).abs() < 1e-6);

        for _ in 0..10 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), MAX_BACKOFF);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
