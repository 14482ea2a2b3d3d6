//! A small SMSC for exercising clients.
//!
//! The server authenticates one bind per connection, then hands every PDU to
//! a [`RequestHandler`] and writes back whatever it returns. It can also push
//! PDUs to all bound clients and drop them on demand, which is enough to
//! test delivery, reconnect and keepalive behaviour end to end.
//!
//! ```no_run
//! # async fn demo() -> smpp_session::client::SmppResult<()> {
//! use smpp_session::server::{Server, ServerConfig, StubHandler};
//!
//! let server = Server::start(ServerConfig::default(), StubHandler::new()).await?;
//! println!("listening on {}", server.addr());
//! server.close().await;
//! # Ok(())
//! # }
//! ```

mod handler;

pub use handler::{EchoHandler, RequestHandler, StubHandler, reject_all};

use crate::client::{SequenceCounter, SmppError, SmppResult};
use crate::codec::CodecError;
use crate::connection::{Connection, ConnectionReader, ConnectionWriter, Stream};
use crate::datatypes::{CommandId, CommandStatus, Tlv, TlvTag};
use crate::macros::builder_setters;
use crate::pdu::{FieldName, Pdu};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Credentials the server accepts.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub user: String,
    pub password: String,
    /// system_id returned in bind responses
    pub system_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            user: "client".into(),
            password: "secret".into(),
            system_id: "smpptest".into(),
        }
    }
}

impl ServerConfig {
    builder_setters! {
        user: String,
        password: String,
        system_id: String,
    }
}

struct BoundClient {
    writer: Arc<ConnectionWriter>,
    kick: Arc<Notify>,
}

struct Shared {
    config: ServerConfig,
    handler: Box<dyn RequestHandler>,
    clients: Mutex<HashMap<u64, BoundClient>>,
    next_client: AtomicU64,
    sequence: SequenceCounter,
}

impl Shared {
    fn clients(&self) -> MutexGuard<'_, HashMap<u64, BoundClient>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Give server originated requests a sequence number.
    fn number(&self, pdu: &mut Pdu) {
        let request = !pdu.is_response() && pdu.command_id() != CommandId::GenericNack;
        if request && pdu.sequence() == 0 {
            pdu.set_sequence(self.sequence.next());
        }
    }
}

/// A running test server.
pub struct Server {
    addr: SocketAddr,
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    accept: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Listen on an ephemeral loopback port.
    pub async fn start(config: ServerConfig, handler: impl RequestHandler) -> SmppResult<Server> {
        Self::bind("127.0.0.1:0", config, handler).await
    }

    pub async fn bind(
        addr: &str,
        config: ServerConfig,
        handler: impl RequestHandler,
    ) -> SmppResult<Server> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            config,
            handler: Box::new(handler),
            clients: Mutex::new(HashMap::new()),
            next_client: AtomicU64::new(1),
            sequence: SequenceCounter::new(),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        let accept = tokio::spawn(accept_connections(listener, Arc::clone(&shared), shutdown_rx));
        info!(%addr, "test server listening");

        Ok(Server {
            addr,
            shared,
            shutdown,
            accept: Mutex::new(Some(accept)),
        })
    }

    /// `host:port` to dial.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of currently bound clients.
    pub fn clients(&self) -> usize {
        self.shared.clients().len()
    }

    /// Write `pdu` to every bound client, returning how many got it.
    pub async fn broadcast(&self, pdu: &Pdu) -> usize {
        let writers: Vec<Arc<ConnectionWriter>> = self
            .shared
            .clients()
            .values()
            .map(|client| Arc::clone(&client.writer))
            .collect();

        let mut sent = 0;
        for writer in writers {
            let mut pdu = pdu.clone();
            self.shared.number(&mut pdu);
            match writer.write_pdu(&pdu).await {
                Ok(()) => sent += 1,
                Err(e) => debug!(error = %e, "broadcast write failed"),
            }
        }
        sent
    }

    /// Drop every bound client's connection.
    pub fn disconnect_all(&self) {
        let clients = self.shared.clients();
        info!(clients = clients.len(), "disconnecting all clients");
        for client in clients.values() {
            client.kick.notify_one();
        }
    }

    /// Stop accepting and drop every connection.
    pub async fn close(&self) {
        self.shutdown.send_replace(true);
        let accept = self.accept.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(accept) = accept {
            if let Err(e) = accept.await {
                warn!(error = %e, "accept loop failed");
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn accept_connections(
    listener: TcpListener,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut join_set = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            res = listener.accept() => match res {
                Ok((socket, peer)) => {
                    debug!(%peer, "accepted");
                    join_set.spawn(serve_client(
                        Arc::clone(&shared),
                        socket,
                        peer,
                        shutdown.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
            // Reap finished connections as they go.
            Some(_) = join_set.join_next(), if !join_set.is_empty() => {}
        }
    }
    join_set.shutdown().await;
}

async fn serve_client(
    shared: Arc<Shared>,
    socket: TcpStream,
    peer: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = socket.set_nodelay(true) {
        debug!(%peer, error = %e, "set_nodelay failed");
    }
    let mut conn = Connection::new(Stream::Tcp(socket));

    let system_id = match authenticate(&shared.config, &mut conn).await {
        Ok(Some(system_id)) => system_id,
        Ok(None) => return,
        Err(e) => {
            debug!(%peer, error = %e, "bind failed");
            return;
        }
    };
    info!(%peer, %system_id, "client bound");

    let (reader, writer) = conn.split();
    let writer = Arc::new(writer);
    let kick = Arc::new(Notify::new());
    let id = shared.next_client.fetch_add(1, Ordering::Relaxed);
    shared.clients().insert(
        id,
        BoundClient {
            writer: Arc::clone(&writer),
            kick: Arc::clone(&kick),
        },
    );

    if let Err(e) = serve_bound(&shared, reader, &writer, &kick, &mut shutdown).await {
        debug!(%peer, error = %e, "client connection ended");
    }

    shared.clients().remove(&id);
    if let Err(e) = writer.shutdown().await {
        debug!(%peer, error = %e, "shutdown failed");
    }
    debug!(%peer, "client gone");
}

/// Run the bind handshake. `Ok(None)` means the client was turned away.
async fn authenticate(config: &ServerConfig, conn: &mut Connection) -> SmppResult<Option<String>> {
    let bind = match conn.read_pdu().await {
        Ok(Some(pdu)) => pdu,
        Ok(None) => return Ok(None),
        Err(SmppError::Codec(e)) => {
            conn.write_pdu(&Pdu::generic_nack(0, e.to_command_status())).await?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if !bind.command_id().is_bind() {
        warn!(command = %bind.command_id(), "first PDU was not a bind");
        let nack = Pdu::generic_nack(bind.sequence(), CommandStatus::IncorrectBindStatus);
        conn.write_pdu(&nack).await?;
        return Ok(None);
    }

    let mut resp = bind.response()?;
    let system_id = bind.string(FieldName::SystemId).unwrap_or_default();
    let password = bind.string(FieldName::Password).unwrap_or_default();
    let status = if system_id != config.user {
        CommandStatus::InvalidSystemId
    } else if password != config.password {
        CommandStatus::InvalidPassword
    } else {
        CommandStatus::Ok
    };

    resp.set_status(status);
    if status.is_ok() {
        resp.set(FieldName::SystemId, config.system_id.as_str())?;
        resp.set_tlv(Tlv::from_u8(TlvTag::ScInterfaceVersion, 0x34));
    }
    conn.write_pdu(&resp).await?;

    if status.is_ok() {
        Ok(Some(system_id))
    } else {
        warn!(%system_id, %status, "bind rejected");
        Ok(None)
    }
}

async fn serve_bound(
    shared: &Shared,
    mut reader: ConnectionReader,
    writer: &ConnectionWriter,
    kick: &Notify,
    shutdown: &mut watch::Receiver<bool>,
) -> SmppResult<()> {
    loop {
        let pdu = tokio::select! {
            _ = kick.notified() => return Ok(()),
            _ = shutdown.changed() => return Ok(()),
            read = reader.read_pdu() => match read {
                Ok(Some(pdu)) => pdu,
                Ok(None) => return Ok(()),
                Err(SmppError::Codec(e)) => {
                    writer.write_pdu(&Pdu::generic_nack(0, e.to_command_status())).await?;
                    // A bad length leaves the stream unframed.
                    if matches!(e, CodecError::MalformedHeader(_) | CodecError::OversizedPdu(_)) {
                        return Err(e.into());
                    }
                    continue;
                }
                Err(e) => return Err(e),
            },
        };

        if pdu.command_id() == CommandId::Unbind {
            writer.write_pdu(&pdu.response()?).await?;
            debug!("client unbound");
            return Ok(());
        }

        for mut out in shared.handler.handle(&pdu) {
            shared.number(&mut out);
            writer.write_pdu(&out).await?;
        }
    }
}
