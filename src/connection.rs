// ABOUTME: Transport for SMPP v3.4 sessions: TCP or TLS streams carrying length-prefixed PDUs
// ABOUTME: A connection splits into a reader owned by one task and a writer shared behind a lock

use crate::client::{SmppError, SmppResult};
use crate::codec::{CodecError, Encodable};
use crate::frame;
use crate::pdu::Pdu;
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadBuf, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_native_tls::TlsStream;
use tokio_native_tls::native_tls::{self, Certificate};
use tracing::{debug, trace};

/// TLS settings for dialing an SMSC.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// PEM encoded CA certificate to trust in addition to the system roots.
    pub ca_certificate: Option<PathBuf>,
    /// Name to verify the server certificate against; defaults to the host
    /// part of the address.
    pub domain: Option<String>,
    /// Skip certificate verification. Only for test harnesses.
    pub danger_accept_invalid_certs: bool,
}

impl TlsConfig {
    fn connector(&self) -> SmppResult<tokio_native_tls::TlsConnector> {
        let mut builder = native_tls::TlsConnector::builder();
        if let Some(path) = &self.ca_certificate {
            let pem = std::fs::read(path)?;
            let cert = Certificate::from_pem(&pem).map_err(|e| SmppError::Tls(e.to_string()))?;
            builder.add_root_certificate(cert);
        }
        builder.danger_accept_invalid_certs(self.danger_accept_invalid_certs);
        let connector = builder.build().map_err(|e| SmppError::Tls(e.to_string()))?;
        Ok(tokio_native_tls::TlsConnector::from(connector))
    }
}

/// The byte stream under a connection.
#[derive(Debug)]
pub enum Stream {
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Stream::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Stream::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Stream::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Stream::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Stream::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// A PDU level connection before it is split.
///
/// The bind handshake runs on this type; once bound it is split so one task
/// can read while any number of callers write.
#[derive(Debug)]
pub struct Connection {
    // Writes are buffered and flushed once per PDU.
    stream: BufWriter<Stream>,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl Connection {
    /// Create a new `Connection`, backed by `stream`.
    pub fn new(stream: Stream) -> Connection {
        Connection {
            stream: BufWriter::new(stream),
            // A PDU never exceeds 4096 octets, so one frame always fits.
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Dial `addr`, wrapping the socket in TLS when `tls` is set.
    pub async fn connect(
        addr: &str,
        tls: Option<&TlsConfig>,
        connect_timeout: Duration,
    ) -> SmppResult<Connection> {
        let socket = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| SmppError::Timeout)??;
        socket.set_nodelay(true)?;

        let stream = match tls {
            Some(tls) => {
                let domain = match &tls.domain {
                    Some(domain) => domain.clone(),
                    None => host_of(addr).to_owned(),
                };
                let connector = tls.connector()?;
                let stream = connector
                    .connect(&domain, socket)
                    .await
                    .map_err(|e| SmppError::Tls(e.to_string()))?;
                Stream::Tls(Box::new(stream))
            }
            None => Stream::Tcp(socket),
        };
        debug!(addr, tls = tls.is_some(), "connected");
        Ok(Connection::new(stream))
    }

    /// Read a single PDU.
    ///
    /// Returns `None` when the peer closes the stream between PDUs.
    pub async fn read_pdu(&mut self) -> SmppResult<Option<Pdu>> {
        read_pdu(&mut self.stream, &mut self.buffer).await
    }

    /// Write a single PDU and flush it.
    pub async fn write_pdu(&mut self, pdu: &Pdu) -> SmppResult<()> {
        write_pdu(&mut self.stream, pdu).await
    }

    /// Split into a reader and a shareable writer.
    ///
    /// Anything already buffered for reading moves to the reader.
    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        let stream = self.stream.into_inner();
        let (read_half, write_half) = tokio::io::split(stream);
        (
            ConnectionReader {
                stream: read_half,
                buffer: self.buffer,
            },
            ConnectionWriter {
                stream: Mutex::new(BufWriter::new(write_half)),
            },
        )
    }
}

/// The reading side of a split connection, owned by one task.
#[derive(Debug)]
pub struct ConnectionReader {
    stream: ReadHalf<Stream>,
    buffer: BytesMut,
}

impl ConnectionReader {
    /// Read a single PDU. Cancel safe: partial frames stay buffered.
    pub async fn read_pdu(&mut self) -> SmppResult<Option<Pdu>> {
        read_pdu(&mut self.stream, &mut self.buffer).await
    }
}

/// The writing side of a split connection.
///
/// Each PDU is written and flushed while holding the lock, so concurrent
/// writers never interleave bytes.
#[derive(Debug)]
pub struct ConnectionWriter {
    stream: Mutex<BufWriter<WriteHalf<Stream>>>,
}

impl ConnectionWriter {
    pub async fn write_pdu(&self, pdu: &Pdu) -> SmppResult<()> {
        let mut stream = self.stream.lock().await;
        write_pdu(&mut *stream, pdu).await
    }

    /// Shut down the write direction; the peer sees end of stream.
    pub async fn shutdown(&self) -> SmppResult<()> {
        let mut stream = self.stream.lock().await;
        stream.shutdown().await?;
        Ok(())
    }
}

async fn read_pdu<R>(stream: &mut R, buffer: &mut BytesMut) -> SmppResult<Option<Pdu>>
where
    R: AsyncRead + Unpin,
{
    loop {
        // Attempt to parse a PDU from the buffered data.
        if let Some(pdu) = parse_pdu(buffer)? {
            return Ok(Some(pdu));
        }

        // `0` indicates "end of stream".
        if 0 == stream.read_buf(buffer).await? {
            // A clean close leaves nothing half read.
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(SmppError::Connection(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )))
            };
        }
    }
}

fn parse_pdu(buffer: &mut BytesMut) -> SmppResult<Option<Pdu>> {
    let mut cursor = Cursor::new(&buffer[..]);
    match frame::check(&mut cursor) {
        Ok(len) => {
            let pdu = frame::parse(&buffer[..], len);
            // Discard the frame even when it fails to decode.
            buffer.advance(len);
            let pdu = pdu?;
            trace!(command = %pdu.command_id(), seq = pdu.sequence(), "read pdu");
            Ok(Some(pdu))
        }
        // Not an error: wait for more data.
        Err(CodecError::Incomplete) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_pdu<W>(stream: &mut W, pdu: &Pdu) -> SmppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = pdu.to_bytes()?;
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    trace!(command = %pdu.command_id(), seq = pdu.sequence(), "wrote pdu");
    Ok(())
}

fn host_of(addr: &str) -> &str {
    match addr.rsplit_once(':') {
        Some((host, _)) => host.trim_start_matches('[').trim_end_matches(']'),
        None => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::CommandId;
    use crate::pdu::FieldName;
    use tokio::net::TcpListener;

    #[test]
    fn host_is_taken_from_address() {
        assert_eq!(host_of("smsc.example.com:2775"), "smsc.example.com");
        assert_eq!(host_of("[::1]:2775"), "::1");
        assert_eq!(host_of("localhost"), "localhost");
    }

    #[tokio::test]
    async fn pdus_cross_a_socket_in_pieces() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut pdu = Pdu::new(CommandId::SubmitSmResp);
            pdu.set(FieldName::MessageId, "abc").unwrap();
            pdu.set_sequence(3);
            let bytes = pdu.to_bytes().unwrap();
            // Dribble the frame out to exercise partial reads.
            for chunk in bytes.chunks(5) {
                socket.write_all(chunk).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let conn = Connection::connect(&addr, None, Duration::from_secs(1))
            .await
            .unwrap();
        let (mut reader, _writer) = conn.split();
        let pdu = reader.read_pdu().await.unwrap().unwrap();
        assert_eq!(pdu.message_id().as_deref(), Some("abc"));
        assert_eq!(pdu.sequence(), 3);
        assert!(reader.read_pdu().await.unwrap().is_none());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_length_fails_the_read() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&[0x00, 0x00, 0x20, 0x00]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let mut conn = Connection::connect(&addr, None, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(
            conn.read_pdu().await,
            Err(SmppError::Codec(CodecError::OversizedPdu(0x2000)))
        ));
    }
}
