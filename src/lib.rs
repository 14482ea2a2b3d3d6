//! SMPP v3.4 client sessions, wire codec and a test SMSC.
//!
//! The crate is layered bottom up:
//!
//! * [`pdutext`] - short message character sets (GSM 7-bit, UCS-2, Latin-1, ...)
//! * [`codec`], [`pdu`] - the PDU wire format, driven by per-command field schemas
//! * [`frame`], [`connection`] - length-prefixed framing over TCP or TLS
//! * [`client`] - bound sessions with keepalive, reconnect and request correlation
//! * [`server`] - a minimal SMSC for tests and demos
//!
//! # Examples
//!
//! Bind against the bundled test server and submit a message:
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, SessionBuilder, ShortMessage};
//! use smpp_session::pdutext::Text;
//! use smpp_session::server::{Server, ServerConfig, StubHandler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::start(ServerConfig::default(), StubHandler::new()).await?;
//!
//!     let session = SessionBuilder::new(server.addr(), BindCredentials::transceiver("client", "secret"))
//!         .bind();
//!     let mut status = session.status_events().ok_or("status taken")?;
//!     status.recv().await;
//!
//!     let sms = ShortMessage::new("1234567890", "0987654321", Text::gsm7_packed("Hello, World!"));
//!     let resp = session.submit(&sms).await?;
//!     println!("Message sent with ID: {}", resp.message_id);
//!
//!     session.close().await?;
//!     server.close().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod frame;
mod macros;
pub mod pdu;
pub mod pdutext;
pub mod server;


pub use codec::{CodecError, Encodable, MAX_PDU_SIZE, PduHeader};
pub use pdu::{FieldName, Pdu};

// Re-export the main client API for easy access
pub use client::{
    BindCredentials, ConnStatus, Session, SessionBuilder, ShortMessage, SmppError, SmppResult,
};
