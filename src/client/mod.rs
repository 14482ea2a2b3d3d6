// ABOUTME: SMPP client sessions: bind, keep alive, reconnect and correlate requests with responses
// ABOUTME: Exports the session handle, its configuration, message types and delivery fan-out

//! SMPP Client Module
//!
//! A [`Session`] keeps one SMSC bind alive for as long as the application
//! needs it:
//!
//! * **Background bind** - connect, bind and retry with exponential backoff
//! * **Keep-alive** - enquire_link on an interval, reconnect when unanswered
//! * **Concurrent requests** - any number of callers share one connection;
//!   responses are matched to requests by sequence number
//! * **Unsolicited PDUs** - deliver_sm is acknowledged and handed to a [`Handler`]
//! * **Long messages** - split into concatenated segments with a UDH
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, SessionBuilder, ShortMessage};
//! use smpp_session::pdutext::Text;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionBuilder::new("localhost:2775", BindCredentials::transmitter("system_id", "password"))
//!     .bind();
//!
//! // Wait for the first bind
//! let mut status = session.status_events().ok_or("status taken")?;
//! while let Some(event) = status.recv().await {
//!     if event.is_connected() {
//!         break;
//!     }
//! }
//!
//! let message = ShortMessage::new("123456789", "987654321", Text::gsm7_packed("Hello!"));
//! let resp = session.submit(&message).await?;
//! println!("message id {}", resp.message_id);
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Receiving Messages
//!
//! [`DeliveryFanout`] is a handler that copies every deliver_sm to its
//! subscribers:
//!
//! ```rust,no_run
//! use smpp_session::client::{BindCredentials, DeliveryFanout, SessionBuilder};
//!
//! # async fn example() {
//! let fanout = DeliveryFanout::new();
//! let mut inbox = fanout.subscribe();
//! let _session = SessionBuilder::new("localhost:2775", BindCredentials::receiver("id", "pass"))
//!     .handler(fanout.clone())
//!     .bind();
//!
//! while let Some(delivery) = inbox.recv().await {
//!     println!("{} -> {}: {}", delivery.src, delivery.dst, delivery.text);
//! }
//! # }
//! ```

pub mod builder;
pub mod delivery;
pub mod error;
pub mod flow_control;
mod inflight;
pub mod keepalive;
pub mod session;
pub mod traits;
mod transmitter;
pub mod types;

// Re-export the main types for easy access
pub use builder::{DEFAULT_PORT, SessionBuilder, SessionConfig};
pub use delivery::{DeliveryEvent, DeliveryFanout, DeliveryReceipt, Subscription};
pub use error::{SmppError, SmppResult};
pub use flow_control::RateLimiter;
pub use keepalive::{KeepAliveConfig, KeepAliveStatus};
pub use session::{Backoff, SequenceCounter, Session};
pub use traits::Handler;
pub use transmitter::{ESM_CLASS_UDHI, split_segments};
pub use types::{
    BindCredentials, BindType, ConnStatus, ConnStatusKind, Destination, QueryResponse,
    ShortMessage, SubmitMultiResponse, SubmitResponse,
};
