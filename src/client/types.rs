// ABOUTME: Supporting types for session operations: credentials, status events and message shapes
// ABOUTME: Builder style setters keep the common cases short while exposing every submit_sm field

use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, MessageState, NumericPlanIndicator, PriorityFlag,
    RegisteredDelivery, Tlv, TypeOfNumber,
};
use crate::macros::builder_setters;
use crate::pdu::{Pdu, UnsuccessSme};
use crate::pdutext::Text;
use std::fmt;

/// SMPP bind operation credentials
#[derive(Debug, Clone)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication
    pub password: String,
    /// System type (optional, defaults to empty string)
    pub system_type: Option<String>,
    /// Type of bind operation to perform
    pub bind_type: BindType,
    /// SMPP interface version to use
    pub interface_version: InterfaceVersion,
}

impl BindCredentials {
    pub fn new(bind_type: BindType, system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
            bind_type,
            interface_version: InterfaceVersion::SmppV34,
        }
    }

    pub fn transmitter(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Transmitter, system_id, password)
    }

    pub fn receiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Receiver, system_id, password)
    }

    pub fn transceiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(BindType::Transceiver, system_id, password)
    }

    /// Set the system type for the bind operation
    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }
}

/// Bind kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    /// Receive-only session
    Receiver,
    /// Send-only session
    Transmitter,
    /// Send and receive session
    Transceiver,
}

impl BindType {
    pub fn command_id(&self) -> CommandId {
        match self {
            BindType::Receiver => CommandId::BindReceiver,
            BindType::Transmitter => CommandId::BindTransmitter,
            BindType::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_id(&self) -> CommandId {
        match self {
            BindType::Receiver => CommandId::BindReceiverResp,
            BindType::Transmitter => CommandId::BindTransmitterResp,
            BindType::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    pub fn can_transmit(&self) -> bool {
        !matches!(self, BindType::Receiver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatusKind {
    Connected,
    Disconnected,
    ConnectionFailed,
    BindFailed,
}

impl fmt::Display for ConnStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnStatusKind::Connected => "connected",
            ConnStatusKind::Disconnected => "disconnected",
            ConnStatusKind::ConnectionFailed => "connection failed",
            ConnStatusKind::BindFailed => "bind failed",
        };
        f.write_str(name)
    }
}

/// A session connectivity event, with the cause when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnStatus {
    pub kind: ConnStatusKind,
    pub cause: Option<String>,
}

impl ConnStatus {
    pub(crate) fn new(kind: ConnStatusKind, cause: Option<String>) -> Self {
        Self { kind, cause }
    }

    pub fn is_connected(&self) -> bool {
        self.kind == ConnStatusKind::Connected
    }
}

impl fmt::Display for ConnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.kind, cause),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// An outbound short message.
///
/// ```
/// use smpp_session::client::ShortMessage;
/// use smpp_session::datatypes::RegisteredDelivery;
/// use smpp_session::pdutext::Text;
///
/// let sm = ShortMessage::new("447700900001", "447700900002", Text::gsm7_packed("Hi"))
///     .registered_delivery(RegisteredDelivery::FinalDeliveryReceipt)
///     .validity_period("000001000000000R".to_string());
/// assert_eq!(sm.dst, "447700900002");
/// ```
#[derive(Debug, Clone)]
pub struct ShortMessage {
    pub src: String,
    pub dst: String,
    pub text: Text,
    pub service_type: String,
    pub src_ton: TypeOfNumber,
    pub src_npi: NumericPlanIndicator,
    pub dst_ton: TypeOfNumber,
    pub dst_npi: NumericPlanIndicator,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: PriorityFlag,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: RegisteredDelivery,
    pub tlvs: Vec<Tlv>,
}

impl ShortMessage {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, text: impl Into<Text>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            text: text.into(),
            service_type: String::new(),
            src_ton: TypeOfNumber::Unknown,
            src_npi: NumericPlanIndicator::Unknown,
            dst_ton: TypeOfNumber::Unknown,
            dst_npi: NumericPlanIndicator::Unknown,
            esm_class: 0,
            protocol_id: 0,
            priority_flag: PriorityFlag::Level0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: RegisteredDelivery::None,
            tlvs: Vec::new(),
        }
    }

    builder_setters! {
        service_type: String,
        esm_class: u8,
        protocol_id: u8,
        priority_flag: PriorityFlag,
        schedule_delivery_time: String,
        validity_period: String,
        registered_delivery: RegisteredDelivery,
    }

    pub fn source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.src_ton = ton;
        self.src_npi = npi;
        self
    }

    pub fn dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dst_ton = ton;
        self.dst_npi = npi;
        self
    }

    pub fn with_tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }
}

/// Result of a submit_sm.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub message_id: String,
    pub pdu: Pdu,
}

/// Result of a submit_multi.
#[derive(Debug, Clone)]
pub struct SubmitMultiResponse {
    pub message_id: String,
    pub unsuccess: Vec<UnsuccessSme>,
    pub pdu: Pdu,
}

/// Result of a query_sm.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub message_id: String,
    pub final_date: String,
    pub message_state: MessageState,
    pub error_code: u8,
    pub pdu: Pdu,
}

/// Destination of a submit_multi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Address {
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
        addr: String,
    },
    DistributionList(String),
}

impl Destination {
    pub fn address(addr: impl Into<String>) -> Self {
        Destination::Address {
            ton: TypeOfNumber::Unknown,
            npi: NumericPlanIndicator::Unknown,
            addr: addr.into(),
        }
    }

    pub fn list(name: impl Into<String>) -> Self {
        Destination::DistributionList(name.into())
    }
}

impl From<&Destination> for crate::pdu::DestAddress {
    fn from(dest: &Destination) -> Self {
        match dest {
            Destination::Address { ton, npi, addr } => {
                crate::pdu::DestAddress::sme((*ton).into(), (*npi).into(), addr.clone())
            }
            Destination::DistributionList(name) => {
                crate::pdu::DestAddress::DistributionList(name.clone())
            }
        }
    }
}

/// Turns a response PDU into an error when its status is not Ok.
pub(crate) fn check_status(pdu: Pdu) -> Result<Pdu, crate::client::SmppError> {
    match pdu.status() {
        CommandStatus::Ok => Ok(pdu),
        status => Err(crate::client::SmppError::Status(status)),
    }
}
