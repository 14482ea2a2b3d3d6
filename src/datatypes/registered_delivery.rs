// ABOUTME: SMSC delivery receipt request values and short message states
// ABOUTME: Used by submit requests and query_sm responses

use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// SMSC Delivery Receipt bits of registered_delivery
/// (SMPP v3.4 Section 5.2.17, bits 1-0).
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RegisteredDelivery {
    /// No SMSC Delivery Receipt requested (default)
    #[default]
    None = 0x00,
    /// Receipt requested where final delivery outcome is success or failure
    FinalDeliveryReceipt = 0x01,
    /// Receipt requested where the final delivery outcome is failure
    FailureDeliveryReceipt = 0x02,
}

impl RegisteredDelivery {
    /// True when the raw registered_delivery octet asks for any SMSC receipt.
    pub fn requests_receipt(raw: u8) -> bool {
        raw & 0x03 != 0
    }
}

/// message_state of query_sm_resp (SMPP v3.4 Section 5.2.28).
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageState {
    Enroute = 1,
    Delivered = 2,
    Expired = 3,
    Deleted = 4,
    Undeliverable = 5,
    Accepted = 6,
    Unknown = 7,
    Rejected = 8,
    #[num_enum(catch_all)]
    Other(u8),
}

impl MessageState {
    pub fn is_final(&self) -> bool {
        !matches!(self, MessageState::Enroute | MessageState::Accepted | MessageState::Other(_))
    }
}
