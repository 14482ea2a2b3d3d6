use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The command_id field of the PDU header (SMPP v3.4 Section 5.1.2.1).
///
/// Response ids are the request id with bit 31 set.
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    ReplaceSm = 0x0000_0007,
    ReplaceSmResp = 0x8000_0007,
    CancelSm = 0x0000_0008,
    CancelSmResp = 0x8000_0008,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    // Reserved 0x0000000A - 0x8000000A
    Outbind = 0x0000_000B,
    // Reserved 0x0000000C - 0x00000014
    //          0x8000000B - 0x80000014
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    // Reserved 0x00000016 - 0x00000020
    //          0x80000016 - 0x80000020
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
    // Reserved 0x00000022 - 0x000000FF
    //          0x80000022 - 0x800000FF
    // Reserved 0x00000100
    // Reserved 0x80000100
    // Reserved 0x00000101 - 0x80000101
    AlertNotification = 0x0000_0102,
    // Reserved 0x80000102
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
    // Reserved for SMPP extension
    //          0x00000104 - 0x0000FFFF
    //          0x80000104 - 0x8000FFFF
    // Reserved 0x00010000 - 0x000101FF
    //          0x80010000 - 0x800101FF
    // Reserved for SMSC Vendor
    //          0x00010200 - 0x000102FF
    //          0x80010200 - 0x800102FF
    // Reserved 0x00010300 - 0xFFFFFFFF
}

const RESPONSE_BIT: u32 = 0x8000_0000;

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        u32::from(*self) & RESPONSE_BIT != 0
    }

    /// The response paired with this request.
    ///
    /// Returns `None` for responses and for the requests that have no
    /// response (alert_notification, outbind).
    pub fn response_id(&self) -> Option<CommandId> {
        if self.is_response() {
            return None;
        }
        CommandId::try_from(u32::from(*self) | RESPONSE_BIT).ok()
    }

    /// True for the three bind requests.
    pub fn is_bind(&self) -> bool {
        matches!(
            self,
            CommandId::BindReceiver | CommandId::BindTransmitter | CommandId::BindTransceiver
        )
    }

    /// The lowercase protocol name, e.g. `submit_sm_resp`.
    pub fn name(&self) -> &'static str {
        match self {
            CommandId::GenericNack => "generic_nack",
            CommandId::BindReceiver => "bind_receiver",
            CommandId::BindReceiverResp => "bind_receiver_resp",
            CommandId::BindTransmitter => "bind_transmitter",
            CommandId::BindTransmitterResp => "bind_transmitter_resp",
            CommandId::QuerySm => "query_sm",
            CommandId::QuerySmResp => "query_sm_resp",
            CommandId::SubmitSm => "submit_sm",
            CommandId::SubmitSmResp => "submit_sm_resp",
            CommandId::DeliverSm => "deliver_sm",
            CommandId::DeliverSmResp => "deliver_sm_resp",
            CommandId::Unbind => "unbind",
            CommandId::UnbindResp => "unbind_resp",
            CommandId::ReplaceSm => "replace_sm",
            CommandId::ReplaceSmResp => "replace_sm_resp",
            CommandId::CancelSm => "cancel_sm",
            CommandId::CancelSmResp => "cancel_sm_resp",
            CommandId::BindTransceiver => "bind_transceiver",
            CommandId::BindTransceiverResp => "bind_transceiver_resp",
            CommandId::Outbind => "outbind",
            CommandId::EnquireLink => "enquire_link",
            CommandId::EnquireLinkResp => "enquire_link_resp",
            CommandId::SubmitMulti => "submit_multi",
            CommandId::SubmitMultiResp => "submit_multi_resp",
            CommandId::AlertNotification => "alert_notification",
            CommandId::DataSm => "data_sm",
            CommandId::DataSmResp => "data_sm_resp",
        }
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_id_is_response() {
        assert!(!CommandId::EnquireLink.is_response());
        assert!(CommandId::EnquireLinkResp.is_response());
        assert!(!CommandId::SubmitSm.is_response());
        assert!(CommandId::SubmitSmResp.is_response());
        assert!(CommandId::GenericNack.is_response());
    }

    #[test]
    fn response_id_sets_high_bit() {
        assert_eq!(
            CommandId::BindTransceiver.response_id(),
            Some(CommandId::BindTransceiverResp)
        );
        assert_eq!(u32::from(CommandId::BindTransceiverResp), 0x8000_0009);
        assert_eq!(CommandId::SubmitSm.response_id(), Some(CommandId::SubmitSmResp));
        assert_eq!(CommandId::AlertNotification.response_id(), None);
        assert_eq!(CommandId::Outbind.response_id(), None);
        assert_eq!(CommandId::SubmitSmResp.response_id(), None);
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(CommandId::try_from(0x0000_000Au32).is_err());
        assert_eq!(CommandId::try_from(0x0000_0021u32), Ok(CommandId::SubmitMulti));
    }
}
