//! Mandatory field layout per command (SMPP v3.4 Section 4).

use super::field::FieldName::{self, *};
use crate::datatypes::CommandId;

const BIND: &[FieldName] = &[
    SystemId,
    Password,
    SystemType,
    InterfaceVersion,
    AddrTon,
    AddrNpi,
    AddressRange,
];

const BIND_RESP: &[FieldName] = &[SystemId];

const OUTBIND: &[FieldName] = &[SystemId, Password];

const SUBMIT_SM: &[FieldName] = &[
    ServiceType,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    DestAddrTon,
    DestAddrNpi,
    DestinationAddr,
    EsmClass,
    ProtocolId,
    PriorityFlag,
    ScheduleDeliveryTime,
    ValidityPeriod,
    RegisteredDelivery,
    ReplaceIfPresentFlag,
    DataCoding,
    SmDefaultMsgId,
    SmLength,
    ShortMessage,
];

const SUBMIT_MULTI: &[FieldName] = &[
    ServiceType,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    NumberOfDests,
    DestAddresses,
    EsmClass,
    ProtocolId,
    PriorityFlag,
    ScheduleDeliveryTime,
    ValidityPeriod,
    RegisteredDelivery,
    ReplaceIfPresentFlag,
    DataCoding,
    SmDefaultMsgId,
    SmLength,
    ShortMessage,
];

const SUBMIT_MULTI_RESP: &[FieldName] = &[MessageId, NoUnsuccess, UnsuccessSmes];

const MESSAGE_ID: &[FieldName] = &[MessageId];

const QUERY_SM: &[FieldName] = &[MessageId, SourceAddrTon, SourceAddrNpi, SourceAddr];

const QUERY_SM_RESP: &[FieldName] = &[MessageId, FinalDate, MessageState, ErrorCode];

const REPLACE_SM: &[FieldName] = &[
    MessageId,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    ScheduleDeliveryTime,
    ValidityPeriod,
    RegisteredDelivery,
    SmDefaultMsgId,
    SmLength,
    ShortMessage,
];

const CANCEL_SM: &[FieldName] = &[
    ServiceType,
    MessageId,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    DestAddrTon,
    DestAddrNpi,
    DestinationAddr,
];

const DATA_SM: &[FieldName] = &[
    ServiceType,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    DestAddrTon,
    DestAddrNpi,
    DestinationAddr,
    EsmClass,
    RegisteredDelivery,
    DataCoding,
];

const ALERT_NOTIFICATION: &[FieldName] = &[
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    EsmeAddrTon,
    EsmeAddrNpi,
    EsmeAddr,
];

const EMPTY: &[FieldName] = &[];

/// Declared order of the mandatory fields of `command`.
pub fn fields(command: CommandId) -> &'static [FieldName] {
    match command {
        CommandId::BindReceiver | CommandId::BindTransmitter | CommandId::BindTransceiver => BIND,
        CommandId::BindReceiverResp
        | CommandId::BindTransmitterResp
        | CommandId::BindTransceiverResp => BIND_RESP,
        CommandId::Outbind => OUTBIND,
        CommandId::SubmitSm | CommandId::DeliverSm => SUBMIT_SM,
        CommandId::SubmitMulti => SUBMIT_MULTI,
        CommandId::SubmitMultiResp => SUBMIT_MULTI_RESP,
        CommandId::SubmitSmResp | CommandId::DeliverSmResp | CommandId::DataSmResp => MESSAGE_ID,
        CommandId::QuerySm => QUERY_SM,
        CommandId::QuerySmResp => QUERY_SM_RESP,
        CommandId::ReplaceSm => REPLACE_SM,
        CommandId::CancelSm => CANCEL_SM,
        CommandId::DataSm => DATA_SM,
        CommandId::AlertNotification => ALERT_NOTIFICATION,
        CommandId::EnquireLink
        | CommandId::EnquireLinkResp
        | CommandId::Unbind
        | CommandId::UnbindResp
        | CommandId::ReplaceSmResp
        | CommandId::CancelSmResp
        | CommandId::GenericNack => EMPTY,
    }
}
