use num_enum::{FromPrimitive, IntoPrimitive};

/// The command_status field of an SMPP response (SMPP v3.4 Section 5.1.3).
///
/// Values outside the v3.4 table (reserved ranges, vendor specific codes) are
/// kept in `Unknown` so that decoding never fails on a status code.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// No Error
    Ok = 0x0000_0000,
    /// Message Length is invalid
    InvalidMsgLength = 0x0000_0001,
    /// Command Length is invalid
    InvalidCommandLength = 0x0000_0002,
    /// Invalid Command ID
    InvalidCommandId = 0x0000_0003,
    /// Incorrect BIND Status for given command
    IncorrectBindStatus = 0x0000_0004,
    /// ESME Already in Bound State
    AlreadyBoundState = 0x0000_0005,
    /// Invalid Priority Flag
    InvalidPriorityFlag = 0x0000_0006,
    /// Invalid Registered Delivery Flag
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    /// System Error
    SystemError = 0x0000_0008,
    // Reserved 0x00000009
    /// Invalid Source Address
    InvalidSourceAddress = 0x0000_000A,
    /// Invalid Dest Addr
    InvalidDestinationAddress = 0x0000_000B,
    /// Message ID is invalid
    InvalidMessageId = 0x0000_000C,
    /// Bind Failed
    BindFailed = 0x0000_000D,
    /// Invalid Password
    InvalidPassword = 0x0000_000E,
    /// Invalid System ID
    InvalidSystemId = 0x0000_000F,
    // Reserved 0x00000010
    /// Cancel SM Failed
    CancelSmFailed = 0x0000_0011,
    // Reserved 0x00000012
    /// Replace SM Failed
    ReplaceSmFailed = 0x0000_0013,
    /// Message Queue Full
    MessageQueueFull = 0x0000_0014,
    /// Invalid Service Type
    InvalidServiceType = 0x0000_0015,
    // Reserved 0x00000016 - 0x00000032
    /// Invalid number of destinations
    InvalidNumberOfDestinations = 0x0000_0033,
    /// Invalid Distribution List name
    InvalidDistributionListName = 0x0000_0034,
    // Reserved 0x00000035 - 0x0000003F
    /// Destination flag is invalid (submit_multi)
    InvalidDestinationFlag = 0x0000_0040,
    // Reserved 0x00000041
    /// Invalid 'submit with replace' request
    InvalidSubmitWithReplaceRequest = 0x0000_0042,
    /// Invalid esm_class field data
    InvalidEsmClassFieldData = 0x0000_0043,
    /// Cannot Submit to Distribution List
    CannotSubmitToDistributionList = 0x0000_0044,
    /// submit_sm or submit_multi failed
    SubmitFailed = 0x0000_0045,
    // Reserved 0x00000046 - 0x00000047
    /// Invalid Source address TON
    InvalidSourceAddressTon = 0x0000_0048,
    /// Invalid Source address NPI
    InvalidSourceAddressNpi = 0x0000_0049,
    /// Invalid Destination address TON
    InvalidDestinationAddressTon = 0x0000_0050,
    /// Invalid Destination address NPI
    InvalidDestinationAddressNpi = 0x0000_0051,
    // Reserved 0x00000052
    /// Invalid system_type field
    InvalidSystemTypeField = 0x0000_0053,
    /// Invalid replace_if_present flag
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    /// Invalid number of messages
    InvalidNumberOfMessages = 0x0000_0055,
    // Reserved 0x00000056 - 0x00000057
    /// Throttling error (ESME has exceeded allowed message limits)
    ThrottlingError = 0x0000_0058,
    // Reserved 0x00000059 - 0x00000060
    /// Invalid Scheduled Delivery Time
    InvalidScheduledDeliveryTime = 0x0000_0061,
    /// Invalid message validity period (Expiry time)
    InvalidExpiryTime = 0x0000_0062,
    /// Predefined Message Invalid or Not Found
    InvalidPredefinedMessageId = 0x0000_0063,
    /// ESME Receiver Temporary App Error Code
    ReceiverTemporaryAppError = 0x0000_0064,
    /// ESME Receiver Permanent App Error Code
    ReceiverPermanentAppError = 0x0000_0065,
    /// ESME Receiver Reject Message Error Code
    ReceiverRejectMessageError = 0x0000_0066,
    /// query_sm request failed
    QuerySmRequestFailed = 0x0000_0067,
    // Reserved 0x00000068 - 0x000000BF
    /// Error in the optional part of the PDU Body.
    ErrorInOptionalPartOfPduBody = 0x0000_00C0,
    /// Optional Parameter not allowed
    OptionalParameterNotAllowed = 0x0000_00C1,
    /// Invalid Parameter Length.
    InvalidParameterLength = 0x0000_00C2,
    /// Expected Optional Parameter missing
    ExpectedOptionalParameterMissing = 0x0000_00C3,
    /// Invalid Optional Parameter Value
    InvalidOptionalParameterValue = 0x0000_00C4,
    // Reserved 0x000000C5 - 0x000000FD
    /// Delivery Failure (used for data_sm_resp)
    DeliveryFailed = 0x0000_00FE,
    /// Unknown Error
    UnknownError = 0x0000_00FF,
    /// Reserved, extension or vendor specific code.
    #[num_enum(catch_all)]
    Unknown(u32),
}

impl CommandStatus {
    pub fn code(&self) -> u32 {
        u32::from(*self)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CommandStatus::Ok)
    }

    /// The ESME_* mnemonic used by the v3.4 document.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CommandStatus::Ok => "ESME_ROK",
            CommandStatus::InvalidMsgLength => "ESME_RINVMSGLEN",
            CommandStatus::InvalidCommandLength => "ESME_RINVCMDLEN",
            CommandStatus::InvalidCommandId => "ESME_RINVCMDID",
            CommandStatus::IncorrectBindStatus => "ESME_RINVBNDSTS",
            CommandStatus::AlreadyBoundState => "ESME_RALYBND",
            CommandStatus::InvalidPriorityFlag => "ESME_RINVPRTFLG",
            CommandStatus::InvalidRegisteredDeliveryFlag => "ESME_RINVREGDLVFLG",
            CommandStatus::SystemError => "ESME_RSYSERR",
            CommandStatus::InvalidSourceAddress => "ESME_RINVSRCADR",
            CommandStatus::InvalidDestinationAddress => "ESME_RINVDSTADR",
            CommandStatus::InvalidMessageId => "ESME_RINVMSGID",
            CommandStatus::BindFailed => "ESME_RBINDFAIL",
            CommandStatus::InvalidPassword => "ESME_RINVPASWD",
            CommandStatus::InvalidSystemId => "ESME_RINVSYSID",
            CommandStatus::CancelSmFailed => "ESME_RCANCELFAIL",
            CommandStatus::ReplaceSmFailed => "ESME_RREPLACEFAIL",
            CommandStatus::MessageQueueFull => "ESME_RMSGQFUL",
            CommandStatus::InvalidServiceType => "ESME_RINVSERTYP",
            CommandStatus::InvalidNumberOfDestinations => "ESME_RINVNUMDESTS",
            CommandStatus::InvalidDistributionListName => "ESME_RINVDLNAME",
            CommandStatus::InvalidDestinationFlag => "ESME_RINVDESTFLAG",
            CommandStatus::InvalidSubmitWithReplaceRequest => "ESME_RINVSUBREP",
            CommandStatus::InvalidEsmClassFieldData => "ESME_RINVESMCLASS",
            CommandStatus::CannotSubmitToDistributionList => "ESME_RCNTSUBDL",
            CommandStatus::SubmitFailed => "ESME_RSUBMITFAIL",
            CommandStatus::InvalidSourceAddressTon => "ESME_RINVSRCTON",
            CommandStatus::InvalidSourceAddressNpi => "ESME_RINVSRCNPI",
            CommandStatus::InvalidDestinationAddressTon => "ESME_RINVDSTTON",
            CommandStatus::InvalidDestinationAddressNpi => "ESME_RINVDSTNPI",
            CommandStatus::InvalidSystemTypeField => "ESME_RINVSYSTYP",
            CommandStatus::InvalidReplaceIfPresentFlag => "ESME_RINVREPFLAG",
            CommandStatus::InvalidNumberOfMessages => "ESME_RINVNUMMSGS",
            CommandStatus::ThrottlingError => "ESME_RTHROTTLED",
            CommandStatus::InvalidScheduledDeliveryTime => "ESME_RINVSCHED",
            CommandStatus::InvalidExpiryTime => "ESME_RINVEXPIRY",
            CommandStatus::InvalidPredefinedMessageId => "ESME_RINVDFTMSGID",
            CommandStatus::ReceiverTemporaryAppError => "ESME_RX_T_APPN",
            CommandStatus::ReceiverPermanentAppError => "ESME_RX_P_APPN",
            CommandStatus::ReceiverRejectMessageError => "ESME_RX_R_APPN",
            CommandStatus::QuerySmRequestFailed => "ESME_RQUERYFAIL",
            CommandStatus::ErrorInOptionalPartOfPduBody => "ESME_RINVOPTPARSTREAM",
            CommandStatus::OptionalParameterNotAllowed => "ESME_ROPTPARNOTALLWD",
            CommandStatus::InvalidParameterLength => "ESME_RINVPARLEN",
            CommandStatus::ExpectedOptionalParameterMissing => "ESME_RMISSINGOPTPARAM",
            CommandStatus::InvalidOptionalParameterValue => "ESME_RINVOPTPARAMVAL",
            CommandStatus::DeliveryFailed => "ESME_RDELIVERYFAILURE",
            CommandStatus::UnknownError => "ESME_RUNKNOWNERR",
            CommandStatus::Unknown(_) => "ESME_UNKNOWN",
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:08X})", self.mnemonic(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_round_trips() {
        assert_eq!(CommandStatus::from(0x0000_000Eu32), CommandStatus::InvalidPassword);
        assert_eq!(CommandStatus::InvalidPassword.code(), 0x0E);
        assert_eq!(CommandStatus::from(0u32), CommandStatus::Ok);
        assert!(CommandStatus::Ok.is_ok());
    }

    #[test]
    fn reserved_status_is_preserved() {
        let status = CommandStatus::from(0x0000_0400u32);
        assert_eq!(status, CommandStatus::Unknown(0x400));
        assert_eq!(u32::from(status), 0x400);
        assert!(!status.is_ok());
    }

    #[test]
    fn display_includes_mnemonic_and_code() {
        assert_eq!(
            CommandStatus::IncorrectBindStatus.to_string(),
            "ESME_RINVBNDSTS (0x00000004)"
        );
    }
}
