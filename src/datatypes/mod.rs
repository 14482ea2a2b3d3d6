mod command_id;
mod command_status;
mod data_coding;
mod interface_version;
mod numeric_plan_indicator;
mod priority_flag;
mod registered_delivery;
mod tlv;
mod type_of_number;

pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{DataCoding, MessageClass};
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use priority_flag::PriorityFlag;
pub use registered_delivery::{MessageState, RegisteredDelivery};
pub use tlv::{Tlv, TlvMap, TlvTag};
pub use type_of_number::TypeOfNumber;
