// ABOUTME: Defines the priority_flag values of submit_sm and deliver_sm
// ABOUTME: Levels 4-255 are reserved and rejected by try_from

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Message priority (SMPP v3.4 Section 5.2.14).
///
/// The meaning of each level depends on the network: for GSM anything above
/// `Level0` is simply "priority".
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PriorityFlag {
    /// Lowest priority (default)
    #[default]
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    /// Highest priority
    Level3 = 3,
}
