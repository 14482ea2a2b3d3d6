use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Numbering Plan Indicator (SMPP v3.4 Section 5.2.6).
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0b0000_0000,
    /// E163/E164
    Isdn = 0b0000_0001,
    /// X.121
    Data = 0b0000_0011,
    /// F.69
    Telex = 0b0000_0100,
    /// E.212
    LandMobile = 0b0000_0110,
    National = 0b0000_1000,
    Private = 0b0000_1001,
    Ermes = 0b0000_1010,
    /// IP
    Internet = 0b0000_1110,
    WapClientId = 0b0001_0010,
}
