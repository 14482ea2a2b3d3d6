// ABOUTME: Typed view of the SMPP data_coding octet (SMPP v3.4 Section 5.2.19)
// ABOUTME: Maps wire values to character sets and message classes

use std::fmt;

/// The data_coding scheme of a short message.
///
/// `from_byte` never fails; values outside the named set are kept in `Custom`
/// so `to_byte(from_byte(x)) == x` for every octet except the duplicate binary
/// value 0x04, which reads back as 0x02.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataCoding {
    /// SMSC Default Alphabet (typically GSM 7-bit)
    #[default]
    SmscDefault,
    /// IA5 (CCITT T.50)/ASCII encoding
    Ascii,
    /// 8-bit binary data (no encoding)
    Binary,
    /// Latin-1 (ISO-8859-1) character set
    Latin1,
    /// UCS-2 (ISO/IEC-10646) Unicode encoding
    Ucs2,
    /// Cyrillic (ISO-8859-5) character set
    Cyrillic,
    /// Latin/Hebrew (ISO-8859-8) character set
    LatinHebrew,
    /// JIS (X 0208-1990) Japanese character set
    Jis,
    /// Message waiting group, discard message (0xC0)
    Silent,
    /// GSM 7-bit default alphabet with message class
    Gsm7BitWithClass(MessageClass),
    /// UCS-2 with message class
    Ucs2WithClass(MessageClass),
    /// Custom/reserved data coding value
    Custom(u8),
}

impl DataCoding {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => DataCoding::SmscDefault,
            0x01 => DataCoding::Ascii,
            0x02 | 0x04 => DataCoding::Binary,
            0x03 => DataCoding::Latin1,
            0x05 => DataCoding::Jis,
            0x06 => DataCoding::Cyrillic,
            0x07 => DataCoding::LatinHebrew,
            0x08 => DataCoding::Ucs2,
            0xC0 => DataCoding::Silent,
            0xF0 => DataCoding::Gsm7BitWithClass(MessageClass::Flash),
            0xF1 => DataCoding::Gsm7BitWithClass(MessageClass::MobileEquipment),
            0xF2 => DataCoding::Gsm7BitWithClass(MessageClass::SimSpecific),
            0xF3 => DataCoding::Gsm7BitWithClass(MessageClass::TerminalEquipment),
            0xF4 => DataCoding::Ucs2WithClass(MessageClass::Flash),
            0xF5 => DataCoding::Ucs2WithClass(MessageClass::MobileEquipment),
            0xF6 => DataCoding::Ucs2WithClass(MessageClass::SimSpecific),
            0xF7 => DataCoding::Ucs2WithClass(MessageClass::TerminalEquipment),
            _ => DataCoding::Custom(value),
        }
    }

    /// Returns the raw u8 value for wire protocol
    pub fn to_byte(&self) -> u8 {
        match self {
            DataCoding::SmscDefault => 0x00,
            DataCoding::Ascii => 0x01,
            DataCoding::Binary => 0x02,
            DataCoding::Latin1 => 0x03,
            DataCoding::Jis => 0x05,
            DataCoding::Cyrillic => 0x06,
            DataCoding::LatinHebrew => 0x07,
            DataCoding::Ucs2 => 0x08,
            DataCoding::Silent => 0xC0,
            DataCoding::Gsm7BitWithClass(class) => 0xF0 | class.bits(),
            DataCoding::Ucs2WithClass(class) => 0xF4 | class.bits(),
            DataCoding::Custom(value) => *value,
        }
    }

    /// Returns the message class if this coding scheme includes one
    pub fn message_class(&self) -> Option<MessageClass> {
        match self {
            DataCoding::Gsm7BitWithClass(class) | DataCoding::Ucs2WithClass(class) => Some(*class),
            _ => None,
        }
    }

    pub fn is_unicode(&self) -> bool {
        matches!(self, DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_))
    }

    /// Returns the character set name for this encoding
    pub fn charset_name(&self) -> &'static str {
        match self {
            DataCoding::SmscDefault | DataCoding::Gsm7BitWithClass(_) => "GSM 7-bit Default",
            DataCoding::Ascii => "ASCII/IA5",
            DataCoding::Binary => "Binary",
            DataCoding::Latin1 => "ISO-8859-1",
            DataCoding::Jis => "JIS X 0208-1990",
            DataCoding::Cyrillic => "ISO-8859-5",
            DataCoding::LatinHebrew => "ISO-8859-8",
            DataCoding::Silent => "Silent",
            DataCoding::Ucs2 | DataCoding::Ucs2WithClass(_) => "UCS-2",
            DataCoding::Custom(_) => "Custom/Reserved",
        }
    }
}

impl From<u8> for DataCoding {
    fn from(value: u8) -> Self {
        DataCoding::from_byte(value)
    }
}

impl From<DataCoding> for u8 {
    fn from(value: DataCoding) -> Self {
        value.to_byte()
    }
}

impl fmt::Debug for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataCoding({}, 0x{:02X})", self.charset_name(), self.to_byte())
    }
}

/// Message class for SMS delivery
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MessageClass {
    /// Flash SMS (displayed immediately, not stored)
    Flash,
    /// Mobile Equipment specific message
    MobileEquipment,
    /// SIM-specific message (stored on SIM card)
    SimSpecific,
    /// Terminal Equipment specific message
    TerminalEquipment,
}

impl MessageClass {
    fn bits(&self) -> u8 {
        match self {
            MessageClass::Flash => 0,
            MessageClass::MobileEquipment => 1,
            MessageClass::SimSpecific => 2,
            MessageClass::TerminalEquipment => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_coding_byte_round_trip() {
        for value in 0u8..=255 {
            if value == 0x04 {
                continue;
            }
            assert_eq!(DataCoding::from_byte(value).to_byte(), value);
        }
        assert_eq!(DataCoding::from_byte(0x04), DataCoding::Binary);
    }

    #[test]
    fn message_class_is_exposed() {
        assert_eq!(
            DataCoding::from_byte(0xF5).message_class(),
            Some(MessageClass::MobileEquipment)
        );
        assert!(DataCoding::from_byte(0xF6).is_unicode());
        assert_eq!(DataCoding::Latin1.message_class(), None);
    }

    #[test]
    fn silent_coding() {
        assert_eq!(DataCoding::from_byte(0xC0), DataCoding::Silent);
        assert_eq!(DataCoding::Silent.charset_name(), "Silent");
    }
}
