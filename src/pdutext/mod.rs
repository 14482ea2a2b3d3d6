//! Short message text codecs.
//!
//! Each [`Coding`] pairs a character set with the data_coding octet that
//! announces it on the wire. A [`Text`] is a string tagged with the coding it
//! should be sent in; setting one as a PDU's short_message encodes it and
//! updates data_coding in the same step.

pub mod gsm7;
mod iso88595;
mod latin1;
mod raw;
mod ucs2;

use crate::datatypes::DataCoding;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("character {ch:?} cannot be represented in {coding}")]
    InvalidCharacter { ch: char, coding: &'static str },

    #[error("invalid {coding} input at offset {offset}")]
    InvalidByte { offset: usize, coding: &'static str },

    #[error("GSM 7-bit input ends with an escape")]
    TrailingEscape,

    #[error("undefined GSM 7-bit extension character {0:#04x}")]
    UndefinedExtension(u8),
}

/// A short message character set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Coding {
    /// Bytes passed through as UTF-8.
    #[default]
    Raw,
    /// ISO-8859-1.
    Latin1,
    /// Big-endian UCS-2; characters outside the BMP are rejected.
    Ucs2,
    /// Big-endian UTF-16; characters outside the BMP become surrogate pairs.
    Ucs2Lenient,
    /// GSM 03.38 default alphabet, one septet per octet.
    Gsm7,
    /// GSM 03.38 default alphabet, septets packed LSB first.
    Gsm7Packed,
    /// ISO-8859-5 (Cyrillic).
    Iso88595,
    /// Encodes to nothing; data_coding 0xC0.
    Silent,
}

impl Coding {
    /// The data_coding octet announcing this character set.
    pub fn data_coding(&self) -> u8 {
        match self {
            Coding::Raw | Coding::Gsm7 | Coding::Gsm7Packed => 0x00,
            Coding::Latin1 => 0x03,
            Coding::Iso88595 => 0x06,
            Coding::Ucs2 | Coding::Ucs2Lenient => 0x08,
            Coding::Silent => 0xC0,
        }
    }

    /// Picks the decoder for an inbound message's data_coding.
    ///
    /// IA5 text is ASCII and reads fine as raw UTF-8.
    pub fn for_data_coding(data_coding: u8) -> Coding {
        match DataCoding::from_byte(data_coding) {
            DataCoding::Latin1 => Coding::Latin1,
            DataCoding::Cyrillic => Coding::Iso88595,
            dc if dc.is_unicode() => Coding::Ucs2,
            _ => Coding::Raw,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Coding::Raw => "raw",
            Coding::Latin1 => "latin-1",
            Coding::Ucs2 | Coding::Ucs2Lenient => "ucs-2",
            Coding::Gsm7 | Coding::Gsm7Packed => "gsm 7-bit",
            Coding::Iso88595 => "iso-8859-5",
            Coding::Silent => "silent",
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, TextError> {
        match self {
            Coding::Raw => Ok(raw::encode(text)),
            Coding::Latin1 => latin1::encode(text),
            Coding::Ucs2 => ucs2::encode(text),
            Coding::Ucs2Lenient => Ok(ucs2::encode_lenient(text)),
            Coding::Gsm7 => gsm7::encode(text),
            Coding::Gsm7Packed => gsm7::encode_packed(text),
            Coding::Iso88595 => iso88595::encode(text),
            Coding::Silent => Ok(Vec::new()),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, TextError> {
        match self {
            Coding::Raw => raw::decode(bytes),
            Coding::Latin1 => Ok(latin1::decode(bytes)),
            Coding::Ucs2 | Coding::Ucs2Lenient => ucs2::decode(bytes),
            Coding::Gsm7 => gsm7::decode(bytes),
            Coding::Gsm7Packed => gsm7::decode_packed(bytes),
            Coding::Iso88595 => Ok(iso88595::decode(bytes)),
            Coding::Silent => Ok(String::new()),
        }
    }

    pub fn is_gsm7(&self) -> bool {
        matches!(self, Coding::Gsm7 | Coding::Gsm7Packed)
    }
}

/// Text tagged with the coding it travels in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    pub coding: Coding,
    pub content: String,
}

impl Text {
    pub fn new(coding: Coding, content: impl Into<String>) -> Self {
        Text {
            coding,
            content: content.into(),
        }
    }

    pub fn raw(content: impl Into<String>) -> Self {
        Text::new(Coding::Raw, content)
    }

    pub fn latin1(content: impl Into<String>) -> Self {
        Text::new(Coding::Latin1, content)
    }

    pub fn ucs2(content: impl Into<String>) -> Self {
        Text::new(Coding::Ucs2, content)
    }

    pub fn gsm7(content: impl Into<String>) -> Self {
        Text::new(Coding::Gsm7, content)
    }

    pub fn gsm7_packed(content: impl Into<String>) -> Self {
        Text::new(Coding::Gsm7Packed, content)
    }

    pub fn iso88595(content: impl Into<String>) -> Self {
        Text::new(Coding::Iso88595, content)
    }

    pub fn silent() -> Self {
        Text::new(Coding::Silent, String::new())
    }

    pub fn encode(&self) -> Result<Vec<u8>, TextError> {
        self.coding.encode(&self.content)
    }

    pub fn decode(coding: Coding, bytes: &[u8]) -> Result<Self, TextError> {
        Ok(Text::new(coding, coding.decode(bytes)?))
    }

    pub fn data_coding(&self) -> u8 {
        self.coding.data_coding()
    }
}

impl From<&str> for Text {
    fn from(content: &str) -> Self {
        Text::raw(content)
    }
}

impl From<String> for Text {
    fn from(content: String) -> Self {
        Text::raw(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_coding_identifiers() {
        assert_eq!(Coding::Raw.data_coding(), 0x00);
        assert_eq!(Coding::Latin1.data_coding(), 0x03);
        assert_eq!(Coding::Ucs2.data_coding(), 0x08);
        assert_eq!(Coding::Gsm7Packed.data_coding(), 0x00);
        assert_eq!(Coding::Iso88595.data_coding(), 0x06);
        assert_eq!(Coding::Silent.data_coding(), 0xC0);
    }

    #[test]
    fn inbound_decoder_selection() {
        assert_eq!(Coding::for_data_coding(0x03), Coding::Latin1);
        assert_eq!(Coding::for_data_coding(0x06), Coding::Iso88595);
        assert_eq!(Coding::for_data_coding(0x08), Coding::Ucs2);
        assert_eq!(Coding::for_data_coding(0x00), Coding::Raw);
        assert_eq!(Coding::for_data_coding(0xF0), Coding::Raw);
        assert_eq!(Coding::for_data_coding(0x01), Coding::Raw);
        for class in 0xF4..=0xF7 {
            assert_eq!(Coding::for_data_coding(class), Coding::Ucs2);
        }
    }

    #[test]
    fn silent_is_empty_both_ways() {
        assert_eq!(Text::silent().encode().unwrap(), Vec::<u8>::new());
        assert_eq!(Coding::Silent.decode(b"ignored").unwrap(), "");
    }

    #[test]
    fn text_decode_keeps_coding() {
        let text = Text::decode(Coding::Latin1, &[0x63, 0x61, 0x66, 0xE9]).unwrap();
        assert_eq!(text, Text::latin1("café"));
        assert_eq!(text.data_coding(), 0x03);
    }
}
