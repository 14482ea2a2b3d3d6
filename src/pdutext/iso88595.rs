use super::TextError;

// Most of the upper half is the Cyrillic block shifted down by 0x360.
const CYRILLIC_OFFSET: u32 = 0x360;

pub(super) fn encode(text: &str) -> Result<Vec<u8>, TextError> {
    text.chars()
        .map(|ch| {
            let byte = match u32::from(ch) {
                cp @ 0x00..=0xA0 => cp as u8,
                0xAD => 0xAD,
                0x2116 => 0xF0,
                0xA7 => 0xFD,
                0x40D | 0x450 | 0x45D => {
                    return Err(TextError::InvalidCharacter { ch, coding: "iso-8859-5" });
                }
                cp @ 0x401..=0x45F => (cp - CYRILLIC_OFFSET) as u8,
                _ => return Err(TextError::InvalidCharacter { ch, coding: "iso-8859-5" }),
            };
            Ok(byte)
        })
        .collect()
}

pub(super) fn decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x00..=0xA0 | 0xAD => char::from(b),
            0xF0 => '\u{2116}',
            0xFD => '\u{A7}',
            _ => char::from_u32(u32::from(b) + CYRILLIC_OFFSET).unwrap_or(char::REPLACEMENT_CHARACTER),
        })
        .collect()
}
