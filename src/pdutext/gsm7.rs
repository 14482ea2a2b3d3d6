// ABOUTME: GSM 03.38 default alphabet with its 0x1B extension table
// ABOUTME: Unpacked (one septet per octet) and packed (LSB first) forms, plus septet helpers

use super::TextError;

const ESCAPE: u8 = 0x1B;

#[rustfmt::skip]
const DEFAULT_ALPHABET: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

fn default_septet(ch: char) -> Option<u8> {
    DEFAULT_ALPHABET
        .iter()
        .position(|&c| c == ch)
        .map(|i| i as u8)
        .filter(|&septet| septet != ESCAPE)
}

fn extension_septet(ch: char) -> Option<u8> {
    EXTENSION.iter().find(|(_, c)| *c == ch).map(|(s, _)| *s)
}

/// Convert text to septets, one per octet, escapes included.
pub fn to_septets(text: &str) -> Result<Vec<u8>, TextError> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(septet) = default_septet(ch) {
            out.push(septet);
        } else if let Some(septet) = extension_septet(ch) {
            out.push(ESCAPE);
            out.push(septet);
        } else {
            return Err(TextError::InvalidCharacter { ch, coding: "gsm 7-bit" });
        }
    }
    Ok(out)
}

/// Convert septets back to text.
pub fn from_septets(septets: &[u8]) -> Result<String, TextError> {
    let mut out = String::with_capacity(septets.len());
    let mut iter = septets.iter().enumerate();
    while let Some((offset, &septet)) = iter.next() {
        if septet >= 0x80 {
            return Err(TextError::InvalidByte { offset, coding: "gsm 7-bit" });
        }
        if septet != ESCAPE {
            out.push(DEFAULT_ALPHABET[septet as usize]);
            continue;
        }
        let (_, &code) = iter.next().ok_or(TextError::TrailingEscape)?;
        let ch = EXTENSION
            .iter()
            .find(|(s, _)| *s == code)
            .map(|(_, c)| *c)
            .ok_or(TextError::UndefinedExtension(code))?;
        out.push(ch);
    }
    Ok(out)
}

/// Number of septets `text` occupies, counting escaped characters twice.
pub fn septet_count(text: &str) -> Result<usize, TextError> {
    text.chars().try_fold(0usize, |count, ch| {
        if default_septet(ch).is_some() {
            Ok(count + 1)
        } else if extension_septet(ch).is_some() {
            Ok(count + 2)
        } else {
            Err(TextError::InvalidCharacter { ch, coding: "gsm 7-bit" })
        }
    })
}

/// Pack septets LSB first, starting after `fill_bits` zero bits.
///
/// The fill aligns packed text after a user data header.
pub fn pack(septets: &[u8], fill_bits: u8) -> Vec<u8> {
    let total_bits = fill_bits as usize + septets.len() * 7;
    let mut out = vec![0u8; total_bits.div_ceil(8)];
    for (i, &septet) in septets.iter().enumerate() {
        let bit = fill_bits as usize + i * 7;
        let (byte, shift) = (bit / 8, bit % 8);
        let value = u16::from(septet & 0x7F) << shift;
        out[byte] |= value as u8;
        if shift > 1 {
            out[byte + 1] |= (value >> 8) as u8;
        }
    }
    out
}

/// Unpack every whole septet that follows `fill_bits` leading bits.
pub fn unpack(packed: &[u8], fill_bits: u8) -> Vec<u8> {
    let total_bits = (packed.len() * 8).saturating_sub(fill_bits as usize);
    let count = total_bits / 7;
    (0..count)
        .map(|i| {
            let bit = fill_bits as usize + i * 7;
            let (byte, shift) = (bit / 8, bit % 8);
            let mut value = u16::from(packed[byte]) >> shift;
            if shift > 1 {
                value |= u16::from(packed[byte + 1]) << (8 - shift);
            }
            (value & 0x7F) as u8
        })
        .collect()
}

pub(super) fn encode(text: &str) -> Result<Vec<u8>, TextError> {
    to_septets(text)
}

pub(super) fn decode(bytes: &[u8]) -> Result<String, TextError> {
    from_septets(bytes)
}

const CR: u8 = 0x0D;

/// Packs text, filling seven spare bits with CR rather than zeros.
///
/// Zero fill would read back as '@'. A text that itself ends in CR on an
/// octet boundary gets a second CR, which receivers treat as one.
pub(super) fn encode_packed(text: &str) -> Result<Vec<u8>, TextError> {
    let mut septets = to_septets(text)?;
    match septets.len() % 8 {
        7 => septets.push(CR),
        0 if septets.last() == Some(&CR) => septets.push(CR),
        _ => {}
    }
    Ok(pack(&septets, 0))
}

pub(super) fn decode_packed(bytes: &[u8]) -> Result<String, TextError> {
    let mut septets = unpack(bytes, 0);
    if septets.len() % 8 == 0 && septets.last() == Some(&CR) {
        septets.pop();
    }
    from_septets(&septets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_packs() {
        let packed = encode_packed("Hello world").unwrap();
        assert_eq!(
            packed,
            vec![0xC8, 0x32, 0x9B, 0xFD, 0x06, 0xDD, 0xDF, 0x72, 0x36, 0x19]
        );
        assert_eq!(decode_packed(&packed).unwrap(), "Hello world");
    }

    #[test]
    fn seven_characters_fill_with_carriage_return() {
        let packed = encode_packed("1234567").unwrap();
        assert_eq!(packed.len(), 7);
        assert_eq!(packed[6], CR << 1);
        assert_eq!(decode_packed(&packed).unwrap(), "1234567");

        // A zero byte after seven septets is a real '@'.
        let packed = encode_packed("1234567@").unwrap();
        assert_eq!(packed.len(), 7);
        assert_eq!(decode_packed(&packed).unwrap(), "1234567@");
        let packed = encode_packed("123456@@").unwrap();
        assert_eq!(decode_packed(&packed).unwrap(), "123456@@");
        let packed = encode_packed("123456@").unwrap();
        assert_eq!(decode_packed(&packed).unwrap(), "123456@");
    }

    #[test]
    fn trailing_carriage_return_on_boundary_is_doubled() {
        let packed = encode_packed("1234567\r").unwrap();
        assert_eq!(packed.len(), 8);
        assert_eq!(decode_packed(&packed).unwrap(), "1234567\r\r");
    }

    #[test]
    fn extension_table_uses_escape() {
        let septets = to_septets("{€}").unwrap();
        assert_eq!(septets, vec![0x1B, 0x28, 0x1B, 0x65, 0x1B, 0x29]);
        assert_eq!(from_septets(&septets).unwrap(), "{€}");
        assert_eq!(septet_count("a[b]").unwrap(), 6);
    }

    #[test]
    fn unpacked_round_trip() {
        let encoded = encode("Øre @ 10£").unwrap();
        assert_eq!(encoded[0], 0x0B);
        assert_eq!(decode(&encoded).unwrap(), "Øre @ 10£");
    }

    #[test]
    fn decoder_rejections() {
        assert_eq!(decode(&[0x41, 0x1B]), Err(TextError::TrailingEscape));
        assert_eq!(decode(&[0x1B, 0x41]), Err(TextError::UndefinedExtension(0x41)));
        assert_eq!(
            decode(&[0x41, 0x80]),
            Err(TextError::InvalidByte { offset: 1, coding: "gsm 7-bit" })
        );
        assert!(matches!(
            encode("日本"),
            Err(TextError::InvalidCharacter { ch: '日', .. })
        ));
        // ESC is not a character of the alphabet.
        assert!(encode("\u{1B}").is_err());
    }

    #[test]
    fn fill_bits_align_after_header() {
        let septets = to_septets("Hi").unwrap();
        let packed = pack(&septets, 1);
        assert_eq!(packed, vec![0x90, 0x69]);
        assert_eq!(&unpack(&packed, 1)[..2], &septets[..]);
    }
}
