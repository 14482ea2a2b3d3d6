use super::TextError;

const CODING: &str = "ucs-2";

/// Big-endian UCS-2. Characters outside the Basic Multilingual Plane fail.
pub(super) fn encode(text: &str) -> Result<Vec<u8>, TextError> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let unit = u16::try_from(u32::from(ch))
            .map_err(|_| TextError::InvalidCharacter { ch, coding: CODING })?;
        out.extend_from_slice(&unit.to_be_bytes());
    }
    Ok(out)
}

/// Big-endian UTF-16, emitting surrogate pairs where needed.
pub(super) fn encode_lenient(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

pub(super) fn decode(bytes: &[u8]) -> Result<String, TextError> {
    if bytes.len() % 2 != 0 {
        return Err(TextError::InvalidByte {
            offset: bytes.len() - 1,
            coding: CODING,
        });
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

    let mut out = String::with_capacity(bytes.len() / 2);
    let mut offset = 0;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(ch) => {
                offset += ch.len_utf16() * 2;
                out.push(ch);
            }
            Err(_) => return Err(TextError::InvalidByte { offset, coding: CODING }),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ucs2_is_big_endian() {
        assert_eq!(encode("Hé").unwrap(), vec![0x00, 0x48, 0x00, 0xE9]);
        assert_eq!(decode(&[0x04, 0x1F, 0x04, 0x40]).unwrap(), "Пр");
    }

    #[test]
    fn strict_mode_rejects_astral_characters() {
        assert_eq!(
            encode("ok 😀"),
            Err(TextError::InvalidCharacter { ch: '😀', coding: CODING })
        );
    }

    #[test]
    fn lenient_mode_emits_surrogates() {
        let encoded = encode_lenient("😀");
        assert_eq!(encoded, vec![0xD8, 0x3D, 0xDE, 0x00]);
        assert_eq!(decode(&encoded).unwrap(), "😀");
    }

    #[test]
    fn odd_length_and_lone_surrogates_fail() {
        assert_eq!(
            decode(&[0x00, 0x41, 0x00]),
            Err(TextError::InvalidByte { offset: 2, coding: CODING })
        );
        assert_eq!(
            decode(&[0x00, 0x41, 0xD8, 0x3D]),
            Err(TextError::InvalidByte { offset: 2, coding: CODING })
        );
    }
}
