use super::TextError;

pub(super) fn encode(text: &str) -> Result<Vec<u8>, TextError> {
    text.chars()
        .map(|ch| {
            u8::try_from(u32::from(ch)).map_err(|_| TextError::InvalidCharacter {
                ch,
                coding: "latin-1",
            })
        })
        .collect()
}

pub(super) fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_round_trip() {
        let encoded = encode("Ærø ¿?").unwrap();
        assert_eq!(encoded, vec![0xC6, 0x72, 0xF8, 0x20, 0xBF, 0x3F]);
        assert_eq!(decode(&encoded), "Ærø ¿?");
    }

    #[test]
    fn latin1_rejects_wide_characters() {
        assert_eq!(
            encode("price: €5"),
            Err(TextError::InvalidCharacter { ch: '€', coding: "latin-1" })
        );
    }
}
