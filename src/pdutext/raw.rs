use super::TextError;

pub(super) fn encode(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

pub(super) fn decode(bytes: &[u8]) -> Result<String, TextError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| TextError::InvalidByte {
            offset: e.valid_up_to(),
            coding: "raw",
        })
}
