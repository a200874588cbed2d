//! Base64 as used by license documents (standard alphabet, padded).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lcpt_core::CryptoError;

/// Decode a base64 document field.
///
/// Whitespace is ignored so that values wrapped by the producing server
/// still decode.
pub fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| CryptoError::Encoding {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Encode bytes as standard padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
