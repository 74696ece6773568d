//! Share tokens and share-set encoding.
//!
//! A token is `base64(id || data)`. A share set, as stored in a file record's
//! `SharedKey` field, is a JSON array of tokens.

use super::{SharingError, SharingResult};
use base64::{Engine as _, engine::general_purpose};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// One evaluation of the per-byte polynomials at the non-zero point `id`.
/// Wiped on drop.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    pub id: u8,
    pub data: Vec<u8>,
}

impl Share {
    pub fn encode(&self) -> String {
        let mut raw = Zeroizing::new(Vec::with_capacity(self.data.len() + 1));
        raw.push(self.id);
        raw.extend_from_slice(&self.data);
        general_purpose::STANDARD.encode(raw.as_slice())
    }

    pub fn decode(token: &str) -> SharingResult<Self> {
        let raw = Zeroizing::new(
            general_purpose::STANDARD
                .decode(token.trim())
                .map_err(|err| SharingError::Malformed(format!("share token is not base64: {err}")))?,
        );
        match raw.split_first() {
            Some((&0, _)) => Err(SharingError::Malformed("share id 0 is reserved".into())),
            Some((&id, data)) if !data.is_empty() => Ok(Share {
                id,
                data: data.to_vec(),
            }),
            _ => Err(SharingError::Malformed("share token carries no data".into())),
        }
    }
}

/// Serialize shares into the JSON token array kept on the ledger.
pub fn encode_share_set(shares: &[Share]) -> String {
    let tokens: Vec<String> = shares.iter().map(Share::encode).collect();
    // a Vec<String> always serializes
    serde_json::to_string(&tokens).unwrap_or_else(|_| "[]".into())
}

/// Parse a JSON token array back into shares.
pub fn decode_share_set(encoded: &str) -> SharingResult<Vec<Share>> {
    let tokens: Vec<String> = serde_json::from_str(encoded)
        .map_err(|err| SharingError::Malformed(format!("share set is not a token array: {err}")))?;
    tokens.iter().map(|t| Share::decode(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_keeps_id_and_payload() {
        let share = Share {
            id: 7,
            data: vec![1, 2, 3],
        };
        assert_eq!(Share::decode(&share.encode()).unwrap(), share);
    }

    #[test]
    fn zero_id_and_empty_payload_are_rejected() {
        let zero = general_purpose::STANDARD.encode([0u8, 9, 9]);
        assert!(matches!(Share::decode(&zero), Err(SharingError::Malformed(_))));

        let empty = general_purpose::STANDARD.encode([3u8]);
        assert!(matches!(Share::decode(&empty), Err(SharingError::Malformed(_))));

        assert!(matches!(Share::decode("%%%"), Err(SharingError::Malformed(_))));
    }

    #[test]
    fn share_set_is_a_json_array() {
        let shares = vec![
            Share { id: 1, data: vec![0xaa] },
            Share { id: 2, data: vec![0xbb] },
        ];
        let encoded = encode_share_set(&shares);
        assert!(encoded.starts_with('['));
        assert_eq!(decode_share_set(&encoded).unwrap(), shares);
        assert!(decode_share_set("{\"a\":1}").is_err());
    }
}
