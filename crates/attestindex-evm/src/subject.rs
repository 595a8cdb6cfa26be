//! Subject identifier normalization.
//!
//! Subjects arrive as raw bytes: either a 20-byte address or a 32-byte
//! left-padded word (the common on-chain habit of passing an address through
//! `abi.encode`). Both forms normalize to the same address; every other
//! length is a per-transaction failure.

use alloy_primitives::Address;
use attestindex_core::DecodeError;

/// Normalize raw subject bytes to an address.
///
/// Pure: no logging, no configuration. For a 32-byte word only the low-order
/// 20 bytes are the address; the leading 12 are padding and are discarded.
pub fn normalize_subject(raw: &[u8]) -> Result<Address, DecodeError> {
    match raw.len() {
        20 => Ok(Address::from_slice(raw)),
        32 => Ok(Address::from_slice(&raw[12..])),
        len => Err(DecodeError::SubjectLength { len }),
    }
}

/// Render an address in EIP-55 checksummed form, as stored on records.
pub fn checksum(address: Address) -> String {
    address.to_checksum(None)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: &str = "AbCdEf0123456789AbCdEf0123456789AbCdEf01";

    #[test]
    fn literal_and_padded_forms_normalize_identically() {
        let literal = hex::decode(SUBJECT).unwrap();
        let mut padded = vec![0u8; 12];
        padded.extend_from_slice(&literal);

        let from_literal = normalize_subject(&literal).unwrap();
        let from_padded = normalize_subject(&padded).unwrap();

        assert_eq!(from_literal, from_padded);
        assert_eq!(checksum(from_literal), checksum(from_padded));
        assert_eq!(
            checksum(from_literal).to_lowercase(),
            format!("0x{}", SUBJECT.to_lowercase())
        );
    }

    #[test]
    fn checksum_matches_known_vector() {
        // First example address from the EIP-55 write-up.
        let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let address = normalize_subject(&raw).unwrap();
        assert_eq!(
            checksum(address),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn rejects_other_lengths() {
        for len in [0usize, 19, 21, 31, 33, 64] {
            let raw = vec![0x11u8; len];
            let err = normalize_subject(&raw).unwrap_err();
            assert!(matches!(err, DecodeError::SubjectLength { len: l } if l == len));
        }
    }
}
