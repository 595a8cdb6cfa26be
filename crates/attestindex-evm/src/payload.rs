//! Inner attestation payload decoder.
//!
//! Attestations carry a second ABI-encoded layer inside the call's
//! `attestationData`: a fixed `(bool isPositive, string articlePage,
//! address submitter)` tuple. Empty data is legal ("no data"); everything
//! else decodes completely or the record is dropped.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use attestindex_core::DecodeError;

use crate::extract;

/// The decoded inner payload. Transient: feeds record assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub is_positive: bool,
    pub article_page: String,
    pub submitter: Address,
}

/// The fixed payload schema.
fn payload_type() -> DynSolType {
    DynSolType::Tuple(vec![
        DynSolType::Bool,
        DynSolType::String,
        DynSolType::Address,
    ])
}

/// Decode `attestation_data` against the fixed payload schema.
///
/// `Ok(None)` means the attestation carries no data; that is legal and no
/// record is produced for it. Any mismatch against the schema (wrong arity,
/// truncated tail, non-UTF-8 text) is an error and the record is dropped.
pub fn decode_attestation_data(data: &[u8]) -> Result<Option<DecodedPayload>, DecodeError> {
    if data.is_empty() {
        return Ok(None);
    }

    let payload_err = |reason: String| DecodeError::PayloadDecodeFailed { reason };

    let decoded = payload_type()
        .abi_decode_params(data)
        .map_err(|e| payload_err(format!("attestationData: {e}")))?;

    let fields = extract::tuple(decoded, "attestationData").map_err(payload_err)?;
    let [positive_value, page_value, submitter_value]: [DynSolValue; 3] =
        fields.try_into().map_err(|vals: Vec<DynSolValue>| {
            payload_err(format!(
                "attestationData: expected 3 fields, got {}",
                vals.len()
            ))
        })?;

    let is_positive = extract::boolean(positive_value, "isPositive").map_err(payload_err)?;
    let article_page = extract::string(page_value, "articlePage").map_err(payload_err)?;
    let submitter = extract::address(submitter_value, "submitter").map_err(payload_err)?;

    // dyn-abi decodes strings lossily; a replacement char means the bytes
    // were not UTF-8.
    if article_page.contains('\u{FFFD}') {
        return Err(payload_err("articlePage: invalid UTF-8".into()));
    }

    Ok(Some(DecodedPayload {
        is_positive,
        article_page,
        submitter,
    }))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_attestation_data;

    // abi.encode(true, "page-3", 0xaaaa…aaaa), written out word by word:
    // bool, string offset (0x60), address, string length, string bytes.
    const CANONICAL_HEX: &str = concat!(
        "0000000000000000000000000000000000000000000000000000000000000001",
        "0000000000000000000000000000000000000000000000000000000000000060",
        "000000000000000000000000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        "0000000000000000000000000000000000000000000000000000000000000006",
        "706167652d330000000000000000000000000000000000000000000000000000",
    );

    #[test]
    fn empty_data_is_no_data() {
        let result = decode_attestation_data(&[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn decodes_canonical_layout() {
        let data = hex::decode(CANONICAL_HEX).unwrap();
        let payload = decode_attestation_data(&data).unwrap().expect("payload");
        assert!(payload.is_positive);
        assert_eq!(payload.article_page, "page-3");
        assert_eq!(payload.submitter, Address::repeat_byte(0xaa));
    }

    #[test]
    fn encoder_matches_canonical_layout() {
        let encoded = encode_attestation_data(true, "page-3", Address::repeat_byte(0xaa));
        assert_eq!(hex::encode(encoded), CANONICAL_HEX);
    }

    #[test]
    fn roundtrips_through_encoder() {
        let submitter = Address::repeat_byte(0xaa);
        let encoded = encode_attestation_data(true, "page-3", submitter);
        let payload = decode_attestation_data(&encoded).unwrap().expect("payload");
        assert!(payload.is_positive);
        assert_eq!(payload.article_page, "page-3");
        assert_eq!(payload.submitter, submitter);
    }

    #[test]
    fn truncated_tail_is_rejected() {
        let data = hex::decode(CANONICAL_HEX).unwrap();
        // Keep the three head words but drop the string length and content
        // the offset word points at.
        let err = decode_attestation_data(&data[..96]).unwrap_err();
        assert!(matches!(err, DecodeError::PayloadDecodeFailed { .. }));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        // A lone bool word cannot satisfy the three-field schema.
        let data = hex::decode("0000000000000000000000000000000000000000000000000000000000000001")
            .unwrap();
        let err = decode_attestation_data(&data).unwrap_err();
        assert!(matches!(err, DecodeError::PayloadDecodeFailed { .. }));
    }

    #[test]
    fn non_utf8_article_page_is_rejected() {
        let mut data = hex::decode(CANONICAL_HEX).unwrap();
        for byte in &mut data[128..134] {
            *byte = 0xff;
        }
        let err = decode_attestation_data(&data).unwrap_err();
        assert!(matches!(err, DecodeError::PayloadDecodeFailed { .. }));
    }
}
