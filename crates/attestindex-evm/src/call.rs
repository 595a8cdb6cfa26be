//! Attestation registry call decoder.
//!
//! Decodes transaction `input` data against the one call the registry
//! accepts:
//!
//! ```text
//! attest((bytes32 schemaId, uint64 expirationDate, bytes subject,
//!         bytes attestationData), bytes[] validationPayloads)
//! ```
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs tuple
//! - Transactions addressed elsewhere, or with empty calldata, are "not
//!   applicable" and decode to `Ok(None)`; everything else either decodes
//!   fully or fails

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, B256};
use attestindex_core::DecodeError;

use crate::extract;

/// ABI fragment for the registry's `attest` entry point. The payload struct
/// is a tuple on the wire.
pub(crate) const ATTEST_ABI_JSON: &str = r#"[
    {
        "name": "attest",
        "type": "function",
        "inputs": [
            {
                "name": "attestationPayload",
                "type": "tuple",
                "components": [
                    {"name": "schemaId", "type": "bytes32"},
                    {"name": "expirationDate", "type": "uint64"},
                    {"name": "subject", "type": "bytes"},
                    {"name": "attestationData", "type": "bytes"}
                ]
            },
            {"name": "validationPayloads", "type": "bytes[]"}
        ],
        "outputs": [],
        "stateMutability": "payable"
    }
]"#;

// ─── Decoded shapes ──────────────────────────────────────────────────────────

/// The outer payload of an `attest` call, exactly as carried on the wire.
/// Transient: exists between call decode and record assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationPayload {
    /// Registry schema the attestation claims to follow.
    pub schema_id: B256,
    /// Expiration as Unix seconds; zero means no expiry.
    pub expiration_date: u64,
    /// Raw subject bytes (20-byte address or 32-byte left-padded word).
    pub subject: Vec<u8>,
    /// Inner ABI-encoded payload; may be empty.
    pub attestation_data: Vec<u8>,
}

/// One fully-decoded `attest` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestCall {
    pub payload: AttestationPayload,
    /// Opaque validator inputs; carried through but never interpreted.
    pub validation_payloads: Vec<Vec<u8>>,
}

// ─── AttestCallDecoder ───────────────────────────────────────────────────────

/// Decodes raw transaction calldata addressed to one registry contract.
pub struct AttestCallDecoder {
    contract: Address,
    contract_hex: String,
    selector: [u8; 4],
    input_types: Vec<DynSolType>,
}

impl AttestCallDecoder {
    /// Create a decoder for the registry deployed at `contract`.
    ///
    /// # Errors
    /// Returns `DecodeError` if the embedded ABI fragment fails to parse;
    /// that only happens on a corrupted build.
    pub fn new(contract: Address) -> Result<Self, DecodeError> {
        let abi: JsonAbi =
            serde_json::from_str(ATTEST_ABI_JSON).map_err(|e| DecodeError::AbiDecodeFailed {
                reason: format!("invalid ABI JSON: {e}"),
            })?;
        let func = abi
            .functions()
            .find(|f| f.name == "attest")
            .ok_or_else(|| DecodeError::AbiDecodeFailed {
                reason: "embedded ABI has no attest function".into(),
            })?;

        let input_types = resolve_input_types(func)?;

        Ok(Self {
            contract,
            contract_hex: format!("{contract:#x}"),
            selector: func.selector().0,
            input_types,
        })
    }

    /// The registry contract this decoder filters on.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// The 4-byte selector of `attest`.
    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Returns `true` if `to` is the registry contract (case-insensitive).
    pub fn matches_destination(&self, to: &str) -> bool {
        to.eq_ignore_ascii_case(&self.contract_hex)
    }

    /// Decode one transaction's calldata.
    ///
    /// `Ok(None)` means the transaction is not applicable: it was addressed
    /// elsewhere (or to no contract at all) or carries empty calldata. Any
    /// `Err` is a per-transaction decode failure; the caller logs it and
    /// skips the transaction.
    ///
    /// # Arguments
    /// * `to` - the transaction's destination, `None` for contract creation
    /// * `input` - full calldata including the 4-byte selector prefix
    pub fn decode(&self, to: Option<&str>, input: &[u8]) -> Result<Option<AttestCall>, DecodeError> {
        match to {
            Some(to) if self.matches_destination(to) => {}
            _ => return Ok(None),
        }
        if input.is_empty() {
            return Ok(None);
        }
        if input.len() < 4 {
            return Err(DecodeError::CalldataTooShort { len: input.len() });
        }
        if input[..4] != self.selector {
            return Err(DecodeError::SelectorMismatch {
                got: hex::encode(&input[..4]),
            });
        }

        let decoded = DynSolType::Tuple(self.input_types.clone())
            .abi_decode_params(&input[4..])
            .map_err(|e| DecodeError::AbiDecodeFailed {
                reason: format!("attest inputs: {e}"),
            })?;

        extract_call(decoded).map(Some)
    }
}

/// Resolve the `attest` input params into concrete dynamic types.
fn resolve_input_types(func: &Function) -> Result<Vec<DynSolType>, DecodeError> {
    func.inputs
        .iter()
        .map(|p| {
            p.resolve().map_err(|e| DecodeError::AbiDecodeFailed {
                reason: format!("param '{}': {e}", p.name),
            })
        })
        .collect()
}

/// Pull the `(payload, validationPayloads)` pair out of the decoded tuple.
fn extract_call(decoded: DynSolValue) -> Result<AttestCall, DecodeError> {
    let abi_err = |reason: String| DecodeError::AbiDecodeFailed { reason };

    let inputs = extract::tuple(decoded, "attest inputs").map_err(abi_err)?;
    let [payload_value, validations_value]: [DynSolValue; 2] =
        inputs.try_into().map_err(|vals: Vec<DynSolValue>| {
            abi_err(format!("attest inputs: expected 2 values, got {}", vals.len()))
        })?;

    let fields = extract::tuple(payload_value, "attestationPayload").map_err(abi_err)?;
    let [schema_value, expiration_value, subject_value, data_value]: [DynSolValue; 4] =
        fields.try_into().map_err(|vals: Vec<DynSolValue>| {
            abi_err(format!(
                "attestationPayload: expected 4 fields, got {}",
                vals.len()
            ))
        })?;

    Ok(AttestCall {
        payload: AttestationPayload {
            schema_id: extract::word(schema_value, "schemaId").map_err(abi_err)?,
            expiration_date: extract::uint64(expiration_value, "expirationDate").map_err(abi_err)?,
            subject: extract::bytes(subject_value, "subject").map_err(abi_err)?,
            attestation_data: extract::bytes(data_value, "attestationData").map_err(abi_err)?,
        },
        validation_payloads: extract::bytes_array(validations_value, "validationPayloads")
            .map_err(abi_err)?,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_attestation_data, AttestEncoder};

    const REGISTRY: &str = "0x4d339Fb2Cc8A3a07E91fb4a9b1E232B2f6002deF";

    fn decoder() -> AttestCallDecoder {
        AttestCallDecoder::new(REGISTRY.parse().unwrap()).unwrap()
    }

    fn sample_payload() -> AttestationPayload {
        AttestationPayload {
            schema_id: B256::repeat_byte(0x11),
            expiration_date: 1_999_999_999,
            subject: vec![0xaa; 20],
            attestation_data: encode_attestation_data(true, "page-3", Address::repeat_byte(0xaa)),
        }
    }

    fn sample_calldata() -> Vec<u8> {
        AttestEncoder::new()
            .unwrap()
            .encode_call(&sample_payload(), &[vec![0x01, 0x02]])
    }

    #[test]
    fn decodes_attest_calldata() {
        let call = decoder()
            .decode(Some(REGISTRY), &sample_calldata())
            .unwrap()
            .expect("applicable call");
        assert_eq!(call.payload, sample_payload());
        assert_eq!(call.validation_payloads, vec![vec![0x01, 0x02]]);
    }

    #[test]
    fn foreign_destination_is_not_applicable() {
        let other = "0x0000000000000000000000000000000000000001";
        let result = decoder().decode(Some(other), &sample_calldata()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn contract_creation_is_not_applicable() {
        let result = decoder().decode(None, &sample_calldata()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn destination_match_ignores_case() {
        let upper = REGISTRY.to_ascii_uppercase();
        let result = decoder().decode(Some(&upper), &sample_calldata()).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn empty_calldata_is_not_applicable() {
        let result = decoder().decode(Some(REGISTRY), &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn short_calldata_is_rejected() {
        let err = decoder().decode(Some(REGISTRY), &[0xde, 0xad]).unwrap_err();
        assert!(matches!(err, DecodeError::CalldataTooShort { len: 2 }));
    }

    #[test]
    fn selector_mismatch_is_rejected() {
        let mut calldata = sample_calldata();
        calldata[0] ^= 0xff;
        let err = decoder().decode(Some(REGISTRY), &calldata).unwrap_err();
        assert!(matches!(err, DecodeError::SelectorMismatch { .. }));
    }

    #[test]
    fn truncated_tail_is_rejected() {
        let calldata = sample_calldata();
        // Drop the final validation payload's length and content words.
        let cut = &calldata[..calldata.len() - 64];
        let err = decoder().decode(Some(REGISTRY), cut).unwrap_err();
        assert!(matches!(err, DecodeError::AbiDecodeFailed { .. }));
    }
}
