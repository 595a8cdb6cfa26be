//! Attestation calldata encoder, the inverse of the call decoder.
//!
//! Builds `attest` calldata and inner payload bytes from typed values.
//! Exists for fixtures and tests; the indexer itself only decodes.

use alloy_core::dyn_abi::DynSolValue;
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, U256};
use attestindex_core::DecodeError;

use crate::call::{AttestationPayload, ATTEST_ABI_JSON};

/// Builds calldata for the registry's `attest` entry point.
pub struct AttestEncoder {
    func: Function,
}

impl AttestEncoder {
    /// Create an encoder from the embedded ABI fragment.
    pub fn new() -> Result<Self, DecodeError> {
        let abi: JsonAbi =
            serde_json::from_str(ATTEST_ABI_JSON).map_err(|e| DecodeError::AbiDecodeFailed {
                reason: format!("invalid ABI JSON: {e}"),
            })?;
        let func = abi
            .functions()
            .find(|f| f.name == "attest")
            .cloned()
            .ok_or_else(|| DecodeError::AbiDecodeFailed {
                reason: "embedded ABI has no attest function".into(),
            })?;
        Ok(Self { func })
    }

    /// Encode a full `attest` call.
    ///
    /// Returns `selector ++ abi_encode(payload, validationPayloads)`, the
    /// calldata shape the decoder accepts.
    pub fn encode_call(
        &self,
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
    ) -> Vec<u8> {
        let payload_value = DynSolValue::Tuple(vec![
            DynSolValue::FixedBytes(payload.schema_id, 32),
            DynSolValue::Uint(U256::from(payload.expiration_date), 64),
            DynSolValue::Bytes(payload.subject.clone()),
            DynSolValue::Bytes(payload.attestation_data.clone()),
        ]);
        let validations_value = DynSolValue::Array(
            validation_payloads
                .iter()
                .cloned()
                .map(DynSolValue::Bytes)
                .collect(),
        );

        let mut calldata = self.func.selector().to_vec();
        calldata.extend_from_slice(
            &DynSolValue::Tuple(vec![payload_value, validations_value]).abi_encode_params(),
        );
        calldata
    }
}

/// ABI-encode the inner `(bool, string, address)` payload.
pub fn encode_attestation_data(is_positive: bool, article_page: &str, submitter: Address) -> Vec<u8> {
    DynSolValue::Tuple(vec![
        DynSolValue::Bool(is_positive),
        DynSolValue::String(article_page.to_owned()),
        DynSolValue::Address(submitter),
    ])
    .abi_encode_params()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
