//! Record assembly: validated decode outputs in, one `Attestation` out.

use alloy_primitives::Address;
use attestindex_core::{Attestation, DecodeError, TransactionRef};

use crate::call::{AttestCall, AttestCallDecoder};
use crate::payload::{decode_attestation_data, DecodedPayload};
use crate::subject::{checksum, normalize_subject};

/// Outcome of running the full decode chain over one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAttestation {
    pub call: AttestCall,
    pub payload: DecodedPayload,
    pub subject: Address,
}

/// Run call decode, payload decode, and subject normalization in sequence.
///
/// `Ok(None)` covers both silent outcomes: the transaction is not applicable
/// (wrong destination or empty calldata) or the attestation carries no data.
pub fn decode_attestation(
    decoder: &AttestCallDecoder,
    to: Option<&str>,
    input: &[u8],
) -> Result<Option<DecodedAttestation>, DecodeError> {
    let call = match decoder.decode(to, input)? {
        Some(call) => call,
        None => return Ok(None),
    };
    let payload = match decode_attestation_data(&call.payload.attestation_data)? {
        Some(payload) => payload,
        None => return Ok(None),
    };
    let subject = normalize_subject(&call.payload.subject)?;

    Ok(Some(DecodedAttestation {
        call,
        payload,
        subject,
    }))
}

/// Build the final record from already-validated parts.
///
/// Performs no decoding and cannot fail; inconsistent inputs here are a bug
/// upstream, not a runtime condition. `block_timestamp` is the on-chain
/// timestamp of the containing block, so re-running a backfill reproduces
/// identical records.
pub fn assemble(
    tx: &TransactionRef,
    decoded: &DecodedAttestation,
    block_timestamp: i64,
) -> Attestation {
    Attestation {
        tx_hash: tx.hash.clone(),
        block_number: tx.block_number,
        schema_id: format!("0x{}", hex::encode(decoded.call.payload.schema_id)),
        subject: checksum(decoded.subject),
        is_positive: decoded.payload.is_positive,
        article_page: decoded.payload.article_page.clone(),
        submitter: checksum(decoded.payload.submitter),
        timestamp: block_timestamp,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
