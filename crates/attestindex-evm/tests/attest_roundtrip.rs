//! End-to-end decode tests over the public API.
//!
//! Each test builds real `attest` calldata with the encoder, runs the full
//! call → payload → subject chain, and asserts on the assembled record.

use alloy_primitives::{Address, B256};
use attestindex_core::{DecodeError, TransactionRef};
use attestindex_evm::{
    assemble, decode_attestation, encode_attestation_data, AttestCallDecoder, AttestEncoder,
    AttestationPayload,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

const REGISTRY: &str = "0x4d339Fb2Cc8A3a07E91fb4a9b1E232B2f6002deF";
const SUBJECT_HEX: &str = "AbCdEf0123456789AbCdEf0123456789AbCdEf01";

fn decoder() -> AttestCallDecoder {
    AttestCallDecoder::new(REGISTRY.parse().expect("registry address")).expect("decoder")
}

/// Build full `attest` calldata around the given subject and inner payload.
fn attest_calldata(subject: Vec<u8>, attestation_data: Vec<u8>) -> Vec<u8> {
    let payload = AttestationPayload {
        schema_id: B256::repeat_byte(0x33),
        expiration_date: 0,
        subject,
        attestation_data,
    };
    AttestEncoder::new()
        .expect("encoder")
        .encode_call(&payload, &[])
}

fn subject_bytes() -> Vec<u8> {
    hex::decode(SUBJECT_HEX).unwrap_or_else(|e| panic!("bad hex '{SUBJECT_HEX}': {e}"))
}

// ─── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn padded_and_literal_subjects_produce_the_same_record() {
    let inner = encode_attestation_data(true, "page-3", Address::repeat_byte(0x77));

    let literal = subject_bytes();
    let mut padded = vec![0u8; 12];
    padded.extend_from_slice(&literal);

    let dec = decoder();
    let tx = TransactionRef::new("0xabc", 500);

    let from_literal = decode_attestation(&dec, Some(REGISTRY), &attest_calldata(literal, inner.clone()))
        .expect("decode")
        .expect("record");
    let from_padded = decode_attestation(&dec, Some(REGISTRY), &attest_calldata(padded, inner))
        .expect("decode")
        .expect("record");

    let record_a = assemble(&tx, &from_literal, 1_700_000_000);
    let record_b = assemble(&tx, &from_padded, 1_700_000_000);
    assert_eq!(record_a, record_b);
    assert_eq!(
        record_a.subject.to_lowercase(),
        format!("0x{}", SUBJECT_HEX.to_lowercase())
    );
}

#[test]
fn full_chain_reproduces_encoded_triple() {
    let submitter = Address::repeat_byte(0xaa);
    let inner = encode_attestation_data(true, "page-3", submitter);
    let calldata = attest_calldata(subject_bytes(), inner);

    let decoded = decode_attestation(&decoder(), Some(REGISTRY), &calldata)
        .expect("decode")
        .expect("record");

    assert!(decoded.payload.is_positive);
    assert_eq!(decoded.payload.article_page, "page-3");
    assert_eq!(decoded.payload.submitter, submitter);

    let record = assemble(&TransactionRef::new("0xdef", 42), &decoded, 1_699_999_999);
    assert_eq!(record.block_number, 42);
    assert_eq!(record.schema_id, format!("0x{}", "33".repeat(32)));
    assert_eq!(
        record.submitter.to_lowercase(),
        format!("0x{}", "aa".repeat(20))
    );
}

#[test]
fn foreign_destination_produces_no_record() {
    // The inner payload is garbage; it must never be looked at.
    let calldata = attest_calldata(subject_bytes(), vec![0xde, 0xad, 0xbe, 0xef]);
    let result = decode_attestation(
        &decoder(),
        Some("0x1111111111111111111111111111111111111111"),
        &calldata,
    )
    .expect("decode");
    assert!(result.is_none());
}

#[test]
fn empty_attestation_data_produces_no_record() {
    let calldata = attest_calldata(subject_bytes(), vec![]);
    let result = decode_attestation(&decoder(), Some(REGISTRY), &calldata).expect("decode");
    assert!(result.is_none());
}

#[test]
fn truncated_payload_fails_only_that_transaction() {
    let inner = encode_attestation_data(false, "page-1", Address::repeat_byte(0x01));
    // The string length word declares six bytes; leave only four behind it.
    let cut = inner[..132].to_vec();
    let calldata = attest_calldata(subject_bytes(), cut);

    let err = decode_attestation(&decoder(), Some(REGISTRY), &calldata).unwrap_err();
    assert!(matches!(err, DecodeError::PayloadDecodeFailed { .. }));

    // The decoder carries no state; the next transaction decodes normally.
    let ok = decode_attestation(
        &decoder(),
        Some(REGISTRY),
        &attest_calldata(subject_bytes(), encode_attestation_data(true, "page-2", Address::ZERO)),
    )
    .expect("decode");
    assert!(ok.is_some());
}
