//! # attestindex-evm
//!
//! Decoding for the attestation registry's two-layer calldata encoding,
//! built on `alloy-core`.
//!
//! ## Implementation notes
//! - Outer layer: `attest((bytes32,uint64,bytes,bytes),bytes[])`, matched by
//!   destination and 4-byte selector
//! - Inner layer: `attestationData` holds an ABI-encoded
//!   `(bool, string, address)` tuple
//! - Subjects normalize from 20-byte or 32-byte-padded form to one
//!   checksummed address

pub mod assemble;
pub mod call;
pub mod encode;
mod extract;
pub mod payload;
pub mod subject;

pub use assemble::{assemble, decode_attestation, DecodedAttestation};
pub use call::{AttestCall, AttestCallDecoder, AttestationPayload};
pub use encode::{encode_attestation_data, AttestEncoder};
pub use payload::{decode_attestation_data, DecodedPayload};
pub use subject::{checksum, normalize_subject};
