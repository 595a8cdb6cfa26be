//! Typed extractors for decoded `DynSolValue`s.
//!
//! Decoding hands back a tree of dynamic values; these helpers pull the
//! expected shape out of it and report the field name on mismatch. Callers
//! wrap the plain-string reason into the error variant of their stage.

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256};

pub(crate) fn tuple(value: DynSolValue, field: &str) -> Result<Vec<DynSolValue>, String> {
    match value {
        DynSolValue::Tuple(vals) => Ok(vals),
        other => Err(mismatch(field, "tuple", &other)),
    }
}

pub(crate) fn word(value: DynSolValue, field: &str) -> Result<B256, String> {
    match value {
        DynSolValue::FixedBytes(w, 32) => Ok(w),
        DynSolValue::FixedBytes(_, n) => Err(format!("{field}: expected bytes32, got bytes{n}")),
        other => Err(mismatch(field, "bytes32", &other)),
    }
}

pub(crate) fn uint64(value: DynSolValue, field: &str) -> Result<u64, String> {
    match value {
        DynSolValue::Uint(v, _) => {
            u64::try_from(v).map_err(|_| format!("{field}: value does not fit in u64"))
        }
        other => Err(mismatch(field, "uint64", &other)),
    }
}

pub(crate) fn bytes(value: DynSolValue, field: &str) -> Result<Vec<u8>, String> {
    match value {
        DynSolValue::Bytes(b) => Ok(b),
        other => Err(mismatch(field, "bytes", &other)),
    }
}

pub(crate) fn bytes_array(value: DynSolValue, field: &str) -> Result<Vec<Vec<u8>>, String> {
    let items = match value {
        DynSolValue::Array(items) => items,
        other => return Err(mismatch(field, "bytes[]", &other)),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| bytes(item, &format!("{field}[{i}]")))
        .collect()
}

pub(crate) fn boolean(value: DynSolValue, field: &str) -> Result<bool, String> {
    match value {
        DynSolValue::Bool(b) => Ok(b),
        other => Err(mismatch(field, "bool", &other)),
    }
}

pub(crate) fn string(value: DynSolValue, field: &str) -> Result<String, String> {
    match value {
        DynSolValue::String(s) => Ok(s),
        other => Err(mismatch(field, "string", &other)),
    }
}

pub(crate) fn address(value: DynSolValue, field: &str) -> Result<Address, String> {
    match value {
        DynSolValue::Address(a) => Ok(a),
        other => Err(mismatch(field, "address", &other)),
    }
}

fn mismatch(field: &str, expected: &str, got: &DynSolValue) -> String {
    format!("{field}: expected {expected}, got {}", kind(got))
}

/// Short type label for error messages.
fn kind(value: &DynSolValue) -> &'static str {
    match value {
        DynSolValue::Bool(_) => "bool",
        DynSolValue::Int(..) => "int",
        DynSolValue::Uint(..) => "uint",
        DynSolValue::FixedBytes(..) => "fixed bytes",
        DynSolValue::Address(_) => "address",
        DynSolValue::Function(_) => "function",
        DynSolValue::Bytes(_) => "bytes",
        DynSolValue::String(_) => "string",
        DynSolValue::Array(_) => "array",
        DynSolValue::FixedArray(_) => "fixed array",
        DynSolValue::Tuple(_) => "tuple",
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn uint64_rejects_oversized_value() {
        let v = DynSolValue::Uint(U256::MAX, 256);
        let err = uint64(v, "expirationDate").unwrap_err();
        assert!(err.contains("does not fit"));
    }

    #[test]
    fn word_reports_narrow_fixed_bytes() {
        let v = DynSolValue::FixedBytes(B256::ZERO, 4);
        let err = word(v, "schemaId").unwrap_err();
        assert!(err.contains("bytes4"));
    }

    #[test]
    fn mismatch_names_the_field() {
        let err = boolean(DynSolValue::String("x".into()), "isPositive").unwrap_err();
        assert_eq!(err, "isPositive: expected bool, got string");
    }
}
