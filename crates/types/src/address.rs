//! Bech32m address encoding for puzzle hashes.
//!
//! An address is the bech32m encoding of a 32-byte puzzle hash under the
//! network's human-readable prefix (e.g. `txch` on test networks).

use crate::Bytes32;
use bech32::{FromBase32, ToBase32, Variant};
use thiserror::Error;

/// Errors from address encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("bech32 error: {0}")]
    Bech32(String),

    #[error("address uses bech32 instead of bech32m")]
    WrongVariant,

    #[error("address payload is {0} bytes, expected 32")]
    InvalidPayload(usize),

    #[error("address prefix {actual:?} does not match network prefix {expected:?}")]
    PrefixMismatch { expected: String, actual: String },
}

/// Encode a puzzle hash as an address with the given prefix.
pub fn encode_address(puzzle_hash: &Bytes32, prefix: &str) -> Result<String, AddressError> {
    bech32::encode(prefix, puzzle_hash.as_bytes().to_base32(), Variant::Bech32m)
        .map_err(|e| AddressError::Bech32(e.to_string()))
}

/// Decode an address into its prefix and puzzle hash.
pub fn decode_address(address: &str) -> Result<(String, Bytes32), AddressError> {
    let (hrp, data, variant) =
        bech32::decode(address).map_err(|e| AddressError::Bech32(e.to_string()))?;
    if variant != Variant::Bech32m {
        return Err(AddressError::WrongVariant);
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Bech32(e.to_string()))?;
    let puzzle_hash =
        Bytes32::try_from_slice(&bytes).map_err(|_| AddressError::InvalidPayload(bytes.len()))?;
    Ok((hrp, puzzle_hash))
}

/// Decode an address, requiring it to belong to the network with `prefix`.
pub fn decode_address_for(address: &str, prefix: &str) -> Result<Bytes32, AddressError> {
    let (hrp, puzzle_hash) = decode_address(address)?;
    if hrp != prefix {
        return Err(AddressError::PrefixMismatch {
            expected: prefix.to_string(),
            actual: hrp,
        });
    }
    Ok(puzzle_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_then_decode_preserves_hash() {
        let ph = Bytes32::new([0x42; 32]);
        let address = encode_address(&ph, "txch").unwrap();
        assert!(address.starts_with("txch1"));
        assert_eq!(decode_address(&address).unwrap(), ("txch".to_string(), ph));
    }

    #[test]
    fn test_prefix_mismatch() {
        let address = encode_address(&Bytes32::ZERO, "xch").unwrap();
        assert_eq!(
            decode_address_for(&address, "txch"),
            Err(AddressError::PrefixMismatch {
                expected: "txch".into(),
                actual: "xch".into()
            })
        );
    }

    #[test]
    fn test_rejects_plain_bech32() {
        let address =
            bech32::encode("txch", [1u8; 32].to_base32(), Variant::Bech32).unwrap();
        assert_eq!(decode_address(&address), Err(AddressError::WrongVariant));
    }
}
