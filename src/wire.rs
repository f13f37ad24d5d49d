//! Wire-format helpers: base64/hex `serde` adapters for group elements and
//! scalars (`spec.md` §6). Grounded on the teacher's `crypto_serde.rs`
//! hex-wrapper-module idiom, extended with a base64 variant since the spec
//! pins base64 for matrices/headers and hex for signatures and raw scalars.

use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::group::{encoding, Curve, CurveConfig, Scalar};

/// `serde(with = "point_to_base64")`: encodes a curve point as a SEC1
/// compressed point, base64-standard-encoded.
pub mod point_to_base64 {
    use super::*;

    pub fn serialize<S: Serializer>(point: &Curve, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = encoding::encode_point::<CurveConfig>(point);
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Curve, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &encoded)
            .map_err(serde::de::Error::custom)?;
        encoding::decode_point::<CurveConfig>(&bytes).map_err(serde::de::Error::custom)
    }
}

/// `serde(with = "scalar_to_hex")`: encodes a scalar as a 32-byte big-endian
/// hex string, per the spec's "each response is a 32-byte big-endian scalar"
/// wire rule for proof transcripts.
pub mod scalar_to_hex {
    use super::*;

    pub fn serialize<S: Serializer>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = scalar.into_bigint().to_bytes_be();
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scalar, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded).map_err(serde::de::Error::custom)?;
        let scalar = Scalar::from_be_bytes_mod_order(&bytes);
        // `from_be_bytes_mod_order` silently reduces out-of-range input;
        // reject anything that was not already canonical (`spec.md` §6:
        // "a 32-byte big-endian scalar < q"). Compare at the input's own
        // length, left-padding the canonical re-encoding to match, since
        // `to_bytes_be()` strips leading zero bytes.
        let canonical = scalar.into_bigint().to_bytes_be();
        let mut padded = vec![0u8; bytes.len().saturating_sub(canonical.len())];
        padded.extend_from_slice(&canonical);
        if bytes.len() < canonical.len() || padded != bytes {
            return Err(serde::de::Error::custom(crate::error::GroupError::ScalarOutOfRange));
        }
        Ok(scalar)
    }
}

/// Hex-encodes an arbitrary byte slice, used for Ed25519 signatures.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a hex string produced by [`bytes_to_hex`].
pub fn bytes_from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s)
}

/// `serde(with = "bytes_to_base64_serde")`: base64-standard-encodes an
/// arbitrary byte vector field, used for the bulletin board's opaque
/// signature/key blobs (`spec.md` §6).
pub mod bytes_to_base64_serde {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        bytes_from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Base64-standard-encodes an arbitrary byte slice, used for headers and
/// Ed25519 public keys on the wire.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Decodes a base64 string produced by [`bytes_to_base64`].
pub fn bytes_from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::random_nonzero_scalar;
    use ark_ec::PrimeGroup;
    use ark_std::test_rng;

    #[derive(Serialize, Deserialize)]
    struct PointWrapper(#[serde(with = "point_to_base64")] Curve);

    #[derive(Serialize, Deserialize)]
    struct ScalarWrapper(#[serde(with = "scalar_to_hex")] Scalar);

    #[test]
    fn point_round_trips_through_json() {
        let point = Curve::generator();
        let wrapper = PointWrapper(point);
        let json = serde_json::to_string(&wrapper).unwrap();
        let parsed: PointWrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.0, point);
    }

    #[test]
    fn scalar_round_trips_through_json() {
        let mut rng = test_rng();
        let scalar = random_nonzero_scalar(&mut rng);
        let wrapper = ScalarWrapper(scalar);
        let json = serde_json::to_string(&wrapper).unwrap();
        let parsed: ScalarWrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.0, scalar);
    }

    #[test]
    fn hex_round_trips() {
        let bytes = vec![1u8, 2, 3, 255];
        assert_eq!(bytes_from_hex(&bytes_to_hex(&bytes)).unwrap(), bytes);
    }
}
