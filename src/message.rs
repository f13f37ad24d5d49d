//! Message ↔ curve-point embedding (component B).
//!
//! Deterministic, reversible encoding of short byte strings as curve points
//! by the standard try-and-increment scheme: a one-byte counter is appended
//! to the (zero-padded) message and the result is tried as a compressed
//! point's x-coordinate until one of the two candidate sign variants lands
//! on the curve. Grounded on the teacher's `shuffling/data_structures.rs`
//! encode/decode pair, generalized from its fixed bn254-scalar embedding to
//! the try-and-increment search this crate's SEC1 encoding requires.

use ark_ff::PrimeField;

use crate::error::EncodingError;
use crate::group::{Curve, CurveConfig};

const MAX_COUNTER: u16 = 256;

fn field_byte_length() -> usize {
    (<crate::group::BaseField as PrimeField>::MODULUS_BIT_SIZE as usize).div_ceil(8)
}

/// Maximum number of message bytes admissible to [`encode`]: one field byte
/// reserved for the try-and-increment counter.
pub fn max_message_len() -> usize {
    field_byte_length() - 1
}

/// Encodes `msg` as a curve point via try-and-increment.
///
/// `msg` is right-padded with zero bytes to `max_message_len()`, then a
/// trailing counter byte `0..=255` is appended in turn until the resulting
/// `field_byte_length()`-byte string is a valid x-coordinate for either sign
/// variant of a compressed point. Fails with [`EncodingError::Exhausted`] if
/// no counter value works (probability roughly `2^-256`).
pub fn encode(msg: &[u8]) -> Result<Curve, EncodingError> {
    let max_len = max_message_len();
    if msg.len() > max_len {
        return Err(EncodingError::MessageTooLong(msg.len()));
    }

    let mut padded = vec![0u8; max_len];
    padded[..msg.len()].copy_from_slice(msg);

    for counter in 0..MAX_COUNTER {
        let mut candidate = vec![0x02u8];
        candidate.extend_from_slice(&padded);
        candidate.push(counter as u8);

        if let Ok(point) = crate::group::encoding::decode_point::<CurveConfig>(&candidate) {
            return Ok(point);
        }
        candidate[0] = 0x03;
        if let Ok(point) = crate::group::encoding::decode_point::<CurveConfig>(&candidate) {
            return Ok(point);
        }
    }
    Err(EncodingError::Exhausted)
}

/// Recovers the original message bytes from a point produced by [`encode`].
///
/// Reads the point's x-coordinate, strips the trailing counter byte, then
/// strips the zero padding `encode` added.
pub fn decode(point: &Curve) -> Vec<u8> {
    let encoded = crate::group::encoding::encode_point::<CurveConfig>(point);
    // encoded = [sign_byte, x-coordinate bytes (field_byte_length long)]
    let x_bytes = &encoded[1..];
    let without_counter = &x_bytes[..x_bytes.len() - 1];

    let end = without_counter
        .iter()
        .rposition(|b| *b != 0)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    without_counter[..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_message() {
        let msg = b"vote:A";
        let point = encode(msg).expect("encodes");
        assert_eq!(decode(&point), msg);
    }

    #[test]
    fn round_trips_empty_message() {
        let point = encode(b"").expect("encodes empty message");
        assert_eq!(decode(&point), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_max_length_message() {
        let msg = vec![0xabu8; max_message_len()];
        let point = encode(&msg).expect("encodes max-length message");
        assert_eq!(decode(&point), msg);
    }

    #[test]
    fn rejects_overlong_message() {
        let msg = vec![0u8; max_message_len() + 1];
        let err = encode(&msg).unwrap_err();
        assert_eq!(err, EncodingError::MessageTooLong(max_message_len() + 1));
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        // Messages ending in a zero byte are not admissible to the round-trip
        // law: `decode` strips trailing zero padding it cannot distinguish
        // from a caller's own trailing zero bytes (`spec.md` §4.B).
        fn arb_admissible_message() -> impl Strategy<Value = Vec<u8>> {
            prop::collection::vec(any::<u8>(), 0..max_message_len())
                .prop_filter("must not end in a zero byte", |msg| {
                    msg.last().map_or(true, |last| *last != 0)
                })
        }

        proptest! {
            #[test]
            fn decode_undoes_encode_for_any_admissible_message(msg in arb_admissible_message()) {
                let point = encode(&msg).expect("admissible message encodes");
                prop_assert_eq!(decode(&point), msg);
            }
        }
    }
}
