//! EC-ElGamal encryption, decryption and re-randomization (component C).
//!
//! Grounded on the teacher's `shuffling/data_structures.rs` ciphertext type
//! and `shuffling/public_key_setup.rs` key-generation helpers, generalized
//! from the teacher's fixed single-key setup to the explicit `(G, H)` public
//! key this crate threads through threshold key generation.

use ark_ec::{CurveGroup, PrimeGroup};
use ark_std::rand::RngCore;
use ark_std::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{ElGamalError, GroupError};
use crate::group::{encoding, random_nonzero_scalar, Curve, CurveConfig, Scalar};
use crate::wire::point_to_base64;

/// An ElGamal public key `(G, H)` with `H = s * G` for secret `s`.
///
/// `G` is carried explicitly (rather than assumed to be the fixed group
/// generator) so a threshold-combined key reconstructed via Lagrange
/// interpolation is indistinguishable in shape from a single-party key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionPublicKey {
    #[serde(with = "point_to_base64")]
    pub generator: Curve,
    #[serde(with = "point_to_base64")]
    pub h: Curve,
}

impl EncryptionPublicKey {
    /// Builds a public key from the process-wide default generator and a secret scalar.
    pub fn from_secret(secret: &Scalar) -> Self {
        let generator = Curve::generator();
        EncryptionPublicKey {
            generator,
            h: generator * secret,
        }
    }
}

/// An EC-ElGamal ciphertext `(C1, C2)` with invariant `C2 - s*C1 = M`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    #[serde(with = "point_to_base64")]
    pub c1: Curve,
    #[serde(with = "point_to_base64")]
    pub c2: Curve,
}

impl Ciphertext {
    /// Serializes to the wire format: two concatenated SEC1 compressed points.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = encoding::encode_point::<CurveConfig>(&self.c1);
        out.extend(encoding::encode_point::<CurveConfig>(&self.c2));
        out
    }

    /// Parses a ciphertext serialized by [`Ciphertext::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GroupError> {
        if bytes.len() != 2 * encoding::ENCODED_POINT_LEN {
            return Err(GroupError::WrongLength {
                expected: 2 * encoding::ENCODED_POINT_LEN,
                actual: bytes.len(),
            });
        }
        let (c1_bytes, c2_bytes) = bytes.split_at(encoding::ENCODED_POINT_LEN);
        Ok(Ciphertext {
            c1: encoding::decode_point::<CurveConfig>(c1_bytes)?,
            c2: encoding::decode_point::<CurveConfig>(c2_bytes)?,
        })
    }

    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, self.to_bytes())
    }

    pub fn from_base64(s: &str) -> Result<Self, GroupError> {
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, s)
            .map_err(|_| GroupError::WrongLength {
                expected: 2 * encoding::ENCODED_POINT_LEN,
                actual: 0,
            })?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypts an already-embedded message point under `pk`, sampling a fresh
/// randomizer `k <- [1, q)`.
///
/// Never returns a ciphertext with either coordinate equal to the identity:
/// `C1 = k*G` is non-identity because `k != 0`, and `C2 = m_point + k*H` is
/// re-sampled on the vanishing chance it lands on the identity.
pub fn encrypt<R: RngCore + ?Sized>(
    pk: &EncryptionPublicKey,
    m_point: &Curve,
    rng: &mut R,
) -> Result<Ciphertext, ElGamalError> {
    loop {
        let k = random_nonzero_scalar(rng);
        let c1 = pk.generator * k;
        let c2 = *m_point + pk.h * k;
        if c1.is_zero() || c2.is_zero() {
            continue;
        }
        return Ok(Ciphertext { c1, c2 });
    }
}

/// Decrypts with the full secret key `s`, returning the embedded message point.
pub fn decrypt(secret: &Scalar, ciphertext: &Ciphertext) -> Result<Curve, ElGamalError> {
    let m_point = ciphertext.c2 - ciphertext.c1 * secret;
    if m_point.into_affine().is_zero() {
        return Err(ElGamalError::IdentityRecovered);
    }
    Ok(m_point)
}

/// Re-randomizes a ciphertext in place for fresh randomizer `r`, preserving
/// the plaintext it decrypts to: `(C1 + r*G, C2 + r*H)`.
pub fn rerandomize(ciphertext: &Ciphertext, pk: &EncryptionPublicKey, r: &Scalar) -> Ciphertext {
    Ciphertext {
        c1: ciphertext.c1 + pk.generator * r,
        c2: ciphertext.c2 + pk.h * r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message;
    use ark_std::test_rng;

    #[test]
    fn encrypt_decrypt_round_trips() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);

        let m_point = message::encode(b"ballot").unwrap();
        let ciphertext = encrypt(&pk, &m_point, &mut rng).unwrap();
        let recovered = decrypt(&secret, &ciphertext).unwrap();
        assert_eq!(recovered, m_point);
    }

    #[test]
    fn rerandomize_preserves_plaintext_but_changes_bytes() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);

        let m_point = message::encode(b"ballot").unwrap();
        let ciphertext = encrypt(&pk, &m_point, &mut rng).unwrap();
        let r = random_nonzero_scalar(&mut rng);
        let rerandomized = rerandomize(&ciphertext, &pk, &r);

        assert_ne!(rerandomized.to_bytes(), ciphertext.to_bytes());
        assert_eq!(decrypt(&secret, &rerandomized).unwrap(), m_point);
    }

    #[test]
    fn ciphertext_bytes_round_trip() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);
        let m_point = message::encode(b"x").unwrap();
        let ciphertext = encrypt(&pk, &m_point, &mut rng).unwrap();

        let bytes = ciphertext.to_bytes();
        let parsed = Ciphertext::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, ciphertext);
    }
}
