//! Canonical-bytes Ed25519 signing (component I).
//!
//! Grounded on the teacher's `signing/mod.rs` `Signable`/canonical-bytes
//! architecture (a type declares how it serializes to the bytes it signs,
//! independent of its `serde` wire representation), adapted from the
//! teacher's generic `ark_crypto_primitives::signature::SignatureScheme`
//! (demonstrated there with Schnorr) to concrete `ed25519-dalek`, since
//! `spec.md` §4.I pins Ed25519 specifically.

use ark_std::rand::{CryptoRng, RngCore};
use ed25519_dalek::{Signer, Verifier};

pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};

use crate::error::SigningError;

/// Implemented by any type with a canonical byte representation that is
/// signed directly (no pre-hash, per `spec.md` §4.I: "Ed25519 signs and
/// verifies these bytes directly").
pub trait Signable {
    fn canonical_bytes(&self) -> Vec<u8>;
}

/// Generates a fresh mix-server or trustee Ed25519 signing key.
pub fn generate_signing_key<R: RngCore + CryptoRng>(rng: &mut R) -> SigningKey {
    SigningKey::generate(rng)
}

/// Signs `value`'s canonical bytes.
pub fn sign<T: Signable>(value: &T, signing_key: &SigningKey) -> Signature {
    signing_key.sign(&value.canonical_bytes())
}

/// Verifies `signature` over `value`'s canonical bytes under `public_key`.
pub fn verify<T: Signable>(
    value: &T,
    public_key: &VerifyingKey,
    signature: &Signature,
) -> Result<(), SigningError> {
    public_key
        .verify(&value.canonical_bytes(), signature)
        .map_err(|_| SigningError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    struct Message(Vec<u8>);
    impl Signable for Message {
        fn canonical_bytes(&self) -> Vec<u8> {
            self.0.clone()
        }
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let mut rng = test_rng();
        let signing_key = generate_signing_key(&mut rng);
        let message = Message(b"mix batch bytes".to_vec());
        let signature = sign(&message, &signing_key);
        verify(&message, &signing_key.verifying_key(), &signature).unwrap();
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let mut rng = test_rng();
        let signing_key = generate_signing_key(&mut rng);
        let message = Message(b"mix batch bytes".to_vec());
        let signature = sign(&message, &signing_key);
        let tampered = Message(b"mix batch byte5".to_vec());
        assert!(verify(&tampered, &signing_key.verifying_key(), &signature).is_err());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let mut rng = test_rng();
        let signing_key = generate_signing_key(&mut rng);
        let other_key = generate_signing_key(&mut rng);
        let message = Message(b"mix batch bytes".to_vec());
        let signature = sign(&message, &signing_key);
        assert!(verify(&message, &other_key.verifying_key(), &signature).is_err());
    }
}
