//! `Vote`: an immutable wrapper around a ballot ciphertext (`spec.md` §3).
//!
//! Re-randomization produces a new `Vote` rather than mutating in place,
//! mirroring the teacher's immutable-ciphertext-wrapper style in
//! `shuffling/data_structures.rs`.

use serde::{Deserialize, Serialize};

use crate::elgamal::{rerandomize, Ciphertext, EncryptionPublicKey};
use crate::group::Scalar;

/// A single encrypted ballot. On the wire, a `Vote` is the hex-encoded
/// ciphertext bytes (`spec.md` §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote(Ciphertext);

impl Vote {
    pub fn new(ciphertext: Ciphertext) -> Self {
        Vote(ciphertext)
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.0
    }

    /// Re-randomizes this vote's ciphertext, returning a fresh unlinkable
    /// `Vote` for the same plaintext.
    pub fn rerandomized(&self, pk: &EncryptionPublicKey, r: &Scalar) -> Vote {
        Vote(rerandomize(&self.0, pk, r))
    }

    pub fn to_hex(&self) -> String {
        crate::wire::bytes_to_hex(&self.0.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, crate::error::GroupError> {
        let bytes = crate::wire::bytes_from_hex(s).map_err(|_| crate::error::GroupError::WrongLength {
            expected: 2 * crate::group::encoding::ENCODED_POINT_LEN,
            actual: 0,
        })?;
        Ok(Vote(Ciphertext::from_bytes(&bytes)?))
    }
}
