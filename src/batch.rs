//! `MixBatchHeader`, `MixBatchOutput`, `MixBatchChain`: the data model for a
//! mix server's published output and canonical serialization for signing
//! (component I, `spec.md` §3 and §4.I).
//!
//! Grounded on the teacher's `shuffling/data_structures.rs` record style
//! (plain structs carrying matrices plus a detached signature), with the
//! signature modeled as a presence-typed `Option` field per `spec.md` §9's
//! note on "exceptions and nullable signature fields".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elgamal::Ciphertext;
use crate::error::{SigningError, VerifierError};
use crate::signing::{Signable, Signature, SigningKey, VerifyingKey};
use crate::switch::SwitchProof;
use crate::wire::{bytes_from_base64, bytes_from_hex, bytes_to_base64, bytes_to_hex};

/// Fixed-layout header: `logN` and the derived layer count, each a 32-bit
/// big-endian integer on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixBatchHeader {
    pub log_n: u32,
    pub layers: u32,
}

impl MixBatchHeader {
    pub fn for_size(n: usize) -> Self {
        let log_n = n.trailing_zeros();
        MixBatchHeader {
            log_n,
            layers: 2 * log_n - 1,
        }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.log_n.to_be_bytes());
        out[4..].copy_from_slice(&self.layers.to_be_bytes());
        out
    }

    pub fn to_base64(self) -> String {
        bytes_to_base64(&self.to_bytes())
    }
}

/// A mix server's complete, signable output: the header, the full
/// ciphertext/proof matrices produced by [`crate::waksman::apply`], the
/// signer's public key, and an optional signature over the rest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MixBatchOutput {
    pub header: MixBatchHeader,
    pub ciphertexts_matrix: Vec<Vec<Ciphertext>>,
    pub proofs_matrix: Vec<Vec<SwitchProof>>,
    #[serde(with = "verifying_key_base64")]
    pub signer_public_key: VerifyingKey,
    pub signature: Option<SignatureHex>,
}

/// A `serde`-friendly hex wrapper around an Ed25519 signature.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SignatureHex(#[serde(with = "signature_hex")] pub Signature);

mod signature_hex {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &Signature, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_hex(&sig.to_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = bytes_from_hex(&encoded).map_err(serde::de::Error::custom)?;
        let array: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature is not 64 bytes"))?;
        Ok(Signature::from_bytes(&array))
    }
}

mod verifying_key_base64 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &VerifyingKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_base64(key.as_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VerifyingKey, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = bytes_from_base64(&encoded).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("public key is not 32 bytes"))?;
        VerifyingKey::from_bytes(&array).map_err(serde::de::Error::custom)
    }
}

impl Signable for MixBatchOutput {
    /// Header, then `ciphertextsMatrix` column-major, then `proofsMatrix`
    /// column-major, with the signature slot absent — `spec.md` §4.I.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        for column in &self.ciphertexts_matrix {
            for ciphertext in column {
                out.extend(ciphertext.to_bytes());
            }
        }
        for column in &self.proofs_matrix {
            for proof in column {
                out.extend(proof.to_bytes());
            }
        }
        out
    }
}

impl MixBatchOutput {
    /// Signs the batch's canonical bytes with `signing_key`, filling in both
    /// the signature and signer public key fields.
    pub fn sign(&mut self, signing_key: &SigningKey) {
        let signature = crate::signing::sign(self, signing_key);
        self.signature = Some(SignatureHex(signature));
        self.signer_public_key = signing_key.verifying_key();
    }

    /// Verifies the batch's own signature under its stated `signer_public_key`.
    /// Does not check that key against an authorized set — see
    /// [`crate::verify::verify_chain`] for that.
    pub fn verify_self_signature(&self) -> Result<(), SigningError> {
        let signature = self.signature.as_ref().ok_or(SigningError::MissingSignature)?;
        crate::signing::verify(self, &self.signer_public_key, &signature.0)
    }

    pub fn input_column(&self) -> &[Ciphertext] {
        &self.ciphertexts_matrix[0]
    }

    pub fn output_column(&self) -> &[Ciphertext] {
        self.ciphertexts_matrix.last().expect("non-empty matrix")
    }
}

/// A multiset of ciphertexts compared by their canonical wire bytes, used to
/// check the column-consistency invariant between adjacent batches without
/// caring about row order.
fn ciphertext_multiset(column: &[Ciphertext]) -> BTreeMap<Vec<u8>, usize> {
    let mut multiset = BTreeMap::new();
    for ciphertext in column {
        *multiset.entry(ciphertext.to_bytes()).or_insert(0) += 1;
    }
    multiset
}

/// An ordered chain of mix batches keyed by mixer index (`spec.md` §3).
#[derive(Clone, Debug, Default)]
pub struct MixBatchChain {
    pub batches: BTreeMap<u32, MixBatchOutput>,
}

impl MixBatchChain {
    pub fn new() -> Self {
        MixBatchChain {
            batches: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, mixer_index: u32, batch: MixBatchOutput) {
        self.batches.insert(mixer_index, batch);
    }

    /// Checks that the output column of every batch equals (as a multiset)
    /// the input column of its successor.
    pub fn check_column_consistency(&self) -> Result<(), VerifierError> {
        let mut iter = self.batches.values();
        let Some(mut previous) = iter.next() else {
            return Ok(());
        };
        for current in iter {
            if ciphertext_multiset(previous.output_column())
                != ciphertext_multiset(current.input_column())
            {
                return Err(VerifierError::ColumnMismatch);
            }
            previous = current;
        }
        Ok(())
    }

    /// Checks that the first batch's input column equals the published
    /// ballot set, as a multiset.
    pub fn check_ballot_set(&self, ballot_set: &[Ciphertext]) -> Result<(), VerifierError> {
        let Some(first) = self.batches.values().next() else {
            return Ok(());
        };
        if ciphertext_multiset(first.input_column()) != ciphertext_multiset(ballot_set) {
            return Err(VerifierError::BallotSetMismatch);
        }
        Ok(())
    }
}
