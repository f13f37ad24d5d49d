//! Threshold decryption: per-trustee partial decryptions with a
//! Chaum–Pedersen DLEQ proof, combined by Lagrange interpolation
//! (`spec.md` §4.D "Threshold decryption").
//!
//! Grounded on the teacher's `shuffling/community_decryption/mod.rs`
//! `CommunityDecryptionShare::generate`/`verify` pair (partial decryption
//! share plus a DLEQ proof tying it to the trustee's public key), generalized
//! from its n-of-n combination to `(t, n)` Lagrange reconstruction. Unlike
//! the teacher's stub (`spec.md` §9 notes its partial-decryption proof was
//! never actually checked), every partial here is proof-verified before
//! being folded into the combination.

use std::collections::BTreeSet;

use ark_ec::PrimeGroup;
use ark_std::rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::elgamal::{Ciphertext, EncryptionPublicKey};
use crate::error::ThresholdDecryptError;
use crate::group::encoding;
use crate::group::{hash_to_scalar, random_nonzero_scalar, Curve, Scalar};
use crate::threshold::polynomial::lagrange_combine;
use crate::wire::{point_to_base64, scalar_to_hex};

/// Chaum–Pedersen DLEQ proof that `log_G(public_share) == log_{C1}(share)`:
/// the same secret scalar produced both the trustee's public key share and
/// its partial decryption of a specific ciphertext.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DleqProof {
    #[serde(with = "point_to_base64")]
    pub commit_g: Curve,
    #[serde(with = "point_to_base64")]
    pub commit_c1: Curve,
    #[serde(with = "scalar_to_hex")]
    pub response: Scalar,
    #[serde(with = "scalar_to_hex")]
    pub challenge: Scalar,
}

/// One trustee's partial decryption `d_j = s_j * C1` of a ciphertext, plus
/// the DLEQ proof tying it to that trustee's public share.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PartialDecryption {
    pub trustee_index: u32,
    #[serde(with = "point_to_base64")]
    pub share: Curve,
    pub proof: DleqProof,
}

fn dleq_challenge(
    generator: Curve,
    c1: Curve,
    public_share: Curve,
    partial_share: Curve,
    commit_g: Curve,
    commit_c1: Curve,
) -> Scalar {
    let mut bytes = encoding::encode_point::<crate::group::CurveConfig>(&generator);
    bytes.extend(encoding::encode_point::<crate::group::CurveConfig>(&c1));
    bytes.extend(encoding::encode_point::<crate::group::CurveConfig>(&public_share));
    bytes.extend(encoding::encode_point::<crate::group::CurveConfig>(&partial_share));
    bytes.extend(encoding::encode_point::<crate::group::CurveConfig>(&commit_g));
    bytes.extend(encoding::encode_point::<crate::group::CurveConfig>(&commit_c1));
    hash_to_scalar(&bytes)
}

/// Produces trustee `trustee_index`'s partial decryption of `ciphertext`
/// under `secret_share`, with a DLEQ proof of correctness.
pub fn partial_decrypt<R: RngCore + ?Sized>(
    trustee_index: u32,
    secret_share: &Scalar,
    pk: &EncryptionPublicKey,
    ciphertext: &Ciphertext,
    rng: &mut R,
) -> PartialDecryption {
    let share = ciphertext.c1 * secret_share;
    let public_share = pk.generator * secret_share;

    let nonce = random_nonzero_scalar(rng);
    let commit_g = pk.generator * nonce;
    let commit_c1 = ciphertext.c1 * nonce;

    let e = dleq_challenge(pk.generator, ciphertext.c1, public_share, share, commit_g, commit_c1);
    let response = nonce + e * secret_share;

    PartialDecryption {
        trustee_index,
        share,
        proof: DleqProof {
            commit_g,
            commit_c1,
            response,
            challenge: e,
        },
    }
}

/// Verifies a partial decryption's DLEQ proof against the trustee's known
/// public share `H_j`.
pub fn verify_partial(
    pk: &EncryptionPublicKey,
    ciphertext: &Ciphertext,
    public_share: &Curve,
    partial: &PartialDecryption,
) -> bool {
    let recomputed = dleq_challenge(
        pk.generator,
        ciphertext.c1,
        *public_share,
        partial.share,
        partial.proof.commit_g,
        partial.proof.commit_c1,
    );
    if recomputed != partial.proof.challenge {
        return false;
    }
    let e = partial.proof.challenge;
    pk.generator * partial.proof.response == partial.proof.commit_g + *public_share * e
        && ciphertext.c1 * partial.proof.response == partial.proof.commit_c1 + partial.share * e
}

/// Combines `partials` (deduplicated, proof-verified against
/// `public_shares`, and requiring at least `threshold` of them) into the
/// ciphertext's embedded message point: `D = Σ λ_j(0) d_j = s*C1`, then
/// `m_point = C2 - D` (`spec.md` §4.D). Does not perform the final
/// point-to-bytes decode — see [`crate::message::decode`].
pub fn threshold_decrypt(
    pk: &EncryptionPublicKey,
    ciphertext: &Ciphertext,
    threshold: usize,
    public_shares: &[(u32, Curve)],
    partials: &[PartialDecryption],
) -> Result<Curve, ThresholdDecryptError> {
    let mut seen = BTreeSet::new();
    let mut verified: Vec<(u32, Curve)> = Vec::new();

    for partial in partials {
        if !seen.insert(partial.trustee_index) {
            return Err(ThresholdDecryptError::DuplicateTrustee(partial.trustee_index));
        }
        let public_share = public_shares
            .iter()
            .find(|(index, _)| *index == partial.trustee_index)
            .map(|(_, point)| *point)
            .ok_or(ThresholdDecryptError::UnknownTrustee(partial.trustee_index))?;
        if !verify_partial(pk, ciphertext, &public_share, partial) {
            return Err(ThresholdDecryptError::InvalidPartialProof(partial.trustee_index));
        }
        verified.push((partial.trustee_index, partial.share));
    }

    if verified.len() < threshold {
        return Err(ThresholdDecryptError::InsufficientShares {
            required: threshold,
            available: verified.len(),
        });
    }
    verified.truncate(threshold);

    let combined = lagrange_combine(&verified);
    Ok(ciphertext.c2 - combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::random_nonzero_scalar;
    use crate::message;
    use crate::threshold::dkg::run_dkg;
    use ark_std::test_rng;

    #[tokio::test]
    async fn s1_threshold_decrypt_recovers_plaintext_with_exactly_t_shares() {
        let mut rng = test_rng();
        let outcome = run_dkg(3, 2, &mut rng).await.unwrap();
        let pk = outcome.combined_public_key;

        let m_point = message::encode(b"A").unwrap();
        let ciphertext = crate::elgamal::encrypt(&pk, &m_point, &mut rng).unwrap();

        let public_shares: Vec<(u32, Curve)> = outcome
            .shares
            .iter()
            .map(|share| (share.index, share.public_share))
            .collect();

        let partials: Vec<PartialDecryption> = outcome.shares[..2]
            .iter()
            .map(|share| {
                partial_decrypt(share.index, &share.secret_share(), &pk, &ciphertext, &mut rng)
            })
            .collect();

        let recovered = threshold_decrypt(&pk, &ciphertext, 2, &public_shares, &partials).unwrap();
        assert_eq!(message::decode(&recovered), b"A");
    }

    #[tokio::test]
    async fn s5_insufficient_trustees_reject_then_succeed() {
        let mut rng = test_rng();
        let outcome = run_dkg(5, 3, &mut rng).await.unwrap();
        let pk = outcome.combined_public_key;

        let m_point = message::encode(b"tally").unwrap();
        let ciphertext = crate::elgamal::encrypt(&pk, &m_point, &mut rng).unwrap();

        let public_shares: Vec<(u32, Curve)> = outcome
            .shares
            .iter()
            .map(|share| (share.index, share.public_share))
            .collect();

        let two_partials: Vec<PartialDecryption> = outcome.shares[..2]
            .iter()
            .map(|share| {
                partial_decrypt(share.index, &share.secret_share(), &pk, &ciphertext, &mut rng)
            })
            .collect();
        let err = threshold_decrypt(&pk, &ciphertext, 3, &public_shares, &two_partials).unwrap_err();
        assert_eq!(
            err,
            ThresholdDecryptError::InsufficientShares {
                required: 3,
                available: 2
            }
        );

        let three_partials: Vec<PartialDecryption> = outcome.shares[1..4]
            .iter()
            .map(|share| {
                partial_decrypt(share.index, &share.secret_share(), &pk, &ciphertext, &mut rng)
            })
            .collect();
        let recovered = threshold_decrypt(&pk, &ciphertext, 3, &public_shares, &three_partials).unwrap();
        assert_eq!(message::decode(&recovered), b"tally");
    }

    #[tokio::test]
    async fn tampered_partial_proof_is_rejected() {
        let mut rng = test_rng();
        let outcome = run_dkg(3, 2, &mut rng).await.unwrap();
        let pk = outcome.combined_public_key;
        let m_point = message::encode(b"x").unwrap();
        let ciphertext = crate::elgamal::encrypt(&pk, &m_point, &mut rng).unwrap();
        let public_shares: Vec<(u32, Curve)> = outcome
            .shares
            .iter()
            .map(|share| (share.index, share.public_share))
            .collect();

        let mut partials: Vec<PartialDecryption> = outcome.shares[..2]
            .iter()
            .map(|share| {
                partial_decrypt(share.index, &share.secret_share(), &pk, &ciphertext, &mut rng)
            })
            .collect();
        partials[0].proof.response = random_nonzero_scalar(&mut rng);

        let err = threshold_decrypt(&pk, &ciphertext, 2, &public_shares, &partials).unwrap_err();
        assert!(matches!(err, ThresholdDecryptError::InvalidPartialProof(_)));
    }
}
