//! Chaum–Pedersen OR-proof for a 2×2 switch (component E).
//!
//! A switch routes two input ciphertexts to two output ciphertexts either
//! straight through or swapped, re-randomizing each output, and proves in
//! zero-knowledge which branch happened without revealing which. Grounded on
//! the teacher's `shuffling/chaum_pedersen.rs` DLEQ sub-proof building blocks
//! (commit/respond/verify over a `CurveGroup`), generalized here to the
//! single-fake-challenge Fiat–Shamir OR-composition of two such DLEQs per
//! branch — the vestigial rewinding-based OR variant noted as out of scope
//! is intentionally not implemented.

use ark_std::rand::RngCore;
use ark_std::Zero;
use serde::{Deserialize, Serialize};

use crate::elgamal::{rerandomize, Ciphertext, EncryptionPublicKey};
use crate::error::SwitchProofError;
use crate::group::{hash_to_scalar, random_nonzero_scalar, Curve, Scalar};
use crate::group::encoding;
use crate::wire::{point_to_base64, scalar_to_hex};

/// One Sigma-protocol commitment pair `(t*G, t*H)` (real) or its simulated
/// equivalent `(z*G - c*X, z*H - c*Y)` (fake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentPair {
    #[serde(with = "point_to_base64")]
    pub a_g: Curve,
    #[serde(with = "point_to_base64")]
    pub a_h: Curve,
}

impl CommitmentPair {
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = encoding::encode_point::<crate::group::CurveConfig>(&self.a_g);
        out.extend(encoding::encode_point::<crate::group::CurveConfig>(&self.a_h));
        out
    }
}

/// A transcript proving `C`/`D` are a straight-through or swapped,
/// re-randomized routing of inputs `A`/`B`, without revealing which.
///
/// Field naming follows `spec.md` §4.E: branch "A" is the pairing
/// `(A->C, B->D)`, branch "B" is `(B->C, A->D)`. Only `challenge_a` is
/// carried on the wire; the verifier recomputes `challenge_b = e -
/// challenge_a`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SwitchProof {
    pub commit_a1: CommitmentPair,
    pub commit_a2: CommitmentPair,
    pub commit_b1: CommitmentPair,
    pub commit_b2: CommitmentPair,
    #[serde(with = "scalar_to_hex")]
    pub z_a1: Scalar,
    #[serde(with = "scalar_to_hex")]
    pub z_a2: Scalar,
    #[serde(with = "scalar_to_hex")]
    pub z_b1: Scalar,
    #[serde(with = "scalar_to_hex")]
    pub z_b2: Scalar,
    #[serde(with = "scalar_to_hex")]
    pub challenge_a: Scalar,
}

impl SwitchProof {
    /// Canonical byte encoding used both as the Fiat-Shamir transcript input
    /// (commitments only) and as part of a `MixBatchOutput`'s signed bytes
    /// (the full transcript): four commitment pairs then five 32-byte
    /// big-endian scalars, in field-declaration order.
    pub fn to_bytes(&self) -> Vec<u8> {
        use ark_ff::{BigInteger, PrimeField};
        let mut out = self.commit_a1.canonical_bytes();
        out.extend(self.commit_a2.canonical_bytes());
        out.extend(self.commit_b1.canonical_bytes());
        out.extend(self.commit_b2.canonical_bytes());
        for scalar in [self.z_a1, self.z_a2, self.z_b1, self.z_b2, self.challenge_a] {
            out.extend(scalar.into_bigint().to_bytes_be());
        }
        out
    }

    fn fiat_shamir_challenge(
        commit_a1: &CommitmentPair,
        commit_a2: &CommitmentPair,
        commit_b1: &CommitmentPair,
        commit_b2: &CommitmentPair,
    ) -> Scalar {
        let mut bytes = commit_a1.canonical_bytes();
        bytes.extend(commit_a2.canonical_bytes());
        bytes.extend(commit_b1.canonical_bytes());
        bytes.extend(commit_b2.canonical_bytes());
        hash_to_scalar(&bytes)
    }
}

fn diff(x: &Ciphertext, y: &Ciphertext) -> (Curve, Curve) {
    (x.c1 - y.c1, x.c2 - y.c2)
}

/// The output of applying a switch: the two routed-and-re-randomized
/// ciphertexts plus the OR-proof that the routing is either straight-through
/// or swapped.
pub struct SwitchOutput {
    pub c: Ciphertext,
    pub d: Ciphertext,
    pub proof: SwitchProof,
}

/// Applies a switch to inputs `left`/`right` per `flag` (false = pass
/// through, true = swap), re-randomizing both outputs and producing an
/// OR-proof of correct routing. Internally resamples on the
/// negligible-probability event that the Fiat-Shamir challenge hashes to
/// zero (`spec.md` §4.E tie-break).
pub fn apply<R: RngCore + ?Sized>(
    pk: &EncryptionPublicKey,
    left: &Ciphertext,
    right: &Ciphertext,
    flag: bool,
    rng: &mut R,
) -> SwitchOutput {
    loop {
        if let Some(output) = try_apply(pk, left, right, flag, rng) {
            return output;
        }
    }
}

fn try_apply<R: RngCore + ?Sized>(
    pk: &EncryptionPublicKey,
    left: &Ciphertext,
    right: &Ciphertext,
    flag: bool,
    rng: &mut R,
) -> Option<SwitchOutput> {
    let r_c = random_nonzero_scalar(rng);
    let r_d = random_nonzero_scalar(rng);

    // branch A = (left->C, right->D); branch B = (right->C, left->D)
    let (c, d, real_is_a) = if !flag {
        (rerandomize(left, pk, &r_c), rerandomize(right, pk, &r_d), true)
    } else {
        (rerandomize(right, pk, &r_c), rerandomize(left, pk, &r_d), false)
    };

    let (x_a1, y_a1) = diff(&c, left);
    let (x_a2, y_a2) = diff(&d, right);
    let (x_b1, y_b1) = diff(&c, right);
    let (x_b2, y_b2) = diff(&d, left);

    let g = pk.generator;
    let h = pk.h;

    let (commit_a1, commit_a2, commit_b1, commit_b2, z_a1, z_a2, z_b1, z_b2, challenge_a);

    if real_is_a {
        let t1 = random_nonzero_scalar(rng);
        let t2 = random_nonzero_scalar(rng);
        let real_a1 = CommitmentPair { a_g: g * t1, a_h: h * t1 };
        let real_a2 = CommitmentPair { a_g: g * t2, a_h: h * t2 };

        let c_fake = random_nonzero_scalar(rng);
        let fake_z1 = random_nonzero_scalar(rng);
        let fake_z2 = random_nonzero_scalar(rng);
        let fake_b1 = CommitmentPair {
            a_g: g * fake_z1 - x_b1 * c_fake,
            a_h: h * fake_z1 - y_b1 * c_fake,
        };
        let fake_b2 = CommitmentPair {
            a_g: g * fake_z2 - x_b2 * c_fake,
            a_h: h * fake_z2 - y_b2 * c_fake,
        };

        let e = SwitchProof::fiat_shamir_challenge(&real_a1, &real_a2, &fake_b1, &fake_b2);
        if e.is_zero() {
            return None;
        }
        let c_real = e - c_fake;

        commit_a1 = real_a1;
        commit_a2 = real_a2;
        commit_b1 = fake_b1;
        commit_b2 = fake_b2;
        z_a1 = t1 + c_real * r_c;
        z_a2 = t2 + c_real * r_d;
        z_b1 = fake_z1;
        z_b2 = fake_z2;
        challenge_a = c_real;
    } else {
        let t1 = random_nonzero_scalar(rng);
        let t2 = random_nonzero_scalar(rng);
        let real_b1 = CommitmentPair { a_g: g * t1, a_h: h * t1 };
        let real_b2 = CommitmentPair { a_g: g * t2, a_h: h * t2 };

        let c_fake = random_nonzero_scalar(rng);
        let fake_z1 = random_nonzero_scalar(rng);
        let fake_z2 = random_nonzero_scalar(rng);
        let fake_a1 = CommitmentPair {
            a_g: g * fake_z1 - x_a1 * c_fake,
            a_h: h * fake_z1 - y_a1 * c_fake,
        };
        let fake_a2 = CommitmentPair {
            a_g: g * fake_z2 - x_a2 * c_fake,
            a_h: h * fake_z2 - y_a2 * c_fake,
        };

        let e = SwitchProof::fiat_shamir_challenge(&fake_a1, &fake_a2, &real_b1, &real_b2);
        if e.is_zero() {
            return None;
        }
        let c_real = e - c_fake;

        commit_a1 = fake_a1;
        commit_a2 = fake_a2;
        commit_b1 = real_b1;
        commit_b2 = real_b2;
        z_a1 = fake_z1;
        z_a2 = fake_z2;
        z_b1 = t1 + c_real * r_c;
        z_b2 = t2 + c_real * r_d;
        challenge_a = c_fake;
    }

    Some(SwitchOutput {
        c,
        d,
        proof: SwitchProof {
            commit_a1,
            commit_a2,
            commit_b1,
            commit_b2,
            z_a1,
            z_a2,
            z_b1,
            z_b2,
            challenge_a,
        },
    })
}

/// Verifies a switch OR-proof against its public statement: inputs
/// `left`/`right`, outputs `c`/`d`, and the key pair `(G, H)` re-randomization
/// was performed under.
pub fn verify(
    pk: &EncryptionPublicKey,
    left: &Ciphertext,
    right: &Ciphertext,
    c: &Ciphertext,
    d: &Ciphertext,
    proof: &SwitchProof,
) -> Result<(), SwitchProofError> {
    let e = SwitchProof::fiat_shamir_challenge(
        &proof.commit_a1,
        &proof.commit_a2,
        &proof.commit_b1,
        &proof.commit_b2,
    );
    if e.is_zero() {
        return Err(SwitchProofError::ZeroChallenge);
    }
    let challenge_b = e - proof.challenge_a;

    let (x_a1, y_a1) = diff(c, left);
    let (x_a2, y_a2) = diff(d, right);
    let (x_b1, y_b1) = diff(c, right);
    let (x_b2, y_b2) = diff(d, left);

    let g = pk.generator;
    let h = pk.h;

    let sub_proof_holds = |z: Scalar, commit: &CommitmentPair, challenge: Scalar, x: Curve, y: Curve| {
        g * z == commit.a_g + x * challenge && h * z == commit.a_h + y * challenge
    };

    let ok = sub_proof_holds(proof.z_a1, &proof.commit_a1, proof.challenge_a, x_a1, y_a1)
        && sub_proof_holds(proof.z_a2, &proof.commit_a2, proof.challenge_a, x_a2, y_a2)
        && sub_proof_holds(proof.z_b1, &proof.commit_b1, challenge_b, x_b1, y_b1)
        && sub_proof_holds(proof.z_b2, &proof.commit_b2, challenge_b, x_b2, y_b2);

    if ok {
        Ok(())
    } else {
        Err(SwitchProofError::InvariantViolated)
    }
}
