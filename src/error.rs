//! Crate-wide error taxonomy.
//!
//! Each cryptographic subsystem defines its own `thiserror` enum close to the
//! code that raises it (mirroring the teacher's `shuffling/error.rs`
//! convention); this module composes them into one [`MixnetError`] so callers
//! at the orchestrator boundary (component J) can use a single `Result` type.
//! See `spec.md` §7 for the required error kinds.

use thiserror::Error;

/// Component A: group/curve arithmetic failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("point encoding is not {expected} bytes: got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("encoded x-coordinate is not less than the field modulus")]
    XCoordinateOutOfRange,
    #[error("point is not on the curve")]
    NotOnCurve,
    #[error("scalar is not less than the group order q")]
    ScalarOutOfRange,
    #[error("unrecognized SEC1 sign tag: 0x{0:02x}")]
    BadSignTag(u8),
}

/// Component B: message-to-point embedding failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("message of {0} bytes exceeds the maximum admissible length")]
    MessageTooLong(usize),
    #[error("no valid point found after 256 counter values")]
    Exhausted,
}

/// Component C: EC-ElGamal failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElGamalError {
    #[error("group error: {0}")]
    Group(#[from] GroupError),
    #[error("decryption recovered the identity point")]
    IdentityRecovered,
}

/// Component D: threshold key generation / decryption failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DkgError {
    #[error("trustee {trustee} never received a share from trustee {from}")]
    MissingShare { trustee: u32, from: u32 },
    #[error("trustee {trustee} received a malformed share from trustee {from}")]
    MalformedShare { trustee: u32, from: u32 },
    #[error("key generation was cancelled before completion")]
    Cancelled,
    #[error("threshold t={t} must satisfy 1 <= t <= n={n}")]
    BadThreshold { t: u32, n: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdDecryptError {
    #[error("need {required} partial decryptions, only {available} available")]
    InsufficientShares { required: usize, available: usize },
    #[error("partial decryption proof from trustee {0} failed to verify")]
    InvalidPartialProof(u32),
    #[error("duplicate partial decryption from trustee {0}")]
    DuplicateTrustee(u32),
    #[error("trustee index {0} is not part of the authorized set")]
    UnknownTrustee(u32),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Component E: 2x2 switch OR-proof failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwitchProofError {
    #[error("Fiat-Shamir challenge hashed to zero; resample randomizers")]
    ZeroChallenge,
    #[error("switch produced an output whose plaintext multiset does not match its input")]
    InvariantViolated,
}

/// Component F: Waksman network configuration failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkConfigError {
    #[error("network size {0} is not a power of two >= 2")]
    NotPowerOfTwo(usize),
    #[error("sigma has length {actual}, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("sigma is not a bijection on {{0,..,{0}-1}}")]
    NotAPermutation(usize),
    #[error("recursive sub-permutation at size {0} failed bijection validation")]
    SubPermutationInvalid(usize),
}

/// Component G: mix server failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixServerError {
    #[error(transparent)]
    Network(#[from] NetworkConfigError),
    #[error(transparent)]
    Switch(#[from] SwitchProofError),
    #[error("input batch size {0} is not a power of two >= 2")]
    BadBatchSize(usize),
    #[error("switch at layer {layer} position {position} produced an inconsistent output")]
    InconsistentSwitchOutput { layer: usize, position: usize },
}

/// Component H: batch/chain verification failures (reported, not necessarily fatal).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("proof at layer {layer} position {position} failed to verify")]
    ProofInvalid { layer: usize, position: usize },
    #[error("batch signature is invalid or signed by an unauthorized key")]
    ChainBroken,
    #[error("adjacent batches do not share the same ciphertext multiset")]
    ColumnMismatch,
    #[error("first batch's input column does not match the published ballot set")]
    BallotSetMismatch,
}

/// Component I: canonical serialization and signing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("signature is missing from the batch")]
    MissingSignature,
    #[error("signature does not verify under the stated public key")]
    InvalidSignature,
    #[error("malformed Ed25519 key or signature bytes")]
    MalformedKeyMaterial,
}

/// Top-level error composing every subsystem, for use at the orchestrator boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixnetError {
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    ElGamal(#[from] ElGamalError),
    #[error(transparent)]
    Dkg(#[from] DkgError),
    #[error(transparent)]
    ThresholdDecrypt(#[from] ThresholdDecryptError),
    #[error(transparent)]
    SwitchProof(#[from] SwitchProofError),
    #[error(transparent)]
    NetworkConfig(#[from] NetworkConfigError),
    #[error(transparent)]
    MixServer(#[from] MixServerError),
    #[error(transparent)]
    Verifier(#[from] VerifierError),
    #[error(transparent)]
    Signing(#[from] SigningError),
}
