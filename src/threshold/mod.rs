//! Threshold key generation and decryption (component D).
//!
//! An additive `(t, n)` Shamir scheme over the scalar field. Key generation
//! runs as `n` cooperating Tokio tasks exchanging shares point-to-point
//! ([`dkg`]); decryption is a pure combination of per-trustee partial
//! decryptions, each accompanied by a Chaum–Pedersen DLEQ proof
//! ([`decrypt`]). Grounded on the teacher's
//! `shuffling/community_decryption/mod.rs` partial-decryption/combine shape,
//! generalized from its n-of-n scheme to full `(t, n)` Lagrange
//! reconstruction per `spec.md` §4.D, and on `shuffler/hand_runtime.rs`'s
//! `CancellationToken`-guarded task model for the concurrent DKG round.

pub mod decrypt;
pub mod dkg;
pub mod polynomial;

pub use decrypt::{partial_decrypt, threshold_decrypt, PartialDecryption};
pub use dkg::{run_dkg, DkgOutcome, TrusteeKeyShare};
pub use polynomial::{lagrange_coefficient_at_zero, lagrange_combine, Polynomial};
