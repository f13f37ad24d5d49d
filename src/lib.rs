//! Verifiable re-encryption mixnet for electronic voting.
//!
//! A batch of EC-ElGamal ciphertexts encrypting ballots under a shared
//! threshold public key passes through a cascade of mix servers, each
//! permuting and re-encrypting its input and publishing a zero-knowledge
//! proof of correctness; a threshold of decryption trustees then jointly
//! recovers the tally. See `DESIGN.md` for the grounding ledger tying every
//! module below to the teacher repository it was adapted from.

pub mod batch;
pub mod board;
pub mod config;
pub mod elgamal;
pub mod error;
pub mod group;
pub mod message;
pub mod mix_server;
pub mod signing;
pub mod switch;
pub mod threshold;
pub mod verify;
pub mod vote;
pub mod waksman;
pub mod wire;

pub use error::MixnetError;
