//! Mix server: owns one stage's secret permutation and signing key, and
//! drives it through the permutation network to produce a signed
//! `MixBatchOutput` (component G, `spec.md` §4.G).
//!
//! Grounded on the teacher's `shuffler/service.rs` "owns its secret state,
//! produces a signed artifact" shape, generalized from its per-hand shuffle
//! loop to one Waksman-network application per batch.

use ark_std::rand::RngCore;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::batch::{MixBatchHeader, MixBatchOutput};
use crate::elgamal::{Ciphertext, EncryptionPublicKey};
use crate::error::MixServerError;
use crate::signing::{generate_signing_key, SigningKey, VerifyingKey};
use crate::waksman::{self, WaksmanNetwork};

const LOG_TARGET: &str = "mixnet::mix_server";

/// One mix server: a fixed batch size `n`, a secret permutation `sigma` of
/// `{0,...,n-1}` realized as a configured [`WaksmanNetwork`], and an Ed25519
/// signing key. Immutable once built; `run` may be called repeatedly (each
/// call re-applies the same permutation to a fresh input batch, as a cascade
/// stage does across successive polls).
pub struct MixServer {
    batch_size: usize,
    network: WaksmanNetwork,
    signing_key: SigningKey,
}

impl MixServer {
    /// Builds a mix server for batch size `n` (rounded up to the next power
    /// of two by the caller, per `spec.md` §4.G step 1): samples a fresh
    /// uniform random permutation of `{0,...,n-1}`, configures the Waksman
    /// network realizing it, and generates a fresh Ed25519 signing key.
    pub fn new<R: RngCore + ?Sized>(n: usize, rng: &mut R) -> Result<Self, MixServerError> {
        if n < 2 || !n.is_power_of_two() {
            return Err(MixServerError::BadBatchSize(n));
        }
        let mut sigma: Vec<usize> = (0..n).collect();
        sigma.shuffle(rng);
        let network = waksman::configure(&sigma)?;
        let signing_key = generate_signing_key(rng);
        Ok(MixServer {
            batch_size: n,
            network,
            signing_key,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Runs this mix server on `input`: configures nothing new (the
    /// permutation was fixed at construction), applies the network to
    /// produce the ciphertext and proof matrices, assembles a
    /// `MixBatchOutput`, and signs it (`spec.md` §4.G steps 2–4).
    pub fn run<R: RngCore + ?Sized>(
        &self,
        input: &[Ciphertext],
        pk: &EncryptionPublicKey,
        rng: &mut R,
    ) -> Result<MixBatchOutput, MixServerError> {
        if input.len() != self.batch_size {
            return Err(MixServerError::BadBatchSize(input.len()));
        }

        let result = waksman::apply(&self.network, pk, input, rng);
        debug!(
            target: LOG_TARGET,
            batch_size = self.batch_size,
            layers = self.network.layer_count(),
            "mix network applied"
        );

        let mut batch = MixBatchOutput {
            header: MixBatchHeader::for_size(self.batch_size),
            ciphertexts_matrix: result.columns,
            proofs_matrix: result.proofs,
            signer_public_key: self.signing_key.verifying_key(),
            signature: None,
        };
        batch.sign(&self.signing_key);

        info!(
            target: LOG_TARGET,
            batch_size = self.batch_size,
            "mix batch signed"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::encrypt;
    use crate::group::random_nonzero_scalar;
    use crate::message;
    use crate::verify::verify_mix_batch;
    use ark_std::test_rng;

    #[test]
    fn rejects_non_power_of_two_batch_size() {
        let mut rng = test_rng();
        assert!(MixServer::new(6, &mut rng).is_err());
    }

    #[test]
    fn run_produces_a_self_verifying_signed_batch() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);
        let server = MixServer::new(4, &mut rng).unwrap();

        let input: Vec<Ciphertext> = ["A", "B", "A", "B"]
            .iter()
            .map(|m| encrypt(&pk, &message::encode(m.as_bytes()).unwrap(), &mut rng).unwrap())
            .collect();

        let batch = server.run(&input, &pk, &mut rng).unwrap();
        batch.verify_self_signature().unwrap();
        assert_eq!(batch.signer_public_key, server.verifying_key());

        let report = verify_mix_batch(&batch, &pk);
        assert!(report.ok, "{:?}", report.failures);
    }

    #[test]
    fn rejects_wrong_size_input() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);
        let server = MixServer::new(4, &mut rng).unwrap();
        let input: Vec<Ciphertext> = ["A", "B"]
            .iter()
            .map(|m| encrypt(&pk, &message::encode(m.as_bytes()).unwrap(), &mut rng).unwrap())
            .collect();
        assert!(server.run(&input, &pk, &mut rng).is_err());
    }
}
