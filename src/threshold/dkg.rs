//! n-party Shamir key generation (`spec.md` §4.D steps 1–4, §5 concurrency
//! model).
//!
//! Each of the `n` trustees runs as an independent Tokio task with a private
//! bounded inbox; suspension points are exactly the inbox reads awaiting the
//! `n` share messages, and a shared [`CancellationToken`] aborts every
//! surviving task the moment one fails — grounded on the teacher's
//! `shuffler/hand_runtime.rs` per-participant `CancellationToken` convention,
//! generalized from its single-cancellation-source shuffler hand to the
//! mesh of point-to-point channels a DKG round needs.

use ark_ec::PrimeGroup;
use ark_std::rand::RngCore;
use ark_std::Zero;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::elgamal::EncryptionPublicKey;
use crate::error::DkgError;
use crate::group::{Curve, Scalar};
use crate::threshold::polynomial::{lagrange_combine, Polynomial};

const LOG_TARGET: &str = "mixnet::threshold::dkg";

/// One trustee's share message to another: `f_i(j)` sent from trustee `i` to
/// trustee `j`.
struct ShareMessage {
    from: u32,
    value: Scalar,
}

/// A trustee's final state after a successful key-generation round: its
/// secret share `s_i` (zeroized on drop, never reconstructed in the clear)
/// and its public share `H_i = s_i * G`.
pub struct TrusteeKeyShare {
    pub index: u32,
    secret_share: Scalar,
    pub public_share: Curve,
}

impl TrusteeKeyShare {
    /// The trustee's secret share. Callers must not log or persist this in
    /// the clear; it is held only long enough to produce partial
    /// decryptions.
    pub fn secret_share(&self) -> Scalar {
        self.secret_share
    }
}

impl Drop for TrusteeKeyShare {
    fn drop(&mut self) {
        self.secret_share = Scalar::zero();
    }
}

/// The public output of a completed key-generation round: the combined
/// encryption public key and every trustee's key share.
pub struct DkgOutcome {
    pub combined_public_key: EncryptionPublicKey,
    pub shares: Vec<TrusteeKeyShare>,
}

async fn participant_task(
    index: u32,
    n: u32,
    polynomial: Polynomial,
    senders: Vec<mpsc::Sender<ShareMessage>>,
    mut inbox: mpsc::Receiver<ShareMessage>,
    cancel: CancellationToken,
) -> Result<TrusteeKeyShare, DkgError> {
    for j in 1..=n {
        let message = ShareMessage {
            from: index,
            value: polynomial.evaluate(j),
        };
        tokio::select! {
            _ = cancel.cancelled() => return Err(DkgError::Cancelled),
            result = senders[(j - 1) as usize].send(message) => {
                if result.is_err() {
                    cancel.cancel();
                    return Err(DkgError::Cancelled);
                }
            }
        }
    }
    // the polynomial's coefficients are no longer needed once every share
    // has been sent; dropping it here zeroizes them ahead of the inbox wait.
    drop(polynomial);

    let mut received: Vec<Option<Scalar>> = vec![None; n as usize];
    for _ in 0..n {
        let message = tokio::select! {
            _ = cancel.cancelled() => return Err(DkgError::Cancelled),
            message = inbox.recv() => message,
        };
        let Some(message) = message else {
            cancel.cancel();
            return Err(DkgError::Cancelled);
        };
        let slot = received
            .get_mut((message.from - 1) as usize)
            .ok_or(DkgError::MalformedShare {
                trustee: index,
                from: message.from,
            })?;
        if slot.is_some() {
            cancel.cancel();
            return Err(DkgError::MalformedShare {
                trustee: index,
                from: message.from,
            });
        }
        *slot = Some(message.value);
    }
    // the outgoing-shares table (the other ends of `senders`) is dropped
    // with this task's frame; nothing further is sent on behalf of `index`.

    let mut secret_share = Scalar::zero();
    for (from_zero_based, value) in received.into_iter().enumerate() {
        match value {
            Some(v) => secret_share += v,
            None => {
                return Err(DkgError::MissingShare {
                    trustee: index,
                    from: from_zero_based as u32 + 1,
                })
            }
        }
    }

    let public_share = Curve::generator() * secret_share;
    Ok(TrusteeKeyShare {
        index,
        secret_share,
        public_share,
    })
}

/// Runs a full `(t, n)` key-generation round: `n` trustees each sample a
/// degree-`(t-1)` polynomial, exchange evaluations point-to-point, and sum
/// the shares they receive. The combined public key is reconstructed via
/// Lagrange interpolation over the first `t` trustees' public shares
/// (`spec.md` §4.D step 4 — any `t`-subset reconstructs the same point).
///
/// Cancellation: any participant failure aborts the whole round; every
/// surviving task observes the shared [`CancellationToken`] at its next
/// channel operation (`spec.md` §5).
pub async fn run_dkg<R: RngCore + ?Sized>(
    n: u32,
    t: u32,
    rng: &mut R,
) -> Result<DkgOutcome, DkgError> {
    if t == 0 || t > n {
        return Err(DkgError::BadThreshold { t, n });
    }

    let cancel = CancellationToken::new();
    let mut senders = Vec::with_capacity(n as usize);
    let mut inboxes = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let (tx, rx) = mpsc::channel(n as usize);
        senders.push(tx);
        inboxes.push(rx);
    }

    let mut join_set = JoinSet::new();
    for (offset, inbox) in inboxes.into_iter().enumerate() {
        let index = offset as u32 + 1;
        let polynomial = Polynomial::random(t, rng);
        let task_senders = senders.clone();
        let task_cancel = cancel.clone();
        join_set.spawn(async move {
            participant_task(index, n, polynomial, task_senders, inbox, task_cancel).await
        });
    }
    drop(senders);

    let mut shares = Vec::with_capacity(n as usize);
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Ok(share)) => shares.push(share),
            Ok(Err(err)) => {
                cancel.cancel();
                join_set.abort_all();
                warn!(target: LOG_TARGET, n, t, error = %err, "key generation aborted");
                return Err(err);
            }
            Err(_) => {
                cancel.cancel();
                join_set.abort_all();
                return Err(DkgError::Cancelled);
            }
        }
    }

    shares.sort_by_key(|share| share.index);
    let public_points: Vec<(u32, Curve)> = shares
        .iter()
        .take(t as usize)
        .map(|share| (share.index, share.public_share))
        .collect();
    let combined_h = lagrange_combine(&public_points);
    let combined_public_key = EncryptionPublicKey {
        generator: Curve::generator(),
        h: combined_h,
    };

    info!(target: LOG_TARGET, n, t, "threshold key generation completed");
    Ok(DkgOutcome {
        combined_public_key,
        shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::test_rng;

    #[tokio::test]
    async fn combined_key_matches_secret_sum_and_any_t_subset_reconstructs() {
        let mut rng = test_rng();
        let outcome = run_dkg(5, 3, &mut rng).await.unwrap();
        assert_eq!(outcome.shares.len(), 5);

        let public_points: Vec<(u32, Curve)> = outcome
            .shares
            .iter()
            .skip(1)
            .take(3)
            .map(|share| (share.index, share.public_share))
            .collect();
        let alt_combined = lagrange_combine(&public_points);
        assert_eq!(alt_combined, outcome.combined_public_key.h);

        for share in &outcome.shares {
            assert_eq!(Curve::generator() * share.secret_share(), share.public_share);
        }
    }

    #[tokio::test]
    async fn rejects_bad_threshold() {
        let mut rng = test_rng();
        assert!(run_dkg(3, 0, &mut rng).await.is_err());
        assert!(run_dkg(3, 4, &mut rng).await.is_err());
    }
}
