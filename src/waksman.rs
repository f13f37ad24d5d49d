//! Waksman permutation network: configuration and application (component F).
//!
//! Grounded on the teacher's recursive-tree style for mutually-referencing
//! owned sub-structures (see `shuffling/mod.rs`'s module tree), applied here
//! to the network/switch recursion `spec.md` §9 calls out explicitly
//! ("model as a tree of owned sub-networks... no cycles"). The routing
//! itself realizes a permutation by 2-colouring the union of the two perfect
//! matchings induced by input-pairing (`w`, `w^1`) and output-pairing (wires
//! sharing a destination pair) — the standard technique for constructing a
//! Beneš/Waksman switch assignment from an arbitrary permutation, equivalent
//! to the chain-following procedure in `spec.md` §4.F.

use ark_std::rand::RngCore;

use crate::elgamal::{Ciphertext, EncryptionPublicKey};
use crate::error::NetworkConfigError;
use crate::switch::{self, SwitchProof};

/// A configured Waksman network, ready to route ciphertexts according to the
/// permutation it was built from.
#[derive(Debug, Clone)]
pub enum WaksmanNetwork {
    /// `n = 2`: a single switch. `swap = false` realizes the identity,
    /// `true` realizes the transposition.
    Base { swap: bool },
    /// `n > 2`: a first and last column of `n/2` switches each, plus two
    /// size-`n/2` sub-networks.
    Recursive {
        size: usize,
        first_column: Vec<bool>,
        last_column: Vec<bool>,
        top: Box<WaksmanNetwork>,
        bottom: Box<WaksmanNetwork>,
    },
}

impl WaksmanNetwork {
    pub fn size(&self) -> usize {
        match self {
            WaksmanNetwork::Base { .. } => 2,
            WaksmanNetwork::Recursive { size, .. } => *size,
        }
    }

    /// `2*log2(n) - 1`, the number of switch columns this network has.
    pub fn layer_count(&self) -> usize {
        layer_count_for(self.size())
    }
}

fn layer_count_for(n: usize) -> usize {
    2 * (n.trailing_zeros() as usize) - 1
}

fn is_power_of_two_at_least_two(n: usize) -> bool {
    n >= 2 && n.is_power_of_two()
}

fn validate_permutation(sigma: &[usize], n: usize) -> Result<(), NetworkConfigError> {
    if sigma.len() != n {
        return Err(NetworkConfigError::WrongLength {
            expected: n,
            actual: sigma.len(),
        });
    }
    let mut seen = vec![false; n];
    for &value in sigma {
        if value >= n || seen[value] {
            return Err(NetworkConfigError::NotAPermutation(n));
        }
        seen[value] = true;
    }
    Ok(())
}

/// Configures a Waksman network realizing `sigma`, a bijection on
/// `{0,...,n-1}` for `n` a power of two `>= 2`.
pub fn configure(sigma: &[usize]) -> Result<WaksmanNetwork, NetworkConfigError> {
    let n = sigma.len();
    if !is_power_of_two_at_least_two(n) {
        return Err(NetworkConfigError::NotPowerOfTwo(n));
    }
    validate_permutation(sigma, n)?;
    configure_validated(sigma)
}

fn configure_validated(sigma: &[usize]) -> Result<WaksmanNetwork, NetworkConfigError> {
    let n = sigma.len();
    if n == 2 {
        return Ok(WaksmanNetwork::Base {
            swap: sigma == [1, 0],
        });
    }

    let color = color_wires(sigma);

    let first_column: Vec<bool> = (0..n / 2).map(|k| color[2 * k]).collect();

    let mut sigma_inv = vec![0usize; n];
    for (w, &target) in sigma.iter().enumerate() {
        sigma_inv[target] = w;
    }
    let last_column: Vec<bool> = (0..n / 2)
        .map(|m| color[sigma_inv[2 * m]])
        .collect();

    let (top_sigma, bottom_sigma) = split_sub_permutations(sigma, &color);
    // `spec.md` §4.F step 4: "Validate each sub-permutation is a bijection of
    // {0,...,n/2-1}" before recursing into it.
    validate_permutation(&top_sigma, n / 2).map_err(|_| NetworkConfigError::SubPermutationInvalid(n / 2))?;
    validate_permutation(&bottom_sigma, n / 2).map_err(|_| NetworkConfigError::SubPermutationInvalid(n / 2))?;

    Ok(WaksmanNetwork::Recursive {
        size: n,
        first_column,
        last_column,
        top: Box::new(configure_validated(&top_sigma)?),
        bottom: Box::new(configure_validated(&bottom_sigma)?),
    })
}

/// Assigns each wire `w` in `0..n` a colour (`false` = routed through the top
/// sub-network, `true` = bottom) by 2-colouring the union of the
/// input-pairing matching (`w <-> w^1`) and output-pairing matching (`w <->`
/// the other preimage of `sigma[w]`'s destination pair). This union is a
/// disjoint set of even cycles, which always admits a 2-colouring alternating
/// along each cycle.
fn color_wires(sigma: &[usize]) -> Vec<bool> {
    let n = sigma.len();
    let mut sigma_inv = vec![0usize; n];
    for (w, &target) in sigma.iter().enumerate() {
        sigma_inv[target] = w;
    }
    let right_partner = |w: usize| -> usize { sigma_inv[sigma[w] ^ 1] };

    let mut color: Vec<Option<bool>> = vec![None; n];
    for start in 0..n {
        if color[start].is_some() {
            continue;
        }
        color[start] = Some(false);
        let mut current = start;
        let mut use_left_edge = true;
        let mut next_color = true;
        loop {
            let next = if use_left_edge {
                current ^ 1
            } else {
                right_partner(current)
            };
            if color[next].is_some() {
                break;
            }
            color[next] = Some(next_color);
            current = next;
            use_left_edge = !use_left_edge;
            next_color = !next_color;
        }
    }
    color.into_iter().map(|c| c.unwrap()).collect()
}

fn split_sub_permutations(sigma: &[usize], color: &[bool]) -> (Vec<usize>, Vec<usize>) {
    let build = |want: bool| -> Vec<usize> {
        let targets: Vec<usize> = (0..sigma.len())
            .filter(|&w| color[w] == want)
            .map(|w| sigma[w])
            .collect();
        let mut sorted_targets = targets.clone();
        sorted_targets.sort_unstable();
        let rank = |value: usize| sorted_targets.binary_search(&value).unwrap();
        targets.into_iter().map(rank).collect()
    };
    (build(false), build(true))
}

/// The columns and proofs produced by applying a configured network to a
/// batch of ciphertexts: `columns` has `layer_count()+1` entries of `n`
/// ciphertexts each, `proofs` has `layer_count()` entries of `n/2` proofs
/// each.
pub struct MixResult {
    pub columns: Vec<Vec<Ciphertext>>,
    pub proofs: Vec<Vec<SwitchProof>>,
}

/// Applies `network` to `input`, re-encrypting and permuting per the
/// configured routing, and recording an OR-proof for every switch.
pub fn apply<R: RngCore + ?Sized>(
    network: &WaksmanNetwork,
    pk: &EncryptionPublicKey,
    input: &[Ciphertext],
    rng: &mut R,
) -> MixResult {
    match network {
        WaksmanNetwork::Base { swap } => {
            let output = switch::apply(pk, &input[0], &input[1], *swap, rng);
            MixResult {
                columns: vec![input.to_vec(), vec![output.c, output.d]],
                proofs: vec![vec![output.proof]],
            }
        }
        WaksmanNetwork::Recursive {
            first_column,
            last_column,
            top,
            bottom,
            ..
        } => {
            let n = input.len();
            let half = n / 2;

            let mut top_input = Vec::with_capacity(half);
            let mut bottom_input = Vec::with_capacity(half);
            let mut first_proofs = Vec::with_capacity(half);
            for k in 0..half {
                let output = switch::apply(pk, &input[2 * k], &input[2 * k + 1], first_column[k], rng);
                top_input.push(output.c);
                bottom_input.push(output.d);
                first_proofs.push(output.proof);
            }

            let top_result = apply(top, pk, &top_input, rng);
            let bottom_result = apply(bottom, pk, &bottom_input, rng);
            let inner_layers = top_result.columns.len();
            debug_assert_eq!(inner_layers, bottom_result.columns.len());

            let mut columns = Vec::with_capacity(inner_layers + 2);
            columns.push(input.to_vec());
            for j in 0..inner_layers {
                let mut combined = top_result.columns[j].clone();
                combined.extend(bottom_result.columns[j].iter().cloned());
                columns.push(combined);
            }

            let mut proofs = Vec::with_capacity(inner_layers + 1);
            proofs.push(first_proofs);
            for j in 0..top_result.proofs.len() {
                let mut combined = top_result.proofs[j].clone();
                combined.extend(bottom_result.proofs[j].iter().cloned());
                proofs.push(combined);
            }

            let top_last = columns.last().unwrap()[..half].to_vec();
            let bottom_last = columns.last().unwrap()[half..].to_vec();
            let mut final_output = vec![None; n];
            let mut last_proofs = Vec::with_capacity(half);
            for m in 0..half {
                let output = switch::apply(pk, &top_last[m], &bottom_last[m], last_column[m], rng);
                final_output[2 * m] = Some(output.c);
                final_output[2 * m + 1] = Some(output.d);
                last_proofs.push(output.proof);
            }
            columns.push(final_output.into_iter().map(|c| c.unwrap()).collect());
            proofs.push(last_proofs);

            MixResult { columns, proofs }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::{decrypt, encrypt, EncryptionPublicKey};
    use crate::group::random_nonzero_scalar;
    use crate::message;
    use ark_std::test_rng;

    fn is_permutation(sigma: &[usize]) -> bool {
        let n = sigma.len();
        let mut seen = vec![false; n];
        for &v in sigma {
            if v >= n || seen[v] {
                return false;
            }
            seen[v] = true;
        }
        true
    }

    #[test]
    fn rejects_non_power_of_two_sizes() {
        for n in [1usize, 3, 5, 6, 7] {
            let sigma: Vec<usize> = (0..n).collect();
            assert!(configure(&sigma).is_err());
        }
    }

    #[test]
    fn accepts_valid_sizes() {
        for n in [2usize, 4, 1024] {
            let sigma: Vec<usize> = (0..n).collect();
            assert!(configure(&sigma).is_ok());
        }
    }

    #[test]
    fn applying_network_realizes_permutation_s1() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);

        let plaintexts = ["A", "B", "A", "B"];
        let input: Vec<Ciphertext> = plaintexts
            .iter()
            .map(|m| encrypt(&pk, &message::encode(m.as_bytes()).unwrap(), &mut rng).unwrap())
            .collect();

        let sigma = vec![2usize, 0, 3, 1];
        assert!(is_permutation(&sigma));
        let network = configure(&sigma).unwrap();
        let result = apply(&network, &pk, &input, &mut rng);

        assert_eq!(result.columns.len(), network.layer_count() + 1);
        assert_eq!(result.proofs.len(), network.layer_count());

        let output = result.columns.last().unwrap();
        for i in 0..4 {
            let decrypted_bytes = message::decode(&decrypt(&secret, &output[sigma[i]]).unwrap());
            assert_eq!(decrypted_bytes, plaintexts[i].as_bytes());
            assert_ne!(output[sigma[i]].to_bytes(), input[i].to_bytes());
        }
    }

    #[test]
    fn sigma_round_trip_over_random_permutations() {
        let mut rng = test_rng();
        let secret = random_nonzero_scalar(&mut rng);
        let pk = EncryptionPublicKey::from_secret(&secret);
        let n = 8;

        for seed_offset in 0..5u8 {
            let mut sigma: Vec<usize> = (0..n).collect();
            // deterministic pseudo-shuffle so this test needs no extra rand crate API
            for i in (1..n).rev() {
                let j = (i + seed_offset as usize * 7 + 3) % (i + 1);
                sigma.swap(i, j);
            }
            assert!(is_permutation(&sigma));

            let input: Vec<Ciphertext> = (0..n)
                .map(|i| {
                    encrypt(&pk, &message::encode(&[i as u8]).unwrap(), &mut rng).unwrap()
                })
                .collect();

            let network = configure(&sigma).unwrap();
            let result = apply(&network, &pk, &input, &mut rng);
            let output = result.columns.last().unwrap();

            for i in 0..n {
                let decoded = message::decode(&decrypt(&secret, &output[sigma[i]]).unwrap());
                assert_eq!(decoded, vec![i as u8]);
            }
        }
    }
}
