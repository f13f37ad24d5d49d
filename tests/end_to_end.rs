//! Full-pipeline integration tests: threshold key generation, ballot
//! encryption, a mix-server cascade, chain verification and threshold
//! decryption composed together in one flow, rather than each module's unit
//! tests exercising only its own boundary. Covers `spec.md` §8 scenarios
//! S1 and S2 end to end.

use std::collections::BTreeMap;

use ark_std::test_rng;

use vote_mixnet::batch::MixBatchChain;
use vote_mixnet::elgamal::encrypt;
use vote_mixnet::message;
use vote_mixnet::mix_server::MixServer;
use vote_mixnet::signing::VerifyingKey;
use vote_mixnet::threshold::{partial_decrypt, run_dkg, threshold_decrypt};
use vote_mixnet::verify::verify_chain;

async fn run_election(plaintexts: &[&str], mixer_count: usize) -> BTreeMap<String, u64> {
    let mut rng = test_rng();
    let dkg = run_dkg(3, 2, &mut rng).await.expect("key generation succeeds");
    let pk = dkg.combined_public_key;

    let ballots: Vec<_> = plaintexts
        .iter()
        .map(|choice| {
            let m_point = message::encode(choice.as_bytes()).expect("encodes");
            encrypt(&pk, &m_point, &mut rng).expect("encrypts")
        })
        .collect();

    let mut current = ballots.clone();
    let mut chain = MixBatchChain::new();
    let mut authorized_keys: Vec<VerifyingKey> = Vec::new();
    for mixer_index in 0..mixer_count {
        let server = MixServer::new(current.len(), &mut rng).expect("valid batch size");
        let batch = server.run(&current, &pk, &mut rng).expect("mix run succeeds");
        authorized_keys.push(server.verifying_key());
        current = batch.output_column().to_vec();
        chain.insert(mixer_index as u32, batch);
    }

    let report = verify_chain(&chain, &pk, &authorized_keys, &ballots);
    assert!(report.chain_ok, "chain should verify: {:?}", report.chain_errors);

    let public_shares: Vec<_> = dkg.shares.iter().map(|share| (share.index, share.public_share)).collect();
    let decrypting_trustees = &dkg.shares[..2];

    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    for ciphertext in &current {
        let partials: Vec<_> = decrypting_trustees
            .iter()
            .map(|share| partial_decrypt(share.index, &share.secret_share(), &pk, ciphertext, &mut rng))
            .collect();
        let m_point = threshold_decrypt(&pk, ciphertext, 2, &public_shares, &partials).expect("threshold decrypts");
        let choice = String::from_utf8(message::decode(&m_point)).expect("plaintext is UTF-8");
        *tally.entry(choice).or_insert(0) += 1;
    }
    tally
}

#[tokio::test]
async fn s1_single_mixer_two_options_tallies_correctly() {
    let tally = run_election(&["A", "B", "A", "B"], 1).await;
    let expected: BTreeMap<String, u64> = [("A".to_string(), 2), ("B".to_string(), 2)].into_iter().collect();
    assert_eq!(tally, expected);
}

#[tokio::test]
async fn s2_three_mixer_cascade_eight_distinct_ballots_tallies_correctly() {
    let plaintexts = ["1", "2", "3", "4", "5", "6", "7", "8"];
    let tally = run_election(&plaintexts, 3).await;
    let expected: BTreeMap<String, u64> = plaintexts.iter().map(|p| (p.to_string(), 1)).collect();
    assert_eq!(tally, expected);
}

#[tokio::test]
async fn threshold_degenerate_single_trustee_decryption_still_works() {
    let mut rng = test_rng();
    let dkg = run_dkg(1, 1, &mut rng).await.expect("key generation succeeds");
    let pk = dkg.combined_public_key;

    let m_point = message::encode(b"solo").expect("encodes");
    let ciphertext = encrypt(&pk, &m_point, &mut rng).expect("encrypts");

    let public_shares: Vec<_> = dkg.shares.iter().map(|share| (share.index, share.public_share)).collect();
    let partial = partial_decrypt(dkg.shares[0].index, &dkg.shares[0].secret_share(), &pk, &ciphertext, &mut rng);

    let recovered = threshold_decrypt(&pk, &ciphertext, 1, &public_shares, &[partial]).expect("decrypts");
    assert_eq!(message::decode(&recovered), b"solo");
}
