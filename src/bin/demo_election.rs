//! End-to-end election demo, entirely in-process against the in-memory
//! bulletin board: key generation, ballot casting, a cascade of mix
//! servers, chain verification, threshold decryption, and tallying
//! (`spec.md` §8 scenarios S1/S2). Grounded on the teacher's
//! `src/bin/legit_poker_server.rs` "one binary wires the whole system
//! together" shape, generalized from one HTTP service to an in-process
//! walk through every actor in the mixnet.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vote_mixnet::board::{BoardConfig, BulletinBoard, InMemoryBulletinBoard, ResultsReport, SignedBallots};
use vote_mixnet::config::{init_tracing, Config};
use vote_mixnet::elgamal::{encrypt, EncryptionPublicKey};
use vote_mixnet::group::encoding;
use vote_mixnet::message;
use vote_mixnet::mix_server::MixServer;
use vote_mixnet::threshold::{partial_decrypt, run_dkg, threshold_decrypt};
use vote_mixnet::verify::verify_chain;
use vote_mixnet::vote::Vote;

const LOG_TARGET: &str = "bin::demo_election";
const TRUSTEE_COUNT: u32 = 3;
const TRUSTEE_THRESHOLD: u32 = 2;
const MIXER_COUNT: usize = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // Role/bulletin-board-url are unused by this binary (everything runs
    // in-process), but it shares `Config` so `--poll-id` follows the same
    // convention as the networked binaries.
    let config = Config::parse();
    init_tracing(config.json);
    let mut rng = StdRng::from_entropy();

    let dkg = run_dkg(TRUSTEE_COUNT, TRUSTEE_THRESHOLD, &mut rng)
        .await
        .context("threshold key generation failed")?;
    let pk = dkg.combined_public_key;
    tracing::info!(target: LOG_TARGET, n = TRUSTEE_COUNT, t = TRUSTEE_THRESHOLD, "trustees generated a shared key");

    let board = InMemoryBulletinBoard::new(BoardConfig {
        mix_adversary_budget: 1,
        decryption_total: TRUSTEE_COUNT,
        decryption_required: TRUSTEE_THRESHOLD,
        bb_signing_public_key: Vec::new(),
        signed_config_blob: encode_public_key(&pk),
    });
    board.put_voting_public_key(encode_public_key(&pk)).await?;

    let ballots = vec!["alice", "bob", "alice", "carol", "bob", "alice", "carol", "bob"];
    let mut votes = Vec::with_capacity(ballots.len());
    for choice in &ballots {
        let m_point = message::encode(choice.as_bytes())?;
        let ciphertext = encrypt(&pk, &m_point, &mut rng)?;
        votes.push(Vote::new(ciphertext));
    }
    board
        .seed_ballots(
            &config.poll_id,
            SignedBallots {
                votes: votes.clone(),
                bb_signature: Vec::new(),
            },
        )
        .await;
    tracing::info!(target: LOG_TARGET, poll_id = %config.poll_id, count = votes.len(), "ballots cast");

    board.start_mix(&config.poll_id).await?;
    let mut current: Vec<_> = votes.iter().map(|vote| *vote.ciphertext()).collect();
    let mut authorized_keys = Vec::new();
    for mixer_index in 0..MIXER_COUNT {
        let server = MixServer::new(current.len(), &mut rng)
            .map_err(|err| anyhow!("mix server {mixer_index} setup failed: {err}"))?;
        let batch = server
            .run(&current, &pk, &mut rng)
            .map_err(|err| anyhow!("mix server {mixer_index} run failed: {err}"))?;
        authorized_keys.push(server.verifying_key());
        current = batch.output_column().to_vec();
        board.put_mix_batch(&config.poll_id, mixer_index as u32, batch).await?;
        tracing::info!(target: LOG_TARGET, mixer_index, "mix stage completed");
    }
    board.end_mix(&config.poll_id).await?;

    let chain_batches = board.get_mix_batches(&config.poll_id).await?;
    let mut chain = vote_mixnet::batch::MixBatchChain::new();
    for (mixer_index, batch) in chain_batches {
        chain.insert(mixer_index, batch);
    }
    let ballot_set: Vec<_> = votes.iter().map(|vote| *vote.ciphertext()).collect();
    let chain_report = verify_chain(&chain, &pk, &authorized_keys, &ballot_set);
    tracing::info!(target: LOG_TARGET, chain_ok = chain_report.chain_ok, "chain verification finished");
    if !chain_report.chain_ok {
        return Err(anyhow!("chain verification failed: {:?}", chain_report.chain_errors));
    }

    let public_shares: Vec<_> = dkg.shares.iter().map(|share| (share.index, share.public_share)).collect();
    let decrypting_trustees = &dkg.shares[..TRUSTEE_THRESHOLD as usize];

    let mut tally: BTreeMap<String, u64> = BTreeMap::new();
    let mut decryption_proofs = Vec::new();
    for ciphertext in &current {
        let partials: Vec<_> = decrypting_trustees
            .iter()
            .map(|share| partial_decrypt(share.index, &share.secret_share(), &pk, ciphertext, &mut rng))
            .collect();
        let m_point = threshold_decrypt(&pk, ciphertext, TRUSTEE_THRESHOLD as usize, &public_shares, &partials)
            .context("threshold decryption failed")?;
        let choice = String::from_utf8(message::decode(&m_point)).context("recovered a non-UTF-8 ballot")?;
        *tally.entry(choice).or_insert(0) += 1;
        decryption_proofs.extend(partials);
    }

    board
        .put_results(
            &config.poll_id,
            ResultsReport {
                chain_verified: chain_report.chain_ok,
                partial_decryption_proofs: decryption_proofs,
                tally: tally.clone(),
            },
        )
        .await?;

    for (choice, count) in &tally {
        println!("{choice}: {count}");
    }
    Ok(())
}

fn encode_public_key(pk: &EncryptionPublicKey) -> Vec<u8> {
    let mut bytes = encoding::encode_point::<vote_mixnet::group::CurveConfig>(&pk.generator);
    bytes.extend(encoding::encode_point::<vote_mixnet::group::CurveConfig>(&pk.h));
    bytes
}
