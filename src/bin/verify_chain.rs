//! The chain verifier: fetches every published mix batch plus the original
//! ballot set, checks the full chain, and reports the result (`spec.md`
//! §4.H, §6).

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use ed25519_dalek::VerifyingKey;

use vote_mixnet::batch::MixBatchChain;
use vote_mixnet::board::{BoardConfig, BulletinBoard, HttpBulletinBoard};
use vote_mixnet::config::{init_tracing, Config, Role};
use vote_mixnet::elgamal::EncryptionPublicKey;
use vote_mixnet::group::{encoding, CurveConfig};
use vote_mixnet::verify::verify_chain;

const LOG_TARGET: &str = "bin::verify_chain";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.json);
    if config.role != Role::Verifier {
        bail!("verify_chain binary requires --role verifier");
    }
    let bulletin_board_url = config
        .bulletin_board_url
        .as_deref()
        .context("verifier requires --bulletin-board-url; the in-memory board is demo-only")?;

    let authorized_keys = parse_authorized_keys(&config.authorized_signing_keys)?;

    let board = HttpBulletinBoard::new(bulletin_board_url);
    let board_config = board.get_config().await?;
    let pk = load_public_key(&board_config)?;

    let ballots = board.get_encrypted_ballots(&config.poll_id).await?;
    let ballot_set: Vec<_> = ballots.votes.iter().map(|vote| *vote.ciphertext()).collect();

    let batches = board.get_mix_batches(&config.poll_id).await?;
    let mut chain = MixBatchChain::new();
    for (mixer_index, batch) in batches {
        chain.insert(mixer_index, batch);
    }

    let report = verify_chain(&chain, &pk, &authorized_keys, &ballot_set);

    for (mixer_index, batch_report) in &report.batch_reports {
        tracing::info!(
            target: LOG_TARGET,
            poll_id = %config.poll_id,
            mixer_index,
            ok = batch_report.ok,
            failures = batch_report.failures.len(),
            "batch verified"
        );
    }
    if report.chain_ok {
        tracing::info!(target: LOG_TARGET, poll_id = %config.poll_id, "chain verification passed");
    } else {
        tracing::warn!(
            target: LOG_TARGET,
            poll_id = %config.poll_id,
            chain_errors = ?report.chain_errors,
            "chain verification failed"
        );
    }

    if !report.chain_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_authorized_keys(entries: &[String]) -> Result<Vec<VerifyingKey>> {
    entries
        .iter()
        .map(|entry| {
            let bytes = vote_mixnet::wire::bytes_from_base64(entry)
                .with_context(|| format!("authorized signing key {entry} is not valid base64"))?;
            let array: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow!("authorized signing key is not 32 bytes"))?;
            VerifyingKey::from_bytes(&array).context("authorized signing key is not a valid Ed25519 point")
        })
        .collect()
}

fn load_public_key(board_config: &BoardConfig) -> Result<EncryptionPublicKey> {
    // Same local-testing convention as `mix_server`: `signed_config_blob` is
    // the raw 66-byte SEC1-encoded (G, H) pair.
    let bytes = &board_config.signed_config_blob;
    if bytes.len() != 2 * encoding::ENCODED_POINT_LEN {
        bail!("signed_config_blob is not a (G, H) key pair encoding");
    }
    let (g_bytes, h_bytes) = bytes.split_at(encoding::ENCODED_POINT_LEN);
    Ok(EncryptionPublicKey {
        generator: encoding::decode_point::<CurveConfig>(g_bytes)?,
        h: encoding::decode_point::<CurveConfig>(h_bytes)?,
    })
}
