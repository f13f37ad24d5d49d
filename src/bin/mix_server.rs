//! One mix-server stage: fetches its input batch from the bulletin board,
//! runs it through a freshly configured Waksman network, and publishes the
//! signed `MixBatchOutput` (`spec.md` §4.G, §6).
//!
//! Grounded on the teacher's `src/bin/legit_poker_server.rs` shape: parse
//! args, init tracing, build config, run the core logic.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vote_mixnet::board::{BulletinBoard, HttpBulletinBoard};
use vote_mixnet::config::{init_tracing, Config, Role};
use vote_mixnet::elgamal::{encrypt, Ciphertext, EncryptionPublicKey};
use vote_mixnet::group::{encoding, CurveConfig};
use vote_mixnet::message;
use vote_mixnet::mix_server::MixServer;

const LOG_TARGET: &str = "bin::mix_server";

/// Reserved plaintext padded ciphertexts decrypt to. Never a prefix a real
/// ballot encoder would produce on its own, so padding never inflates a
/// genuine voter's tally count the way duplicating a real ciphertext would.
const PAD_SENTINEL: &[u8] = b"__mixnet_pad_abstain__";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.json);
    if config.role != Role::MixServer {
        bail!("mix_server binary requires --role mix-server");
    }
    let mixer_index = config
        .mixer_index
        .context("--mixer-index is required for role mix-server")?;
    let bulletin_board_url = config
        .bulletin_board_url
        .as_deref()
        .context("mix_server requires --bulletin-board-url; the in-memory board is demo-only")?;

    let board = HttpBulletinBoard::new(bulletin_board_url);
    let board_config = board.get_config().await?;

    let mut rng = StdRng::from_entropy();

    // The encryption public key is published as part of the voting setup,
    // not re-derived here; this binary treats it as already-known context
    // published alongside `board_config.signed_config_blob`.
    let pk = load_public_key(&board_config)?;

    let input = fetch_input_batch(&board, &config.poll_id, mixer_index).await?;
    let n = input.len().next_power_of_two().max(2);
    let padded = pad_to_power_of_two(input, n, &pk, &mut rng)?;

    let server = MixServer::new(padded.len(), &mut rng)
        .map_err(|err| anyhow!("failed to configure mix server: {err}"))?;

    let batch = server
        .run(&padded, &pk, &mut rng)
        .map_err(|err| anyhow!("mix server run failed: {err}"))?;

    board.put_mix_batch(&config.poll_id, mixer_index, batch).await?;
    tracing::info!(target: LOG_TARGET, poll_id = %config.poll_id, mixer_index, "mix batch published");
    Ok(())
}

/// Reads this mixer's input: the published ballot set for mixer 0, or the
/// preceding mixer's output column otherwise.
async fn fetch_input_batch(
    board: &HttpBulletinBoard,
    poll_id: &str,
    mixer_index: u32,
) -> Result<Vec<Ciphertext>> {
    if mixer_index == 0 {
        let ballots = board.get_encrypted_ballots(poll_id).await?;
        Ok(ballots.votes.iter().map(|vote| *vote.ciphertext()).collect())
    } else {
        let batches = board.get_mix_batches(poll_id).await?;
        let previous = batches
            .get(&(mixer_index - 1))
            .ok_or_else(|| anyhow!("no published batch for preceding mixer {}", mixer_index - 1))?;
        Ok(previous.output_column().to_vec())
    }
}

fn pad_to_power_of_two(
    mut input: Vec<Ciphertext>,
    n: usize,
    pk: &EncryptionPublicKey,
    rng: &mut StdRng,
) -> Result<Vec<Ciphertext>> {
    if input.len() > n {
        bail!("batch size {} exceeds padded size {}", input.len(), n);
    }
    if input.is_empty() && n > 0 {
        bail!("cannot pad an empty ballot batch");
    }
    // Dummy-filling at the ingest boundary is explicitly the collaborator's
    // problem per `spec.md` §4.G; each padding slot gets a fresh encryption
    // of the reserved sentinel plaintext rather than a copy of a real
    // ciphertext, so padding never inflates a real voter's tally count.
    let sentinel = message::encode(PAD_SENTINEL).context("failed to encode padding sentinel")?;
    while input.len() < n {
        input.push(encrypt(pk, &sentinel, rng).context("failed to encrypt padding ciphertext")?);
    }
    Ok(input)
}

fn load_public_key(board_config: &vote_mixnet::board::BoardConfig) -> Result<EncryptionPublicKey> {
    // `signed_config_blob` is opaque at this layer (`spec.md` §6); a real
    // deployment parses its collaborator-defined envelope. This binary
    // expects the raw 66-byte `(G || H)` SEC1 encoding for local testing.
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
