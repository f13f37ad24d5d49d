//! One decryption trustee: fetches the fully-mixed ciphertext batch, emits
//! a partial decryption with its Chaum–Pedersen DLEQ proof for each
//! ciphertext, and publishes them (`spec.md` §4.D "Threshold decryption",
//! §6).

use anyhow::{bail, Context, Result};
use ark_ec::PrimeGroup;
use rand::rngs::StdRng;
use rand::SeedableRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use clap::Parser;
use vote_mixnet::board::{BulletinBoard, HttpBulletinBoard};
use vote_mixnet::config::{init_tracing, Config, Role};
use vote_mixnet::elgamal::EncryptionPublicKey;
use vote_mixnet::group::{Curve, Scalar};
use vote_mixnet::threshold::decrypt::partial_decrypt;
use vote_mixnet::wire::bytes_from_hex;

/// The raw secret-share bytes parsed from `--secret-share-hex`, held only
/// long enough to build the `Scalar` and zeroized on drop — the same
/// plain-byte-buffer convention the teacher applies to `ShufflerSecret`
/// and `PlayerSecret` in `src/domain/mod.rs`.
#[derive(Zeroize, ZeroizeOnDrop)]
struct RawSecretShare(Vec<u8>);

const LOG_TARGET: &str = "bin::trustee";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.json);
    if config.role != Role::Trustee {
        bail!("trustee binary requires --role trustee");
    }
    let trustee_index = config
        .trustee_index
        .context("--trustee-index is required for role trustee")?;
    let secret_share_hex = config
        .secret_share_hex
        .as_deref()
        .context("--secret-share-hex is required for role trustee")?;
    let bulletin_board_url = config
        .bulletin_board_url
        .as_deref()
        .context("trustee requires --bulletin-board-url; the in-memory board is demo-only")?;

    let secret_share = parse_secret_share(secret_share_hex)?;
    let board = HttpBulletinBoard::new(bulletin_board_url);

    let mix_batches = board.get_mix_batches(&config.poll_id).await?;
    let last_mixer = mix_batches
        .keys()
        .max()
        .copied()
        .context("no mix batches published yet")?;
    let final_batch = &mix_batches[&last_mixer];
    let output = final_batch.output_column();

    // `partial_decrypt` only ever reads `pk.generator`, never `pk.h` (this
    // trustee does not know the combined secret), so a throwaway key with
    // the process-wide generator is all the statement needs.
    let generator_only = EncryptionPublicKey {
        generator: Curve::generator(),
        h: Curve::generator(),
    };

    let mut rng = StdRng::from_entropy();
    let partials: Vec<_> = output
        .iter()
        .map(|ciphertext| partial_decrypt(trustee_index, &secret_share, &generator_only, ciphertext, &mut rng))
        .collect();

    let count = partials.len();
    board
        .put_partial_decryption(&config.poll_id, trustee_index, partials)
        .await?;
    tracing::info!(
        target: LOG_TARGET,
        poll_id = %config.poll_id,
        trustee_index,
        count,
        "partial decryptions published"
    );
    // Combining every trustee's partials into one `put_results` call (via
    // `get_partial_decryptions` plus `threshold::decrypt::threshold_decrypt`)
    // is the orchestrator's job (`spec.md` §6); this binary's job ends at
    // publishing its own partials where the orchestrator can read them.
    Ok(())
}

fn parse_secret_share(hex: &str) -> Result<Scalar> {
    use ark_ff::PrimeField;
    let raw = RawSecretShare(bytes_from_hex(hex).context("secret share is not valid hex")?);
    Ok(Scalar::from_be_bytes_mod_order(&raw.0))
}
