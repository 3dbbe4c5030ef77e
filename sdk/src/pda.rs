//! Deterministic address derivation.
//!
//! Every account the fractionalization program touches is derived from a
//! program id plus an ordered seed set; seed order is part of the wire
//! contract. The bump search walks downward from 255 until the candidate
//! falls off the ed25519 curve, mirroring the ledger's canonical-bump rule.

use rand::{distributions::Alphanumeric, Rng};
use solana_sdk::pubkey::{Pubkey, PubkeyError};
use spl_associated_token_account::get_associated_token_address;

use crate::error::{EngineError, Result};
use crate::{TOKEN_METADATA_PROGRAM_ID, TOKEN_VAULT_PROGRAM_ID};

const METADATA_PREFIX: &[u8] = b"metadata";
const VAULT_PREFIX: &[u8] = b"vault";
const EXTERNAL_PREFIX: &[u8] = b"external";
const FRACTION_PREFIX: &[u8] = b"fraction";
const TRANSFER_PREFIX: &[u8] = b"transfer";
const STORE_PREFIX: &[u8] = b"store";

/// Length of the random seed strings minted for fresh identities.
pub const RANDOM_SEED_LEN: usize = 16;

/// Derive the canonical program address for `seeds` under `program_id`.
///
/// Appends a bump byte to the seed set, starting at 255 and decrementing,
/// until the candidate is a valid off-curve address. At most 256 candidates
/// are tried. Pure function: identical inputs always yield the identical
/// `(address, bump)` pair.
pub fn derive_address(program_id: &Pubkey, seeds: &[&[u8]]) -> Result<(Pubkey, u8)> {
    let mut bump = [u8::MAX];
    for _ in 0..=u8::MAX {
        let mut seeds_with_bump = seeds.to_vec();
        seeds_with_bump.push(&bump);
        match Pubkey::create_program_address(&seeds_with_bump, program_id) {
            Ok(address) => return Ok((address, bump[0])),
            Err(PubkeyError::InvalidSeeds) => (),
            // Oversized or too many seeds: no bump can ever succeed.
            Err(_) => break,
        }
        bump[0] = bump[0].wrapping_sub(1);
    }
    Err(EngineError::DerivationExhausted)
}

/// A fresh random seed string for a new mint or vault identity.
///
/// Randomness is chosen before derivation, so the resulting address can still
/// collide with an unseen prior allocation; the submission driver's retry
/// loop owns that case.
pub fn random_seed() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SEED_LEN)
        .map(char::from)
        .collect()
}

/// Mint address for a freshly minted NFT: (seed, payer, destination) under
/// the fractionalization program.
pub fn mint_address(
    program_id: &Pubkey,
    seed: &str,
    payer: &Pubkey,
    destination: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[seed.as_bytes(), payer.as_ref(), destination.as_ref()],
    )
}

/// Vault account address: (payer, token-vault program, seed) under the
/// fractionalization program.
pub fn vault_address(program_id: &Pubkey, payer: &Pubkey, seed: &str) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[
            payer.as_ref(),
            TOKEN_VAULT_PROGRAM_ID.as_ref(),
            seed.as_bytes(),
        ],
    )
}

/// Metadata account for a mint, owned by the token-metadata program.
pub fn metadata_address(mint: &Pubkey) -> Result<(Pubkey, u8)> {
    derive_address(
        &TOKEN_METADATA_PROGRAM_ID,
        &[
            METADATA_PREFIX,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
    )
}

/// The vault's authority (also the fraction mint authority), owned by the
/// token-vault program.
pub fn vault_authority(vault: &Pubkey) -> Result<(Pubkey, u8)> {
    derive_address(
        &TOKEN_VAULT_PROGRAM_ID,
        &[
            VAULT_PREFIX,
            TOKEN_VAULT_PROGRAM_ID.as_ref(),
            vault.as_ref(),
        ],
    )
}

/// The safety deposit box recording one deposited token type in a vault.
pub fn safety_deposit_box(vault: &Pubkey, token_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    derive_address(
        &TOKEN_VAULT_PROGRAM_ID,
        &[VAULT_PREFIX, vault.as_ref(), token_mint.as_ref()],
    )
}

/// External price account for a vault.
pub fn external_pricing_address(
    program_id: &Pubkey,
    vault: &Pubkey,
    payer: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[EXTERNAL_PREFIX, vault.as_ref(), payer.as_ref()],
    )
}

/// The mint issuing a vault's fractional shares.
pub fn fraction_mint_address(
    program_id: &Pubkey,
    vault: &Pubkey,
    payer: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[FRACTION_PREFIX, vault.as_ref(), payer.as_ref()],
    )
}

/// Delegate authority for moving a deposited token into or out of a vault.
pub fn transfer_authority(
    program_id: &Pubkey,
    vault: &Pubkey,
    token_mint: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[TRANSFER_PREFIX, vault.as_ref(), token_mint.as_ref()],
    )
}

/// Token account holding a deposited token inside a vault.
pub fn token_store_address(
    program_id: &Pubkey,
    vault: &Pubkey,
    token_mint: &Pubkey,
) -> Result<(Pubkey, u8)> {
    derive_address(
        program_id,
        &[STORE_PREFIX, vault.as_ref(), token_mint.as_ref()],
    )
}

/// The associated token account of `wallet` for `mint`.
pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(wallet, mint)
}
