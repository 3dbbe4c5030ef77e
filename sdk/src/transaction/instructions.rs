//! Per-operation instruction constructors.
//!
//! Account order, signer flags, and writable flags are part of what the
//! receiving programs decode; the tables here must never be reordered.

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::{system_instruction, system_program, sysvar};

use crate::error::{EngineError, Result};
use crate::instruction::{
    CreateVaultArgs, FractionalizeArgs, MintNftArgs, SendShareArgs, TesseraInstruction,
};
use crate::{TOKEN_METADATA_PROGRAM_ID, TOKEN_VAULT_PROGRAM_ID};

/// Discriminant of ActivateVault in the token-vault program's own enum.
const ACTIVATE_VAULT_DISCRIMINANT: u8 = 2;

/// Fund a program-derived account. The derived account is not a client-side
/// signer; its signature is supplied on-chain via seeds.
pub fn create_derived_account(
    payer: &Pubkey,
    new_account: &Pubkey,
    lamports: u64,
    space: u64,
    owner: &Pubkey,
) -> Instruction {
    let mut instruction = system_instruction::create_account(payer, new_account, lamports, space, owner);
    for meta in &mut instruction.accounts {
        if meta.pubkey == *new_account {
            meta.is_signer = false;
        }
    }
    instruction
}

/// Initialize a mint with zero decimals, `authority` as both mint and freeze
/// authority.
pub fn initialize_mint(mint: &Pubkey, authority: &Pubkey) -> Result<Instruction> {
    spl_token::instruction::initialize_mint(&spl_token::id(), mint, authority, Some(authority), 0)
        .map_err(|e| EngineError::Transaction(e.to_string()))
}

pub fn create_associated_token_account(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        payer,
        wallet,
        mint,
        &spl_token::id(),
    )
}

/// MintNft — the program creates the metadata for the derived mint and issues
/// one unit to the destination's token account.
pub fn mint_nft(
    program_id: &Pubkey,
    payer: &Pubkey,
    destination: &Pubkey,
    creator: &Pubkey,
    mint: &Pubkey,
    metadata: &Pubkey,
    token_account: &Pubkey,
    args: MintNftArgs,
) -> Result<Instruction> {
    let data = TesseraInstruction::MintNft(args).pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*destination, false),
            AccountMeta::new_readonly(*creator, false),
            AccountMeta::new(*mint, false),
            AccountMeta::new(*metadata, false),
            AccountMeta::new(*token_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data,
    })
}

/// CreateVault — establishes the vault and its pricing, fraction-mint, and
/// treasury accounts, leaving the vault Inactive.
pub fn create_vault(
    program_id: &Pubkey,
    payer: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    external_pricing: &Pubkey,
    fraction_mint: &Pubkey,
    redeem_treasury: &Pubkey,
    fraction_treasury: &Pubkey,
    args: CreateVaultArgs,
) -> Result<Instruction> {
    let data = TesseraInstruction::CreateVault(args).pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(*vault_authority, false),
            AccountMeta::new(*external_pricing, false),
            AccountMeta::new(*fraction_mint, false),
            AccountMeta::new(*redeem_treasury, false),
            AccountMeta::new(*fraction_treasury, false),
            AccountMeta::new_readonly(TOKEN_VAULT_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(spl_token::native_mint::id(), false),
        ],
        data,
    })
}

/// AddTokenToVault — moves one unit of the token into the vault's safety
/// deposit box via a program-owned store account.
pub fn add_token_to_vault(
    program_id: &Pubkey,
    token: &Pubkey,
    payer: &Pubkey,
    token_account: &Pubkey,
    transfer_authority: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    token_store: &Pubkey,
    safety_deposit_box: &Pubkey,
) -> Result<Instruction> {
    let data = TesseraInstruction::AddTokenToVault.pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*token, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new(*token_account, false),
            AccountMeta::new_readonly(*transfer_authority, false),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(*vault_authority, false),
            AccountMeta::new(*token_store, false),
            AccountMeta::new(*safety_deposit_box, false),
            AccountMeta::new_readonly(TOKEN_VAULT_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        ],
        data,
    })
}

/// Fractionalize — mints shares into the vault's fraction treasury.
pub fn fractionalize(
    program_id: &Pubkey,
    payer: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    fraction_mint: &Pubkey,
    fraction_treasury: &Pubkey,
    args: FractionalizeArgs,
) -> Result<Instruction> {
    let data = TesseraInstruction::Fractionalize(args).pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*vault, false),
            AccountMeta::new_readonly(*vault_authority, false),
            AccountMeta::new(*fraction_mint, false),
            AccountMeta::new(*fraction_treasury, false),
            AccountMeta::new_readonly(TOKEN_VAULT_PROGRAM_ID, false),
        ],
        data,
    })
}

/// SendShare — withdraws fractional shares from the treasury to the
/// destination's associated fraction-token account.
pub fn send_share(
    program_id: &Pubkey,
    token: &Pubkey,
    payer: &Pubkey,
    destination: &Pubkey,
    destination_token_account: &Pubkey,
    transfer_authority: &Pubkey,
    vault: &Pubkey,
    vault_authority: &Pubkey,
    fraction_mint: &Pubkey,
    fraction_treasury: &Pubkey,
    args: SendShareArgs,
) -> Result<Instruction> {
    let data = TesseraInstruction::SendShare(args).pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*token, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*destination, false),
            AccountMeta::new(*destination_token_account, false),
            AccountMeta::new_readonly(*transfer_authority, false),
            AccountMeta::new_readonly(*vault, false),
            AccountMeta::new_readonly(*vault_authority, false),
            AccountMeta::new_readonly(*fraction_mint, false),
            AccountMeta::new(*fraction_treasury, false),
            AccountMeta::new_readonly(TOKEN_VAULT_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data,
    })
}

/// ActivateVault on the token-vault program. The only foreign payload this
/// engine encodes by hand: discriminant byte plus the share count.
pub fn activate_vault(
    vault: &Pubkey,
    fraction_mint: &Pubkey,
    fraction_treasury: &Pubkey,
    fraction_mint_authority: &Pubkey,
    vault_authority: &Pubkey,
    number_of_shares: u64,
) -> Instruction {
    let mut data = vec![ACTIVATE_VAULT_DISCRIMINANT];
    data.extend_from_slice(&number_of_shares.to_le_bytes());
    Instruction {
        program_id: TOKEN_VAULT_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*vault, false),
            AccountMeta::new(*fraction_mint, false),
            AccountMeta::new(*fraction_treasury, false),
            AccountMeta::new_readonly(*fraction_mint_authority, false),
            AccountMeta::new_readonly(*vault_authority, true),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    fn flags(instruction: &Instruction) -> Vec<(Pubkey, bool, bool)> {
        instruction
            .accounts
            .iter()
            .map(|m| (m.pubkey, m.is_signer, m.is_writable))
            .collect()
    }

    #[test]
    fn derived_account_creation_keeps_payer_as_sole_signer() {
        let payer = pk(1);
        let mint = pk(2);
        let instruction = create_derived_account(&payer, &mint, 1_461_600, 82, &spl_token::id());
        assert_eq!(instruction.program_id, system_program::id());
        assert_eq!(
            flags(&instruction),
            vec![(payer, true, true), (mint, false, true)]
        );
    }

    #[test]
    fn mint_nft_table_is_fixed() {
        let instruction = mint_nft(
            &pk(9),
            &pk(1),
            &pk(2),
            &pk(1),
            &pk(3),
            &pk(4),
            &pk(5),
            MintNftArgs {
                name: "n".into(),
                symbol: "s".into(),
                uri: "u".into(),
                mint_bump: 255,
                mint_seed: "seed".into(),
            },
        )
        .unwrap();
        assert_eq!(instruction.program_id, pk(9));
        assert_eq!(
            flags(&instruction),
            vec![
                (pk(1), true, true),
                (pk(2), false, false),
                (pk(1), false, false),
                (pk(3), false, true),
                (pk(4), false, true),
                (pk(5), false, true),
                (spl_token::id(), false, false),
                (TOKEN_METADATA_PROGRAM_ID, false, false),
                (system_program::id(), false, false),
                (sysvar::rent::id(), false, false),
            ]
        );
        assert_eq!(instruction.data[0], 0);
    }

    #[test]
    fn create_vault_table_is_fixed() {
        let instruction = create_vault(
            &pk(9),
            &pk(1),
            &pk(2),
            &pk(3),
            &pk(4),
            &pk(5),
            &pk(6),
            &pk(7),
            CreateVaultArgs {
                vault_bump: 254,
                vault_seed: "seed".into(),
            },
        )
        .unwrap();
        assert_eq!(instruction.accounts.len(), 13);
        assert_eq!(instruction.data[0], 1);
        let signers: Vec<_> = instruction
            .accounts
            .iter()
            .filter(|m| m.is_signer)
            .map(|m| m.pubkey)
            .collect();
        assert_eq!(signers, vec![pk(1)]);
        assert_eq!(instruction.accounts[12].pubkey, spl_token::native_mint::id());
    }

    #[test]
    fn add_token_payload_is_the_bare_discriminant() {
        let instruction = add_token_to_vault(
            &pk(9),
            &pk(1),
            &pk(2),
            &pk(3),
            &pk(4),
            &pk(5),
            &pk(6),
            &pk(7),
            &pk(8),
        )
        .unwrap();
        assert_eq!(instruction.data, vec![2]);
        assert_eq!(instruction.accounts.len(), 13);
        assert_eq!(instruction.accounts[0].pubkey, pk(1));
        assert!(instruction.accounts[1].is_signer);
    }

    #[test]
    fn activate_vault_encodes_discriminant_and_share_count() {
        let instruction = activate_vault(&pk(1), &pk(2), &pk(3), &pk(4), &pk(5), 100);
        assert_eq!(instruction.program_id, TOKEN_VAULT_PROGRAM_ID);
        let mut expected = vec![2u8];
        expected.extend_from_slice(&100u64.to_le_bytes());
        assert_eq!(instruction.data, expected);
        assert_eq!(
            flags(&instruction),
            vec![
                (pk(1), false, true),
                (pk(2), false, true),
                (pk(3), false, true),
                (pk(4), false, false),
                (pk(5), true, false),
            ]
        );
    }

    #[test]
    fn send_share_table_is_fixed() {
        let instruction = send_share(
            &pk(9),
            &pk(1),
            &pk(2),
            &pk(3),
            &pk(4),
            &pk(5),
            &pk(6),
            &pk(7),
            &pk(8),
            &pk(10),
            SendShareArgs { number_of_shares: 1 },
        )
        .unwrap();
        assert_eq!(instruction.accounts.len(), 13);
        assert_eq!(instruction.data[0], 4);
        assert!(instruction.accounts[1].is_signer);
        assert!(instruction.accounts[3].is_writable);
        assert!(instruction.accounts[9].is_writable);
    }
}
