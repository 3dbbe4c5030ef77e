//! Vault lifecycle orchestration.
//!
//! [`VaultClient`] owns the connection handle, the fee payer, and the program
//! id for the duration of a command; every operation is a terminal step and
//! nothing already persisted on the ledger is rolled back on failure. All
//! submission is sequential.

use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use spl_token::state::Mint;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::instruction::{CreateVaultArgs, FractionalizeArgs, MintNftArgs, SendShareArgs};
use crate::pda;
use crate::rpc::LedgerRpc;
use crate::submit::{self, CancelFlag};
use crate::transaction::builder::TransactionBuilder;
use crate::transaction::instructions;
use crate::vault::{VaultAccount, VaultState};

/// Lamports assumed per signature when estimating fees, padded well above the
/// cluster default so a whole session of commands fits one top-up.
const SIGNATURE_FEE_LAMPORTS: u64 = 5_000;
const FEE_PAD_SIGNATURES: u64 = 100;

pub struct MintReceipt {
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub token_account: Pubkey,
    pub signature: Signature,
    /// Attempts consumed by the collision-retry loop (1 = no collision).
    pub attempts: u32,
}

pub struct VaultReceipt {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub external_pricing: Pubkey,
    pub fraction_mint: Pubkey,
    pub redeem_treasury: Pubkey,
    pub fraction_treasury: Pubkey,
    pub signature: Signature,
}

pub struct DepositReceipt {
    pub safety_deposit_box: Pubkey,
    pub token_store: Pubkey,
    pub signature: Signature,
}

pub struct VaultClient<R: LedgerRpc> {
    rpc: R,
    payer: Keypair,
    program_id: Pubkey,
    max_mint_attempts: u32,
    cancel: CancelFlag,
}

impl<R: LedgerRpc> std::fmt::Debug for VaultClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("payer", &self.payer.pubkey())
            .field("program_id", &self.program_id)
            .field("max_mint_attempts", &self.max_mint_attempts)
            .finish()
    }
}

impl<R: LedgerRpc> VaultClient<R> {
    /// Connect, then verify once that the fractionalization program is
    /// deployed and executable. No operation runs without this check.
    pub fn connect(
        rpc: R,
        payer: Keypair,
        program_id: Pubkey,
        max_mint_attempts: u32,
        cancel: CancelFlag,
    ) -> Result<Self> {
        let version = rpc.node_version()?;
        info!(%version, %program_id, "connected to cluster");
        submit::check_program(&rpc, &program_id)?;
        Ok(Self {
            rpc,
            payer,
            program_id,
            max_mint_attempts,
            cancel,
        })
    }

    pub fn payer_pubkey(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Make sure the payer can cover rent for a mint plus a session's worth
    /// of signatures, requesting an airdrop when it cannot.
    fn establish_payer(&self) -> Result<()> {
        let required = self.rpc.minimum_rent(Mint::LEN)?
            + FEE_PAD_SIGNATURES * SIGNATURE_FEE_LAMPORTS;
        let balance = submit::ensure_funded(&self.rpc, &self.payer.pubkey(), required)?;
        debug!(payer = %self.payer.pubkey(), balance, "payer established");
        Ok(())
    }

    /// Mint an NFT to `destination`: create the derived mint, its metadata,
    /// and the destination's token account, and issue one unit — one
    /// transaction, retried with a fresh seed when the derived mint address
    /// turns out to be taken.
    pub fn mint_nft(
        &self,
        name: &str,
        symbol: &str,
        uri: &str,
        destination: &Pubkey,
    ) -> Result<MintReceipt> {
        self.establish_payer()?;
        let payer = self.payer.pubkey();
        let mint_rent = self.rpc.minimum_rent(Mint::LEN)?;

        let (signature, (mint, metadata, token_account), attempts) = submit::submit_with_rederive(
            &self.rpc,
            &self.cancel,
            "mint",
            self.max_mint_attempts,
            &[&self.payer],
            |attempt| {
                let seed = pda::random_seed();
                let (mint, mint_bump) =
                    pda::mint_address(&self.program_id, &seed, &payer, destination)?;
                let (metadata, _) = pda::metadata_address(&mint)?;
                let token_account = pda::associated_token_address(destination, &mint);
                debug!(%mint, attempt, "derived candidate mint");
                let args = MintNftArgs {
                    name: name.to_owned(),
                    symbol: symbol.to_owned(),
                    uri: uri.to_owned(),
                    mint_bump,
                    mint_seed: seed,
                };
                let prepared = TransactionBuilder::new(payer)
                    .add_instruction(instructions::create_derived_account(
                        &payer,
                        &mint,
                        mint_rent,
                        Mint::LEN as u64,
                        &spl_token::id(),
                    ))
                    .add_instruction(instructions::initialize_mint(&mint, &payer)?)
                    .add_instruction(instructions::create_associated_token_account(
                        &payer,
                        destination,
                        &mint,
                    ))
                    .add_instruction(instructions::mint_nft(
                        &self.program_id,
                        &payer,
                        destination,
                        &payer,
                        &mint,
                        &metadata,
                        &token_account,
                        args,
                    )?)
                    .build();
                Ok((prepared, mint, (mint, metadata, token_account)))
            },
        )?;

        info!(%mint, %signature, attempts, "minted");
        Ok(MintReceipt {
            mint,
            metadata,
            token_account,
            signature,
            attempts,
        })
    }

    /// Establish a new vault in Inactive state. The vault identity is random
    /// but submission is direct; only minting uses the simulate-retry path.
    pub fn create_vault(&self) -> Result<VaultReceipt> {
        self.establish_payer()?;
        let payer = self.payer.pubkey();
        let seed = pda::random_seed();
        let (vault, vault_bump) = pda::vault_address(&self.program_id, &payer, &seed)?;
        let (vault_authority, _) = pda::vault_authority(&vault)?;
        let (external_pricing, _) =
            pda::external_pricing_address(&self.program_id, &vault, &payer)?;
        let (fraction_mint, _) = pda::fraction_mint_address(&self.program_id, &vault, &payer)?;
        let redeem_treasury =
            pda::associated_token_address(&vault_authority, &spl_token::native_mint::id());
        let fraction_treasury = pda::associated_token_address(&vault_authority, &fraction_mint);

        let prepared = TransactionBuilder::new(payer)
            .add_instruction(instructions::create_vault(
                &self.program_id,
                &payer,
                &vault,
                &vault_authority,
                &external_pricing,
                &fraction_mint,
                &redeem_treasury,
                &fraction_treasury,
                CreateVaultArgs {
                    vault_bump,
                    vault_seed: seed,
                },
            )?)
            .build();
        let signature = submit::submit(&self.rpc, &prepared, &[&self.payer])?;

        info!(%vault, %signature, "vault created");
        Ok(VaultReceipt {
            vault,
            vault_authority,
            external_pricing,
            fraction_mint,
            redeem_treasury,
            fraction_treasury,
            signature,
        })
    }

    /// Deposit `token` into the vault's safety deposit box.
    pub fn add_token(&self, vault: &Pubkey, token: &Pubkey) -> Result<DepositReceipt> {
        self.establish_payer()?;
        let payer = self.payer.pubkey();
        let token_account = pda::associated_token_address(&payer, token);
        let (vault_authority, _) = pda::vault_authority(vault)?;
        let (transfer_authority, _) = pda::transfer_authority(&self.program_id, vault, token)?;
        let (token_store, _) = pda::token_store_address(&self.program_id, vault, token)?;
        let (safety_deposit_box, _) = pda::safety_deposit_box(vault, token)?;

        let prepared = TransactionBuilder::new(payer)
            .add_instruction(instructions::add_token_to_vault(
                &self.program_id,
                token,
                &payer,
                &token_account,
                &transfer_authority,
                vault,
                &vault_authority,
                &token_store,
                &safety_deposit_box,
            )?)
            .build();
        let signature = submit::submit(&self.rpc, &prepared, &[&self.payer])?;

        info!(%vault, %token, %signature, "token deposited");
        Ok(DepositReceipt {
            safety_deposit_box,
            token_store,
            signature,
        })
    }

    /// Mint `number_of_shares` fractional shares. An Inactive vault is
    /// activated first, within the same transaction; an Active vault only
    /// mints. Anything else cannot accept shares.
    pub fn fractionalize(&self, vault: &Pubkey, number_of_shares: u64) -> Result<Signature> {
        self.establish_payer()?;
        let payer = self.payer.pubkey();
        let (state, account) = self.vault_info(vault)?;
        let account = match state {
            VaultState::Inactive | VaultState::Active => {
                account.ok_or(EngineError::InvalidAccountData { address: *vault })?
            }
            VaultState::Uninitialized | VaultState::Combined => {
                return Err(EngineError::RemoteRejection {
                    operation: "fractionalize",
                    message: format!("vault {vault} cannot mint shares in state {state:?}"),
                })
            }
        };
        let (vault_authority, _) = pda::vault_authority(vault)?;

        let mut builder = TransactionBuilder::new(payer);
        if state == VaultState::Inactive {
            debug!(%vault, "vault inactive, activating first");
            builder = builder.add_instruction(instructions::activate_vault(
                vault,
                &account.fraction_mint,
                &account.fraction_treasury,
                &vault_authority,
                &payer,
                number_of_shares,
            ));
        }
        let prepared = builder
            .add_instruction(instructions::fractionalize(
                &self.program_id,
                &payer,
                vault,
                &vault_authority,
                &account.fraction_mint,
                &account.fraction_treasury,
                FractionalizeArgs { number_of_shares },
            )?)
            .build();
        let signature = submit::submit(&self.rpc, &prepared, &[&self.payer])?;

        info!(%vault, number_of_shares, %signature, "shares minted");
        Ok(signature)
    }

    /// Transfer `amount` fractional shares from the vault's treasury to
    /// `destination`. `token` is the deposited token mint; it seeds the
    /// vault's transfer authority.
    pub fn send_share(
        &self,
        vault: &Pubkey,
        token: &Pubkey,
        destination: &Pubkey,
        amount: u64,
    ) -> Result<Signature> {
        self.establish_payer()?;
        let payer = self.payer.pubkey();
        let (_, account) = self.vault_info(vault)?;
        let account = account.ok_or(EngineError::InvalidAccountData { address: *vault })?;
        let destination_token_account =
            pda::associated_token_address(destination, &account.fraction_mint);
        let (transfer_authority, _) = pda::transfer_authority(&self.program_id, vault, token)?;
        let (vault_authority, _) = pda::vault_authority(vault)?;

        let prepared = TransactionBuilder::new(payer)
            .add_instruction(instructions::send_share(
                &self.program_id,
                token,
                &payer,
                destination,
                &destination_token_account,
                &transfer_authority,
                vault,
                &vault_authority,
                &account.fraction_mint,
                &account.fraction_treasury,
                SendShareArgs {
                    number_of_shares: amount,
                },
            )?)
            .build();
        let signature = submit::submit(&self.rpc, &prepared, &[&self.payer])?;

        info!(%vault, %destination, amount, %signature, "shares sent");
        Ok(signature)
    }

    /// Read the vault's current state from the ledger.
    pub fn vault_info(&self, vault: &Pubkey) -> Result<(VaultState, Option<VaultAccount>)> {
        match self.rpc.account(vault)? {
            None => Ok((VaultState::Uninitialized, None)),
            Some(raw) => {
                let account = VaultAccount::unpack(vault, &raw.data)?;
                Ok((account.state, Some(account)))
            }
        }
    }
}
