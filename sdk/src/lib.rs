//! Client engine for the Tessera fractionalization program.
//!
//! Derives the program's deterministic account addresses, encodes its
//! instruction set, assembles and signs transactions, and sequences the vault
//! lifecycle (mint → vault → deposit → fractionalize → send shares). All
//! ledger access goes through the [`rpc::LedgerRpc`] capability so the engine
//! can be driven against any conforming client.

pub mod error;
pub mod instruction;
pub mod lifecycle;
pub mod pda;
pub mod rpc;
pub mod submit;
pub mod vault;

pub mod transaction {
    pub mod builder;
    pub mod instructions;

    pub use builder::{PreparedTransaction, TransactionBuilder};
}

pub use error::{EngineError, Result};
pub use lifecycle::{DepositReceipt, MintReceipt, VaultClient, VaultReceipt};
pub use submit::CancelFlag;
pub use vault::{VaultAccount, VaultState};

use solana_sdk::pubkey::Pubkey;

/// The token-metadata program that owns NFT metadata accounts.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// The token-vault program that owns vaults and safety deposit boxes.
pub const TOKEN_VAULT_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("vau1zxA2LbssAUEF7Gpw91zMM1LvXrvpzJtmZ58rPsn");
