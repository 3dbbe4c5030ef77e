//! Engine error types

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No bump in [0, 255] produced a valid off-curve address for the seed
    /// set. Indicates malformed seeds rather than bad luck.
    #[error("no valid bump found for the given seed set")]
    DerivationExhausted,

    /// Every re-derivation attempt collided with an existing account.
    #[error("gave up after {attempts} derivation attempts, all colliding")]
    DerivationRetriesExhausted { attempts: u32 },

    /// Simulation reported that a freshly derived address is already taken.
    /// Consumed by the retry loop; callers only see it if retries are off.
    #[error("derived address {address} is already in use")]
    SimulationCollision { address: Pubkey },

    /// An instruction requires this signer but no key for it was supplied.
    #[error("no signing key supplied for required signer {pubkey}")]
    MissingSigner { pubkey: Pubkey },

    #[error("payer balance {available} lamports is below the required {needed}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("program {program_id} is not deployed")]
    ProgramNotDeployed { program_id: Pubkey },

    #[error("program {program_id} exists but is not executable")]
    ProgramNotExecutable { program_id: Pubkey },

    /// The remote program decoded the instruction and rejected it for domain
    /// reasons. Never retried here.
    #[error("{operation} rejected by the ledger: {message}")]
    RemoteRejection {
        operation: &'static str,
        message: String,
    },

    #[error("account {address} holds data this engine cannot interpret")]
    InvalidAccountData { address: Pubkey },

    #[error("interrupted by the operator")]
    Interrupted,

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("rpc error: {0}")]
    Rpc(Box<solana_client::client_error::ClientError>),
}

impl From<solana_client::client_error::ClientError> for EngineError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
