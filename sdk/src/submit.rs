//! Transaction submission: preconditions, funding, direct send, and the
//! bounded simulate-then-retry loop for collision-prone derivations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use solana_sdk::instruction::InstructionError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::system_instruction::SystemError;
use solana_sdk::transaction::TransactionError;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::rpc::{LedgerRpc, SimulationOutcome};
use crate::transaction::builder::PreparedTransaction;

/// Cooperative cancellation shared between the operator's interrupt handler
/// and the retry loop. Cancellation takes effect before the next attempt, so
/// nothing half-built is ever submitted.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One-time precondition: the program must exist and be executable.
pub fn check_program(rpc: &dyn LedgerRpc, program_id: &Pubkey) -> Result<()> {
    match rpc.account(program_id)? {
        None => Err(EngineError::ProgramNotDeployed {
            program_id: *program_id,
        }),
        Some(account) if !account.executable => Err(EngineError::ProgramNotExecutable {
            program_id: *program_id,
        }),
        Some(_) => Ok(()),
    }
}

/// Top up the payer by airdrop until it can cover `required` lamports.
pub fn ensure_funded(rpc: &dyn LedgerRpc, payer: &Pubkey, required: u64) -> Result<u64> {
    let balance = rpc.balance(payer)?;
    if balance >= required {
        return Ok(balance);
    }
    info!(
        %payer,
        balance,
        required,
        "payer below fee estimate, requesting airdrop"
    );
    let signature = rpc.request_airdrop(payer, required - balance)?;
    rpc.wait_for_confirmation(&signature)?;
    let balance = rpc.balance(payer)?;
    if balance < required {
        return Err(EngineError::InsufficientFunds {
            needed: required,
            available: balance,
        });
    }
    Ok(balance)
}

/// Sign and send, blocking until the ledger confirms inclusion.
pub fn submit(
    rpc: &dyn LedgerRpc,
    prepared: &PreparedTransaction,
    keys: &[&Keypair],
) -> Result<Signature> {
    let blockhash = rpc.latest_blockhash()?;
    let transaction = prepared.sign(keys, blockhash)?;
    let signature = rpc.send_and_confirm(&transaction)?;
    debug!(%signature, "transaction confirmed");
    Ok(signature)
}

/// Simulate-then-retry for operations staking a freshly random-seeded
/// address. `build` is invoked once per attempt and must re-derive from a new
/// seed; it returns the prepared transaction, the address the attempt stakes
/// on, and a caller payload describing the attempt. The first attempt whose
/// simulation is clean is submitted for real.
///
/// Returns the signature, the successful attempt's payload, and how many
/// attempts were consumed.
pub fn submit_with_rederive<T, F>(
    rpc: &dyn LedgerRpc,
    cancel: &CancelFlag,
    operation: &'static str,
    max_attempts: u32,
    keys: &[&Keypair],
    mut build: F,
) -> Result<(Signature, T, u32)>
where
    F: FnMut(u32) -> Result<(PreparedTransaction, Pubkey, T)>,
{
    for attempt in 1..=max_attempts {
        if cancel.is_set() {
            return Err(EngineError::Interrupted);
        }
        let (prepared, subject, value) = build(attempt)?;
        let blockhash = rpc.latest_blockhash()?;
        let transaction = prepared.sign(keys, blockhash)?;
        let outcome = rpc.simulate(&transaction)?;
        match classify(operation, &subject, outcome) {
            Ok(()) => {
                let signature = rpc.send_and_confirm(&transaction)?;
                debug!(%signature, attempt, "transaction confirmed");
                return Ok((signature, value, attempt));
            }
            Err(EngineError::SimulationCollision { address }) => {
                warn!(%address, attempt, "derived address already taken, re-deriving");
            }
            Err(other) => return Err(other),
        }
    }
    Err(EngineError::DerivationRetriesExhausted {
        attempts: max_attempts,
    })
}

fn classify(
    operation: &'static str,
    subject: &Pubkey,
    outcome: SimulationOutcome,
) -> Result<()> {
    let Some(err) = outcome.err else {
        return Ok(());
    };
    if is_collision(&err, &outcome.logs) {
        return Err(EngineError::SimulationCollision { address: *subject });
    }
    let mut message = err.to_string();
    if !outcome.logs.is_empty() {
        message = format!("{message}; logs: {}", outcome.logs.join(" | "));
    }
    Err(EngineError::RemoteRejection { operation, message })
}

fn is_collision(err: &TransactionError, logs: &[String]) -> bool {
    if logs.iter().any(|line| line.contains("already in use")) {
        return true;
    }
    matches!(
        err,
        TransactionError::InstructionError(_, InstructionError::Custom(code))
            if *code == SystemError::AccountAlreadyInUse as u32
    )
}
