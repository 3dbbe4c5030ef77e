//! Transaction assembly.
//!
//! Pure: instruction order is preserved exactly as supplied (execution order
//! matters — accounts must be created before later instructions write to
//! them) and the signer requirement is the deduplicated union across every
//! instruction's account metas. Signing and submission live in the driver.

use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey,
    signature::Keypair, signer::Signer, transaction::Transaction,
};

use crate::error::{EngineError, Result};

pub struct TransactionBuilder {
    fee_payer: Pubkey,
    instructions: Vec<Instruction>,
}

impl TransactionBuilder {
    pub fn new(fee_payer: Pubkey) -> Self {
        Self {
            fee_payer,
            instructions: Vec::new(),
        }
    }

    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn add_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn build(self) -> PreparedTransaction {
        let mut required_signers = vec![self.fee_payer];
        for instruction in &self.instructions {
            for meta in &instruction.accounts {
                if meta.is_signer && !required_signers.contains(&meta.pubkey) {
                    required_signers.push(meta.pubkey);
                }
            }
        }
        PreparedTransaction {
            fee_payer: self.fee_payer,
            instructions: self.instructions,
            required_signers,
        }
    }
}

/// An assembled transaction awaiting signatures and a blockhash.
pub struct PreparedTransaction {
    pub fee_payer: Pubkey,
    pub instructions: Vec<Instruction>,
    /// Fee payer first, then every other signer any instruction demands.
    pub required_signers: Vec<Pubkey>,
}

impl PreparedTransaction {
    /// Sign with `keys`, verifying first that every required signer has a
    /// corresponding key.
    pub fn sign(&self, keys: &[&Keypair], recent_blockhash: Hash) -> Result<Transaction> {
        for required in &self.required_signers {
            if !keys.iter().any(|key| key.pubkey() == *required) {
                return Err(EngineError::MissingSigner { pubkey: *required });
            }
        }
        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &recent_blockhash,
        );
        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_sign(&keys.to_vec(), recent_blockhash)
            .map_err(|e| EngineError::Transaction(e.to_string()))?;
        Ok(transaction)
    }
}
