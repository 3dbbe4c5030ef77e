//! Ledger RPC capability.
//!
//! The engine consumes exactly these operations; any client that satisfies
//! them is substitutable, including the in-memory ledger the tests use.

use std::thread::sleep;
use std::time::Duration;

use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction, transaction::TransactionError,
};

use crate::error::{EngineError, Result};

/// What a transaction simulation reported back.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub err: Option<TransactionError>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

pub trait LedgerRpc {
    fn balance(&self, address: &Pubkey) -> Result<u64>;
    fn minimum_rent(&self, data_len: usize) -> Result<u64>;
    fn latest_blockhash(&self) -> Result<Hash>;
    fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature>;
    fn wait_for_confirmation(&self, signature: &Signature) -> Result<()>;
    fn simulate(&self, transaction: &Transaction) -> Result<SimulationOutcome>;
    fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature>;
    fn account(&self, address: &Pubkey) -> Result<Option<Account>>;
    fn node_version(&self) -> Result<String>;
}

impl<T: LedgerRpc + ?Sized> LedgerRpc for &T {
    fn balance(&self, address: &Pubkey) -> Result<u64> {
        (**self).balance(address)
    }

    fn minimum_rent(&self, data_len: usize) -> Result<u64> {
        (**self).minimum_rent(data_len)
    }

    fn latest_blockhash(&self) -> Result<Hash> {
        (**self).latest_blockhash()
    }

    fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        (**self).request_airdrop(address, lamports)
    }

    fn wait_for_confirmation(&self, signature: &Signature) -> Result<()> {
        (**self).wait_for_confirmation(signature)
    }

    fn simulate(&self, transaction: &Transaction) -> Result<SimulationOutcome> {
        (**self).simulate(transaction)
    }

    fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature> {
        (**self).send_and_confirm(transaction)
    }

    fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        (**self).account(address)
    }

    fn node_version(&self) -> Result<String> {
        (**self).node_version()
    }
}

const CONFIRM_POLL_ATTEMPTS: u32 = 60;
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

impl LedgerRpc for RpcClient {
    fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.get_balance(address)?)
    }

    fn minimum_rent(&self, data_len: usize) -> Result<u64> {
        Ok(self.get_minimum_balance_for_rent_exemption(data_len)?)
    }

    fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.get_latest_blockhash()?)
    }

    fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        Ok(RpcClient::request_airdrop(self, address, lamports)?)
    }

    fn wait_for_confirmation(&self, signature: &Signature) -> Result<()> {
        for _ in 0..CONFIRM_POLL_ATTEMPTS {
            if self.confirm_transaction(signature)? {
                return Ok(());
            }
            sleep(CONFIRM_POLL_INTERVAL);
        }
        Err(EngineError::Transaction(format!(
            "transaction {signature} was not confirmed in time"
        )))
    }

    fn simulate(&self, transaction: &Transaction) -> Result<SimulationOutcome> {
        let result = self.simulate_transaction(transaction)?.value;
        Ok(SimulationOutcome {
            err: result.err,
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature> {
        Ok(self.send_and_confirm_transaction(transaction)?)
    }

    fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        Ok(self
            .get_account_with_commitment(address, self.commitment())?
            .value)
    }

    fn node_version(&self) -> Result<String> {
        Ok(self.get_version()?.solana_core)
    }
}
