//! Remote vault account state.
//!
//! Vault state lives on the ledger and is never tracked locally; this module
//! only knows how to read it. The layout is the token-vault program's fixed
//! 204-byte account.

use solana_sdk::pubkey::Pubkey;

use crate::error::{EngineError, Result};

pub const VAULT_ACCOUNT_LEN: usize = 204;

const ALLOW_SHARE_CREATION_OFFSET: usize = 161;
const TOKEN_TYPE_COUNT_OFFSET: usize = 194;
const STATE_OFFSET: usize = 195;
const PRICE_OFFSET: usize = 196;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No account exists at the vault address (or it was never initialized).
    Uninitialized,
    /// Created; accepts deposits, no shares outstanding.
    Inactive,
    /// Activated; shares can be minted and withdrawn.
    Active,
    /// Bought out; the underlying assets have been reclaimed.
    Combined,
}

#[derive(Debug, Clone)]
pub struct VaultAccount {
    pub token_program: Pubkey,
    pub fraction_mint: Pubkey,
    pub authority: Pubkey,
    pub fraction_treasury: Pubkey,
    pub redeem_treasury: Pubkey,
    pub allow_further_share_creation: bool,
    pub pricing_lookup_address: Pubkey,
    pub token_type_count: u8,
    pub state: VaultState,
    pub locked_price_per_share: u64,
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(bytes)
}

impl VaultAccount {
    pub fn unpack(address: &Pubkey, data: &[u8]) -> Result<Self> {
        if data.len() < VAULT_ACCOUNT_LEN {
            return Err(EngineError::InvalidAccountData { address: *address });
        }
        let state = if data[0] == 0 {
            VaultState::Uninitialized
        } else {
            match data[STATE_OFFSET] {
                0 => VaultState::Inactive,
                1 => VaultState::Active,
                2 => VaultState::Combined,
                _ => return Err(EngineError::InvalidAccountData { address: *address }),
            }
        };
        let mut price = [0u8; 8];
        price.copy_from_slice(&data[PRICE_OFFSET..PRICE_OFFSET + 8]);
        Ok(Self {
            token_program: read_pubkey(data, 1),
            fraction_mint: read_pubkey(data, 33),
            authority: read_pubkey(data, 65),
            fraction_treasury: read_pubkey(data, 97),
            redeem_treasury: read_pubkey(data, 129),
            allow_further_share_creation: data[ALLOW_SHARE_CREATION_OFFSET] != 0,
            pricing_lookup_address: read_pubkey(data, 162),
            token_type_count: data[TOKEN_TYPE_COUNT_OFFSET],
            state,
            locked_price_per_share: u64::from_le_bytes(price),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn vault_bytes(
        fraction_mint: &Pubkey,
        authority: &Pubkey,
        fraction_treasury: &Pubkey,
        redeem_treasury: &Pubkey,
        state: u8,
    ) -> Vec<u8> {
        let mut data = vec![0u8; VAULT_ACCOUNT_LEN];
        data[0] = 3; // account type tag written by the vault program
        data[33..65].copy_from_slice(fraction_mint.as_ref());
        data[65..97].copy_from_slice(authority.as_ref());
        data[97..129].copy_from_slice(fraction_treasury.as_ref());
        data[129..161].copy_from_slice(redeem_treasury.as_ref());
        data[ALLOW_SHARE_CREATION_OFFSET] = 1;
        data[TOKEN_TYPE_COUNT_OFFSET] = 1;
        data[STATE_OFFSET] = state;
        data[PRICE_OFFSET..PRICE_OFFSET + 8].copy_from_slice(&42u64.to_le_bytes());
        data
    }

    #[test]
    fn unpacks_an_active_vault() {
        let address = Pubkey::new_unique();
        let fraction_mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let fraction_treasury = Pubkey::new_unique();
        let redeem_treasury = Pubkey::new_unique();
        let data = vault_bytes(
            &fraction_mint,
            &authority,
            &fraction_treasury,
            &redeem_treasury,
            1,
        );
        let vault = VaultAccount::unpack(&address, &data).unwrap();
        assert_eq!(vault.state, VaultState::Active);
        assert_eq!(vault.fraction_mint, fraction_mint);
        assert_eq!(vault.authority, authority);
        assert_eq!(vault.fraction_treasury, fraction_treasury);
        assert_eq!(vault.redeem_treasury, redeem_treasury);
        assert!(vault.allow_further_share_creation);
        assert_eq!(vault.token_type_count, 1);
        assert_eq!(vault.locked_price_per_share, 42);
    }

    #[test]
    fn state_byte_maps_to_the_lifecycle() {
        let address = Pubkey::new_unique();
        let a = Pubkey::new_unique();
        for (byte, state) in [
            (0, VaultState::Inactive),
            (1, VaultState::Active),
            (2, VaultState::Combined),
        ] {
            let data = vault_bytes(&a, &a, &a, &a, byte);
            assert_eq!(VaultAccount::unpack(&address, &data).unwrap().state, state);
        }
    }

    #[test]
    fn zero_key_reads_as_uninitialized() {
        let address = Pubkey::new_unique();
        let a = Pubkey::new_unique();
        let mut data = vault_bytes(&a, &a, &a, &a, 1);
        data[0] = 0;
        let vault = VaultAccount::unpack(&address, &data).unwrap();
        assert_eq!(vault.state, VaultState::Uninitialized);
    }

    #[test]
    fn short_or_garbled_data_is_rejected() {
        let address = Pubkey::new_unique();
        let a = Pubkey::new_unique();
        assert!(matches!(
            VaultAccount::unpack(&address, &[0u8; 16]),
            Err(EngineError::InvalidAccountData { .. })
        ));
        let mut data = vault_bytes(&a, &a, &a, &a, 9);
        data[0] = 3;
        assert!(matches!(
            VaultAccount::unpack(&address, &data),
            Err(EngineError::InvalidAccountData { .. })
        ));
    }
}
