//! Operation records for the fractionalization program.
//!
//! The wire layout is what the remote program's decoder expects: a one-byte
//! variant discriminant followed by each field in declaration order, strings
//! as a u32-LE length plus UTF-8 bytes, integers fixed-width little-endian.
//! Discriminants are frozen; a variant's field layout must never change once
//! deployed.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{EngineError, Result};

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MintNftArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Bump for the mint address; the program re-derives and signs with it.
    pub mint_bump: u8,
    pub mint_seed: String,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateVaultArgs {
    pub vault_bump: u8,
    pub vault_seed: String,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct FractionalizeArgs {
    pub number_of_shares: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SendShareArgs {
    pub number_of_shares: u64,
}

/// The closed instruction set of the fractionalization program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum TesseraInstruction {
    /// 0 — create a derived mint's metadata and issue one unit.
    MintNft(MintNftArgs),
    /// 1 — establish a vault in Inactive state.
    CreateVault(CreateVaultArgs),
    /// 2 — deposit a token into the vault's safety deposit box. The deposit
    /// amount is fixed on-chain, so the revised instruction carries no fields.
    AddTokenToVault,
    /// 3 — mint fractional shares into the vault's fraction treasury.
    Fractionalize(FractionalizeArgs),
    /// 4 — withdraw fractional shares from the treasury to a destination.
    SendShare(SendShareArgs),
}

impl TesseraInstruction {
    pub fn pack(&self) -> Result<Vec<u8>> {
        self.try_to_vec()
            .map_err(|e| EngineError::Transaction(e.to_string()))
    }

    pub fn unpack(data: &[u8]) -> Result<Self> {
        Self::try_from_slice(data).map_err(|e| EngineError::Transaction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_mint() -> TesseraInstruction {
        TesseraInstruction::MintNft(MintNftArgs {
            name: "Test".into(),
            symbol: "T".into(),
            uri: "u".into(),
            mint_bump: 254,
            mint_seed: "abcdefghijklmnop".into(),
        })
    }

    #[test]
    fn discriminants_are_frozen() {
        let cases = [
            (sample_mint(), 0u8),
            (
                TesseraInstruction::CreateVault(CreateVaultArgs {
                    vault_bump: 251,
                    vault_seed: "s".into(),
                }),
                1,
            ),
            (TesseraInstruction::AddTokenToVault, 2),
            (
                TesseraInstruction::Fractionalize(FractionalizeArgs {
                    number_of_shares: 100,
                }),
                3,
            ),
            (
                TesseraInstruction::SendShare(SendShareArgs {
                    number_of_shares: 1,
                }),
                4,
            ),
        ];
        for (record, disc) in cases {
            assert_eq!(record.pack().unwrap()[0], disc);
        }
    }

    #[test]
    fn mint_layout_is_exact() {
        let data = sample_mint().pack().unwrap();
        let mut expected = vec![0u8];
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"Test");
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(b"T");
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(b"u");
        expected.push(254);
        expected.extend_from_slice(&16u32.to_le_bytes());
        expected.extend_from_slice(b"abcdefghijklmnop");
        assert_eq!(data, expected);
    }

    #[test]
    fn add_token_is_a_bare_discriminant() {
        assert_eq!(TesseraInstruction::AddTokenToVault.pack().unwrap(), vec![2]);
    }

    #[test]
    fn share_counts_are_little_endian_u64() {
        let data = TesseraInstruction::Fractionalize(FractionalizeArgs {
            number_of_shares: 0x0102_0304_0506_0708,
        })
        .pack()
        .unwrap();
        assert_eq!(data.len(), 9);
        assert_eq!(&data[1..], &0x0102_0304_0506_0708u64.to_le_bytes());
    }

    proptest! {
        #[test]
        fn prop_mint_round_trips_and_sizes(
            name in "[a-zA-Z0-9 ]{0,40}",
            symbol in "[A-Z]{0,10}",
            uri in "[ -~]{0,60}",
            mint_bump in any::<u8>(),
            mint_seed in "[a-zA-Z0-9]{1,32}",
        ) {
            let record = TesseraInstruction::MintNft(MintNftArgs {
                name: name.clone(),
                symbol: symbol.clone(),
                uri: uri.clone(),
                mint_bump,
                mint_seed: mint_seed.clone(),
            });
            let data = record.pack().unwrap();
            prop_assert_eq!(TesseraInstruction::unpack(&data).unwrap(), record);
            let expected_len = 1
                + (4 + name.len())
                + (4 + symbol.len())
                + (4 + uri.len())
                + 1
                + (4 + mint_seed.len());
            prop_assert_eq!(data.len(), expected_len);
        }

        #[test]
        fn prop_share_records_round_trip(shares in any::<u64>()) {
            for record in [
                TesseraInstruction::Fractionalize(FractionalizeArgs { number_of_shares: shares }),
                TesseraInstruction::SendShare(SendShareArgs { number_of_shares: shares }),
            ] {
                let data = record.pack().unwrap();
                prop_assert_eq!(data.len(), 9);
                prop_assert_eq!(TesseraInstruction::unpack(&data).unwrap(), record);
            }
        }
    }
}
