//! Address catalog
//!
//! The deduplicated, ordered set of addresses a batch of buy instructions
//! references. It is what gets published into a lookup table so that those
//! addresses compile down to one-byte indices.

use std::collections::HashSet;

use solana_sdk::{message::AddressLookupTableAccount, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address;

use crate::{
    accounts::{
        get_bonding_curve_pda, get_creator_vault_pda, get_global_pda,
        get_user_volume_accumulator_pda,
    },
    common::types::Participant,
    constants::{accounts, limits::LOOKUP_TABLE_MAX_ADDRESSES},
    error::ClientError,
};

/// Ordered set of addresses, first occurrence wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressCatalog {
    addresses: Vec<Pubkey>,
    seen: HashSet<Pubkey>,
}

impl AddressCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from static accounts followed by each participant's
    /// accounts, in that order
    pub fn build<I, P>(static_accounts: I, participant_accounts: P) -> Self
    where
        I: IntoIterator<Item = Pubkey>,
        P: IntoIterator<Item = Vec<Pubkey>>,
    {
        let mut catalog = Self::new();
        catalog.extend(static_accounts);
        for accounts in participant_accounts {
            catalog.extend(accounts);
        }
        catalog
    }

    /// Catalog covering every account a batch buy of `mint` touches
    ///
    /// Static program accounts and the payer's own accounts come first, then
    /// for each participant its wallet, token account and volume accumulator.
    pub fn for_batch(
        payer: &Pubkey,
        participants: &[Participant],
        mint: &Pubkey,
        creator: &Pubkey,
        fee_recipient: &Pubkey,
    ) -> Self {
        let bonding_curve = get_bonding_curve_pda(mint);
        let static_accounts = [
            accounts::ASSOCIATED_TOKEN_PROGRAM,
            accounts::TOKEN_PROGRAM,
            accounts::EVENT_AUTHORITY,
            get_global_pda(),
            accounts::PUMPFUN,
            get_associated_token_address(&bonding_curve, mint),
            bonding_curve,
            accounts::SYSTEM_PROGRAM,
            accounts::RENT,
            *payer,
            accounts::FEE_CONFIG,
            *fee_recipient,
            accounts::GLOBAL_VOLUME_ACCUMULATOR,
            get_user_volume_accumulator_pda(payer),
            get_associated_token_address(payer, mint),
            get_creator_vault_pda(creator),
            *mint,
            accounts::FEE_PROGRAM,
        ];

        let participant_accounts = participants.iter().map(|participant| {
            let owner = participant.pubkey();
            vec![
                owner,
                participant.token_account(mint),
                get_user_volume_accumulator_pda(&owner),
            ]
        });

        Self::build(static_accounts, participant_accounts)
    }

    /// Appends an address; returns false when it was already present
    pub fn push(&mut self, address: Pubkey) -> bool {
        if self.seen.insert(address) {
            self.addresses.push(address);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, address: &Pubkey) -> bool {
        self.seen.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[Pubkey] {
        &self.addresses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pubkey> {
        self.addresses.iter()
    }

    /// Fails when the catalog does not fit in `capacity` table entries
    pub fn ensure_capacity(&self, capacity: usize) -> Result<(), ClientError> {
        if self.len() > capacity {
            return Err(ClientError::CatalogTooLarge {
                len: self.len(),
                capacity,
            });
        }
        Ok(())
    }

    /// Fails when the catalog does not fit in a single lookup table
    pub fn ensure_fits_table(&self) -> Result<(), ClientError> {
        self.ensure_capacity(LOOKUP_TABLE_MAX_ADDRESSES)
    }

    /// Entries not yet stored in `table`, in catalog order
    pub fn missing_from(&self, table: &AddressLookupTableAccount) -> Vec<Pubkey> {
        let present: HashSet<&Pubkey> = table.addresses.iter().collect();
        self.addresses
            .iter()
            .filter(|address| !present.contains(address))
            .copied()
            .collect()
    }
}

impl Extend<Pubkey> for AddressCatalog {
    fn extend<T: IntoIterator<Item = Pubkey>>(&mut self, iter: T) {
        for address in iter {
            self.push(address);
        }
    }
}

impl FromIterator<Pubkey> for AddressCatalog {
    fn from_iter<T: IntoIterator<Item = Pubkey>>(iter: T) -> Self {
        let mut catalog = Self::new();
        catalog.extend(iter);
        catalog
    }
}

impl IntoIterator for AddressCatalog {
    type Item = Pubkey;
    type IntoIter = std::vec::IntoIter<Pubkey>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{signature::Keypair, signer::Signer};

    fn dedupe_preserving_order(input: &[Pubkey]) -> Vec<Pubkey> {
        let mut out = Vec::new();
        for key in input {
            if !out.contains(key) {
                out.push(*key);
            }
        }
        out
    }

    #[test]
    fn test_build_dedupes_preserving_first_occurrence() {
        let keys: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        let input = vec![
            keys[0], keys[1], keys[0], keys[2], keys[3], keys[1], keys[4], keys[5], keys[4],
        ];

        let catalog: AddressCatalog = input.iter().copied().collect();
        assert_eq!(catalog.addresses(), dedupe_preserving_order(&input).as_slice());
    }

    #[test]
    fn test_static_accounts_come_first() {
        let shared = Pubkey::new_unique();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();

        let catalog = AddressCatalog::build([shared, a], vec![vec![b, shared], vec![a, b]]);
        assert_eq!(catalog.addresses(), &[shared, a, b]);
    }

    #[test]
    fn test_for_batch_has_no_duplicates() {
        let payer = Keypair::new();
        let payer_key = payer.pubkey();
        // The payer doubles as a participant, as in a single-wallet buy
        let participants = vec![
            Participant::from(payer),
            Participant::from(Keypair::new()),
            Participant::from(Keypair::new()),
        ];
        let mint = Pubkey::new_unique();

        let catalog = AddressCatalog::for_batch(
            &payer_key,
            &participants,
            &mint,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
        );

        let unique: HashSet<_> = catalog.iter().collect();
        assert_eq!(unique.len(), catalog.len());
        // 18 static entries, then 3 per participant other than the payer
        assert_eq!(catalog.len(), 18 + 3 * 2);
        for participant in &participants {
            assert!(catalog.contains(&participant.pubkey()));
            assert!(catalog.contains(&participant.token_account(&mint)));
        }
    }

    #[test]
    fn test_ensure_capacity() {
        let catalog: AddressCatalog = (0..LOOKUP_TABLE_MAX_ADDRESSES + 1)
            .map(|_| Pubkey::new_unique())
            .collect();

        assert!(matches!(
            catalog.ensure_fits_table(),
            Err(ClientError::CatalogTooLarge { len, capacity })
                if len == LOOKUP_TABLE_MAX_ADDRESSES + 1 && capacity == LOOKUP_TABLE_MAX_ADDRESSES
        ));
        assert!(catalog.ensure_capacity(LOOKUP_TABLE_MAX_ADDRESSES + 1).is_ok());
    }

    #[test]
    fn test_missing_from_table() {
        let keys: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let catalog: AddressCatalog = keys.iter().copied().collect();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: vec![keys[2], keys[0]],
        };

        assert_eq!(catalog.missing_from(&table), vec![keys[1], keys[3]]);
    }
}
