//! CashToken category accounting.
//!
//! A transaction's token outputs are valid when, for every category, the
//! fungible amounts and NFT derivations are covered by its inputs, or by a
//! genesis ("minting") input whose outpoint is output 0 of the transaction
//! the category id names.

use std::collections::BTreeSet;

use crate::transparent::token::{Capability, Nft, MAX_FUNGIBLE_AMOUNT};

use super::{error::TransactionError, Hash, Transaction};

impl Transaction {
    /// Checks every token category this transaction's outputs touch.
    /// Violations are consensus failures and surface as errors.
    pub fn validate_tokens(&self) -> Result<(), TransactionError> {
        let categories: BTreeSet<Hash> = self
            .outputs
            .iter()
            .filter_map(|output| output.token.as_ref().map(|token| token.category))
            .collect();
        for category in categories {
            self.validate_token_category(category)?;
        }
        Ok(())
    }

    fn validate_token_category(&self, category: Hash) -> Result<(), TransactionError> {
        let input_fungible: u128 = self
            .inputs
            .iter()
            .filter_map(|input| input.output.as_ref().and_then(|output| output.token.as_ref()))
            .filter(|token| token.category == category)
            .map(|token| token.amount as u128)
            .sum();

        // Parent NFTs available to derive outputs from. Parents are
        // identified by their input position, which is unique per
        // (txid, vout) since no two inputs may share an outpoint.
        let mut parents: Vec<(usize, &Nft)> = self
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(index, input)| {
                let token = input.output.as_ref()?.token.as_ref()?;
                if token.category == category {
                    token.nft.as_ref().map(|nft| (index, nft))
                } else {
                    None
                }
            })
            .collect();

        let genesis_input = self
            .inputs
            .iter()
            .find(|input| input.outpoint.hash == category);

        let mut minted: u128 = 0;
        let mut sent: u128 = 0;
        for (index, output) in self.outputs.iter().enumerate() {
            let token = match &output.token {
                Some(token) if token.category == category => token,
                _ => continue,
            };
            if let Some(genesis) = genesis_input {
                // A category id is the txid of its genesis transaction, and
                // minting must spend that transaction's first output.
                if genesis.outpoint.index != 0 {
                    return Err(TransactionError::TokenGenesisInputIndex(category));
                }
                minted += token.amount as u128;
            } else {
                sent += token.amount as u128;
                if let Some(nft) = &token.nft {
                    let parent_position = parents.iter().position(|(_, parent)| {
                        match nft.capability {
                            // An immutable child needs an exact commitment
                            // match or a parent able to rewrite one.
                            Capability::None => {
                                parent.commitment == nft.commitment
                                    || parent.capability != Capability::None
                            }
                            _ => parent.capability != Capability::None,
                        }
                    });
                    match parent_position {
                        None => {
                            return Err(TransactionError::TokenParentMissing { category, index })
                        }
                        Some(position) => {
                            if parents[position].1.capability != Capability::Minting {
                                parents.remove(position);
                            }
                        }
                    }
                }
            }
        }

        if minted > MAX_FUNGIBLE_AMOUNT as u128 {
            return Err(TransactionError::TokenMintOverflow(category));
        }
        if sent > input_fungible {
            return Err(TransactionError::TokenAmountExceedsInputs {
                category,
                sent,
                available: input_fungible,
            });
        }
        Ok(())
    }
}
