//! Proptest strategies for transparent types.

use proptest::{arbitrary::Arbitrary, collection::vec, option, prelude::*};

use crate::amount::{Amount, MAX_MONEY};
use crate::transaction;

use super::token::{Capability, Nft, TokenData, PREFIX_TOKEN};
use super::{Output, Script};

fn capability_strategy() -> impl Strategy<Value = Capability> {
    prop_oneof![
        Just(Capability::None),
        Just(Capability::Mutable),
        Just(Capability::Minting),
    ]
}

impl Arbitrary for TokenData {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            0u64..=10_000,
            option::of((capability_strategy(), vec(any::<u8>(), 0..8))),
        )
            .prop_map(|(category, amount, nft)| {
                let nft = nft.map(|(capability, commitment)| Nft {
                    capability,
                    commitment,
                });
                // A prefix with neither an amount nor an NFT encodes no
                // token and cannot appear on the wire.
                let amount = if amount == 0 && nft.is_none() { 1 } else { amount };
                TokenData {
                    category: transaction::Hash(category),
                    amount,
                    nft,
                }
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}

impl Arbitrary for Output {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            0i64..=MAX_MONEY,
            any::<Script>().prop_filter(
                "lock scripts must not alias the token prefix",
                |script| script.0.first() != Some(&PREFIX_TOKEN),
            ),
            option::weighted(0.2, any::<TokenData>()),
        )
            .prop_map(|(value, script, token)| Output {
                value: Amount::from_sat(value),
                script,
                token,
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}
