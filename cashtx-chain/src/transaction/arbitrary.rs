//! Proptest strategies for wire-shaped transactions.

use chrono::{TimeZone, Utc};
use proptest::{arbitrary::Arbitrary, collection::vec, prelude::*};

use crate::transparent::{self, Output, Script};

use super::{Input, LockTime, Transaction};

fn input_strategy() -> impl Strategy<Value = Input> {
    (any::<transparent::OutPoint>(), any::<Script>(), any::<u32>()).prop_map(
        |(outpoint, unlock_script, sequence)| Input::from_wire(outpoint, unlock_script, sequence),
    )
}

impl Arbitrary for LockTime {
    type Parameters = ();

    fn arbitrary_with(_args: ()) -> Self::Strategy {
        prop_oneof![
            (0..LockTime::BLOCK_HEIGHT_LIMIT).prop_map(LockTime::Height),
            (LockTime::MIN_TIMESTAMP..=LockTime::MAX_TIMESTAMP)
                .prop_map(|n| LockTime::Time(Utc.timestamp(n, 0)))
        ]
        .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}

impl Arbitrary for Transaction {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            1..=super::CURRENT_VERSION,
            vec(input_strategy(), 0..10),
            vec(any::<Output>(), 0..10),
            any::<LockTime>(),
        )
            .prop_map(|(version, inputs, outputs, locktime)| {
                Transaction::from_wire_parts(version, inputs, outputs, locktime)
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}
