//! Zero-confirmation escrow (ZCE) verification.
//!
//! A ZCE-secured payment carries an escrow output that a companion
//! "reclaim" transaction can recover once the payment confirms; until
//! then, any double-spend forfeits the escrow. Verifying the pair needs no
//! chain state beyond the payment's own attached spent outputs.

use secp256k1::PublicKey;

use crate::amount::Amount;
use crate::transparent::{keys::hash160, Script};

use super::{sighash, SighashType, Transaction};

/// ZCE payments bound their input count so the escrow script stays
/// reconstructible.
const MAX_ZCE_INPUTS: usize = 65_536;

impl Transaction {
    /// Whether this payment is secured by a zero-confirmation escrow of at
    /// least `escrow_amount`, reclaimable by `reclaim`, with both
    /// transactions paying at least `min_fee_rate` base units per byte.
    pub fn is_zce_secured(
        &self,
        reclaim: &Transaction,
        escrow_amount: Amount,
        min_fee_rate: u64,
    ) -> bool {
        // A payment with no inputs contributes no keys to the redeem
        // reconstruction and has nothing to escrow.
        if self.inputs.is_empty() || self.inputs.len() > MAX_ZCE_INPUTS {
            return false;
        }
        // Every payment input must spend a plain P2PKH output, so its
        // public key is recoverable from the unlocking script.
        for input in &self.inputs {
            match &input.output {
                Some(output) if output.script.is_p2pkh() => {}
                _ => return false,
            }
        }

        // The reclaim's first input must point back into this payment.
        let reclaim_input = match reclaim.inputs.first() {
            Some(input) => input,
            None => return false,
        };
        if reclaim_input.outpoint.hash != self.hash() {
            return false;
        }
        let escrow_utxo = match self.outputs.get(reclaim_input.outpoint.index as usize) {
            Some(output) => output,
            None => return false,
        };

        // The escrow must cover the promised amount plus this payment's
        // fee floor.
        let required = escrow_amount.as_sat() as i128
            + self.serialized_size() as i128 * min_fee_rate as i128;
        if (escrow_utxo.value.as_sat() as i128) < required {
            return false;
        }

        // The reclaim itself must pay at least the floor rate, or miners
        // would never pick it up.
        let mut reclaim_input_value = escrow_utxo.value.as_sat() as i128;
        for input in reclaim.inputs.iter().skip(1) {
            match &input.output {
                Some(output) => reclaim_input_value += output.value.as_sat() as i128,
                None => return false,
            }
        }
        let reclaim_output_value: i128 = reclaim
            .outputs
            .iter()
            .map(|output| output.value.as_sat() as i128)
            .sum();
        let reclaim_fee = reclaim_input_value - reclaim_output_value;
        if reclaim_fee < reclaim.serialized_size() as i128 * min_fee_rate as i128 {
            return false;
        }

        // The reclaim unlocking script is exactly signature, public key,
        // redeem script.
        let pushes = match reclaim_input.unlock_script.push_values() {
            Some(pushes) if pushes.len() == 3 => pushes,
            _ => return false,
        };
        let (reclaim_sig, reclaim_key_bytes, redeem_bytes) = (pushes[0], pushes[1], pushes[2]);
        let reclaim_key = match PublicKey::from_slice(reclaim_key_bytes) {
            Ok(key) => key,
            Err(_) => return false,
        };

        // Every signature involved commits to ALL | FORKID.
        let expected_type = (SighashType::ALL | SighashType::FORKID) as u8;
        if reclaim_sig.last() != Some(&expected_type) {
            return false;
        }
        let mut input_keys = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let pushes = match input.unlock_script.push_values() {
                Some(pushes) if pushes.len() == 2 => pushes,
                _ => return false,
            };
            if pushes[0].last() != Some(&expected_type) {
                return false;
            }
            match PublicKey::from_slice(pushes[1]) {
                Ok(key) => input_keys.push(key),
                Err(_) => return false,
            }
        }

        // The escrow redeem script rebuilt from the observed keys must
        // hash to the commitment in the escrow output AND to the redeem
        // script the reclaim actually carries.
        let expected_redeem = Script::escrow_redeem(&input_keys, &reclaim_key);
        let expected_hash = hash160(&expected_redeem.0);
        if escrow_utxo.script.p2sh_hash() != Some(expected_hash) {
            return false;
        }
        if hash160(redeem_bytes) != expected_hash {
            return false;
        }

        // Finally, the reclaim signature must verify over the escrow UTXO.
        sighash::verify_input_signature(
            reclaim,
            0,
            &expected_redeem,
            escrow_utxo.value,
            reclaim_sig,
            &reclaim_key,
        )
    }
}
