//! Transaction balancing: fee estimation, change and min-UTXO checks.

use std::collections::BTreeSet;

use crate::address::CardanoAddress;
use crate::config::ProtocolParams;
use crate::error::{CardanoError, Result};
use crate::transaction::{
    Transaction, TransactionBody, TransactionInput, TransactionOutput, TransactionWitnessSet,
    Utxo, VkeyWitness,
};
use crate::value::Value;

const MAX_FEE_ROUNDS: usize = 8;

/// Collects inputs and outputs, then balances them into a body
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    params: ProtocolParams,
    inputs: Vec<Utxo>,
    outputs: Vec<TransactionOutput>,
    ttl: Option<u64>,
}

impl TransactionBuilder {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            params,
            inputs: Vec::new(),
            outputs: Vec::new(),
            ttl: None,
        }
    }

    /// Adds an input; the same outpoint is only spent once
    pub fn add_input(&mut self, utxo: Utxo) -> &mut Self {
        if !self.inputs.iter().any(|u| u.input == utxo.input) {
            self.inputs.push(utxo);
        }
        self
    }

    /// Adds an output, rejecting it if it carries less than the min-UTXO amount
    pub fn add_output(&mut self, output: TransactionOutput) -> Result<&mut Self> {
        let min_ada = self.params.min_ada_for_output(output.encoded_len())?;
        if output.amount.coin < min_ada {
            return Err(CardanoError::Balancing(format!(
                "output to {} carries {} lovelace, minimum is {}",
                output.address, output.amount.coin, min_ada
            )));
        }
        self.outputs.push(output);
        Ok(self)
    }

    pub fn set_ttl(&mut self, slot: u64) -> &mut Self {
        self.ttl = Some(slot);
        self
    }

    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    pub fn input_total(&self) -> Result<Value> {
        self.inputs
            .iter()
            .try_fold(Value::default(), |acc, u| acc.checked_add(&u.output.amount))
            .ok_or_else(|| CardanoError::Balancing("input total overflow".to_string()))
    }

    pub fn output_total(&self) -> Result<Value> {
        self.outputs
            .iter()
            .try_fold(Value::default(), |acc, o| acc.checked_add(&o.amount))
            .ok_or_else(|| CardanoError::Balancing("output total overflow".to_string()))
    }

    /// Balances inputs against outputs, sending any surplus to `change_address`.
    ///
    /// On success `Σ inputs = Σ outputs + fee` holds exactly, for coin and
    /// every asset.
    pub fn build(&self, change_address: &CardanoAddress) -> Result<TransactionBody> {
        let output_total = self.output_total()?;
        if self.inputs.is_empty() {
            return Err(CardanoError::InsufficientFunds {
                required: output_total.coin,
                available: 0,
            });
        }
        let input_total = self.input_total()?;

        let fee_without_change = self.settle_fee(|fee| self.body(self.outputs.clone(), fee))?;
        let required = output_total
            .coin
            .checked_add(fee_without_change)
            .ok_or_else(|| CardanoError::Balancing("required amount overflow".to_string()))?;
        if input_total.coin < required {
            return Err(CardanoError::InsufficientFunds {
                required,
                available: input_total.coin,
            });
        }

        let surplus = input_total.checked_sub(&output_total).ok_or_else(|| {
            CardanoError::Balancing("inputs do not hold every asset being sent".to_string())
        })?;

        // exact fit, nothing to return
        if surplus.coin == fee_without_change && surplus.is_pure_coin() {
            return self.finish(self.body(self.outputs.clone(), fee_without_change));
        }

        match self.balance_with_change(&surplus, change_address, fee_without_change)? {
            Some(body) => self.finish(body),
            None if surplus.is_pure_coin() => {
                log::debug!(
                    "change of {} lovelace below min-UTXO, adding it to the fee",
                    surplus.coin - fee_without_change
                );
                self.finish(self.body(self.outputs.clone(), surplus.coin))
            }
            None => Err(CardanoError::Balancing(
                "not enough ADA left to return change tokens".to_string(),
            )),
        }
    }

    /// Body with a change output, or `None` if the change cannot stand on its own
    fn balance_with_change(
        &self,
        surplus: &Value,
        change_address: &CardanoAddress,
        starting_fee: u64,
    ) -> Result<Option<TransactionBody>> {
        self.change_body(surplus, change_address, starting_fee, MAX_FEE_ROUNDS)
    }

    fn change_body(
        &self,
        surplus: &Value,
        change_address: &CardanoAddress,
        starting_fee: u64,
        rounds: usize,
    ) -> Result<Option<TransactionBody>> {
        let mut fee = starting_fee;
        for _ in 0..rounds {
            let Some(change) = surplus.checked_sub(&Value::new(fee)) else {
                return Ok(None);
            };
            let change_output = TransactionOutput::new(change_address.clone(), change);
            let min_ada = self.params.min_ada_for_output(change_output.encoded_len())?;
            if change_output.amount.coin < min_ada {
                return Ok(None);
            }

            let mut outputs = self.outputs.clone();
            outputs.push(change_output);
            let body = self.body(outputs, fee);
            let required = self.min_fee(&body)?;
            if required <= fee {
                return Ok(Some(body));
            }
            fee = required;
        }
        Err(CardanoError::Balancing("fee with change output did not converge".to_string()))
    }

    /// Raises the fee until it covers the size of the body it is written into
    fn settle_fee<F>(&self, make_body: F) -> Result<u64>
    where
        F: Fn(u64) -> TransactionBody,
    {
        let mut fee = 0;
        for _ in 0..MAX_FEE_ROUNDS {
            let required = self.min_fee(&make_body(fee))?;
            if required <= fee {
                return Ok(fee);
            }
            fee = required;
        }
        Err(CardanoError::Balancing("fee did not converge".to_string()))
    }

    fn body(&self, outputs: Vec<TransactionOutput>, fee: u64) -> TransactionBody {
        let mut inputs: Vec<TransactionInput> = self.inputs.iter().map(|u| u.input).collect();
        inputs.sort();
        TransactionBody {
            inputs,
            outputs,
            fee,
            ttl: self.ttl,
        }
    }

    fn finish(&self, body: TransactionBody) -> Result<TransactionBody> {
        let size = self.estimated_size(&body);
        if size > self.params.max_tx_size {
            return Err(CardanoError::Balancing(format!(
                "transaction size {size} exceeds maximum {}",
                self.params.max_tx_size
            )));
        }
        Ok(body)
    }

    /// Minimum fee for `body` once it carries its witnesses
    pub fn min_fee(&self, body: &TransactionBody) -> Result<u64> {
        self.params.min_fee(self.estimated_size(body))
    }

    /// Serialized size with one placeholder witness per distinct signing key
    fn estimated_size(&self, body: &TransactionBody) -> usize {
        // script-locked inputs are not unlocked by a vkey witness
        let signers: BTreeSet<[u8; 28]> = self
            .inputs
            .iter()
            .filter(|u| !u.output.address.has_script_payment())
            .map(|u| u.output.address.payment_credential)
            .collect();
        let witnesses = (0..signers.len().max(1))
            .map(|_| VkeyWitness { vkey: [0u8; 32], signature: [0u8; 64] })
            .collect();
        Transaction::new(body.clone(), TransactionWitnessSet { vkey_witnesses: witnesses })
            .to_cbor()
            .len()
    }
}
