//! Input selection strategies.

use crate::config::SelectionPolicy;
use crate::transaction::Utxo;
use crate::value::Value;

/// Picks which UTXOs fund a transaction.
///
/// A strategy never fails: if the candidates cannot cover `target` it returns
/// what it has and the builder reports the shortfall.
pub trait UtxoSelectionStrategy: Send + Sync {
    fn select(&self, utxos: &[Utxo], target: &Value) -> Vec<Utxo>;
}

/// Spend every available UTXO
#[derive(Debug, Clone, Copy, Default)]
pub struct UseAll;

impl UtxoSelectionStrategy for UseAll {
    fn select(&self, utxos: &[Utxo], _target: &Value) -> Vec<Utxo> {
        utxos.to_vec()
    }
}

/// Prefer largest outputs first (minimizes number of inputs)
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestFirst;

impl UtxoSelectionStrategy for LargestFirst {
    fn select(&self, utxos: &[Utxo], target: &Value) -> Vec<Utxo> {
        let mut sorted: Vec<&Utxo> = utxos.iter().collect();
        sorted.sort_by(|a, b| b.output.amount.coin.cmp(&a.output.amount.coin));

        let mut selected = Vec::new();
        let mut total = Value::default();
        for utxo in sorted {
            if total.covers(target) {
                break;
            }
            // saturate instead of failing; the builder does the exact arithmetic
            total = total.checked_add(&utxo.output.amount).unwrap_or_else(|| Value::new(u64::MAX));
            selected.push(utxo.clone());
        }
        selected
    }
}

impl From<SelectionPolicy> for Box<dyn UtxoSelectionStrategy> {
    fn from(policy: SelectionPolicy) -> Self {
        match policy {
            SelectionPolicy::UseAll => Box::new(UseAll),
            SelectionPolicy::LargestFirst => Box::new(LargestFirst),
        }
    }
}
